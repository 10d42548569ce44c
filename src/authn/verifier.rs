use std::collections::HashMap;
use std::sync::Arc;

#[cfg(test)]
use mockall::automock;
use tonic::async_trait;

use crate::AuthError;
use crate::AuthnConfig;
use crate::Dataplane;
use crate::ProxyKind;
use crate::Result;
use crate::StaticTokenEntry;
use crate::VerifierKind;

/// Checks a credential against the proxy record it claims to be.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Verifier: Send + Sync + 'static {
    async fn verify(
        &self,
        record: &Dataplane,
        credential: &str,
    ) -> Result<()>;
}

/// Verifier per proxy kind.
pub type VerifierTable = HashMap<ProxyKind, Arc<dyn Verifier>>;

/// Accepts every credential.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopVerifier;

#[async_trait]
impl Verifier for NoopVerifier {
    async fn verify(
        &self,
        _record: &Dataplane,
        _credential: &str,
    ) -> Result<()> {
        Ok(())
    }
}

/// Accepts bearer tokens issued for the proxy or for its whole mesh.
#[derive(Debug, Clone)]
pub struct StaticTokenVerifier {
    tokens: Vec<StaticTokenEntry>,
}

impl StaticTokenVerifier {
    pub fn new(tokens: Vec<StaticTokenEntry>) -> Self {
        Self { tokens }
    }
}

#[async_trait]
impl Verifier for StaticTokenVerifier {
    async fn verify(
        &self,
        record: &Dataplane,
        credential: &str,
    ) -> Result<()> {
        let token = credential.strip_prefix("Bearer ").unwrap_or(credential).trim();
        let accepted = self.tokens.iter().any(|entry| {
            entry.token == token && entry.mesh == record.mesh && (entry.name == "*" || entry.name == record.name)
        });
        if accepted {
            Ok(())
        } else {
            Err(AuthError::AuthenticationFailed {
                key: record.key(),
                reason: "token is not valid for this proxy".to_string(),
            }
            .into())
        }
    }
}

/// Builds the dispatch table selected by `config`.
pub fn verifiers_from_config(config: &AuthnConfig) -> VerifierTable {
    let static_tokens: Arc<dyn Verifier> = Arc::new(StaticTokenVerifier::new(config.tokens.clone()));
    let noop: Arc<dyn Verifier> = Arc::new(NoopVerifier);

    [ProxyKind::Dataplane, ProxyKind::ZoneIngress, ProxyKind::ZoneEgress]
        .into_iter()
        .map(|kind| {
            let verifier = match config.verifier_for(kind) {
                VerifierKind::None => noop.clone(),
                VerifierKind::StaticToken => static_tokens.clone(),
            };
            (kind, verifier)
        })
        .collect()
}
