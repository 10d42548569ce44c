use serde::Deserialize;
use serde::Serialize;

use super::config_error;
use crate::ProxyKind;
use crate::Result;

/// Credential verification strategy
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum VerifierKind {
    /// Accepts any credential of a known proxy
    #[default]
    None,
    /// Compares the credential against `authn.tokens`
    StaticToken,
}

/// Verifier selected for each proxy kind
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default)]
pub struct VerifierSelection {
    #[serde(default)]
    pub dataplane: VerifierKind,
    #[serde(default)]
    pub zone_ingress: VerifierKind,
    #[serde(default)]
    pub zone_egress: VerifierKind,
}

/// One accepted bearer token.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct StaticTokenEntry {
    pub token: String,
    pub mesh: String,
    /// Proxy name, or `*` for every proxy of the mesh
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct AuthnConfig {
    #[serde(default)]
    pub verifiers: VerifierSelection,

    #[serde(default)]
    pub tokens: Vec<StaticTokenEntry>,
}

impl AuthnConfig {
    pub fn verifier_for(
        &self,
        kind: ProxyKind,
    ) -> VerifierKind {
        match kind {
            ProxyKind::Dataplane => self.verifiers.dataplane,
            ProxyKind::ZoneIngress => self.verifiers.zone_ingress,
            ProxyKind::ZoneEgress => self.verifiers.zone_egress,
        }
    }

    pub fn validate(&self) -> Result<()> {
        let uses_tokens = [ProxyKind::Dataplane, ProxyKind::ZoneIngress, ProxyKind::ZoneEgress]
            .into_iter()
            .any(|kind| self.verifier_for(kind) == VerifierKind::StaticToken);
        if uses_tokens && self.tokens.is_empty() {
            return Err(config_error("authn.tokens must not be empty when static_token is selected"));
        }
        if let Some(entry) = self
            .tokens
            .iter()
            .find(|t| t.token.is_empty() || t.mesh.is_empty() || t.name.is_empty())
        {
            return Err(config_error(format!(
                "authn.tokens entry for {}.{} has an empty field",
                entry.mesh, entry.name
            )));
        }
        Ok(())
    }
}
