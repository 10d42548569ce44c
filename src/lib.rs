//! Health Discovery Service (HDS) control plane for service-mesh proxies.
//!
//! Proxies open a long-lived bidirectional stream, authenticate with the
//! first request and then receive a [`proto::hds::HealthCheckSpecifier`]
//! whenever the probes they should run change. The probe results they report
//! back are folded into the topology store.
//!
//! ```ignore
//! let (shutdown_tx, shutdown_rx) = watch::channel(());
//! let node = HdsNodeBuilder::new(None, shutdown_rx)?.build()?;
//! node.start_metrics_server(shutdown_tx.subscribe());
//! node.run().await?;
//! ```

mod authn;
mod cache;
mod callbacks;
mod config;
mod errors;
mod generator;
mod model;
mod node;
mod reconciler;
mod server;
mod status;
mod store;
mod tracker;
mod watchdog;
pub mod metrics;
pub mod proto;
pub mod utils;

pub use authn::*;
pub use cache::*;
pub use callbacks::*;
pub use config::*;
pub use errors::*;
pub use generator::*;
pub use model::*;
pub use node::*;
pub use proto::proto_duration;
pub use reconciler::*;
pub use server::*;
pub use status::*;
pub use store::*;
pub use tracker::*;
pub use watchdog::*;

//-----------------------------------------------------------
// Test utils

#[cfg(test)]
pub(crate) mod test_utils;
