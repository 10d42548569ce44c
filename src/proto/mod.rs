//! Protocol Buffer definitions and generated code for the health discovery service.
//!
//! The generated module is produced by [`tonic-build`] from `proto/hds.proto`
//! and checked in under `src/generated`.

pub mod hds {
    include!("../generated/envoy.service.health.v3.rs");
}

mod hds_ext;
pub use hds_ext::*;
