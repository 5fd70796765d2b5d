#![deny(unreachable_pub, missing_docs)]
/*!
tonic service implementations for Turbo: CRUD over a soft-deletable Postgres table.
!*/

/// Derivation of store values from gRPC requests
pub mod extensions;

/// gRPC service implementations
pub mod services;

/// Data access for the turbos table
pub mod store;

/// Compiled protocol buffers for the Turbo service
#[allow(unreachable_pub, missing_docs, clippy::derive_partial_eq_without_eq)]
pub mod proto {
    tonic::include_proto!("turbo.v1");
}

/// Encoded file descriptor set for every service in this crate, for use with reflection
pub const FILE_DESCRIPTOR_SET: &[u8] = tonic::include_file_descriptor_set!("routes");
