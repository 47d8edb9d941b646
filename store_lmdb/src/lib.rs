//! LMDB storage backend for gatewatch.
//!
//! Implements the storage traits from `gatewatch-store` using the `heed` LMDB bindings.
//! Every logical store maps to one or more LMDB databases within a single environment.

pub mod audit;
mod codec;
pub mod environment;
pub mod error;
pub mod identity;
pub mod location;
pub mod meta;

pub use audit::LmdbAuditLog;
pub use environment::LmdbEnvironment;
pub use error::LmdbError;
pub use identity::LmdbIdentityStore;
pub use location::LmdbLocationStore;
