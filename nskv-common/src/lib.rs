// nskv-common - Shared types for the namespaced key-value store
//
// This crate defines the identity, error taxonomy, wire record, and
// configuration types shared between the store core (nskv-core) and its
// adapters (nskv-server, nskv-client).

pub mod config;
pub mod error;
pub mod key;
pub mod record;

pub use config::StoreConfig;
pub use error::{Error, Result};
pub use key::{QualifiedKey, DEFAULT_NAMESPACE};
pub use record::{Action, WalRecord};
