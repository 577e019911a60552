//! Session storage for the bearer token.
//!
//! This module provides:
//! - `SessionStore`: the read/write/clear contract for the token slot
//! - `FileSessionStore`: token kept as a plain file in the data directory
//! - `KeyringSessionStore`: token kept in the OS keychain via keyring
//! - `MemorySessionStore`: shared in-process slot
//!
//! The store is injected wherever the token is read or written; nothing
//! reaches for it as ambient global state.

pub mod keychain;
pub mod session;

use std::path::PathBuf;

use anyhow::Result;
use tracing::warn;

use crate::config::SessionBackend;

pub use keychain::KeyringSessionStore;
pub use session::{FileSessionStore, MemorySessionStore, SessionStore, TOKEN_KEY};

/// Open the store selected by `backend`.
///
/// The file backend needs a data directory; without one the token lives in
/// memory for the lifetime of the process.
pub fn open_store(
    backend: SessionBackend,
    data_dir: Option<PathBuf>,
) -> Result<Box<dyn SessionStore + Send>> {
    let store: Box<dyn SessionStore + Send> = match backend {
        SessionBackend::File => match data_dir {
            Some(dir) => Box::new(FileSessionStore::new(dir)),
            None => {
                warn!("No data directory available, keeping session in memory");
                Box::new(MemorySessionStore::new())
            }
        },
        SessionBackend::Keyring => Box::new(KeyringSessionStore::new()?),
        SessionBackend::Memory => Box::new(MemorySessionStore::new()),
    };
    Ok(store)
}
