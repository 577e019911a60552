use anyhow::{Context, Result};
use keyring::Entry;

use super::session::{SessionStore, TOKEN_KEY};

const SERVICE_NAME: &str = "authfront";

/// Token kept in the OS keychain under the `authfront` service.
pub struct KeyringSessionStore {
    entry: Entry,
}

impl KeyringSessionStore {
    pub fn new() -> Result<Self> {
        let entry = Entry::new(SERVICE_NAME, TOKEN_KEY).context("Failed to create keyring entry")?;
        Ok(Self { entry })
    }
}

impl SessionStore for KeyringSessionStore {
    fn load(&self) -> Result<Option<String>> {
        match self.entry.get_password() {
            Ok(token) => Ok(Some(token)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e).context("Failed to retrieve token from keychain"),
        }
    }

    fn save(&self, token: &str) -> Result<()> {
        self.entry
            .set_password(token)
            .context("Failed to store token in keychain")
    }

    fn clear(&self) -> Result<()> {
        match self.entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e).context("Failed to delete token from keychain"),
        }
    }
}
