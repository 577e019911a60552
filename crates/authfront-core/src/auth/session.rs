use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use tracing::debug;

/// Well-known key the bearer token is stored under.
pub const TOKEN_KEY: &str = "token";

/// Persistent slot holding the raw bearer token.
///
/// The value is the token string exactly as the endpoint returned it, with no
/// envelope and no expiry metadata.
pub trait SessionStore {
    /// Read the stored token, if any
    fn load(&self) -> Result<Option<String>>;

    /// Store a token, overwriting any previous one
    fn save(&self, token: &str) -> Result<()>;

    /// Remove the stored token. Clearing an empty store is not an error.
    fn clear(&self) -> Result<()>;
}

/// Token stored as a plain file named after [`TOKEN_KEY`].
pub struct FileSessionStore {
    dir: PathBuf,
}

impl FileSessionStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn token_path(&self) -> PathBuf {
        self.dir.join(TOKEN_KEY)
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<Option<String>> {
        let path = self.token_path();
        if !path.exists() {
            return Ok(None);
        }
        let token = std::fs::read_to_string(&path).context("Failed to read session file")?;
        Ok(Some(token))
    }

    fn save(&self, token: &str) -> Result<()> {
        std::fs::create_dir_all(&self.dir).context("Failed to create session directory")?;
        write_private(&self.token_path(), token).context("Failed to write session file")?;
        debug!(path = ?self.token_path(), "Session saved");
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let path = self.token_path();
        if path.exists() {
            std::fs::remove_file(&path).context("Failed to remove session file")?;
        }
        Ok(())
    }
}

/// Write `contents` readable by the owner only.
#[cfg(unix)]
fn write_private(path: &Path, contents: &str) -> std::io::Result<()> {
    use std::fs::Permissions;
    use std::io::Write;
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    // mode() only applies when the file is created
    file.set_permissions(Permissions::from_mode(0o600))?;
    file.write_all(contents.as_bytes())
}

#[cfg(not(unix))]
fn write_private(path: &Path, contents: &str) -> std::io::Result<()> {
    std::fs::write(path, contents)
}

/// In-process slot. Clones share the same slot.
#[derive(Clone, Default)]
pub struct MemorySessionStore {
    slot: Arc<Mutex<Slot>>,
}

#[derive(Default)]
struct Slot {
    token: Option<String>,
    writes: usize,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `save` calls seen so far
    pub fn write_count(&self) -> usize {
        self.slot.lock().map(|s| s.writes).unwrap_or(0)
    }

    fn with_slot<T>(&self, f: impl FnOnce(&mut Slot) -> T) -> Result<T> {
        let mut slot = self
            .slot
            .lock()
            .map_err(|_| anyhow::anyhow!("Session slot lock poisoned"))?;
        Ok(f(&mut slot))
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<Option<String>> {
        self.with_slot(|s| s.token.clone())
    }

    fn save(&self, token: &str) -> Result<()> {
        self.with_slot(|s| {
            s.token = Some(token.to_string());
            s.writes += 1;
        })
    }

    fn clear(&self) -> Result<()> {
        self.with_slot(|s| s.token = None)
    }
}

impl<S: SessionStore + ?Sized> SessionStore for Box<S> {
    fn load(&self) -> Result<Option<String>> {
        (**self).load()
    }

    fn save(&self, token: &str) -> Result<()> {
        (**self).save(token)
    }

    fn clear(&self) -> Result<()> {
        (**self).clear()
    }
}
