use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use super::credentials::PersistedToken;
use crate::error::{KrmPesanError, Result};

/// File name used inside a token directory.
pub const TOKEN_FILE_NAME: &str = "token.json";

/// Storage abstraction for persisted credentials.
///
/// Implementations only move bytes; all expiry and refresh decisions stay in
/// [`TokenLifecycle`](super::TokenLifecycle).
pub trait TokenStore: Send + Sync {
    /// Read the persisted record. A store with nothing saved yet returns an empty record.
    fn load(&self) -> Result<PersistedToken>;

    /// Overlay `id_token` and `expired_at` onto the existing record and write it back.
    fn store(&self, id_token: &str, expired_at: &str) -> Result<()>;

    /// Human-readable location used in error messages.
    fn location(&self) -> String;
}

/// JSON file store at `<dir>/token.json`.
///
/// Writes are read-merge-write through a sibling temp file and a rename, so a
/// reader never sees a half-written file. There is no cross-process lock:
/// two clients sharing one file can still lose each other's updates.
///
/// # Example
/// ```no_run
/// use krmpesan::auth::{FileTokenStore, TokenStore};
///
/// let store = FileTokenStore::in_dir("/var/lib/krmpesan")?;
/// let persisted = store.load()?;
/// println!("device: {:?}", persisted.device_id());
/// # Ok::<(), krmpesan::KrmPesanError>(())
/// ```
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    /// Use `<dir>/token.json`. The directory must already exist.
    pub fn in_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(KrmPesanError::configuration(format!(
                "Token directory not found: {}",
                dir.display()
            )));
        }
        Ok(Self {
            path: dir.join(TOKEN_FILE_NAME),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<PersistedToken> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(PersistedToken::default())
            }
            Err(err) => return Err(KrmPesanError::persistence(self.location(), err)),
        };
        if raw.trim().is_empty() {
            return Ok(PersistedToken::default());
        }
        serde_json::from_str(&raw).map_err(|err| KrmPesanError::persistence(self.location(), err))
    }

    fn write(&self, token: &PersistedToken) -> Result<()> {
        let serialized = serde_json::to_string_pretty(token)?;
        let tmp = self.path.with_extension("json.tmp");
        write_private(&tmp, serialized.as_bytes())
            .map_err(|err| KrmPesanError::persistence(self.location(), err))?;
        fs::rename(&tmp, &self.path).map_err(|err| {
            let _ = fs::remove_file(&tmp);
            KrmPesanError::persistence(self.location(), err)
        })
    }
}

/// Create (or truncate) `path` readable by the owner only and write `data`.
fn write_private(path: &Path, data: &[u8]) -> io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    #[cfg(unix)]
    {
        // mode() only applies on creation; a leftover temp file keeps its old bits
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(fs::Permissions::from_mode(0o600))?;
    }
    file.write_all(data)?;
    file.sync_all()
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<PersistedToken> {
        self.read()
    }

    fn store(&self, id_token: &str, expired_at: &str) -> Result<()> {
        let mut token = self.read()?;
        token.id_token = Some(id_token.to_string());
        token.expired_at = Some(expired_at.to_string());
        self.write(&token)
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}
