//! Session token persistence and claim decoding.
//!
//! The backend issues a JWT on login/registration. The client only needs to
//! keep it between runs and read the user claims out of its payload; the
//! signature is never verified locally.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use base64::Engine;
use base64::engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE_NO_PAD};
use serde::Deserialize;
use tracing::debug;

use super::error::TokenStoreError;
use super::models::User;

/// File name of the persisted token inside the app config directory.
const TOKEN_FILE_NAME: &str = "token";
/// App config directory name.
const APP_DIR_NAME: &str = "bookshelf";

/// Storage for the backend session token.
pub trait TokenStore: Send + Sync + std::fmt::Debug {
    /// Returns the stored token, if any.
    ///
    /// # Errors
    ///
    /// Returns [`TokenStoreError`] when the backing storage cannot be read.
    fn load(&self) -> Result<Option<String>, TokenStoreError>;

    /// Replaces the stored token.
    ///
    /// # Errors
    ///
    /// Returns [`TokenStoreError`] when the backing storage cannot be written.
    fn save(&self, token: &str) -> Result<(), TokenStoreError>;

    /// Removes the stored token. Clearing an empty store is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`TokenStoreError`] when the backing storage cannot be modified.
    fn clear(&self) -> Result<(), TokenStoreError>;
}

// ==================== MemoryTokenStore ====================

/// In-process token store (tests and one-shot sessions).
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: RwLock<Option<String>>,
}

impl MemoryTokenStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding `token`.
    #[must_use]
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(Some(token.into())),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<String>, TokenStoreError> {
        Ok(self
            .token
            .read()
            .map_or_else(|poisoned| poisoned.into_inner().clone(), |guard| guard.clone()))
    }

    fn save(&self, token: &str) -> Result<(), TokenStoreError> {
        match self.token.write() {
            Ok(mut guard) => *guard = Some(token.to_string()),
            Err(poisoned) => *poisoned.into_inner() = Some(token.to_string()),
        }
        Ok(())
    }

    fn clear(&self) -> Result<(), TokenStoreError> {
        match self.token.write() {
            Ok(mut guard) => *guard = None,
            Err(poisoned) => *poisoned.into_inner() = None,
        }
        Ok(())
    }
}

// ==================== FileTokenStore ====================

/// Token store backed by a single file.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    /// Creates a store at an explicit path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Creates a store at the default location.
    ///
    /// # Errors
    ///
    /// Returns [`TokenStoreError::ConfigDirUnavailable`] when no config
    /// directory can be determined.
    pub fn at_default_location() -> Result<Self, TokenStoreError> {
        default_token_path().map(Self::new)
    }

    /// Returns the token file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<String>, TokenStoreError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => {
                let token = contents.trim();
                Ok((!token.is_empty()).then(|| token.to_string()))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(TokenStoreError::io(&self.path, e)),
        }
    }

    fn save(&self, token: &str) -> Result<(), TokenStoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| TokenStoreError::io(parent, e))?;
        }
        write_private(&self.path, token).map_err(|e| TokenStoreError::io(&self.path, e))?;
        debug!(path = %self.path.display(), "Saved session token");
        Ok(())
    }

    fn clear(&self) -> Result<(), TokenStoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                debug!(path = %self.path.display(), "Removed session token");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(TokenStoreError::io(&self.path, e)),
        }
    }
}

#[cfg(unix)]
fn write_private(path: &Path, contents: &str) -> std::io::Result<()> {
    use std::io::Write;
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let mut file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    // mode() only applies on create; tighten a pre-existing file too
    file.set_permissions(fs::Permissions::from_mode(0o600))?;
    file.write_all(contents.as_bytes())
}

#[cfg(not(unix))]
fn write_private(path: &Path, contents: &str) -> std::io::Result<()> {
    fs::write(path, contents)
}

/// Returns `$XDG_CONFIG_HOME/bookshelf/token`, else `$HOME/.config/bookshelf/token`.
///
/// # Errors
///
/// Returns [`TokenStoreError::ConfigDirUnavailable`] when neither variable is set.
pub fn default_token_path() -> Result<PathBuf, TokenStoreError> {
    config_base_dir()
        .map(|dir| dir.join(APP_DIR_NAME).join(TOKEN_FILE_NAME))
        .ok_or(TokenStoreError::ConfigDirUnavailable)
}

fn config_base_dir() -> Option<PathBuf> {
    let non_empty = |name: &str| {
        std::env::var_os(name)
            .filter(|value| !value.is_empty())
            .map(PathBuf::from)
    };
    non_empty("XDG_CONFIG_HOME").or_else(|| non_empty("HOME").map(|home| home.join(".config")))
}

// ==================== Claims ====================

#[derive(Debug, Deserialize)]
struct TokenClaims {
    id: i64,
    #[serde(default)]
    nombre: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    fecha_creacion: Option<String>,
}

/// Reads the user claims from a JWT payload without verifying it.
///
/// Accepts base64url or standard base64, with or without padding. Returns
/// `None` for anything that is not a three-part token with a JSON payload
/// carrying a numeric `id`.
#[must_use]
pub fn decode_token_user(token: &str) -> Option<User> {
    let mut parts = token.trim().split('.');
    let (Some(_header), Some(payload), Some(_signature), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return None;
    };

    let payload = payload.trim_end_matches('=');
    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .or_else(|_| STANDARD_NO_PAD.decode(payload))
        .ok()?;
    let claims: TokenClaims = serde_json::from_slice(&bytes).ok()?;

    Some(User {
        id: claims.id,
        name: claims.nombre.unwrap_or_default(),
        email: claims.email.unwrap_or_default(),
        created_at: claims.fecha_creacion,
    })
}
