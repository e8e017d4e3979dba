//! OAuth token model and persistent storage.
//!
//! Tokens are persisted as JSON under `<token_dir>/<username>/<client>.token`
//! so separate accounts keep separate credentials. The access token and
//! refresh token are redacted from `Debug` output.

use std::{
    fmt, fs, io,
    path::{Path, PathBuf},
    time::{Duration, SystemTime},
};

use serde::{Deserialize, Serialize};
use serde_with::{formats::Flexible, serde_as, TimestampSeconds};
use veil::Redact;

use crate::error::Result;

/// Refresh this long before the recorded expiry to absorb clock skew
/// between client and server.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// An OAuth 2.0 token as issued by the accounts service.
///
/// The `expires_at` field is derived from the wire `expires_in` when the
/// token is obtained and persisted as a Unix timestamp, so a reloaded token
/// knows whether it is still usable.
#[serde_as]
#[derive(Clone, PartialEq, Eq, Deserialize, Serialize, Redact)]
pub struct Token {
    /// Bearer token presented on every API request.
    #[redact]
    pub access_token: String,

    /// Long-lived token used to obtain fresh access tokens. The token
    /// endpoint does not always echo it back on refresh, in which case the
    /// previous value is carried over.
    #[redact]
    pub refresh_token: Option<String>,

    /// Token type as reported by the token endpoint, normally `Bearer`.
    pub token_type: String,

    /// Absolute expiry of the access token.
    #[serde_as(as = "TimestampSeconds<i64, Flexible>")]
    pub expires_at: SystemTime,

    /// Scope granted to the token, if reported.
    pub scope: Option<String>,
}

impl Token {
    #[must_use]
    pub fn time_to_live(&self) -> Duration {
        self.expires_at
            .duration_since(SystemTime::now())
            .unwrap_or(Duration::ZERO)
    }

    /// Whether the access token should be considered unusable.
    ///
    /// Reports expiry [`EXPIRY_MARGIN`] early so a token that is about to
    /// lapse is refreshed before the service rejects it.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.time_to_live() <= EXPIRY_MARGIN
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.access_token)
    }
}

/// Storage for OAuth tokens.
///
/// The session dumps the current token after every fetch or refresh and
/// loads it on start-up, so interactive authorization is a one-time step.
pub trait TokenStore {
    /// Persists a token.
    fn dump(&self, token: &Token) -> Result<()>;

    /// Loads the stored token, or `None` when no usable token is stored.
    fn load(&self) -> Result<Option<Token>>;
}

/// File-backed token store.
///
/// One file per account and client type, mirroring how the service kept
/// mobile and uploader credentials apart.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    /// Token files are small; refuse to read anything suspiciously large.
    const MAX_FILE_SIZE: u64 = 8 * 1024;

    /// Creates a store at `<token_dir>/<username>/<client>.token`.
    #[must_use]
    pub fn new(token_dir: &Path, username: &str, client: &str) -> Self {
        let path = token_dir.join(username).join(format!("{client}.token"));
        Self { path }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn check(&self) -> io::Result<()> {
        let attributes = fs::metadata(&self.path)?;
        if attributes.len() > Self::MAX_FILE_SIZE {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("{} is too large", self.path.display()),
            ));
        }

        Ok(())
    }
}

impl TokenStore for FileTokenStore {
    fn dump(&self, token: &Token) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = serde_json::to_string(token)?;
        fs::write(&self.path, contents)?;
        debug!("stored token in {}", self.path.display());

        Ok(())
    }

    fn load(&self) -> Result<Option<Token>> {
        match self.check() {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        }

        let contents = fs::read_to_string(&self.path)?;
        match serde_json::from_str::<Token>(&contents) {
            Ok(token) => Ok(Some(token)),
            Err(e) => {
                // A mangled token file is not fatal: fall back to a fresh
                // interactive authorization.
                warn!("ignoring malformed token file {}: {e}", self.path.display());
                Ok(None)
            }
        }
    }
}
