use std::io::Write;
use std::path::{Path, PathBuf};

use color_eyre::eyre::{OptionExt, Result, WrapErr};
use serde::{Deserialize, Serialize};

use crate::spotify_rs::types::SpotifyTokenResponse;

/// Tokens are refreshed this many seconds before Spotify would reject them.
const EXPIRY_MARGIN_SECS: i64 = 60;

/// Access and refresh token persisted between runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedToken {
    pub access_token: String,
    pub refresh_token: String,
    /// Unix timestamp in seconds
    pub expires_at: i64,
}

impl CachedToken {
    /// Builds a cache entry from a token response received at `now`.
    ///
    /// Refresh responses may omit the refresh token, in which case `previous_refresh_token`
    /// is kept.
    pub fn from_response(
        response: SpotifyTokenResponse,
        previous_refresh_token: Option<&str>,
        now: i64,
    ) -> Result<Self> {
        let refresh_token = response
            .refresh_token
            .or_else(|| previous_refresh_token.map(str::to_string))
            .ok_or_eyre("Spotify did not return a refresh token")?;

        Ok(Self {
            access_token: response.access_token,
            refresh_token,
            expires_at: now + response.expires_in as i64,
        })
    }

    pub fn is_expired(&self, now: i64) -> bool {
        now + EXPIRY_MARGIN_SECS >= self.expires_at
    }

    pub fn default_path() -> Option<PathBuf> {
        dirs::cache_dir().map(|path| path.join("remix-remover").join("token.json"))
    }

    /// Returns `None` when nothing has been cached yet.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(path)
            .wrap_err(format!("Failed to read token cache: {}", path.display()))?;
        let token = serde_json::from_str(&contents)
            .wrap_err(format!("Failed to parse token cache: {}", path.display()))?;
        Ok(Some(token))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .wrap_err(format!("Failed to create {}", parent.display()))?;
        }
        let contents = serde_json::to_string_pretty(self)?;

        let mut options = std::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options
            .open(path)
            .wrap_err(format!("Failed to open token cache: {}", path.display()))?;

        // `mode` only applies on creation, so tighten a cache left by an older run.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(std::fs::Permissions::from_mode(0o600))
                .wrap_err("Failed to restrict token cache permissions")?;
        }

        file.write_all(contents.as_bytes())
            .wrap_err(format!("Failed to write token cache: {}", path.display()))?;

        log::debug!("Saved Spotify token to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(refresh_token: Option<&str>) -> SpotifyTokenResponse {
        SpotifyTokenResponse {
            access_token: "access".into(),
            token_type: "Bearer".into(),
            expires_in: 3600,
            refresh_token: refresh_token.map(str::to_string),
            scope: "playlist-read-private".into(),
        }
    }

    #[test]
    fn test_from_response_keeps_previous_refresh_token() {
        let token = CachedToken::from_response(response(None), Some("old"), 1_000).unwrap();
        assert_eq!(token.refresh_token, "old");
        assert_eq!(token.expires_at, 4_600);

        let token = CachedToken::from_response(response(Some("new")), Some("old"), 1_000).unwrap();
        assert_eq!(token.refresh_token, "new");

        assert!(CachedToken::from_response(response(None), None, 1_000).is_err());
    }

    #[test]
    fn test_expiry_margin() {
        let token = CachedToken::from_response(response(Some("r")), None, 0).unwrap();
        assert!(!token.is_expired(3_539));
        assert!(token.is_expired(3_540));
        assert!(token.is_expired(10_000));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache").join("token.json");

        assert_eq!(CachedToken::load(&path).unwrap(), None);

        let token = CachedToken {
            access_token: "a".into(),
            refresh_token: "r".into(),
            expires_at: 42,
        };
        token.save(&path).unwrap();

        assert_eq!(CachedToken::load(&path).unwrap(), Some(token));
    }

    #[cfg(unix)]
    #[test]
    fn test_saved_cache_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let fresh = dir.path().join("fresh.json");
        let stale = dir.path().join("stale.json");
        std::fs::write(&stale, "{}").unwrap();
        std::fs::set_permissions(&stale, std::fs::Permissions::from_mode(0o644)).unwrap();

        let token = CachedToken {
            access_token: "a".into(),
            refresh_token: "r".into(),
            expires_at: 42,
        };
        token.save(&fresh).unwrap();
        token.save(&stale).unwrap();

        for path in [&fresh, &stale] {
            let mode = std::fs::metadata(path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600, "{}", path.display());
        }
        assert_eq!(CachedToken::load(&stale).unwrap(), Some(token));
    }

    #[test]
    fn test_corrupt_cache_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        std::fs::write(&path, "not json").unwrap();

        assert!(CachedToken::load(&path).is_err());
    }
}
