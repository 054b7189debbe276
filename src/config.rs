use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use color_eyre::eyre::{OptionExt, Result, WrapErr, bail};
use serde::{Deserialize, Serialize};
use url::Url;

const DEFAULT_CONFIG: &str = r#"[spotify]
# Create an app at https://developer.spotify.com/dashboard and copy its credentials
client_id = ""
client_secret = ""
redirect_uri = "http://127.0.0.1:8888/callback"

[remover]
# Spotify user id that owns the playlist to filter
username = ""
release_playlist_name = "Release Radar"
remix_free_playlist_name = "Release Radar (No Remixes)"
# Remove the previous tracks of the destination playlist before adding new ones
replace_old_songs = true
# Fail instead of picking the first one when several playlists share the destination name
strict_destination = false

[banned_keywords]
remix = true
edit = false
"#;

#[derive(Debug, Serialize, Deserialize)]
struct ConfigFile {
    spotify: SpotifyConfigFile,
    remover: RemoverConfigFile,
    #[serde(default)]
    banned_keywords: BTreeMap<String, bool>,
}

#[derive(Debug, Serialize, Deserialize)]
struct SpotifyConfigFile {
    client_id: String,
    client_secret: String,
    redirect_uri: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct RemoverConfigFile {
    username: String,
    release_playlist_name: String,
    remix_free_playlist_name: String,
    replace_old_songs: bool,
    #[serde(default)]
    strict_destination: bool,
}

/// Validated configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub spotify: SpotifyConfig,
    pub remover: RemoverConfig,
}

#[derive(Debug, Clone)]
pub struct SpotifyConfig {
    pub client_id: String,
    pub client_secret: String,
    /// Sent verbatim, Spotify compares it byte for byte with the registered URI.
    pub redirect_uri: String,
}

/// Everything a removal run needs besides the Spotify client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoverConfig {
    pub username: String,
    pub release_playlist_name: String,
    pub remix_free_playlist_name: String,
    pub replace_old_songs: bool,
    pub strict_destination: bool,
    /// Enabled keywords only, lowercased.
    pub banned_keywords: BTreeSet<String>,
}

fn required(value: String, field: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        bail!("`{}` must not be empty", field);
    }
    Ok(trimmed.to_string())
}

// Playlist names are matched exactly, surrounding whitespace included.
fn required_name(value: String, field: &str) -> Result<String> {
    if value.trim().is_empty() {
        bail!("`{}` must not be empty", field);
    }
    Ok(value)
}

impl Config {
    /// Load config from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .wrap_err(format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml(&contents)
            .wrap_err(format!("Invalid config file: {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(contents).wrap_err("Failed to parse config")?;
        Self::validate(file)
    }

    fn validate(file: ConfigFile) -> Result<Self> {
        let redirect_uri = required(file.spotify.redirect_uri, "spotify.redirect_uri")?;
        Url::parse(&redirect_uri)
            .wrap_err(format!("Invalid spotify.redirect_uri: {}", redirect_uri))?;

        let spotify = SpotifyConfig {
            client_id: required(file.spotify.client_id, "spotify.client_id")?,
            client_secret: required(file.spotify.client_secret, "spotify.client_secret")?,
            redirect_uri,
        };

        let mut banned_keywords = BTreeSet::new();
        for (keyword, enabled) in file.banned_keywords {
            if keyword.trim().is_empty() {
                bail!("Banned keywords must not be blank");
            }
            if enabled {
                banned_keywords.insert(keyword.to_lowercase());
            }
        }

        let remover = RemoverConfig {
            username: required(file.remover.username, "remover.username")?,
            release_playlist_name: required_name(
                file.remover.release_playlist_name,
                "remover.release_playlist_name",
            )?,
            remix_free_playlist_name: required_name(
                file.remover.remix_free_playlist_name,
                "remover.remix_free_playlist_name",
            )?,
            replace_old_songs: file.remover.replace_old_songs,
            strict_destination: file.remover.strict_destination,
            banned_keywords,
        };

        Ok(Self { spotify, remover })
    }

    /// Get the default config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|path| path.join("remix-remover").join("config.toml"))
    }

    /// Load config from the default location
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path().ok_or_eyre("Could not determine config directory")?;

        Self::from_file(&config_path)
    }

    /// Write the commented template to `path` unless a file already exists there.
    /// Returns whether a file was written.
    pub fn create_default_at(path: &Path) -> Result<bool> {
        if path.exists() {
            return Ok(false);
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .wrap_err(format!("Failed to create {}", parent.display()))?;
        }
        std::fs::write(path, DEFAULT_CONFIG)
            .wrap_err(format!("Failed to write config file: {}", path.display()))?;
        Ok(true)
    }

    pub fn create_default() -> Result<PathBuf> {
        let path = Self::config_path().ok_or_eyre("Could not determine config directory")?;
        if Self::create_default_at(&path)? {
            log::info!("Wrote default config to {}", path.display());
        } else {
            log::info!("Config already exists at {}", path.display());
        }
        Ok(path)
    }
}
