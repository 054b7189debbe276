use serde::{Deserialize, Serialize};

/// Spotify OAuth token response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpotifyTokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
    /// Omitted on refresh when Spotify keeps the previous refresh token valid
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: String,
}

/// Spotify user profile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpotifyUser {
    pub id: String,
    pub display_name: Option<String>,
}

/// Spotify playlist from API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpotifyPlaylist {
    pub id: String,
    pub name: String,
    pub owner: SpotifyPlaylistOwner,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpotifyPlaylistOwner {
    pub id: String,
}

/// Track or episode from a playlist listing. Local files have no id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpotifyTrack {
    pub id: Option<String>,
    pub name: String,
    pub uri: String,
    /// `track` or `episode`
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistTrackObject {
    #[serde(default)]
    pub is_local: bool,
    pub track: Option<SpotifyTrack>,
}

/// One page of a paginated listing
#[derive(Debug, Clone, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreatePlaylistRequest<'a> {
    pub name: &'a str,
    pub public: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct AddTracksRequest {
    pub uris: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RemoveTracksRequest {
    pub tracks: Vec<TrackUri>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrackUri {
    pub uri: String,
}

/// PKCE OAuth session data
#[derive(Debug, Clone)]
pub struct OAuthSession {
    pub code_verifier: String,
    pub state: String,
    pub created_at: i64,
}

/// Response for authentication initiation
#[derive(Debug, Clone)]
pub struct SpotifyAuthResponse {
    pub auth_url: String,
    pub state: String,
}
