use color_eyre::eyre::Result;

/// Decoupled representation of a Spotify user from the API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpotifyApiUser {
    pub id: String,
    pub display_name: Option<String>,
}

/// Decoupled representation of a Spotify playlist from the API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpotifyApiPlaylist {
    pub id: String,
    pub name: String,
    pub owner_id: String,
}

/// Decoupled representation of a playlist entry from the API.
///
/// Entries are addressed by URI, so podcast episodes (`spotify:episode:...`)
/// go through the same add and remove calls as tracks. Local files carry a
/// `spotify:local:...` URI that the Web API cannot add or remove.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpotifyApiTrack {
    pub uri: String,
    pub name: String,
    pub is_local: bool,
}

/// The Spotify API accepts at most this many tracks per add or remove request.
pub const MAX_TRACKS_PER_REQUEST: usize = 100;

/// Port trait wrapping the Spotify API capabilities used by business logic.
///
/// Implementations live in `services::spotify::client` (production) or test mocks.
/// Listing methods return every page; `add_tracks` and `remove_tracks` are a
/// single request each and must be given at most [`MAX_TRACKS_PER_REQUEST`] URIs.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait SpotifyClient: Send + Sync {
    async fn current_user(&self) -> Result<SpotifyApiUser>;

    async fn user_playlists(&self, user_id: &str) -> Result<Vec<SpotifyApiPlaylist>>;

    async fn playlist_tracks(&self, playlist_id: &str) -> Result<Vec<SpotifyApiTrack>>;

    async fn create_playlist(
        &self,
        user_id: &str,
        name: &str,
        public: bool,
    ) -> Result<SpotifyApiPlaylist>;

    async fn add_tracks(&self, playlist_id: &str, uris: &[String]) -> Result<()>;

    /// Removes every occurrence of the given entries from the playlist.
    async fn remove_tracks(&self, playlist_id: &str, uris: &[String]) -> Result<()>;
}
