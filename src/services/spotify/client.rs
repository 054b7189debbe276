use color_eyre::eyre::{Result, WrapErr};

use crate::ports::spotify::{
    MAX_TRACKS_PER_REQUEST, SpotifyApiPlaylist, SpotifyApiTrack, SpotifyApiUser, SpotifyClient,
};
use crate::spotify_rs::client::SpotifyClient as SpotifyHttpClient;
use crate::spotify_rs::types::{PlaylistTrackObject, SpotifyPlaylist};

impl From<SpotifyPlaylist> for SpotifyApiPlaylist {
    fn from(playlist: SpotifyPlaylist) -> Self {
        Self {
            id: playlist.id,
            name: playlist.name,
            owner_id: playlist.owner.id,
        }
    }
}

fn to_api_track(item: PlaylistTrackObject) -> Option<SpotifyApiTrack> {
    let track = item.track?;
    if let Some(kind) = track.kind.as_deref().filter(|kind| *kind != "track") {
        log::debug!("Playlist entry '{}' is a {}", track.name, kind);
    }
    Some(SpotifyApiTrack {
        is_local: item.is_local || track.uri.starts_with("spotify:local:"),
        uri: track.uri,
        name: track.name,
    })
}

#[async_trait::async_trait]
impl SpotifyClient for SpotifyHttpClient {
    async fn current_user(&self) -> Result<SpotifyApiUser> {
        let user = self
            .get_current_user()
            .await
            .wrap_err("Failed to fetch current user")?;
        Ok(SpotifyApiUser {
            id: user.id,
            display_name: user.display_name,
        })
    }

    async fn user_playlists(&self, user_id: &str) -> Result<Vec<SpotifyApiPlaylist>> {
        let playlists = self
            .get_user_playlists(user_id)
            .await
            .wrap_err(format!("Failed to fetch playlists of user {}", user_id))?;
        Ok(playlists.into_iter().map(SpotifyApiPlaylist::from).collect())
    }

    async fn playlist_tracks(&self, playlist_id: &str) -> Result<Vec<SpotifyApiTrack>> {
        let tracks = self
            .get_playlist_tracks(playlist_id)
            .await
            .wrap_err(format!("Failed to fetch tracks of playlist {}", playlist_id))?;
        Ok(tracks.into_iter().filter_map(to_api_track).collect())
    }

    async fn create_playlist(
        &self,
        user_id: &str,
        name: &str,
        public: bool,
    ) -> Result<SpotifyApiPlaylist> {
        let playlist = SpotifyHttpClient::create_playlist(self, user_id, name, public)
            .await
            .wrap_err(format!("Failed to create playlist '{}'", name))?;
        Ok(playlist.into())
    }

    async fn add_tracks(&self, playlist_id: &str, uris: &[String]) -> Result<()> {
        color_eyre::eyre::ensure!(
            uris.len() <= MAX_TRACKS_PER_REQUEST,
            "Cannot add more than {} tracks in one request",
            MAX_TRACKS_PER_REQUEST
        );
        self.add_tracks_to_playlist(playlist_id, uris)
            .await
            .wrap_err(format!("Failed to add tracks to playlist {}", playlist_id))
    }

    async fn remove_tracks(&self, playlist_id: &str, uris: &[String]) -> Result<()> {
        color_eyre::eyre::ensure!(
            uris.len() <= MAX_TRACKS_PER_REQUEST,
            "Cannot remove more than {} tracks in one request",
            MAX_TRACKS_PER_REQUEST
        );
        self.remove_tracks_from_playlist(playlist_id, uris)
            .await
            .wrap_err(format!("Failed to remove tracks from playlist {}", playlist_id))
    }
}
