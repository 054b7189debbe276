use std::time::Duration;

use color_eyre::Result;
use color_eyre::eyre::eyre;
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;

use crate::spotify_rs::types::{
    AddTracksRequest, CreatePlaylistRequest, Page, PlaylistTrackObject, RemoveTracksRequest,
    SpotifyPlaylist, SpotifyUser, TrackUri,
};

pub const SPOTIFY_API_URL: &str = "https://api.spotify.com/v1";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

const PLAYLIST_TRACK_FIELDS: &str = "items(is_local,track(id,name,uri,type)),next";

/// Spotify API client
pub struct SpotifyClient {
    access_token: String,
    base_url: String,
    client: reqwest::Client,
}

impl SpotifyClient {
    pub fn new(access_token: String) -> Self {
        Self::with_base_url(access_token, SPOTIFY_API_URL.to_string())
    }

    pub fn with_base_url(access_token: String, base_url: String) -> Self {
        Self {
            access_token,
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn user_playlists_url(&self, user_id: &str) -> String {
        format!(
            "{}/users/{}/playlists?limit=50",
            self.base_url,
            urlencoding::encode(user_id)
        )
    }

    fn playlist_tracks_url(&self, playlist_id: &str) -> String {
        format!(
            "{}/playlists/{}/tracks?limit=100&fields={}",
            self.base_url,
            urlencoding::encode(playlist_id),
            urlencoding::encode(PLAYLIST_TRACK_FIELDS)
        )
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request
            .bearer_auth(&self.access_token)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or("Failed to get error text".to_string());
            return Err(eyre!("Spotify API returned {}: {}", status, body));
        }

        Ok(response)
    }

    /// Follows `next` links until every page has been read.
    async fn get_all_pages<T: DeserializeOwned>(&self, first_url: String) -> Result<Vec<T>> {
        let mut all_items = Vec::new();
        let mut next_url = Some(first_url);

        while let Some(url) = next_url {
            let page: Page<T> = self.send(self.client.get(&url)).await?.json().await?;
            log::debug!("Fetched page of {} items from {}", page.items.len(), url);
            all_items.extend(page.items);
            next_url = page.next;
        }

        Ok(all_items)
    }

    /// Get the current user's profile
    pub async fn get_current_user(&self) -> Result<SpotifyUser> {
        let url = format!("{}/me", self.base_url);
        let user: SpotifyUser = self.send(self.client.get(url)).await?.json().await?;
        Ok(user)
    }

    /// Get all playlists owned or followed by a user
    pub async fn get_user_playlists(&self, user_id: &str) -> Result<Vec<SpotifyPlaylist>> {
        self.get_all_pages(self.user_playlists_url(user_id)).await
    }

    /// Get every entry of a playlist, including local files and episodes.
    /// Entries whose track is no longer available come back as `null` and are skipped.
    pub async fn get_playlist_tracks(&self, playlist_id: &str) -> Result<Vec<PlaylistTrackObject>> {
        let items: Vec<PlaylistTrackObject> = self
            .get_all_pages(self.playlist_tracks_url(playlist_id))
            .await?;

        Ok(items
            .into_iter()
            .filter(|item| {
                if item.track.is_none() {
                    log::debug!("Skipping unavailable entry in playlist {}", playlist_id);
                }
                item.track.is_some()
            })
            .collect())
    }

    pub async fn create_playlist(
        &self,
        user_id: &str,
        name: &str,
        public: bool,
    ) -> Result<SpotifyPlaylist> {
        let url = format!(
            "{}/users/{}/playlists",
            self.base_url,
            urlencoding::encode(user_id)
        );
        let body = CreatePlaylistRequest { name, public };
        let playlist: SpotifyPlaylist = self
            .send(self.client.post(url).json(&body))
            .await?
            .json()
            .await?;
        Ok(playlist)
    }

    pub async fn add_tracks_to_playlist(&self, playlist_id: &str, uris: &[String]) -> Result<()> {
        let url = format!(
            "{}/playlists/{}/tracks",
            self.base_url,
            urlencoding::encode(playlist_id)
        );
        let body = AddTracksRequest {
            uris: uris.to_vec(),
        };
        self.send(self.client.post(url).json(&body)).await?;
        Ok(())
    }

    /// Removes all occurrences of the given entries
    pub async fn remove_tracks_from_playlist(
        &self,
        playlist_id: &str,
        uris: &[String],
    ) -> Result<()> {
        let url = format!(
            "{}/playlists/{}/tracks",
            self.base_url,
            urlencoding::encode(playlist_id)
        );
        let body = RemoveTracksRequest {
            tracks: uris
                .iter()
                .map(|uri| TrackUri { uri: uri.clone() })
                .collect(),
        };
        self.send(self.client.delete(url).json(&body)).await?;
        Ok(())
    }
}
