use std::collections::HashMap;
use std::sync::Mutex;

use color_eyre::eyre::{OptionExt, Result, ensure};

use crate::ports::spotify::{
    MAX_TRACKS_PER_REQUEST, SpotifyApiPlaylist, SpotifyApiTrack, SpotifyApiUser, SpotifyClient,
};

pub fn track(id: &str, name: &str) -> SpotifyApiTrack {
    SpotifyApiTrack {
        uri: format!("spotify:track:{id}"),
        name: name.into(),
        is_local: false,
    }
}

pub fn episode(id: &str, name: &str) -> SpotifyApiTrack {
    SpotifyApiTrack {
        uri: format!("spotify:episode:{id}"),
        name: name.into(),
        is_local: false,
    }
}

pub fn local_file(name: &str) -> SpotifyApiTrack {
    SpotifyApiTrack {
        uri: format!("spotify:local:Artist:Album:{name}:180"),
        name: name.into(),
        is_local: true,
    }
}

#[derive(Debug, Clone)]
pub struct FakePlaylist {
    pub id: String,
    pub name: String,
    pub owner_id: String,
    pub public: bool,
    pub uris: Vec<String>,
}

impl FakePlaylist {
    /// The last segment of each URI, which is the id for tracks and episodes.
    pub fn track_ids(&self) -> Vec<String> {
        self.uris
            .iter()
            .map(|uri| uri.rsplit(':').next().unwrap_or_default().to_string())
            .collect()
    }
}

#[derive(Default)]
struct FakeState {
    // Insertion order is the order Spotify would list them in.
    playlists: Vec<FakePlaylist>,
    catalog: HashMap<String, SpotifyApiTrack>,
    next_id: usize,
    create_requests: usize,
    add_requests: usize,
    remove_requests: usize,
}

/// In-memory stand-in for the Spotify catalog.
///
/// Every playlist is visible to every user, the way followed playlists show up
/// in a Spotify user's playlist listing.
pub struct FakeSpotify {
    user_id: String,
    state: Mutex<FakeState>,
}

impl FakeSpotify {
    pub fn new(user_id: &str) -> Self {
        Self {
            user_id: user_id.into(),
            state: Mutex::new(FakeState::default()),
        }
    }

    pub fn add_playlist(&self, owner_id: &str, name: &str, tracks: Vec<SpotifyApiTrack>) -> String {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = format!("pl{}", state.next_id);
        let uris = tracks.iter().map(|t| t.uri.clone()).collect();
        for t in tracks {
            state.catalog.insert(t.uri.clone(), t);
        }
        state.playlists.push(FakePlaylist {
            id: id.clone(),
            name: name.into(),
            owner_id: owner_id.into(),
            public: true,
            uris,
        });
        id
    }

    pub fn playlist(&self, id: &str) -> FakePlaylist {
        let state = self.state.lock().unwrap();
        state
            .playlists
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .unwrap_or_else(|| panic!("no playlist with id {id}"))
    }

    pub fn playlist_count(&self) -> usize {
        self.state.lock().unwrap().playlists.len()
    }

    pub fn add_requests(&self) -> usize {
        self.state.lock().unwrap().add_requests
    }

    /// Number of requests that modified the catalog in any way.
    pub fn write_requests(&self) -> usize {
        let state = self.state.lock().unwrap();
        state.create_requests + state.add_requests + state.remove_requests
    }
}

#[async_trait::async_trait]
impl SpotifyClient for FakeSpotify {
    async fn current_user(&self) -> Result<SpotifyApiUser> {
        Ok(SpotifyApiUser {
            id: self.user_id.clone(),
            display_name: None,
        })
    }

    async fn user_playlists(&self, _user_id: &str) -> Result<Vec<SpotifyApiPlaylist>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .playlists
            .iter()
            .map(|p| SpotifyApiPlaylist {
                id: p.id.clone(),
                name: p.name.clone(),
                owner_id: p.owner_id.clone(),
            })
            .collect())
    }

    async fn playlist_tracks(&self, playlist_id: &str) -> Result<Vec<SpotifyApiTrack>> {
        let state = self.state.lock().unwrap();
        let playlist = state
            .playlists
            .iter()
            .find(|p| p.id == playlist_id)
            .ok_or_eyre("404 Not Found")?;
        Ok(playlist
            .uris
            .iter()
            .map(|uri| {
                state.catalog.get(uri).cloned().unwrap_or_else(|| SpotifyApiTrack {
                    uri: uri.clone(),
                    name: String::new(),
                    is_local: false,
                })
            })
            .collect())
    }

    async fn create_playlist(
        &self,
        user_id: &str,
        name: &str,
        public: bool,
    ) -> Result<SpotifyApiPlaylist> {
        let mut state = self.state.lock().unwrap();
        state.create_requests += 1;
        state.next_id += 1;
        let playlist = FakePlaylist {
            id: format!("pl{}", state.next_id),
            name: name.into(),
            owner_id: user_id.into(),
            public,
            uris: Vec::new(),
        };
        let created = SpotifyApiPlaylist {
            id: playlist.id.clone(),
            name: playlist.name.clone(),
            owner_id: playlist.owner_id.clone(),
        };
        state.playlists.push(playlist);
        Ok(created)
    }

    async fn add_tracks(&self, playlist_id: &str, uris: &[String]) -> Result<()> {
        ensure!(
            uris.len() <= MAX_TRACKS_PER_REQUEST,
            "400 Bad Request: too many tracks"
        );
        ensure!(
            !uris.iter().any(|uri| uri.starts_with("spotify:local:")),
            "400 Bad Request: local files cannot be added"
        );
        let mut state = self.state.lock().unwrap();
        state.add_requests += 1;
        let playlist = state
            .playlists
            .iter_mut()
            .find(|p| p.id == playlist_id)
            .ok_or_eyre("404 Not Found")?;
        playlist.uris.extend(uris.iter().cloned());
        Ok(())
    }

    async fn remove_tracks(&self, playlist_id: &str, uris: &[String]) -> Result<()> {
        ensure!(
            uris.len() <= MAX_TRACKS_PER_REQUEST,
            "400 Bad Request: too many tracks"
        );
        ensure!(
            !uris.iter().any(|uri| uri.starts_with("spotify:local:")),
            "400 Bad Request: local files cannot be removed"
        );
        let mut state = self.state.lock().unwrap();
        state.remove_requests += 1;
        let playlist = state
            .playlists
            .iter_mut()
            .find(|p| p.id == playlist_id)
            .ok_or_eyre("404 Not Found")?;
        playlist.uris.retain(|uri| !uris.contains(uri));
        Ok(())
    }
}
