use std::collections::HashSet;

use crate::error::RemoverError;
use crate::ports::spotify::{
    MAX_TRACKS_PER_REQUEST, SpotifyApiPlaylist, SpotifyApiTrack, SpotifyClient,
};

/// How to pick a destination playlist when several of the user's playlists share its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicateNamePolicy {
    /// Use the first playlist returned by Spotify.
    #[default]
    FirstMatch,
    /// Fail with [`RemoverError::AmbiguousDestinationName`].
    Reject,
}

/// Result of reconciling the destination playlist.
#[derive(Debug, Clone)]
pub struct ReconcileResult {
    pub playlist: SpotifyApiPlaylist,
    pub created: bool,
    pub purged: usize,
    pub added: usize,
}

pub struct PlaylistReconciler<'a, C: SpotifyClient> {
    client: &'a C,
    duplicate_policy: DuplicateNamePolicy,
}

impl<'a, C: SpotifyClient> PlaylistReconciler<'a, C> {
    pub fn new(client: &'a C, duplicate_policy: DuplicateNamePolicy) -> Self {
        Self {
            client,
            duplicate_policy,
        }
    }

    /// Finds or creates the playlist named `destination_name`, optionally empties it,
    /// then appends `tracks` in order.
    ///
    /// The destination is resolved before anything is written. When purging, every
    /// removal finishes before the first append.
    pub async fn reconcile(
        &self,
        destination_name: &str,
        tracks: &[SpotifyApiTrack],
        purge_existing: bool,
    ) -> Result<ReconcileResult, RemoverError> {
        let user = self
            .client
            .current_user()
            .await
            .map_err(|e| RemoverError::remote("fetch the current user", e))?;
        log::debug!(
            "Reconciling as {} ({})",
            user.display_name.as_deref().unwrap_or("unknown"),
            user.id
        );

        let existing = self.find_destination(&user.id, destination_name).await?;

        let (playlist, created, purged) = match existing {
            Some(playlist) => {
                log::info!(
                    "Found existing playlist: '{}' (ID: {})",
                    playlist.name,
                    playlist.id
                );
                let purged = if purge_existing {
                    self.purge(&playlist.id).await?
                } else {
                    0
                };
                (playlist, false, purged)
            }
            None => {
                log::info!("Creating new private playlist: '{}'", destination_name);
                let playlist = self
                    .client
                    .create_playlist(&user.id, destination_name, false)
                    .await
                    .map_err(|e| RemoverError::remote("create the destination playlist", e))?;
                (playlist, true, 0)
            }
        };

        if !created && !purge_existing {
            log::warn!(
                "Appending to '{}' without removing its previous tracks, repeated runs will add duplicates",
                playlist.name
            );
        }

        let uris: Vec<String> = tracks.iter().map(|t| t.uri.clone()).collect();
        let added = self.append(&playlist.id, &uris).await?;

        log::info!(
            "Reconciled playlist '{}': {} purged, {} added",
            playlist.name,
            purged,
            added
        );

        Ok(ReconcileResult {
            playlist,
            created,
            purged,
            added,
        })
    }

    async fn find_destination(
        &self,
        user_id: &str,
        destination_name: &str,
    ) -> Result<Option<SpotifyApiPlaylist>, RemoverError> {
        let playlists = self
            .client
            .user_playlists(user_id)
            .await
            .map_err(|e| RemoverError::remote("list the current user's playlists", e))?;

        let mut matches: Vec<SpotifyApiPlaylist> = playlists
            .into_iter()
            .filter(|p| p.owner_id == user_id && p.name == destination_name)
            .collect();

        if matches.len() > 1 {
            match self.duplicate_policy {
                DuplicateNamePolicy::Reject => {
                    return Err(RemoverError::AmbiguousDestinationName {
                        name: destination_name.to_string(),
                        count: matches.len(),
                    });
                }
                DuplicateNamePolicy::FirstMatch => {
                    log::warn!(
                        "Found {} playlists named '{}', using the first one",
                        matches.len(),
                        destination_name
                    );
                }
            }
        }

        if matches.is_empty() {
            Ok(None)
        } else {
            Ok(Some(matches.swap_remove(0)))
        }
    }

    /// Removes every entry currently in the playlist. Returns the number of distinct
    /// entries removed.
    ///
    /// Local files cannot be removed through the API, so a playlist holding any is
    /// rejected before the first removal.
    async fn purge(&self, playlist_id: &str) -> Result<usize, RemoverError> {
        let current = self
            .client
            .playlist_tracks(playlist_id)
            .await
            .map_err(|e| RemoverError::remote("fetch the destination playlist's tracks", e))?;

        let local_files = current.iter().filter(|track| track.is_local).count();
        if local_files > 0 {
            return Err(RemoverError::LocalFilesInDestination {
                playlist_id: playlist_id.to_string(),
                count: local_files,
            });
        }

        // Removal deletes all occurrences, so each URI only needs to be sent once.
        let mut seen = HashSet::new();
        let uris: Vec<String> = current
            .into_iter()
            .map(|track| track.uri)
            .filter(|uri| seen.insert(uri.clone()))
            .collect();

        let total = uris.len();
        let mut removed = 0;
        for batch in uris.chunks(MAX_TRACKS_PER_REQUEST) {
            if let Err(e) = self.client.remove_tracks(playlist_id, batch).await {
                return Err(if removed == 0 {
                    RemoverError::remote("remove tracks from the destination playlist", e)
                } else {
                    RemoverError::PartialPurge {
                        playlist_id: playlist_id.to_string(),
                        removed,
                        total,
                        source: e.into(),
                    }
                });
            }
            removed += batch.len();
            log::debug!("Removed {}/{} tracks from {}", removed, total, playlist_id);
        }

        Ok(removed)
    }

    async fn append(&self, playlist_id: &str, uris: &[String]) -> Result<usize, RemoverError> {
        let total = uris.len();
        let mut added = 0;
        for batch in uris.chunks(MAX_TRACKS_PER_REQUEST) {
            if let Err(e) = self.client.add_tracks(playlist_id, batch).await {
                return Err(if added == 0 {
                    RemoverError::remote("add tracks to the destination playlist", e)
                } else {
                    RemoverError::PartialAppend {
                        playlist_id: playlist_id.to_string(),
                        added,
                        total,
                        source: e.into(),
                    }
                });
            }
            added += batch.len();
            log::debug!("Added {}/{} tracks to {}", added, total, playlist_id);
        }

        Ok(added)
    }
}
