use color_eyre::eyre::Result;

use crate::config::RemoverConfig;
use crate::error::RemoverError;
use crate::ports::spotify::{SpotifyApiPlaylist, SpotifyApiTrack, SpotifyClient};
use crate::services::filter::KeywordFilter;
use crate::services::reconcile::{DuplicateNamePolicy, PlaylistReconciler};

/// Outcome of a full removal run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovalSummary {
    pub total_fetched: usize,
    pub total_kept: usize,
    pub total_removed: usize,
    pub total_skipped: usize,
    pub destination_playlist_id: String,
    pub created: bool,
    pub purged: usize,
}

/// Outcome of filtering the source playlist without writing anything.
#[derive(Debug, Clone)]
pub struct FilterPreview {
    pub source: SpotifyApiPlaylist,
    pub kept: Vec<SpotifyApiTrack>,
    pub removed: Vec<SpotifyApiTrack>,
    /// Local files that pass the filter but cannot be added through the API.
    pub skipped: Vec<SpotifyApiTrack>,
}

/// Fetches a playlist, drops tracks with banned keywords and publishes the rest.
pub struct RemovalPipeline<C: SpotifyClient> {
    client: C,
    username: String,
    filter: KeywordFilter,
    duplicate_policy: DuplicateNamePolicy,
}

impl<C: SpotifyClient> RemovalPipeline<C> {
    pub fn new(config: &RemoverConfig, client: C) -> Result<Self> {
        let duplicate_policy = if config.strict_destination {
            DuplicateNamePolicy::Reject
        } else {
            DuplicateNamePolicy::FirstMatch
        };

        Ok(Self {
            client,
            username: config.username.clone(),
            filter: KeywordFilter::new(&config.banned_keywords)?,
            duplicate_policy,
        })
    }

    pub async fn run(
        &self,
        source_playlist_name: &str,
        destination_playlist_name: &str,
        purge_existing: bool,
    ) -> Result<RemovalSummary, RemoverError> {
        let preview = self.preview(source_playlist_name).await?;
        let total_fetched = preview.kept.len() + preview.removed.len() + preview.skipped.len();

        let reconciled = PlaylistReconciler::new(&self.client, self.duplicate_policy)
            .reconcile(destination_playlist_name, &preview.kept, purge_existing)
            .await?;

        debug_assert_eq!(reconciled.added, preview.kept.len());

        let summary = RemovalSummary {
            total_fetched,
            total_kept: preview.kept.len(),
            total_removed: preview.removed.len(),
            total_skipped: preview.skipped.len(),
            destination_playlist_id: reconciled.playlist.id,
            created: reconciled.created,
            purged: reconciled.purged,
        };

        log::info!(
            "Copied {} of {} tracks from '{}' to '{}'",
            summary.total_kept,
            summary.total_fetched,
            source_playlist_name,
            destination_playlist_name
        );

        Ok(summary)
    }

    /// Resolves and filters the source playlist. Nothing is written.
    pub async fn preview(&self, source_playlist_name: &str) -> Result<FilterPreview, RemoverError> {
        let source = self.find_source(source_playlist_name).await?;

        let tracks = self
            .client
            .playlist_tracks(&source.id)
            .await
            .map_err(|e| RemoverError::remote("fetch the source playlist's tracks", e))?;
        log::info!("Fetched {} tracks from '{}'", tracks.len(), source.name);

        let (kept, removed) = self.filter.partition(tracks);
        for track in &removed {
            log::debug!("Filtered out '{}' ({})", track.name, track.uri);
        }

        let (skipped, kept): (Vec<_>, Vec<_>) = kept.into_iter().partition(|t| t.is_local);
        for track in &skipped {
            log::warn!("Skipping local file '{}', it cannot be added to a playlist", track.name);
        }

        Ok(FilterPreview {
            source,
            kept,
            removed,
            skipped,
        })
    }

    async fn find_source(&self, name: &str) -> Result<SpotifyApiPlaylist, RemoverError> {
        let playlists = self
            .client
            .user_playlists(&self.username)
            .await
            .map_err(|e| RemoverError::remote("list the user's playlists", e))?;

        playlists
            .into_iter()
            .find(|p| p.name == name)
            .ok_or_else(|| RemoverError::SourcePlaylistNotFound {
                name: name.to_string(),
            })
    }
}
