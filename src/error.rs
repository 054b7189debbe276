pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors produced while filtering a playlist and republishing the result.
///
/// `PartialPurge` and `PartialAppend` mean the destination playlist was already
/// modified when the failure happened, so it may now hold a mix of old and new
/// tracks. Every other variant is raised before anything was written, or on
/// the very first write.
#[derive(Debug, thiserror::Error)]
pub enum RemoverError {
    #[error("Could not find a playlist named '{name}'. Please check the configured name")]
    SourcePlaylistNotFound { name: String },

    #[error("Spotify request failed while trying to {operation}: {source}")]
    RemoteOperationFailed {
        operation: &'static str,
        #[source]
        source: BoxError,
    },

    #[error("Found {count} playlists named '{name}', refusing to pick one")]
    AmbiguousDestinationName { name: String, count: usize },

    #[error(
        "Playlist {playlist_id} holds {count} local files, which Spotify does not let us remove. Remove them in the Spotify app and run again"
    )]
    LocalFilesInDestination { playlist_id: String, count: usize },

    #[error(
        "Purge of playlist {playlist_id} stopped after removing {removed} of {total} tracks: {source}"
    )]
    PartialPurge {
        playlist_id: String,
        removed: usize,
        total: usize,
        #[source]
        source: BoxError,
    },

    #[error(
        "Append to playlist {playlist_id} stopped after adding {added} of {total} tracks: {source}"
    )]
    PartialAppend {
        playlist_id: String,
        added: usize,
        total: usize,
        #[source]
        source: BoxError,
    },
}

impl RemoverError {
    pub(crate) fn remote(operation: &'static str, source: color_eyre::Report) -> Self {
        Self::RemoteOperationFailed {
            operation,
            source: source.into(),
        }
    }

    /// True when the destination playlist may have been left half-written.
    pub fn is_partial_write(&self) -> bool {
        matches!(self, Self::PartialPurge { .. } | Self::PartialAppend { .. })
    }
}
