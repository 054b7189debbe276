//! Minimal Spotify Web API bindings: OAuth, token persistence and the playlist endpoints.
pub mod auth;
pub mod client;
pub mod token_cache;
pub mod types;
