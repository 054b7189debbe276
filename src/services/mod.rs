pub mod filter;
pub mod pipeline;
pub mod reconcile;
pub mod spotify;
