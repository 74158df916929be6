//! Playlist selection and the sequential fetch, reorder, write-back pipeline.

pub mod coordinator;
pub mod playlist;
pub mod store;

pub use coordinator::*;
pub use playlist::*;
pub use store::*;
