#![warn(clippy::all, missing_docs)]

//! Core logic for cinefav, a terminal movie browser.
//!
//! This crate hosts the movie models, configuration handling, the
//! favorites store with its pluggable storage and change transports,
//! the subscription adapter used by UI screens, and the metadata client.

pub mod config;
pub mod favorites;
pub mod models;
pub mod storage;
pub mod sync;
pub mod tmdb;
pub mod view;

pub use config::AppConfig;
pub use favorites::{FavoritesStore, FAVORITES_KEY};
pub use models::{FavoriteInput, FavoriteMovie, MovieId, MovieSummary, SearchPage};
pub use storage::{FileBackend, MemoryBackend, StorageBackend};
pub use sync::{ChangeTransport, FileWatchTransport, LocalBus, Subscription};
pub use tmdb::TmdbClient;
pub use view::FavoritesView;
