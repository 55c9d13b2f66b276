pub mod auth;
pub mod cli;
pub mod config;
pub mod entity;
pub mod error;
pub mod repository;
pub mod server;
pub mod storage;
pub mod tracker;

pub use auth::AuthState;
pub use error::{Result, TrackerError};
pub use repository::{NoteRepository, Outcome};
pub use tracker::TrackerController;
