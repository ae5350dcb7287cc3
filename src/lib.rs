//! Bibliotheca Library Catalog
//!
//! An in-memory library catalog kept in a binary search tree ordered by
//! registration sequence, with a loan ledger computing overdue fines,
//! served over a REST JSON API.

use std::sync::Arc;

use tokio::sync::Mutex;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;
pub mod tree;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers.
///
/// The library sits behind one lock: each request runs its operation,
/// persistence included, before the next one starts.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub library: Arc<Mutex<services::Library>>,
}

impl AppState {
    pub fn new(config: AppConfig, library: services::Library) -> Self {
        Self {
            config: Arc::new(config),
            library: Arc::new(Mutex::new(library)),
        }
    }
}
