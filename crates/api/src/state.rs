use std::sync::Arc;

use folio_store::{AssetStore, PortfolioRepository, ProjectService};

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Server configuration (auth gate, upload staging, storage paths).
    pub config: Arc<ServerConfig>,
    /// Project operations over the portfolio document and image tree.
    pub projects: Arc<ProjectService>,
}

impl AppState {
    /// Wire the project service to the configured storage locations.
    pub fn new(config: ServerConfig) -> Self {
        let projects = ProjectService::new(
            AssetStore::new(&config.storage.images_dir),
            PortfolioRepository::new(&config.storage.portfolio_path),
        );
        Self {
            config: Arc::new(config),
            projects: Arc::new(projects),
        }
    }
}
