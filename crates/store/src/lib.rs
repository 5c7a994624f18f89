//! Filesystem persistence for the portfolio service.
//!
//! - [`assets`] -- per-project image directories.
//! - [`portfolio`] -- the single JSON document.
//! - [`reconciler`] -- applies image updates to the asset store.
//! - [`service`] -- create / update / delete orchestration.

pub mod assets;
pub mod error;
pub mod portfolio;
pub mod reconciler;
pub mod service;

pub use assets::AssetStore;
pub use error::{PortfolioError, StoreError};
pub use portfolio::PortfolioRepository;
pub use reconciler::ImageReconciler;
pub use service::ProjectService;
