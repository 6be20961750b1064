//! Aggregation and state-management core for an environmental monitoring
//! dashboard.
//!
//! The crate turns raw geotagged records into the data every dashboard view
//! needs: map layers keyed by severity and category, rolling 7-day trend
//! statistics, a community-report lifecycle with moderation state and
//! upvotes, and a gamified impact-scoring and achievement evaluator. All
//! reads and writes go through the [`store::RecordStore`] seam; the
//! presentation layer consuming [`engine::DashboardEngine`] lives outside
//! this crate.

pub mod analyst;
pub mod engine;
pub mod errors;
pub mod geo;
pub mod impact;
pub mod models;
pub mod reports;
pub mod store;
pub mod trends;

pub use engine::{DashboardEngine, UserDashboard};
pub use errors::{CoreError, CoreResult};
pub use geo::{LayerSet, MapMarker};
pub use models::{
    CommunityReport, EnvironmentalRecord, Prediction, ReportStatus, ReportType, Severity,
    UserAction, UserProfile, UserRole,
};
pub use store::{Collection, MemoryStore, Query, RecordStore, SqliteStore};

/// Installs a JSON-formatted tracing subscriber honoring `RUST_LOG`.
/// Intended for binaries and integration tests embedding the engine.
pub fn init_tracing() -> Result<(), String> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .json()
        .try_init()
        .map_err(|error| error.to_string())
}
