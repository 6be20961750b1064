use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use tracing::warn;

use crate::errors::CoreResult;
use crate::geo::{project_markers, LayerSet, MapMarker};
use crate::impact::{self, Achievement, RECENT_ACTIONS_LIMIT};
use crate::models::{CommunityReport, EnvironmentalRecord, Prediction, UserAction, UserProfile};
use crate::reports::{self, NewReport};
use crate::store::{decode_rows, Collection, Query, RecordStore, SortOrder};
use crate::trends::{build_snapshot, AnalyticsSnapshot, ENV_FETCH_LIMIT};

/// Pull-based aggregation core behind the dashboard views. Holds no state
/// of its own: every operation reads through to the record store, and list
/// views re-fetch full collections after mutations rather than patching
/// local state.
#[derive(Clone)]
pub struct DashboardEngine {
    store: Arc<dyn RecordStore>,
}

/// Everything the per-user impact view needs in one read.
#[derive(Debug, Clone, Serialize)]
pub struct UserDashboard {
    pub profile: UserProfile,
    /// Recomputed from the ledger on every read; never the stored cache.
    pub impact_score: u64,
    pub recent_actions: Vec<UserAction>,
    pub achievements: Vec<Achievement>,
}

impl DashboardEngine {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// The most recent environmental records, capped at the fetch limit.
    /// Read failures degrade to an empty sample.
    async fn env_sample(&self) -> Vec<EnvironmentalRecord> {
        match self
            .store
            .select(
                Collection::EnvironmentalData,
                Query::new()
                    .order_by("recorded_at", SortOrder::Descending)
                    .limit(ENV_FETCH_LIMIT),
            )
            .await
        {
            Ok(rows) => decode_rows(Collection::EnvironmentalData, rows),
            Err(err) => {
                warn!(%err, "environmental data fetch failed, degrading to empty sample");
                Vec::new()
            }
        }
    }

    async fn collection_count(&self, collection: Collection) -> u64 {
        match self.store.select(collection, Query::new()).await {
            Ok(rows) => rows.len() as u64,
            Err(err) => {
                warn!(collection = collection.as_str(), %err, "count fetch failed, reporting zero");
                0
            }
        }
    }

    pub async fn map_markers(&self, layers: &LayerSet) -> Vec<MapMarker> {
        let records = self.env_sample().await;
        project_markers(&records, layers)
    }

    pub async fn analytics(&self) -> AnalyticsSnapshot {
        self.analytics_at(Utc::now().date_naive()).await
    }

    /// Same as [`analytics`](Self::analytics) with an explicit trend-window
    /// end date.
    pub async fn analytics_at(&self, today: NaiveDate) -> AnalyticsSnapshot {
        let records = self.env_sample().await;
        let report_count = self.collection_count(Collection::CommunityReports).await;
        let prediction_count = self.collection_count(Collection::Predictions).await;
        build_snapshot(&records, report_count, prediction_count, today)
    }

    pub async fn list_reports(&self) -> Vec<CommunityReport> {
        reports::list(self.store.as_ref()).await
    }

    pub async fn submit_report(&self, new: NewReport) -> CoreResult<CommunityReport> {
        reports::submit(self.store.as_ref(), new).await
    }

    /// Upvotes a report, then re-fetches the full list so callers always
    /// see store-confirmed state rather than an optimistic local patch.
    pub async fn upvote_report(&self, report_id: &str) -> CoreResult<Vec<CommunityReport>> {
        reports::upvote(self.store.as_ref(), report_id).await?;
        Ok(reports::list(self.store.as_ref()).await)
    }

    pub async fn list_predictions(&self) -> Vec<Prediction> {
        match self
            .store
            .select(
                Collection::Predictions,
                Query::new().order_by("created_at", SortOrder::Descending),
            )
            .await
        {
            Ok(rows) => decode_rows(Collection::Predictions, rows),
            Err(err) => {
                warn!(%err, "prediction fetch failed, degrading to empty list");
                Vec::new()
            }
        }
    }

    /// Loads the per-user impact view, creating the profile lazily on first
    /// access. The score and achievements are evaluated against the full
    /// ledger; only the activity feed is truncated.
    pub async fn user_dashboard(&self, user_id: &str) -> CoreResult<UserDashboard> {
        let profile = impact::ensure_profile(self.store.as_ref(), user_id).await?;
        let ledger = match impact::load_ledger(self.store.as_ref(), user_id).await {
            Ok(ledger) => ledger,
            Err(err) => {
                warn!(user_id, %err, "action ledger fetch failed, degrading to empty history");
                Vec::new()
            }
        };

        let impact_score = impact::score(&ledger);
        let achievements = impact::evaluate_achievements(&ledger, &profile);
        let recent_actions = ledger.into_iter().take(RECENT_ACTIONS_LIMIT).collect();

        Ok(UserDashboard {
            profile,
            impact_score,
            recent_actions,
            achievements,
        })
    }

    pub async fn reconcile_impact_score(&self, user_id: &str) -> CoreResult<u64> {
        impact::reconcile_score(self.store.as_ref(), user_id).await
    }
}
