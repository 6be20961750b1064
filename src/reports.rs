use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use crate::errors::{CoreError, CoreResult};
use crate::geo::GeoPoint;
use crate::models::{ActionType, CommunityReport, ReportStatus, ReportType, Severity};
use crate::store::{decode_rows, Collection, Query, RecordStore, SortOrder};

/// Ledger credit for submitting a community report.
pub const REPORT_IMPACT_SCORE: u32 = 10;

#[derive(Debug, Clone, Deserialize)]
pub struct NewReport {
    pub user_id: String,
    pub report_type: ReportType,
    pub severity: Severity,
    pub description: String,
    pub lat: f64,
    pub lng: f64,
}

/// Submits a community report and credits the submitting user.
///
/// Two-phase, best-effort: the report row is inserted first, then a
/// `report_submitted` ledger action is appended. The two writes are not
/// atomic. If the action append fails the report still exists and no
/// rollback is attempted; the failure is only logged.
pub async fn submit(store: &dyn RecordStore, new: NewReport) -> CoreResult<CommunityReport> {
    let location = GeoPoint::new(new.lat, new.lng).to_geojson();
    let row = json!({
        "user_id": new.user_id,
        "report_type": new.report_type,
        "location": location,
        "description": new.description,
        "photo_urls": [],
        "severity": new.severity,
        "status": ReportStatus::Pending,
        "verified_by_ai": false,
        "upvotes": 0,
    });

    let stored = store
        .insert(Collection::CommunityReports, row)
        .await
        .map_err(|err| CoreError::StoreWrite(err.to_string()))?;
    let report: CommunityReport = serde_json::from_value(stored)?;

    let action = json!({
        "user_id": report.user_id,
        "action_type": ActionType::ReportSubmitted,
        "action_details": { "report_type": report.report_type },
        "impact_score": REPORT_IMPACT_SCORE,
        "location": report.location,
    });
    if let Err(err) = store.insert(Collection::UserActions, action).await {
        warn!(report_id = %report.id, %err, "report stored but ledger action append failed");
    }

    Ok(report)
}

/// Increments a report's upvote counter by one relative to the value read
/// just before the write. Last-write-wins: two callers observing the same
/// pre-increment value will lose one of the votes; the race is a known
/// limitation of the store contract, not masked here.
pub async fn upvote(store: &dyn RecordStore, report_id: &str) -> CoreResult<()> {
    let rows = store
        .select(
            Collection::CommunityReports,
            Query::new().filter("id", json!(report_id)),
        )
        .await
        .map_err(|err| CoreError::StoreRead(err.to_string()))?;

    let current = rows
        .first()
        .ok_or_else(|| CoreError::NotFound(format!("community report {report_id}")))?;
    let upvotes = current
        .get("upvotes")
        .and_then(serde_json::Value::as_u64)
        .unwrap_or(0);

    store
        .update(
            Collection::CommunityReports,
            report_id,
            json!({ "upvotes": upvotes + 1 }),
        )
        .await
        .map_err(|err| CoreError::StoreWrite(err.to_string()))?;

    Ok(())
}

/// Lists reports newest first. Store read failures degrade to an empty
/// list so the view renders "no data" instead of crashing.
pub async fn list(store: &dyn RecordStore) -> Vec<CommunityReport> {
    match store
        .select(
            Collection::CommunityReports,
            Query::new().order_by("created_at", SortOrder::Descending),
        )
        .await
    {
        Ok(rows) => decode_rows(Collection::CommunityReports, rows),
        Err(err) => {
            warn!(%err, "community report fetch failed, degrading to empty list");
            Vec::new()
        }
    }
}
