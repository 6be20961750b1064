use serde::Serialize;
use serde_json::json;

use crate::errors::{CoreError, CoreResult};
use crate::models::{UserAction, UserProfile, UserRole};
use crate::store::{decode_rows, Collection, Query, RecordStore, SortOrder};

/// Ledger entries shown in the recent-activity feed.
pub const RECENT_ACTIONS_LIMIT: usize = 10;

pub const ACTIVE_MONITOR_THRESHOLD: usize = 5;
pub const CHAMPION_SCORE_THRESHOLD: u64 = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Achievement {
    pub name: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub earned: bool,
}

/// Cumulative impact score: the sum over the user's action ledger. Always
/// recomputed from the ledger; the stored profile aggregate is a cache.
pub fn score(actions: &[UserAction]) -> u64 {
    actions
        .iter()
        .map(|action| u64::from(action.impact_score))
        .sum()
}

/// Evaluates the fixed, ordered achievement list against the action
/// history. Pure and side-effect-free; earned flags are never persisted,
/// so unlocking always reflects current ledger state.
pub fn evaluate_achievements(actions: &[UserAction], _profile: &UserProfile) -> Vec<Achievement> {
    let cumulative = score(actions);
    vec![
        Achievement {
            name: "First Report",
            description: "Submitted your first environmental report",
            icon: "map-pin",
            earned: !actions.is_empty(),
        },
        Achievement {
            name: "Active Monitor",
            description: "Submitted 5+ reports",
            icon: "activity",
            earned: actions.len() >= ACTIVE_MONITOR_THRESHOLD,
        },
        Achievement {
            name: "Champion",
            description: "Earned 100+ impact points",
            icon: "award",
            earned: cumulative >= CHAMPION_SCORE_THRESHOLD,
        },
        // No temporal-span check exists yet, so this never unlocks.
        // Pending product clarification on what "active for 7+ days" means.
        Achievement {
            name: "Dedicated",
            description: "Active for 7+ days",
            icon: "calendar",
            earned: false,
        },
    ]
}

/// Fetches the user's profile, creating one lazily (role `citizen`, score
/// zero) on first access.
pub async fn ensure_profile(store: &dyn RecordStore, user_id: &str) -> CoreResult<UserProfile> {
    let rows = store
        .select(
            Collection::UserProfiles,
            Query::new().filter("id", json!(user_id)).limit(1),
        )
        .await
        .map_err(|err| CoreError::StoreRead(err.to_string()))?;

    if let Some(row) = rows.into_iter().next() {
        return Ok(serde_json::from_value(row)?);
    }

    let created = store
        .insert(
            Collection::UserProfiles,
            json!({
                "id": user_id,
                "role": UserRole::Citizen,
                "total_impact_score": 0,
            }),
        )
        .await
        .map_err(|err| CoreError::StoreWrite(err.to_string()))?;
    Ok(serde_json::from_value(created)?)
}

/// Loads the user's full action ledger, newest first. Errors propagate;
/// callers that can degrade decide that themselves.
pub async fn load_ledger(store: &dyn RecordStore, user_id: &str) -> CoreResult<Vec<UserAction>> {
    let rows = store
        .select(
            Collection::UserActions,
            Query::new()
                .filter("user_id", json!(user_id))
                .order_by("created_at", SortOrder::Descending),
        )
        .await
        .map_err(|err| CoreError::StoreRead(err.to_string()))?;
    Ok(decode_rows(Collection::UserActions, rows))
}

/// Reconciliation pass: recomputes the score from the full ledger and
/// refreshes the stored `total_impact_score` cache. Never writes when the
/// ledger read fails.
pub async fn reconcile_score(store: &dyn RecordStore, user_id: &str) -> CoreResult<u64> {
    let profile = ensure_profile(store, user_id).await?;
    let ledger = load_ledger(store, user_id).await?;
    let total = score(&ledger);

    if profile.total_impact_score != total {
        store
            .update(
                Collection::UserProfiles,
                user_id,
                json!({ "total_impact_score": total }),
            )
            .await
            .map_err(|err| CoreError::StoreWrite(err.to_string()))?;
    }

    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::{
        ensure_profile, evaluate_achievements, load_ledger, reconcile_score, score,
        CHAMPION_SCORE_THRESHOLD,
    };
    use crate::models::{ActionType, UserAction, UserProfile, UserRole};
    use crate::store::{Collection, MemoryStore, Query, RecordStore};
    use chrono::Utc;
    use serde_json::json;

    fn action(user_id: &str, impact_score: u32) -> UserAction {
        UserAction {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            action_type: ActionType::ReportSubmitted,
            action_details: serde_json::Value::Null,
            impact_score,
            location: None,
            created_at: Utc::now(),
        }
    }

    fn profile(user_id: &str) -> UserProfile {
        UserProfile {
            id: user_id.to_string(),
            full_name: None,
            organization: None,
            role: UserRole::Citizen,
            regions_of_interest: Vec::new(),
            notification_preferences: serde_json::Value::Null,
            total_impact_score: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn score_sums_the_ledger() {
        let actions = vec![action("u1", 10), action("u1", 25), action("u1", 0)];
        assert_eq!(score(&actions), 35);
        assert_eq!(score(&[]), 0);
    }

    #[test]
    fn first_report_unlocks_on_any_action() {
        let profile = profile("u1");
        let none = evaluate_achievements(&[], &profile);
        assert!(!none[0].earned);

        let one = evaluate_achievements(&[action("u1", 10)], &profile);
        assert!(one[0].earned);
    }

    #[test]
    fn active_monitor_needs_five_actions() {
        let profile = profile("u1");
        let four: Vec<_> = (0..4).map(|_| action("u1", 10)).collect();
        assert!(!evaluate_achievements(&four, &profile)[1].earned);

        let five: Vec<_> = (0..5).map(|_| action("u1", 10)).collect();
        assert!(evaluate_achievements(&five, &profile)[1].earned);
    }

    #[test]
    fn champion_flips_exactly_at_one_hundred() {
        let profile = profile("u1");
        let almost = vec![action("u1", 89), action("u1", 10)];
        assert_eq!(score(&almost), CHAMPION_SCORE_THRESHOLD - 1);
        assert!(!evaluate_achievements(&almost, &profile)[2].earned);

        let exact = vec![action("u1", 90), action("u1", 10)];
        assert!(evaluate_achievements(&exact, &profile)[2].earned);
    }

    #[test]
    fn dedicated_never_unlocks() {
        let profile = profile("u1");
        let many: Vec<_> = (0..50).map(|_| action("u1", 10)).collect();
        let achievements = evaluate_achievements(&many, &profile);
        assert_eq!(achievements[3].name, "Dedicated");
        assert!(!achievements[3].earned);
    }

    #[tokio::test]
    async fn ensure_profile_creates_citizen_with_zero_score() {
        let store = MemoryStore::new();
        let created = ensure_profile(&store, "u1").await.expect("ensure");
        assert_eq!(created.id, "u1");
        assert_eq!(created.role, UserRole::Citizen);
        assert_eq!(created.total_impact_score, 0);

        // Second access reads the same row instead of inserting again.
        let again = ensure_profile(&store, "u1").await.expect("ensure");
        assert_eq!(again.id, "u1");
        let rows = store
            .select(Collection::UserProfiles, Query::new())
            .await
            .expect("select");
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn reconcile_refreshes_the_stored_cache() {
        let store = MemoryStore::new();
        for points in [10u32, 15, 20] {
            store
                .insert(
                    Collection::UserActions,
                    json!({
                        "user_id": "u1",
                        "action_type": "tree_planted",
                        "impact_score": points,
                    }),
                )
                .await
                .expect("insert action");
        }

        let total = reconcile_score(&store, "u1").await.expect("reconcile");
        assert_eq!(total, 45);

        let rows = store
            .select(
                Collection::UserProfiles,
                Query::new().filter("id", json!("u1")),
            )
            .await
            .expect("select");
        assert_eq!(rows[0]["total_impact_score"], json!(45));
    }

    #[tokio::test]
    async fn ledger_orders_newest_first() {
        let store = MemoryStore::new();
        for (id, at) in [("a", "2026-08-20T00:00:00Z"), ("b", "2026-08-22T00:00:00Z")] {
            store
                .insert(
                    Collection::UserActions,
                    json!({
                        "id": id,
                        "user_id": "u1",
                        "action_type": "data_verified",
                        "impact_score": 5,
                        "created_at": at,
                    }),
                )
                .await
                .expect("insert");
        }

        let ledger = load_ledger(&store, "u1").await.expect("ledger");
        let ids: Vec<&str> = ledger.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }
}
