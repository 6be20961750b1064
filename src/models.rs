use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Ordered urgency classification shared by records, reports, and
/// predictions. Ordering is `low < medium < high < critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }

    pub fn parse(label: &str) -> Option<Self> {
        match label {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            "critical" => Some(Self::Critical),
            _ => None,
        }
    }

    /// Render color for map markers and severity badges.
    pub fn color(self) -> &'static str {
        match self {
            Self::Critical => "#ef4444",
            Self::High => "#f59e0b",
            Self::Medium => "#eab308",
            Self::Low => "#10b981",
        }
    }
}

/// Neutral fallback used when a severity label is missing or unrecognized.
pub const SEVERITY_FALLBACK_COLOR: &str = "#6b7280";

/// Total severity-to-color lookup over free-form labels. Unrecognized
/// labels resolve to the neutral fallback rather than an error.
pub fn severity_color(label: &str) -> &'static str {
    Severity::parse(label).map_or(SEVERITY_FALLBACK_COLOR, Severity::color)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportType {
    Pollution,
    Deforestation,
    Wildlife,
    Water,
    Other,
}

impl ReportType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pollution => "pollution",
            Self::Deforestation => "deforestation",
            Self::Wildlife => "wildlife",
            Self::Water => "water",
            Self::Other => "other",
        }
    }
}

/// Moderation state machine for community reports:
/// `pending -> investigating -> verified | resolved`. Unknown or missing
/// values always collapse to `pending`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    #[default]
    Pending,
    Investigating,
    Verified,
    Resolved,
}

impl<'de> Deserialize<'de> for ReportStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let label = String::deserialize(deserializer)?;
        Ok(Self::parse_or_pending(&label))
    }
}

impl ReportStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Investigating => "investigating",
            Self::Verified => "verified",
            Self::Resolved => "resolved",
        }
    }

    /// Total parser: anything outside the four lifecycle states is `pending`.
    pub fn parse_or_pending(label: &str) -> Self {
        match label {
            "investigating" => Self::Investigating,
            "verified" => Self::Verified,
            "resolved" => Self::Resolved,
            _ => Self::Pending,
        }
    }

    /// Display affordance for the status badge.
    pub fn style(self) -> StatusStyle {
        match self {
            Self::Pending => StatusStyle {
                icon: "clock",
                color_class: "bg-yellow-500/20 text-yellow-300 border-yellow-500/30",
            },
            Self::Investigating => StatusStyle {
                icon: "alert-circle",
                color_class: "bg-blue-500/20 text-blue-300 border-blue-500/30",
            },
            Self::Verified => StatusStyle {
                icon: "check-circle",
                color_class: "bg-green-500/20 text-green-300 border-green-500/30",
            },
            Self::Resolved => StatusStyle {
                icon: "check-circle",
                color_class: "bg-gray-500/20 text-gray-300 border-gray-500/30",
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusStyle {
    pub icon: &'static str,
    pub color_class: &'static str,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Researcher,
    Activist,
    PolicyMaker,
    #[default]
    Citizen,
}

impl UserRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Researcher => "researcher",
            Self::Activist => "activist",
            Self::PolicyMaker => "policy_maker",
            Self::Citizen => "citizen",
        }
    }

    /// Total parser: unrecognized roles resolve to `citizen`.
    pub fn parse_or_citizen(label: &str) -> Self {
        match label {
            "researcher" => Self::Researcher,
            "activist" => Self::Activist,
            "policy_maker" => Self::PolicyMaker,
            _ => Self::Citizen,
        }
    }
}

impl<'de> Deserialize<'de> for UserRole {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let label = String::deserialize(deserializer)?;
        Ok(Self::parse_or_citizen(&label))
    }
}

/// Kinds of ledger entries. The set is open at the store level; entries
/// written by other producers deserialize as `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    ReportSubmitted,
    DataVerified,
    TreePlanted,
    CleanupAttended,
    Other,
}

impl<'de> Deserialize<'de> for ActionType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let label = String::deserialize(deserializer)?;
        Ok(match label.as_str() {
            "report_submitted" => Self::ReportSubmitted,
            "data_verified" => Self::DataVerified,
            "tree_planted" => Self::TreePlanted,
            "cleanup_attended" => Self::CleanupAttended,
            _ => Self::Other,
        })
    }
}

impl ActionType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ReportSubmitted => "report_submitted",
            Self::DataVerified => "data_verified",
            Self::TreePlanted => "tree_planted",
            Self::CleanupAttended => "cleanup_attended",
            Self::Other => "other",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            Self::ReportSubmitted => "map-pin",
            Self::DataVerified => "award",
            Self::TreePlanted => "activity",
            Self::CleanupAttended => "target",
            Self::Other => "activity",
        }
    }
}

/// Total action-type-to-icon lookup over free-form labels.
pub fn action_icon(label: &str) -> &'static str {
    match label {
        "report_submitted" => ActionType::ReportSubmitted.icon(),
        "data_verified" => ActionType::DataVerified.icon(),
        "tree_planted" => ActionType::TreePlanted.icon(),
        "cleanup_attended" => ActionType::CleanupAttended.icon(),
        _ => ActionType::Other.icon(),
    }
}

/// Sensor, satellite, or model reading. Immutable once ingested.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentalRecord {
    pub id: String,
    pub data_type: String,
    /// Raw GeoJSON Point payload as stored (`{"type":"Point","coordinates":[lng,lat]}`).
    pub location: String,
    pub region_name: String,
    #[serde(default)]
    pub metrics: serde_json::Value,
    /// Free-form severity label as ingested. Rendering goes through the
    /// total [`severity_color`] lookup, so labels outside the known set
    /// still flow through every view with the neutral fallback color.
    pub severity_level: String,
    pub source: String,
    pub confidence_score: f64,
    pub recorded_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommunityReport {
    pub id: String,
    pub user_id: String,
    pub report_type: ReportType,
    pub location: String,
    pub description: String,
    #[serde(default)]
    pub photo_urls: Vec<String>,
    pub severity: Severity,
    #[serde(default)]
    pub status: ReportStatus,
    #[serde(default)]
    pub verified_by_ai: bool,
    #[serde(default)]
    pub ai_analysis: Option<String>,
    #[serde(default)]
    pub upvotes: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    pub id: String,
    pub prediction_type: String,
    pub location: String,
    pub region_name: String,
    pub probability: f64,
    pub predicted_date: NaiveDate,
    pub impact_level: String,
    pub model_used: String,
    pub confidence_score: f64,
    #[serde(default)]
    pub recommendations: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Append-only contribution ledger entry. Never mutated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAction {
    pub id: String,
    pub user_id: String,
    pub action_type: ActionType,
    #[serde(default)]
    pub action_details: serde_json::Value,
    pub impact_score: u32,
    #[serde(default)]
    pub location: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub organization: Option<String>,
    #[serde(default)]
    pub role: UserRole,
    #[serde(default)]
    pub regions_of_interest: Vec<String>,
    #[serde(default)]
    pub notification_preferences: serde_json::Value,
    /// Derived aggregate. Treated as a cache of the action ledger sum; the
    /// engine recomputes the score on every read and only a reconciliation
    /// pass refreshes this field.
    #[serde(default)]
    pub total_impact_score: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::{
        action_icon, severity_color, ReportStatus, Severity, UserRole, SEVERITY_FALLBACK_COLOR,
    };

    #[test]
    fn severity_colors_are_fixed() {
        assert_eq!(severity_color("critical"), "#ef4444");
        assert_eq!(severity_color("high"), "#f59e0b");
        assert_eq!(severity_color("medium"), "#eab308");
        assert_eq!(severity_color("low"), "#10b981");
    }

    #[test]
    fn unknown_severity_falls_back_to_neutral() {
        assert_eq!(severity_color("catastrophic"), SEVERITY_FALLBACK_COLOR);
        assert_eq!(severity_color(""), SEVERITY_FALLBACK_COLOR);
        assert_eq!(severity_color("CRITICAL"), SEVERITY_FALLBACK_COLOR);
    }

    #[test]
    fn severity_orders_by_urgency() {
        assert!(Severity::Critical > Severity::High);
        assert!(Severity::High > Severity::Medium);
        assert!(Severity::Medium > Severity::Low);
    }

    #[test]
    fn unknown_status_is_treated_as_pending() {
        let status = ReportStatus::parse_or_pending("escalated");
        assert_eq!(status, ReportStatus::Pending);
        assert_eq!(status.style().icon, "clock");
        assert_eq!(
            status.style().color_class,
            ReportStatus::Pending.style().color_class
        );
    }

    #[test]
    fn unknown_status_deserializes_as_pending() {
        let status: ReportStatus = serde_json::from_str("\"escalated\"").expect("deserialize");
        assert_eq!(status, ReportStatus::Pending);
    }

    #[test]
    fn terminal_statuses_share_the_check_icon() {
        assert_eq!(ReportStatus::Verified.style().icon, "check-circle");
        assert_eq!(ReportStatus::Resolved.style().icon, "check-circle");
    }

    #[test]
    fn unknown_action_type_gets_default_icon() {
        assert_eq!(action_icon("report_submitted"), "map-pin");
        assert_eq!(action_icon("petition_signed"), "activity");
    }

    #[test]
    fn role_round_trips_through_store_labels() {
        let role: UserRole = serde_json::from_str("\"policy_maker\"").expect("deserialize");
        assert_eq!(role, UserRole::PolicyMaker);
        assert_eq!(
            serde_json::to_string(&role).expect("serialize"),
            "\"policy_maker\""
        );
    }
}
