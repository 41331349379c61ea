//! Industry insight records

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Seconds between an insight's creation and its scheduled refresh (7 days)
pub const REFRESH_INTERVAL_SECS: i64 = 7 * 24 * 60 * 60;

/// Interval between an insight's creation and its `next_update`
pub fn refresh_interval() -> Duration {
    Duration::seconds(REFRESH_INTERVAL_SECS)
}

/// Unique identifier for an insight
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InsightId(String);

impl InsightId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for InsightId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for InsightId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Generator output. Opaque to this crate beyond being a JSON object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InsightContent(serde_json::Map<String, serde_json::Value>);

impl InsightContent {
    pub fn new(fields: serde_json::Map<String, serde_json::Value>) -> Self {
        Self(fields)
    }

    /// Accepts only JSON objects; returns the rejected value otherwise.
    pub fn from_value(value: serde_json::Value) -> Result<Self, serde_json::Value> {
        match value {
            serde_json::Value::Object(map) => Ok(Self(map)),
            other => Err(other),
        }
    }

    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.0.get(key)
    }
}

/// Per-industry enrichment record.
///
/// At most one exists per industry; never modified once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndustryInsight {
    pub id: InsightId,
    pub industry: String,
    pub content: InsightContent,
    pub created_at: DateTime<Utc>,
    /// When the content should be regenerated
    pub next_update: DateTime<Utc>,
}

/// An insight about to be written
#[derive(Debug, Clone)]
pub struct NewInsight {
    pub industry: String,
    pub content: InsightContent,
    pub created_at: DateTime<Utc>,
    pub next_update: DateTime<Utc>,
}

impl NewInsight {
    /// Stamp generated content with its creation time and refresh deadline
    pub fn new(industry: impl Into<String>, content: InsightContent, now: DateTime<Utc>) -> Self {
        Self {
            industry: industry.into(),
            content,
            created_at: now,
            next_update: now + refresh_interval(),
        }
    }

    pub(crate) fn into_insight(self) -> IndustryInsight {
        IndustryInsight {
            id: InsightId::new(),
            industry: self.industry,
            content: self.content,
            created_at: self.created_at,
            next_update: self.next_update,
        }
    }
}

/// Outcome of a create-if-absent write
#[derive(Debug, Clone)]
pub struct InsightWrite {
    /// The record now stored for the industry
    pub insight: IndustryInsight,
    /// False when another writer's record won
    pub created: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_next_update_is_seven_days_out() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let content = InsightContent::from_value(json!({"growthRate": 4.5})).unwrap();
        let draft = NewInsight::new("Healthcare", content, now);

        assert_eq!(draft.created_at, now);
        assert_eq!((draft.next_update - now).num_seconds(), 604_800);
    }

    #[test]
    fn test_content_rejects_non_objects() {
        assert!(InsightContent::from_value(json!([1, 2])).is_err());
        assert!(InsightContent::from_value(json!("text")).is_err());

        let content = InsightContent::from_value(json!({"demandLevel": "High"})).unwrap();
        assert_eq!(content.get("demandLevel"), Some(&json!("High")));
    }

    #[test]
    fn test_insight_serializes_camel_case() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let insight = NewInsight::new(
            "Finance",
            InsightContent::from_value(json!({})).unwrap(),
            now,
        )
        .into_insight();

        let value = serde_json::to_value(&insight).unwrap();
        assert_eq!(value["industry"], "Finance");
        assert!(value.get("nextUpdate").is_some());
        assert!(value.get("createdAt").is_some());
    }
}
