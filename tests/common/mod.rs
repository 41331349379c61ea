//! Shared helpers for careerlens integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use careerlens::{
    ExternalId, GenerationError, InsightContent, InsightGenerator, ManualClock, ProfileStore,
};
use chrono::{DateTime, TimeZone, Utc};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Barrier;

pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 9, 2, 14, 0, 0).unwrap()
}

pub fn manual_clock() -> ManualClock {
    ManualClock::at(start_time())
}

/// Insight content tagged with a marker so tests can tell payloads apart
pub fn payload(marker: &str) -> InsightContent {
    InsightContent::from_value(json!({
        "marker": marker,
        "salaryRanges": [{"role": "Analyst", "min": 50000, "max": 90000}],
        "growthRate": 4.2,
        "demandLevel": "High",
        "topSkills": ["SQL", "Communication"],
        "marketOutlook": "Positive",
        "keyTrends": ["Automation"],
        "recommendedSkills": ["Python"]
    }))
    .unwrap()
}

/// Provision `count` profiles named `user_0`, `user_1`, ...
pub fn provision(store: &dyn ProfileStore, count: usize) -> Vec<ExternalId> {
    (0..count)
        .map(|i| {
            let id = ExternalId::new(format!("user_{i}"));
            store.ensure_profile(&id, start_time()).unwrap();
            id
        })
        .collect()
}

/// Generator that holds every caller until `parties` calls are in flight.
///
/// Forces all racing updates past the pre-transaction read before any of
/// them can commit, so each one generates and each one attempts the create.
pub struct BarrierGenerator {
    barrier: Barrier,
    calls: AtomicUsize,
}

impl BarrierGenerator {
    pub fn new(parties: usize) -> Self {
        Self {
            barrier: Barrier::new(parties),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl InsightGenerator for BarrierGenerator {
    async fn generate(&self, industry: &str) -> Result<InsightContent, GenerationError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        self.barrier.wait().await;
        Ok(payload(&format!("{industry}-{n}")))
    }
}
