pub mod json_file_store;
pub mod memory_store;

pub use json_file_store::*;
pub use memory_store::*;

use std::collections::HashSet;

use crate::types::Insight;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Failed to write insights: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to encode insights: {0}")]
    Json(#[from] serde_json::Error),
}

/// Whole-list persistence of the insight library.
///
/// Every operation reads the full list, modifies it and writes it back.
/// Reads never fail: an unreadable list is reported as empty.
/// Upserted insights have repeated tags dropped.
#[allow(async_fn_in_trait)]
pub trait InsightStore {
    async fn list_all(&self) -> Vec<Insight>;

    /// Replace the insight sharing `insight.id` in place, or put it at the front.
    async fn upsert(&self, insight: Insight) -> Result<(), StoreError>;

    /// Missing ids are a no-op.
    async fn delete(&self, id: &str) -> Result<(), StoreError>;

    /// Missing insight or item ids are a no-op.
    async fn toggle_action_item(
        &self,
        insight_id: &str,
        action_item_id: &str,
    ) -> Result<(), StoreError>;
}

/// Drop repeated tags, keeping the first occurrence of each.
pub fn dedupe_tags(tags: &mut Vec<String>) {
    let mut seen = HashSet::new();
    tags.retain(|tag| seen.insert(tag.clone()));
}

pub fn upsert_into(insights: &mut Vec<Insight>, mut insight: Insight) {
    dedupe_tags(&mut insight.tags);
    match insights.iter_mut().find(|existing| existing.id == insight.id) {
        Some(existing) => *existing = insight,
        None => insights.insert(0, insight),
    }
}

pub fn remove_from(insights: &mut Vec<Insight>, id: &str) -> bool {
    let before = insights.len();
    insights.retain(|insight| insight.id != id);
    insights.len() != before
}

pub fn toggle_in(insights: &mut [Insight], insight_id: &str, action_item_id: &str) -> bool {
    insights
        .iter_mut()
        .find(|insight| insight.id == insight_id)
        .is_some_and(|insight| insight.toggle_action_item(action_item_id))
}
