use std::sync::Mutex;

use crate::{
    store::{InsightStore, StoreError, remove_from, toggle_in, upsert_into},
    types::Insight,
};

/// Process-local store. Nothing survives the process.
#[derive(Default)]
pub struct MemoryStore {
    insights: Mutex<Vec<Insight>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_insights(insights: Vec<Insight>) -> Self {
        Self {
            insights: Mutex::new(insights),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Insight>> {
        self.insights.lock().expect("MemoryStore poisoned")
    }
}

impl InsightStore for MemoryStore {
    async fn list_all(&self) -> Vec<Insight> {
        self.lock().clone()
    }

    async fn upsert(&self, insight: Insight) -> Result<(), StoreError> {
        upsert_into(&mut self.lock(), insight);
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        remove_from(&mut self.lock(), id);
        Ok(())
    }

    async fn toggle_action_item(
        &self,
        insight_id: &str,
        action_item_id: &str,
    ) -> Result<(), StoreError> {
        toggle_in(&mut self.lock(), insight_id, action_item_id);
        Ok(())
    }
}
