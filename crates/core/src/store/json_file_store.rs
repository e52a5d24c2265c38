use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use tokio::fs;
use tracing::{debug, warn};

use crate::{
    paths::{INSIGHTS_KEY, get_slot_path, get_slot_tmp_path},
    store::{InsightStore, StoreError, remove_from, toggle_in, upsert_into},
    types::Insight,
};

/// Keeps the insight list as one JSON document under a fixed key in a data directory.
pub struct JsonFileStore {
    data_dir: PathBuf,
    key: String,
}

impl JsonFileStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self::with_key(data_dir, INSIGHTS_KEY)
    }

    pub fn with_key(data_dir: impl Into<PathBuf>, key: impl Into<String>) -> Self {
        Self {
            data_dir: data_dir.into(),
            key: key.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn path(&self) -> PathBuf {
        get_slot_path(&self.data_dir, &self.key)
    }

    async fn read_slot(&self) -> Vec<Insight> {
        let path = self.path();
        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to read insights, treating as empty");
                return Vec::new();
            }
        };

        if content.trim().is_empty() {
            return Vec::new();
        }

        match serde_json::from_str(&content) {
            Ok(insights) => insights,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "stored insights are corrupt, treating as empty");
                Vec::new()
            }
        }
    }

    async fn write_slot(&self, insights: &[Insight]) -> Result<(), StoreError> {
        fs::create_dir_all(&self.data_dir).await?;

        let pretty_json = serde_json::to_string_pretty(insights)?;
        let tmp_path = get_slot_tmp_path(&self.data_dir, &self.key);
        fs::write(&tmp_path, &pretty_json).await?;
        fs::rename(&tmp_path, self.path()).await?;

        debug!(count = insights.len(), path = %self.path().display(), "insights written");
        Ok(())
    }
}

impl InsightStore for JsonFileStore {
    async fn list_all(&self) -> Vec<Insight> {
        self.read_slot().await
    }

    async fn upsert(&self, insight: Insight) -> Result<(), StoreError> {
        let mut insights = self.read_slot().await;
        upsert_into(&mut insights, insight);
        self.write_slot(&insights).await
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let mut insights = self.read_slot().await;
        if !remove_from(&mut insights, id) {
            return Ok(());
        }
        self.write_slot(&insights).await
    }

    async fn toggle_action_item(
        &self,
        insight_id: &str,
        action_item_id: &str,
    ) -> Result<(), StoreError> {
        let mut insights = self.read_slot().await;
        if !toggle_in(&mut insights, insight_id, action_item_id) {
            return Ok(());
        }
        self.write_slot(&insights).await
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    use super::*;
    use crate::store::tests::{check_store_semantics, insight};

    #[tokio::test]
    async fn shares_store_semantics() {
        let dir = tempdir().unwrap();
        check_store_semantics(JsonFileStore::new(dir.path())).await;
    }

    #[tokio::test]
    async fn persists_across_instances() {
        let dir = tempdir().unwrap();
        JsonFileStore::new(dir.path())
            .upsert(insight("a", 1))
            .await
            .unwrap();

        let reopened = JsonFileStore::new(dir.path());
        assert_eq!(reopened.list_all().await, vec![insight("a", 1)]);
        assert!(!get_slot_tmp_path(dir.path(), INSIGHTS_KEY).exists());
    }

    #[tokio::test]
    async fn missing_directory_reads_empty() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("not-yet-created"));
        assert!(store.list_all().await.is_empty());

        store.upsert(insight("a", 1)).await.unwrap();
        assert_eq!(store.list_all().await.len(), 1);
    }

    #[tokio::test]
    async fn corrupt_slot_reads_empty_and_recovers() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        std::fs::write(store.path(), "{ not json").unwrap();
        assert!(store.list_all().await.is_empty());

        std::fs::write(store.path(), r#"[{"id": "a"}]"#).unwrap();
        assert!(store.list_all().await.is_empty());

        store.upsert(insight("b", 2)).await.unwrap();
        assert_eq!(store.list_all().await, vec![insight("b", 2)]);
    }

    #[tokio::test]
    async fn reads_camel_case_documents() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        let document = r#"[{
            "id": "a",
            "url": "https://youtu.be/a",
            "videoTitle": "Title",
            "summary": "Summary",
            "highlights": ["h"],
            "actionItems": [{"id": "x", "text": "Do X", "completed": true}],
            "tags": ["go"],
            "createdAt": 1700000000000
        }]"#;
        std::fs::write(store.path(), document).unwrap();

        let listed = store.list_all().await;
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].video_title, "Title");
        assert!(listed[0].action_items[0].completed);
        assert_eq!(listed[0].created_at, 1_700_000_000_000);
    }

    #[tokio::test]
    async fn write_failure_propagates() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("occupied");
        std::fs::write(&blocker, "file, not a directory").unwrap();

        let store = JsonFileStore::new(&blocker);
        let result = store.upsert(insight("a", 1)).await;
        assert!(matches!(result, Err(StoreError::Io(_))));
    }

    #[tokio::test]
    async fn noop_delete_does_not_create_slot() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        store.delete("missing").await.unwrap();
        store.toggle_action_item("missing", "item").await.unwrap();
        assert!(!store.path().exists());
    }
}
