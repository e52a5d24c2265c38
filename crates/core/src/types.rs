use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One analyzed video note, as kept in the library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Insight {
    pub id: String,
    pub url: String,
    pub video_title: String,
    pub summary: String,
    pub highlights: Vec<String>,
    pub action_items: Vec<ActionItem>,
    pub tags: Vec<String>,
    /// Epoch milliseconds.
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionItem {
    pub id: String,
    pub text: String,
    pub completed: bool,
}

/// Raw structured payload returned by the analysis service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AnalysisResponse {
    pub video_title: String,
    pub summary: String,
    pub highlights: Vec<String>,
    pub action_items: Vec<String>,
    pub suggested_tags: Vec<String>,
}

/// Analysis result with action items already wrapped into [`ActionItem`]s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Analysis {
    pub video_title: String,
    pub summary: String,
    pub highlights: Vec<String>,
    pub action_items: Vec<ActionItem>,
    pub suggested_tags: Vec<String>,
}

impl ActionItem {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            text: text.into(),
            completed: false,
        }
    }
}

impl From<AnalysisResponse> for Analysis {
    fn from(raw: AnalysisResponse) -> Self {
        Self {
            video_title: raw.video_title,
            summary: raw.summary,
            highlights: raw.highlights,
            action_items: raw.action_items.into_iter().map(ActionItem::new).collect(),
            suggested_tags: raw.suggested_tags,
        }
    }
}

impl Insight {
    /// Build an unsaved draft from an analysis of `url`.
    pub fn draft(url: &str, analysis: Analysis) -> Self {
        let mut insight = Self {
            id: Uuid::new_v4().to_string(),
            url: url.trim().to_string(),
            video_title: analysis.video_title,
            summary: analysis.summary,
            highlights: analysis.highlights,
            action_items: analysis.action_items,
            tags: Vec::new(),
            created_at: chrono::Utc::now().timestamp_millis(),
        };
        for tag in analysis.suggested_tags {
            insight.add_tag(&tag);
        }
        insight
    }

    /// Returns false when the tag is blank or already present.
    pub fn add_tag(&mut self, tag: &str) -> bool {
        let tag = tag.trim();
        if tag.is_empty() || self.tags.iter().any(|t| t == tag) {
            return false;
        }
        self.tags.push(tag.to_string());
        true
    }

    pub fn remove_tag(&mut self, tag: &str) -> bool {
        let before = self.tags.len();
        self.tags.retain(|t| t != tag.trim());
        self.tags.len() != before
    }

    /// Appends a fresh, uncompleted item. Blank text is ignored.
    pub fn add_action_item(&mut self, text: &str) -> Option<&ActionItem> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        self.action_items.push(ActionItem::new(text));
        self.action_items.last()
    }

    pub fn remove_action_item(&mut self, id: &str) -> bool {
        let before = self.action_items.len();
        self.action_items.retain(|item| item.id != id);
        self.action_items.len() != before
    }

    /// Flips `completed` on the matching item. Returns false if no item matched.
    pub fn toggle_action_item(&mut self, id: &str) -> bool {
        match self.action_items.iter_mut().find(|item| item.id == id) {
            Some(item) => {
                item.completed = !item.completed;
                true
            }
            None => false,
        }
    }

    pub fn completed_count(&self) -> usize {
        self.action_items.iter().filter(|item| item.completed).count()
    }
}
