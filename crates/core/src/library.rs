use std::collections::BTreeSet;

use crate::types::Insight;

/// Search text and tag selection applied to the library listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LibraryFilter {
    pub search_query: String,
    pub selected_tags: Vec<String>,
}

impl LibraryFilter {
    pub fn new(search_query: impl Into<String>, selected_tags: Vec<String>) -> Self {
        Self {
            search_query: search_query.into(),
            selected_tags,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.search_query.trim().is_empty() && self.selected_tags.is_empty()
    }

    /// Select the tag if unselected, unselect it otherwise.
    pub fn toggle_tag(&mut self, tag: &str) {
        if let Some(pos) = self.selected_tags.iter().position(|t| t == tag) {
            self.selected_tags.remove(pos);
        } else {
            self.selected_tags.push(tag.to_string());
        }
    }

    /// Case-insensitive match on title or summary, and every selected tag present.
    pub fn matches(&self, insight: &Insight) -> bool {
        let query = self.search_query.trim().to_lowercase();
        let matches_search = query.is_empty()
            || insight.video_title.to_lowercase().contains(&query)
            || insight.summary.to_lowercase().contains(&query);

        let matches_tags = self
            .selected_tags
            .iter()
            .all(|tag| insight.tags.iter().any(|t| t == tag));

        matches_search && matches_tags
    }

    pub fn apply<'a>(&self, insights: &'a [Insight]) -> Vec<&'a Insight> {
        insights.iter().filter(|i| self.matches(i)).collect()
    }
}

/// Every distinct tag in the library, sorted.
pub fn all_tags(insights: &[Insight]) -> Vec<String> {
    insights
        .iter()
        .flat_map(|insight| insight.tags.iter().cloned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
