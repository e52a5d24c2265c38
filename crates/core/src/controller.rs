use std::fmt;

use tracing::{debug, info, warn};

use crate::{
    analysis::{AnalysisError, ContentAnalyzer},
    library::{LibraryFilter, all_tags},
    store::{InsightStore, StoreError},
    types::{Analysis, Insight},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Library,
    Analyze,
    Detail,
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            View::Library => "library",
            View::Analyze => "analyze",
            View::Detail => "detail",
        };
        f.write_str(name)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    #[error("Cannot {action} from the {view} view")]
    InvalidTransition { view: View, action: &'static str },

    #[error("No insight matches id {0}")]
    InsightNotFound(String),

    #[error("Id prefix {prefix} matches {count} insights")]
    AmbiguousId { prefix: String, count: usize },

    #[error("There is no analyzed draft to save")]
    NoDraft,

    #[error("An analysis is already in progress")]
    AnalysisInFlight,

    #[error("The analysis finished after it was abandoned; its result was discarded")]
    StaleAnalysis,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Analysis(#[from] AnalysisError),
}

/// Handle for one in-flight analysis. Completing it after the analyze view
/// was left discards the result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisTicket {
    generation: u64,
    url: String,
}

impl AnalysisTicket {
    pub fn url(&self) -> &str {
        &self.url
    }
}

/// Drives the library / analyze / detail modes over a store and an analyzer.
pub struct Controller<S, A> {
    store: S,
    analyzer: A,
    insights: Vec<Insight>,
    view: View,
    selected: Option<Insight>,
    draft: Option<Insight>,
    generation: u64,
    pending: Option<u64>,
}

impl<S: InsightStore, A: ContentAnalyzer> Controller<S, A> {
    pub async fn new(store: S, analyzer: A) -> Self {
        let insights = store.list_all().await;
        debug!(count = insights.len(), "library loaded");
        Self {
            store,
            analyzer,
            insights,
            view: View::Library,
            selected: None,
            draft: None,
            generation: 0,
            pending: None,
        }
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn insights(&self) -> &[Insight] {
        &self.insights
    }

    /// Local snapshot of the insight shown in the detail view.
    pub fn selected(&self) -> Option<&Insight> {
        self.selected.as_ref()
    }

    pub fn draft(&self) -> Option<&Insight> {
        self.draft.as_ref()
    }

    pub fn draft_mut(&mut self) -> Option<&mut Insight> {
        self.draft.as_mut()
    }

    pub fn is_analyzing(&self) -> bool {
        self.pending.is_some()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn visible(&self, filter: &LibraryFilter) -> Vec<&Insight> {
        filter.apply(&self.insights)
    }

    pub fn all_tags(&self) -> Vec<String> {
        all_tags(&self.insights)
    }

    /// Find the single insight whose id is or starts with `prefix`.
    pub fn resolve_id(&self, prefix: &str) -> Result<&Insight, ControllerError> {
        let prefix = prefix.trim();
        if let Some(exact) = self.insights.iter().find(|i| i.id == prefix) {
            return Ok(exact);
        }

        let matches: Vec<&Insight> = self
            .insights
            .iter()
            .filter(|i| !prefix.is_empty() && i.id.starts_with(prefix))
            .collect();
        match matches.as_slice() {
            [only] => Ok(only),
            [] => Err(ControllerError::InsightNotFound(prefix.to_string())),
            _ => Err(ControllerError::AmbiguousId {
                prefix: prefix.to_string(),
                count: matches.len(),
            }),
        }
    }

    pub async fn reload(&mut self) {
        self.insights = self.store.list_all().await;
        debug!(count = self.insights.len(), "library reloaded");
    }

    fn expect_view(&self, view: View, action: &'static str) -> Result<(), ControllerError> {
        if self.view != view {
            return Err(ControllerError::InvalidTransition {
                view: self.view,
                action,
            });
        }
        Ok(())
    }

    fn leave_analysis(&mut self) {
        self.generation += 1;
        self.pending = None;
        self.draft = None;
        self.view = View::Library;
    }

    pub fn start_analysis(&mut self) -> Result<(), ControllerError> {
        self.expect_view(View::Library, "start an analysis")?;
        self.view = View::Analyze;
        Ok(())
    }

    /// Mark an analysis of `url` as in flight. Refused while another one is pending.
    pub fn begin_analysis(&mut self, url: &str) -> Result<AnalysisTicket, ControllerError> {
        self.expect_view(View::Analyze, "analyze a video")?;
        if self.pending.is_some() {
            return Err(ControllerError::AnalysisInFlight);
        }

        self.generation += 1;
        self.pending = Some(self.generation);
        Ok(AnalysisTicket {
            generation: self.generation,
            url: url.trim().to_string(),
        })
    }

    /// Apply the outcome of a ticketed analysis. A successful result becomes the draft.
    pub fn complete_analysis(
        &mut self,
        ticket: AnalysisTicket,
        result: Result<Analysis, AnalysisError>,
    ) -> Result<&Insight, ControllerError> {
        if self.pending != Some(ticket.generation) {
            warn!(url = %ticket.url, "discarding result of abandoned analysis");
            return Err(ControllerError::StaleAnalysis);
        }
        self.pending = None;

        match result {
            Ok(analysis) => Ok(self.draft.insert(Insight::draft(&ticket.url, analysis))),
            Err(e) => {
                self.draft = None;
                Err(e.into())
            }
        }
    }

    pub async fn analyze(
        &mut self,
        url: &str,
        transcript: Option<&str>,
    ) -> Result<&Insight, ControllerError> {
        let ticket = self.begin_analysis(url)?;
        let result = self.analyzer.analyze(ticket.url(), transcript).await;
        self.complete_analysis(ticket, result)
    }

    /// Leave the analyze view, dropping any draft and abandoning a pending analysis.
    pub fn cancel(&mut self) -> Result<(), ControllerError> {
        self.expect_view(View::Analyze, "cancel an analysis")?;
        self.leave_analysis();
        Ok(())
    }

    /// Persist the draft and return to the library. On failure the draft is kept.
    pub async fn save_draft(&mut self) -> Result<(), ControllerError> {
        self.expect_view(View::Analyze, "save a draft")?;
        let draft = self.draft.clone().ok_or(ControllerError::NoDraft)?;
        let id = draft.id.clone();

        self.store.upsert(draft).await?;
        info!(id = %id, "insight saved");

        self.leave_analysis();
        self.reload().await;
        Ok(())
    }

    pub fn select(&mut self, id: &str) -> Result<&Insight, ControllerError> {
        self.expect_view(View::Library, "open an insight")?;
        let snapshot = self
            .insights
            .iter()
            .find(|i| i.id == id)
            .cloned()
            .ok_or_else(|| ControllerError::InsightNotFound(id.to_string()))?;

        self.view = View::Detail;
        Ok(self.selected.insert(snapshot))
    }

    pub async fn back(&mut self) -> Result<(), ControllerError> {
        self.expect_view(View::Detail, "go back")?;
        self.selected = None;
        self.view = View::Library;
        self.reload().await;
        Ok(())
    }

    pub async fn delete_selected(&mut self) -> Result<(), ControllerError> {
        self.expect_view(View::Detail, "delete an insight")?;
        let Some(id) = self.selected.as_ref().map(|i| i.id.clone()) else {
            return Err(ControllerError::InvalidTransition {
                view: self.view,
                action: "delete an insight",
            });
        };

        self.store.delete(&id).await?;
        info!(id = %id, "insight deleted");

        self.selected = None;
        self.view = View::Library;
        self.reload().await;
        Ok(())
    }

    fn selected_mut(&mut self, action: &'static str) -> Result<&mut Insight, ControllerError> {
        self.expect_view(View::Detail, action)?;
        let view = self.view;
        self.selected
            .as_mut()
            .ok_or(ControllerError::InvalidTransition { view, action })
    }

    /// Flip an action item on the snapshot, then persist it. Rolled back if the
    /// write fails. Returns false when the item does not exist.
    pub async fn toggle_action_item(&mut self, item_id: &str) -> Result<bool, ControllerError> {
        let selected = self.selected_mut("toggle an action item")?;
        if !selected.toggle_action_item(item_id) {
            return Ok(false);
        }
        let insight_id = selected.id.clone();

        if let Err(e) = self.store.toggle_action_item(&insight_id, item_id).await {
            warn!(insight_id = %insight_id, item_id, error = %e, "toggle not persisted, rolling back");
            if let Some(selected) = self.selected.as_mut() {
                selected.toggle_action_item(item_id);
            }
            return Err(e.into());
        }
        Ok(true)
    }

    pub async fn add_tag(&mut self, tag: &str) -> Result<bool, ControllerError> {
        self.edit_selected("add a tag", |insight| insight.add_tag(tag))
            .await
    }

    pub async fn remove_tag(&mut self, tag: &str) -> Result<bool, ControllerError> {
        self.edit_selected("remove a tag", |insight| insight.remove_tag(tag))
            .await
    }

    /// Apply `edit` to the snapshot and upsert it, restoring the previous
    /// snapshot if the write fails.
    async fn edit_selected(
        &mut self,
        action: &'static str,
        edit: impl FnOnce(&mut Insight) -> bool,
    ) -> Result<bool, ControllerError> {
        let selected = self.selected_mut(action)?;
        let previous = selected.clone();
        if !edit(&mut *selected) {
            return Ok(false);
        }
        let updated = selected.clone();

        if let Err(e) = self.store.upsert(updated).await {
            warn!(id = %previous.id, error = %e, "edit not persisted, rolling back");
            self.selected = Some(previous);
            return Err(e.into());
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{
        store::{MemoryStore, tests::insight},
        types::AnalysisResponse,
    };

    struct StubAnalyzer {
        response: Option<AnalysisResponse>,
        calls: Cell<usize>,
    }

    impl StubAnalyzer {
        fn ok() -> Self {
            Self {
                response: Some(AnalysisResponse {
                    video_title: "Deep work".into(),
                    summary: "Focus matters.".into(),
                    highlights: vec!["Block time".into()],
                    action_items: vec!["Do X".into(), "Do Y".into()],
                    suggested_tags: vec!["focus".into(), "focus".into()],
                }),
                calls: Cell::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                response: None,
                calls: Cell::new(0),
            }
        }
    }

    impl ContentAnalyzer for StubAnalyzer {
        async fn analyze(
            &self,
            _url: &str,
            _transcript: Option<&str>,
        ) -> Result<Analysis, AnalysisError> {
            self.calls.set(self.calls.get() + 1);
            self.response
                .clone()
                .map(Analysis::from)
                .ok_or(AnalysisError::Failed)
        }
    }

    /// Memory store whose writes can be switched off.
    #[derive(Default)]
    struct FlakyStore {
        inner: MemoryStore,
        fail_writes: Cell<bool>,
    }

    impl FlakyStore {
        fn check(&self) -> Result<(), StoreError> {
            if self.fail_writes.get() {
                return Err(StoreError::Io(std::io::Error::other("disk full")));
            }
            Ok(())
        }
    }

    impl InsightStore for FlakyStore {
        async fn list_all(&self) -> Vec<Insight> {
            self.inner.list_all().await
        }

        async fn upsert(&self, insight: Insight) -> Result<(), StoreError> {
            self.check()?;
            self.inner.upsert(insight).await
        }

        async fn delete(&self, id: &str) -> Result<(), StoreError> {
            self.check()?;
            self.inner.delete(id).await
        }

        async fn toggle_action_item(
            &self,
            insight_id: &str,
            action_item_id: &str,
        ) -> Result<(), StoreError> {
            self.check()?;
            self.inner.toggle_action_item(insight_id, action_item_id).await
        }
    }

    async fn seeded(analyzer: StubAnalyzer) -> Controller<FlakyStore, StubAnalyzer> {
        let store = FlakyStore {
            inner: MemoryStore::with_insights(vec![insight("b", 200), insight("a", 100)]),
            fail_writes: Cell::new(false),
        };
        Controller::new(store, analyzer).await
    }

    #[tokio::test]
    async fn starts_in_library_with_stored_insights() {
        let controller = Controller::new(MemoryStore::new(), StubAnalyzer::ok()).await;
        assert_eq!(controller.view(), View::Library);
        assert!(controller.insights().is_empty());
        assert!(controller.selected().is_none());
    }

    #[tokio::test]
    async fn analyze_then_save_prepends_and_returns_to_library() {
        let mut controller = seeded(StubAnalyzer::ok()).await;
        controller.start_analysis().unwrap();
        assert_eq!(controller.view(), View::Analyze);

        let draft = controller.analyze(" https://youtu.be/dw ", None).await.unwrap();
        assert_eq!(draft.url, "https://youtu.be/dw");
        assert_eq!(draft.tags, vec!["focus"]);
        assert_eq!(draft.action_items.len(), 2);

        let draft = controller.draft_mut().unwrap();
        draft.add_tag("productivity");
        draft.add_action_item("Do Z");
        let draft_id = draft.id.clone();

        controller.save_draft().await.unwrap();
        assert_eq!(controller.view(), View::Library);
        assert!(controller.draft().is_none());
        assert_eq!(controller.insights().len(), 3);
        assert_eq!(controller.insights()[0].id, draft_id);
        assert_eq!(controller.insights()[0].tags, vec!["focus", "productivity"]);
        assert_eq!(controller.insights()[0].action_items.len(), 3);
    }

    #[tokio::test]
    async fn cancel_discards_draft_without_persisting() {
        let mut controller = seeded(StubAnalyzer::ok()).await;
        controller.start_analysis().unwrap();
        controller.analyze("https://youtu.be/dw", None).await.unwrap();
        controller.cancel().unwrap();

        assert_eq!(controller.view(), View::Library);
        assert!(controller.draft().is_none());
        assert_eq!(controller.store().list_all().await.len(), 2);
    }

    #[tokio::test]
    async fn failed_analysis_stays_in_analyze_without_draft() {
        let mut controller = seeded(StubAnalyzer::failing()).await;
        controller.start_analysis().unwrap();
        let err = controller.analyze("https://youtu.be/x", None).await.unwrap_err();
        assert!(matches!(err, ControllerError::Analysis(AnalysisError::Failed)));
        assert_eq!(controller.view(), View::Analyze);
        assert!(controller.draft().is_none());
        assert!(!controller.is_analyzing());
        assert!(matches!(controller.save_draft().await, Err(ControllerError::NoDraft)));
    }

    #[tokio::test]
    async fn refuses_duplicate_submission_and_discards_stale_results() {
        let mut controller = seeded(StubAnalyzer::ok()).await;
        controller.start_analysis().unwrap();
        let ticket = controller.begin_analysis("https://youtu.be/dw").unwrap();
        assert!(controller.is_analyzing());
        assert!(matches!(
            controller.begin_analysis("https://youtu.be/dw"),
            Err(ControllerError::AnalysisInFlight)
        ));
        assert_eq!(controller.analyzer.calls.get(), 0);

        controller.cancel().unwrap();
        let late = StubAnalyzer::ok().response.map(Analysis::from).ok_or(AnalysisError::Failed);
        assert!(matches!(
            controller.complete_analysis(ticket, late),
            Err(ControllerError::StaleAnalysis)
        ));
        assert!(controller.draft().is_none());
        assert_eq!(controller.view(), View::Library);
    }

    #[tokio::test]
    async fn earlier_ticket_cannot_complete_a_newer_request() {
        let mut controller = seeded(StubAnalyzer::ok()).await;
        controller.start_analysis().unwrap();
        let result = || StubAnalyzer::ok().response.map(Analysis::from).ok_or(AnalysisError::Failed);

        let first = controller.begin_analysis("https://old").unwrap();
        controller.complete_analysis(first.clone(), result()).unwrap();

        let second = controller.begin_analysis("https://new").unwrap();
        assert!(matches!(
            controller.complete_analysis(first, result()),
            Err(ControllerError::StaleAnalysis)
        ));
        assert!(controller.is_analyzing());
        assert_eq!(controller.draft().unwrap().url, "https://old");

        let draft = controller.complete_analysis(second, result()).unwrap();
        assert_eq!(draft.url, "https://new");
        assert!(!controller.is_analyzing());
    }

    #[tokio::test]
    async fn failed_save_keeps_draft() {
        let mut controller = seeded(StubAnalyzer::ok()).await;
        controller.start_analysis().unwrap();
        controller.analyze("https://youtu.be/dw", None).await.unwrap();

        controller.store().fail_writes.set(true);
        let err = controller.save_draft().await.unwrap_err();
        assert!(matches!(err, ControllerError::Store(_)));
        assert_eq!(controller.view(), View::Analyze);
        assert!(controller.draft().is_some());
        assert_eq!(controller.insights().len(), 2);
    }

    #[tokio::test]
    async fn detail_toggle_is_optimistic_and_reflected_after_back() {
        let mut controller = seeded(StubAnalyzer::ok()).await;
        let selected = controller.select("a").unwrap();
        assert_eq!(selected.id, "a");
        assert_eq!(controller.view(), View::Detail);

        assert!(controller.toggle_action_item("a-item").await.unwrap());
        assert!(controller.selected().unwrap().action_items[0].completed);
        assert!(!controller.insights()[1].action_items[0].completed);

        assert!(!controller.toggle_action_item("missing").await.unwrap());

        controller.back().await.unwrap();
        assert_eq!(controller.view(), View::Library);
        assert!(controller.selected().is_none());
        assert!(controller.insights()[1].action_items[0].completed);
    }

    #[tokio::test]
    async fn failed_toggle_rolls_back_snapshot() {
        let mut controller = seeded(StubAnalyzer::ok()).await;
        controller.select("a").unwrap();
        controller.store().fail_writes.set(true);

        let err = controller.toggle_action_item("a-item").await.unwrap_err();
        assert!(matches!(err, ControllerError::Store(_)));
        assert!(!controller.selected().unwrap().action_items[0].completed);
    }

    #[tokio::test]
    async fn tag_edits_persist_in_place() {
        let mut controller = seeded(StubAnalyzer::ok()).await;
        controller.select("a").unwrap();
        assert!(controller.add_tag("rust").await.unwrap());
        assert!(!controller.add_tag("rust").await.unwrap());
        assert!(controller.remove_tag("tips").await.unwrap());

        controller.store().fail_writes.set(true);
        assert!(controller.add_tag("lost").await.is_err());
        assert_eq!(controller.selected().unwrap().tags, vec!["go", "rust"]);

        controller.store().fail_writes.set(false);
        controller.back().await.unwrap();
        let ids: Vec<_> = controller.insights().iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
        assert_eq!(controller.insights()[1].tags, vec!["go", "rust"]);
    }

    #[tokio::test]
    async fn delete_returns_to_library() {
        let mut controller = seeded(StubAnalyzer::ok()).await;
        controller.select("b").unwrap();
        controller.delete_selected().await.unwrap();
        assert_eq!(controller.view(), View::Library);
        let ids: Vec<_> = controller.insights().iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["a"]);
    }

    #[tokio::test]
    async fn rejects_transitions_from_the_wrong_view() {
        let mut controller = seeded(StubAnalyzer::ok()).await;
        assert!(matches!(
            controller.cancel(),
            Err(ControllerError::InvalidTransition { view: View::Library, .. })
        ));
        assert!(controller.back().await.is_err());
        assert!(controller.toggle_action_item("a-item").await.is_err());
        assert!(matches!(
            controller.select("zzz"),
            Err(ControllerError::InsightNotFound(_))
        ));

        controller.start_analysis().unwrap();
        assert!(controller.select("a").is_err());
        assert!(controller.start_analysis().is_err());
    }

    #[tokio::test]
    async fn resolves_id_prefixes() {
        let store = MemoryStore::with_insights(vec![
            insight("abc1", 1),
            insight("abc2", 2),
            insight("xyz", 3),
        ]);
        let controller = Controller::new(store, StubAnalyzer::ok()).await;
        assert_eq!(controller.resolve_id("x").unwrap().id, "xyz");
        assert_eq!(controller.resolve_id("abc1").unwrap().id, "abc1");
        assert!(matches!(
            controller.resolve_id("abc"),
            Err(ControllerError::AmbiguousId { count: 2, .. })
        ));
        assert!(matches!(
            controller.resolve_id(""),
            Err(ControllerError::InsightNotFound(_))
        ));
    }
}
