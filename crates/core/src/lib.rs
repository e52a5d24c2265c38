//! Tubemind Core Library
//!
//! Turns a video reference into an editable insight (title, summary,
//! highlights, action items, tags) with an AI provider, and keeps those
//! insights in a local library.

pub mod analysis;
pub mod controller;
pub mod error;
pub mod format;
pub mod library;
pub mod paths;
pub mod provider;
pub mod store;
pub mod types;

pub use analysis::{AnalysisClient, AnalysisError, ContentAnalyzer, build_prompt, response_schema};
pub use controller::{AnalysisTicket, Controller, ControllerError, View};
pub use error::{Result, TubemindError};
pub use format::{format_created_at, format_insight_readable, format_insight_row, short_id};
pub use library::{LibraryFilter, all_tags};
pub use paths::{INSIGHTS_KEY, get_root_data_dir, get_slot_path};
pub use provider::{Provider, ProviderConfig};
pub use store::{InsightStore, JsonFileStore, MemoryStore, StoreError};
pub use types::{ActionItem, Analysis, AnalysisResponse, Insight};
