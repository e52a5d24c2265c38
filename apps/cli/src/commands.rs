use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result, bail};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::fs;
use tubemind_core::{
    ContentAnalyzer, Controller, Insight, InsightStore, LibraryFilter, format_insight_readable,
    format_insight_row, short_id,
};

/// Edits applied to a fresh draft before it is saved.
#[derive(Default)]
pub struct DraftEdits {
    pub title: Option<String>,
    pub summary: Option<String>,
    pub add_tags: Vec<String>,
    pub remove_tags: Vec<String>,
    pub add_actions: Vec<String>,
    /// 1-based positions in the analyzed action item list.
    pub remove_actions: Vec<usize>,
}

impl DraftEdits {
    fn apply(&self, draft: &mut Insight) -> Result<()> {
        if let Some(title) = self.title.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            draft.video_title = title.to_string();
        }
        if let Some(summary) = self.summary.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            draft.summary = summary.to_string();
        }

        let mut positions = self.remove_actions.clone();
        positions.sort_unstable();
        positions.dedup();
        let ids = positions
            .iter()
            .map(|&pos| match pos.checked_sub(1).and_then(|i| draft.action_items.get(i)) {
                Some(item) => Ok(item.id.clone()),
                None => bail!(
                    "no action item at position {} (draft has {})",
                    pos,
                    draft.action_items.len()
                ),
            })
            .collect::<Result<Vec<_>>>()?;
        for id in ids {
            draft.remove_action_item(&id);
        }

        for tag in &self.remove_tags {
            draft.remove_tag(tag);
        }
        for tag in &self.add_tags {
            draft.add_tag(tag);
        }
        for action in &self.add_actions {
            draft.add_action_item(action);
        }
        Ok(())
    }
}

fn create_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    let spinner_style = ProgressStyle::default_spinner()
        .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
        .template("{spinner:.cyan} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    pb.set_style(spinner_style);
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

fn print_rule() {
    println!("{}", style("─".repeat(60)).dim());
}

pub fn list<S: InsightStore, A: ContentAnalyzer>(
    controller: &Controller<S, A>,
    search: Option<String>,
    tags: Vec<String>,
) -> Result<()> {
    if controller.insights().is_empty() {
        println!("{}", style("No insights saved yet.").dim());
        return Ok(());
    }

    let filter = LibraryFilter::new(search.unwrap_or_default(), tags);
    let visible = controller.visible(&filter);
    if visible.is_empty() {
        println!("{}", style("No videos match your search.").dim());
        return Ok(());
    }

    println!("{}", style(format!("{} results", visible.len())).dim());
    for insight in visible {
        println!("{}", format_insight_row(insight));
    }
    Ok(())
}

pub fn tags<S: InsightStore, A: ContentAnalyzer>(controller: &Controller<S, A>) -> Result<()> {
    let tags = controller.all_tags();
    if tags.is_empty() {
        println!("{}", style("No tags yet.").dim());
    }
    for tag in tags {
        println!("#{}", tag);
    }
    Ok(())
}

pub async fn analyze<S: InsightStore, A: ContentAnalyzer>(
    controller: &mut Controller<S, A>,
    url: &str,
    transcript_path: Option<PathBuf>,
    edits: DraftEdits,
    dry_run: bool,
) -> Result<()> {
    let transcript = match transcript_path {
        Some(path) => Some(
            fs::read_to_string(&path)
                .await
                .with_context(|| format!("failed to read transcript {}", path.display()))?,
        ),
        None => None,
    };

    controller.start_analysis()?;

    let spinner = create_spinner("Analyzing video...");
    if let Err(e) = controller.analyze(url, transcript.as_deref()).await {
        spinner.finish_and_clear();
        return Err(e.into());
    }
    spinner.finish_with_message(format!("{} Video analyzed", style("✓").green().bold()));

    let Some(draft) = controller.draft_mut() else {
        bail!("analysis produced no draft");
    };
    if let Err(e) = edits.apply(draft) {
        controller.cancel()?;
        return Err(e);
    }

    print_rule();
    println!("{}", format_insight_readable(draft));
    print_rule();
    let id = draft.id.clone();

    if dry_run {
        controller.cancel()?;
        println!("{}", style("Dry run: draft discarded").dim());
        return Ok(());
    }

    controller.save_draft().await?;
    println!(
        "{} Saved as {}",
        style("✓").green().bold(),
        style(short_id(&id)).cyan()
    );
    Ok(())
}

pub async fn show<S: InsightStore, A: ContentAnalyzer>(
    controller: &mut Controller<S, A>,
    id: &str,
) -> Result<()> {
    let id = controller.resolve_id(id)?.id.clone();
    let insight = controller.select(&id)?;
    println!("{}", format_insight_readable(insight));
    controller.back().await?;
    Ok(())
}

fn resolve_item(insight: &Insight, prefix: &str) -> Result<String> {
    let matches: Vec<_> = insight
        .action_items
        .iter()
        .filter(|item| item.id == prefix || item.id.starts_with(prefix))
        .collect();

    match matches.as_slice() {
        [only] => Ok(only.id.clone()),
        [] => bail!("no action item matches {}", prefix),
        _ => match matches.iter().find(|item| item.id == prefix) {
            Some(exact) => Ok(exact.id.clone()),
            None => bail!("action item prefix {} matches {} items", prefix, matches.len()),
        },
    }
}

pub async fn toggle<S: InsightStore, A: ContentAnalyzer>(
    controller: &mut Controller<S, A>,
    id: &str,
    item_prefix: &str,
) -> Result<()> {
    let id = controller.resolve_id(id)?.id.clone();
    let insight = controller.select(&id)?;
    let item_id = match resolve_item(insight, item_prefix) {
        Ok(item_id) => item_id,
        Err(e) => {
            controller.back().await?;
            return Err(e);
        }
    };

    let result = controller.toggle_action_item(&item_id).await;
    let toggled = controller
        .selected()
        .and_then(|insight| insight.action_items.iter().find(|item| item.id == item_id))
        .cloned();
    controller.back().await?;
    result?;

    if let Some(item) = toggled {
        let mark = if item.completed {
            style("[x]").green()
        } else {
            style("[ ]").dim()
        };
        println!("{} {}", mark, item.text);
    }
    Ok(())
}

pub async fn tag<S: InsightStore, A: ContentAnalyzer>(
    controller: &mut Controller<S, A>,
    id: &str,
    tag: &str,
    add: bool,
) -> Result<()> {
    let id = controller.resolve_id(id)?.id.clone();
    controller.select(&id)?;

    let result = if add {
        controller.add_tag(tag).await
    } else {
        controller.remove_tag(tag).await
    };
    let tags = controller
        .selected()
        .map(|insight| insight.tags.join(", "))
        .unwrap_or_default();
    controller.back().await?;

    if !result? {
        println!("{}", style("Tags unchanged").dim());
    }
    println!("{} {}", style("Tags:").dim(), tags);
    Ok(())
}

pub async fn delete<S: InsightStore, A: ContentAnalyzer>(
    controller: &mut Controller<S, A>,
    id: &str,
) -> Result<()> {
    let id = controller.resolve_id(id)?.id.clone();
    let title = controller.select(&id)?.video_title.clone();
    controller.delete_selected().await?;
    println!("{} Deleted {}", style("✓").green().bold(), style(title).dim());
    Ok(())
}
