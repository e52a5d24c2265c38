use chrono::DateTime;

use crate::types::Insight;

const ROW_TAG_LIMIT: usize = 3;
const SHORT_ID_LEN: usize = 8;

/// Format epoch milliseconds as `YYYY-MM-DD HH:MM` (UTC)
pub fn format_created_at(created_at: i64) -> String {
    DateTime::from_timestamp_millis(created_at)
        .map(|ts| ts.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "unknown date".to_string())
}

pub fn short_id(id: &str) -> &str {
    id.char_indices()
        .nth(SHORT_ID_LEN)
        .map_or(id, |(end, _)| &id[..end])
}

/// One line per insight for the library listing
pub fn format_insight_row(insight: &Insight) -> String {
    let mut row = format!(
        "{}  {}  [{}/{}]",
        short_id(&insight.id),
        insight.video_title,
        insight.completed_count(),
        insight.action_items.len()
    );

    if !insight.tags.is_empty() {
        let shown: Vec<String> = insight
            .tags
            .iter()
            .take(ROW_TAG_LIMIT)
            .map(|tag| format!("#{}", tag))
            .collect();
        row.push_str("  ");
        row.push_str(&shown.join(" "));
        if insight.tags.len() > ROW_TAG_LIMIT {
            row.push_str(&format!(" +{} more", insight.tags.len() - ROW_TAG_LIMIT));
        }
    }

    row
}

/// Format an insight as human-readable markdown
pub fn format_insight_readable(insight: &Insight) -> String {
    let mut output = String::new();
    output.push_str(&format!("# {}\n\n", insight.video_title));

    output.push_str(&format!(
        "**Source:** {} | **Saved:** {}\n",
        insight.url,
        format_created_at(insight.created_at)
    ));
    if !insight.tags.is_empty() {
        output.push_str(&format!("**Tags:** {}\n", insight.tags.join(", ")));
    }
    output.push('\n');

    output.push_str("## Summary\n\n");
    output.push_str(&insight.summary);
    output.push_str("\n\n");

    output.push_str("## Highlights\n\n");
    for highlight in &insight.highlights {
        output.push_str(&format!("• {}\n", highlight));
    }
    output.push('\n');

    output.push_str(&format!(
        "## Action Items ({} / {})\n\n",
        insight.completed_count(),
        insight.action_items.len()
    ));
    for item in &insight.action_items {
        let mark = if item.completed { "x" } else { " " };
        output.push_str(&format!("- [{}] {}  ({})\n", mark, item.text, short_id(&item.id)));
    }

    output
}
