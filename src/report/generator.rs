//! Markdown and JSON report generation.
//!
//! This module turns a finished session into a `SwarmReport` and renders it.

use crate::analysis::{sort_completed, AggregateStatistics, Progress, ScoreTier, SortOrder, ThemeMatch};
use crate::config::ReportConfig;
use crate::models::{AgentRecord, ReportMetadata, SwarmReport};
use crate::session::SessionSummary;
use anyhow::Result;
use chrono::Utc;

/// Assemble the report for a finished session.
pub fn build_report(summary: &SessionSummary, sort: SortOrder) -> SwarmReport {
    let agents = sort_completed(summary.snapshot.agents(), sort)
        .into_iter()
        .cloned()
        .collect();

    SwarmReport {
        metadata: ReportMetadata {
            website_url: summary.website_url.clone(),
            task_id: summary.task_id.clone(),
            task_state: summary.task_state,
            generated_at: Utc::now(),
            duration_seconds: summary.elapsed.as_secs_f64(),
            interrupted: summary.interrupted,
        },
        progress: summary.progress,
        aggregate: summary.aggregate,
        pain_points: summary.themes.pain_points.clone(),
        liked_features: summary.themes.liked_features.clone(),
        agents,
    }
}

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &SwarmReport, config: &ReportConfig) -> String {
    let mut output = String::new();

    output.push_str("# Recensio Review Report\n\n");
    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str(&generate_scores_section(report.aggregate.as_ref()));
    output.push_str(&generate_progress_section(&report.progress));
    output.push_str(&generate_themes_section(
        "Top Pain Points",
        &report.pain_points,
        config.top_themes,
    ));
    output.push_str(&generate_themes_section(
        "Most Liked Features",
        &report.liked_features,
        config.top_themes,
    ));
    output.push_str(&generate_agents_section(&report.agents, config.include_reviews));
    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    if let Some(ref url) = metadata.website_url {
        section.push_str(&format!("- **Website:** {}\n", url));
    }
    match metadata.task_id {
        Some(ref task_id) => section.push_str(&format!("- **Task:** `{}`\n", task_id)),
        None => section.push_str("- **Task:** latest\n"),
    }
    if let Some(state) = metadata.task_state {
        section.push_str(&format!("- **Task Status:** {}\n", state));
    }
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!(
        "- **Duration:** {:.1}s\n",
        metadata.duration_seconds
    ));
    if metadata.interrupted {
        section.push_str("\n> ⚠️ The session ended before the task finished; results are partial.\n");
    }
    section.push('\n');

    section
}

/// The tier is taken from the rounded score so it agrees with the number shown.
fn score_row(name: &str, score: f64) -> String {
    let shown = score.round();
    let tier = ScoreTier::from_score(shown);
    format!("| {} | {} | {} {} |\n", name, shown, tier.emoji(), tier)
}

/// Generate the score table.
fn generate_scores_section(aggregate: Option<&AggregateStatistics>) -> String {
    let mut section = String::new();

    section.push_str("## Scores\n\n");

    let Some(stats) = aggregate else {
        section.push_str("No agent has completed a review yet.\n\n");
        return section;
    };

    section.push_str(&format!(
        "*Mean over {} completed review(s)*\n\n",
        stats.sample_size
    ));
    section.push_str("| Dimension | Score | Tier |\n");
    section.push_str("|:---|:---:|:---:|\n");
    section.push_str(&score_row("**Overall**", stats.overall));
    section.push_str(&score_row("Clarity", stats.clarity));
    section.push_str(&score_row("UX", stats.ux));
    section.push_str(&score_row("Value Proposition", stats.value_proposition));
    section.push('\n');

    section
}

fn generate_progress_section(progress: &Progress) -> String {
    let mut section = String::new();

    section.push_str("## Progress\n\n");
    section.push_str("| Pending | Reviewing | Completed | **Total** |\n");
    section.push_str("|:---:|:---:|:---:|:---:|\n");
    section.push_str(&format!(
        "| {} | {} | {} | **{}** |\n\n",
        progress.pending, progress.reviewing, progress.completed, progress.total
    ));
    section.push_str(&format!(
        "{}% of agents have completed their review.\n\n",
        progress.percent_complete()
    ));

    section
}

/// Generate one ranked theme list, truncated to `limit`.
fn generate_themes_section(title: &str, themes: &[ThemeMatch], limit: usize) -> String {
    let mut section = String::new();

    section.push_str(&format!("## {}\n\n", title));

    if themes.is_empty() {
        section.push_str("Nothing recurring in the reviews so far.\n\n");
        return section;
    }

    for (i, theme) in themes.iter().take(limit).enumerate() {
        section.push_str(&format!(
            "{}. **{}** ({} mention{}, {}%)\n",
            i + 1,
            theme.text,
            theme.mentions,
            if theme.mentions == 1 { "" } else { "s" },
            theme.percentage
        ));
        for mention in theme.reviews.iter().take(2) {
            section.push_str(&format!(
                "   > \"{}\" ({})\n",
                mention.review.trim(),
                mention.agent.display_name()
            ));
        }
    }
    section.push('\n');

    section
}

fn generate_agents_section(agents: &[AgentRecord], include_reviews: bool) -> String {
    let mut section = String::new();

    section.push_str("## Agent Reviews\n\n");

    if agents.is_empty() {
        section.push_str("No completed reviews.\n\n");
        return section;
    }

    for agent in agents {
        section.push_str(&generate_agent_block(agent, include_reviews));
    }

    section
}

/// Generate a single agent block.
fn generate_agent_block(agent: &AgentRecord, include_reviews: bool) -> String {
    let mut block = String::new();
    let ratings = agent.ratings.unwrap_or_default();
    let overall = ratings.overall.round();
    let tier = ScoreTier::from_score(overall);

    block.push_str(&format!(
        "### {} {} - {}\n\n",
        tier.emoji(),
        agent.display_name(),
        overall
    ));
    block.push_str(&format!(
        "*{}, {}, {}*\n\n",
        agent.age, agent.gender, agent.occupation
    ));
    block.push_str(&format!(
        "**Clarity:** {:.0} | **UX:** {:.0} | **Value:** {:.0}\n\n",
        ratings.clarity, ratings.ux, ratings.value_proposition
    ));

    if include_reviews {
        if let Some(review) = agent.completed_review() {
            block.push_str(&format!("> {}\n\n", review.trim()));
        }
    }

    block.push_str("---\n\n");

    block
}

/// Generate the report footer.
fn generate_footer() -> String {
    "*Report generated by Recensio*\n".to_string()
}

/// Generate a JSON report.
pub fn generate_json_report(report: &SwarmReport) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}
