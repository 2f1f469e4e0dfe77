//! Keyword-driven review classification.
//!
//! Each theme is a label plus keywords. A completed review mentions a theme
//! when its lower-cased text contains any keyword as a plain substring; there
//! is no tokenisation, so "slow" also matches "slowly". Themes are ranked by
//! mentions and scaled so the most-mentioned one reads 100%.

use crate::models::AgentRecord;
use serde::{Deserialize, Serialize};

/// A fixed theme: display label and trigger keywords.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeDefinition {
    pub label: String,
    pub keywords: Vec<String>,
}

impl ThemeDefinition {
    pub fn new(label: &str, keywords: &[&str]) -> Self {
        Self {
            label: label.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }

    /// `review_lower` must already be lower-cased.
    fn matches(&self, review_lower: &str) -> bool {
        self.keywords
            .iter()
            .any(|keyword| review_lower.contains(&keyword.to_lowercase()))
    }
}

/// A review that triggered a theme.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThemeMention {
    pub agent: AgentRecord,
    pub review: String,
}

/// A theme found in at least one review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThemeMatch {
    pub text: String,
    pub mentions: usize,
    /// Mentions relative to the top theme of the same pass, 0-100.
    pub percentage: u32,
    /// Contributing reviews in agent arrival order.
    pub reviews: Vec<ThemeMention>,
}

/// Both classification passes over the same agents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThemeReport {
    pub pain_points: Vec<ThemeMatch>,
    pub liked_features: Vec<ThemeMatch>,
}

/// Theme tables used by the classifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeConfig {
    #[serde(default = "default_pain_points")]
    pub pain_points: Vec<ThemeDefinition>,
    #[serde(default = "default_liked_features")]
    pub liked_features: Vec<ThemeDefinition>,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            pain_points: default_pain_points(),
            liked_features: default_liked_features(),
        }
    }
}

pub fn default_pain_points() -> Vec<ThemeDefinition> {
    vec![
        ThemeDefinition::new(
            "Loading times and performance issues",
            &["slow", "loading", "performance", "lag", "laggy", "speed"],
        ),
        ThemeDefinition::new(
            "Confusing navigation",
            &["confusing", "navigation", "hard to find", "lost", "unclear", "complicated"],
        ),
        ThemeDefinition::new(
            "Pricing concerns",
            &["expensive", "price", "pricing", "cost", "overpriced"],
        ),
        ThemeDefinition::new(
            "Trust and credibility concerns",
            &["trust", "scam", "privacy", "security", "credib"],
        ),
        ThemeDefinition::new(
            "Cluttered layout",
            &["cluttered", "overwhelming", "busy", "messy", "crowded"],
        ),
    ]
}

pub fn default_liked_features() -> Vec<ThemeDefinition> {
    vec![
        ThemeDefinition::new(
            "Clean, modern design",
            &["clean", "modern", "design", "beautiful", "sleek"],
        ),
        ThemeDefinition::new(
            "Ease of use",
            &["easy", "intuitive", "simple", "user-friendly", "straightforward"],
        ),
        ThemeDefinition::new(
            "Clear value proposition",
            &["clear", "value", "useful", "benefit"],
        ),
        ThemeDefinition::new(
            "Fast and responsive",
            &["fast", "quick", "responsive", "smooth"],
        ),
        ThemeDefinition::new(
            "Helpful features",
            &["feature", "helpful", "functionality", "tools"],
        ),
    ]
}

/// Rank `definitions` against every completed, non-blank review.
///
/// Themes without mentions are dropped; ties keep table order.
pub fn classify(agents: &[AgentRecord], definitions: &[ThemeDefinition]) -> Vec<ThemeMatch> {
    let reviews: Vec<(&AgentRecord, &str, String)> = agents
        .iter()
        .filter_map(|agent| {
            agent
                .completed_review()
                .map(|review| (agent, review, review.to_lowercase()))
        })
        .collect();

    if reviews.is_empty() {
        return Vec::new();
    }

    let mut matches: Vec<ThemeMatch> = definitions
        .iter()
        .filter_map(|definition| {
            let mentions: Vec<ThemeMention> = reviews
                .iter()
                .filter(|(_, _, lower)| definition.matches(lower))
                .map(|(agent, review, _)| ThemeMention {
                    agent: (*agent).clone(),
                    review: review.to_string(),
                })
                .collect();

            if mentions.is_empty() {
                return None;
            }
            Some(ThemeMatch {
                text: definition.label.clone(),
                mentions: mentions.len(),
                percentage: 0,
                reviews: mentions,
            })
        })
        .collect();

    // Vec::sort_by_key is stable, so equal counts keep table order.
    matches.sort_by_key(|m| std::cmp::Reverse(m.mentions));

    let max = matches.first().map(|m| m.mentions).unwrap_or(0).max(1);
    for m in &mut matches {
        m.percentage = ((m.mentions as f64 / max as f64) * 100.0).round() as u32;
    }

    matches
}

/// Run both passes.
pub fn classify_reviews(agents: &[AgentRecord], config: &ThemeConfig) -> ThemeReport {
    ThemeReport {
        pain_points: classify(agents, &config.pain_points),
        liked_features: classify(agents, &config.liked_features),
    }
}
