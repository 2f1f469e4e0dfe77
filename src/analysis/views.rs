//! Helpers shared by every consumer that presents agents or scores.

use crate::models::AgentRecord;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Severity band of a 0-100 score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreTier {
    /// Below 41
    Low,
    /// 41 to 70
    Mid,
    /// 71 and above
    High,
}

impl ScoreTier {
    pub fn from_score(score: f64) -> Self {
        if score < 41.0 {
            ScoreTier::Low
        } else if score < 71.0 {
            ScoreTier::Mid
        } else {
            ScoreTier::High
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            ScoreTier::Low => "🔴",
            ScoreTier::Mid => "🟡",
            ScoreTier::High => "🟢",
        }
    }
}

impl fmt::Display for ScoreTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoreTier::Low => write!(f, "Low"),
            ScoreTier::Mid => write!(f, "Mid"),
            ScoreTier::High => write!(f, "High"),
        }
    }
}

/// Ordering for lists of completed agents.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum SortOrder {
    /// Arrival order
    #[default]
    Default,
    /// Highest overall rating first
    RatingDesc,
    /// Lowest overall rating first
    RatingAsc,
    /// Name A-Z
    NameAsc,
    /// Name Z-A
    NameDesc,
}

fn overall(agent: &AgentRecord) -> f64 {
    agent.ratings.map(|r| r.overall).unwrap_or(0.0)
}

fn by_name(a: &AgentRecord, b: &AgentRecord) -> Ordering {
    a.name.to_lowercase().cmp(&b.name.to_lowercase())
}

/// Completed agents in the requested order.
///
/// Always starts from the caller's slice, so `Default` is arrival order no
/// matter what was requested before. Sorting is stable.
pub fn sort_completed(agents: &[AgentRecord], order: SortOrder) -> Vec<&AgentRecord> {
    let mut completed: Vec<&AgentRecord> = agents.iter().filter(|a| a.is_rated()).collect();

    match order {
        SortOrder::Default => {}
        SortOrder::RatingDesc => completed.sort_by(|a, b| overall(b).total_cmp(&overall(a))),
        SortOrder::RatingAsc => completed.sort_by(|a, b| overall(a).total_cmp(&overall(b))),
        SortOrder::NameAsc => completed.sort_by(|a, b| by_name(a, b)),
        SortOrder::NameDesc => completed.sort_by(|a, b| by_name(b, a)),
    }

    completed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::{completed_agent, pending_agent};

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(ScoreTier::from_score(0.0), ScoreTier::Low);
        assert_eq!(ScoreTier::from_score(40.0), ScoreTier::Low);
        assert_eq!(ScoreTier::from_score(41.0), ScoreTier::Mid);
        assert_eq!(ScoreTier::from_score(70.0), ScoreTier::Mid);
        assert_eq!(ScoreTier::from_score(71.0), ScoreTier::High);
        assert_eq!(ScoreTier::from_score(100.0), ScoreTier::High);
    }

    #[test]
    fn test_tier_ordering() {
        assert!(ScoreTier::Low < ScoreTier::Mid);
        assert!(ScoreTier::Mid < ScoreTier::High);
        assert_eq!(ScoreTier::High.emoji(), "🟢");
    }

    fn sample() -> Vec<AgentRecord> {
        vec![
            completed_agent(1, "carol", 70.0, "ok"),
            pending_agent(2, "Dave"),
            completed_agent(3, "Alice", 90.0, "ok"),
            completed_agent(4, "Bob", 70.0, "ok"),
        ]
    }

    fn ids(agents: &[&AgentRecord]) -> Vec<i64> {
        agents.iter().map(|a| a.id).collect()
    }

    #[test]
    fn test_sort_orders() {
        let agents = sample();
        assert_eq!(ids(&sort_completed(&agents, SortOrder::Default)), vec![1, 3, 4]);
        assert_eq!(ids(&sort_completed(&agents, SortOrder::RatingDesc)), vec![3, 1, 4]);
        assert_eq!(ids(&sort_completed(&agents, SortOrder::RatingAsc)), vec![1, 4, 3]);
        assert_eq!(ids(&sort_completed(&agents, SortOrder::NameAsc)), vec![3, 4, 1]);
        assert_eq!(ids(&sort_completed(&agents, SortOrder::NameDesc)), vec![1, 4, 3]);
    }

    #[test]
    fn test_default_after_other_sort_is_arrival_order() {
        let agents = sample();
        let _ = sort_completed(&agents, SortOrder::NameDesc);
        let _ = sort_completed(&agents, SortOrder::RatingDesc);
        assert_eq!(ids(&sort_completed(&agents, SortOrder::Default)), vec![1, 3, 4]);
        // The source slice is untouched.
        assert_eq!(agents.iter().map(|a| a.id).collect::<Vec<_>>(), vec![1, 2, 3, 4]);
    }
}
