//! Score aggregation and progress statistics.
//!
//! Pure functions over an agent slice: the same input always gives the same
//! output, and only completed agents with ratings contribute to scores.

use crate::models::{AgentRecord, AgentStatus, Ratings};
use serde::{Deserialize, Serialize};

/// Mean ratings over completed agents.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateStatistics {
    pub overall: f64,
    pub clarity: f64,
    pub ux: f64,
    pub value_proposition: f64,
    /// Number of agents the means were taken over.
    pub sample_size: usize,
}

/// Per-status head counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub total: usize,
    pub pending: usize,
    pub reviewing: usize,
    pub completed: usize,
}

impl Progress {
    /// Completed share in whole percent; 0 with no agents.
    pub fn percent_complete(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        ((self.completed * 100) / self.total) as u8
    }

    /// Every known agent has completed (and there is at least one).
    pub fn is_finished(&self) -> bool {
        self.total > 0 && self.completed == self.total
    }
}

/// Ratings of every completed agent, in arrival order.
pub fn completed_ratings(agents: &[AgentRecord]) -> Vec<&Ratings> {
    agents
        .iter()
        .filter(|a| a.status == AgentStatus::Completed)
        .filter_map(|a| a.ratings.as_ref())
        .collect()
}

/// Compute mean ratings. `None` until at least one agent has completed.
pub fn aggregate(agents: &[AgentRecord]) -> Option<AggregateStatistics> {
    let ratings = completed_ratings(agents);
    if ratings.is_empty() {
        return None;
    }

    let n = ratings.len() as f64;
    let mean = |dimension: fn(&Ratings) -> f64| ratings.iter().map(|r| dimension(r)).sum::<f64>() / n;

    Some(AggregateStatistics {
        overall: mean(|r| r.overall),
        clarity: mean(|r| r.clarity),
        ux: mean(|r| r.ux),
        value_proposition: mean(|r| r.value_proposition),
        sample_size: ratings.len(),
    })
}

/// Count agents by lifecycle status.
pub fn progress(agents: &[AgentRecord]) -> Progress {
    let mut progress = Progress {
        total: agents.len(),
        ..Default::default()
    };

    for agent in agents {
        match agent.status {
            AgentStatus::Pending => progress.pending += 1,
            AgentStatus::Reviewing => progress.reviewing += 1,
            AgentStatus::Completed => progress.completed += 1,
        }
    }

    progress
}

/// Generate a one-line text summary of progress and scores.
pub fn summary_line(progress: &Progress, aggregate: Option<&AggregateStatistics>) -> String {
    let scores = match aggregate {
        Some(stats) => format!(
            "overall {:.0} | clarity {:.0} | ux {:.0} | value {:.0}",
            stats.overall, stats.clarity, stats.ux, stats.value_proposition
        ),
        None => "waiting for first review".to_string(),
    };

    format!(
        "{}/{} reviews ({}%) - {}",
        progress.completed,
        progress.total,
        progress.percent_complete(),
        scores
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::{completed_agent, pending_agent};

    #[test]
    fn test_mean_overall() {
        let agents = vec![
            completed_agent(1, "A", 80.0, "ok"),
            completed_agent(2, "B", 60.0, "ok"),
            completed_agent(3, "C", 100.0, "ok"),
        ];

        let stats = aggregate(&agents).unwrap();
        assert_eq!(stats.overall, 80.0);
        assert_eq!(stats.sample_size, 3);
    }

    #[test]
    fn test_dimensions_averaged_independently() {
        let mut agent = completed_agent(1, "A", 90.0, "ok");
        agent.ratings = Some(Ratings {
            overall: 90.0,
            clarity: 70.0,
            ux: 50.0,
            value_proposition: 30.0,
        });
        let agents = vec![agent, completed_agent(2, "B", 50.0, "ok")];

        let stats = aggregate(&agents).unwrap();
        assert_eq!(stats.overall, 70.0);
        assert_eq!(stats.clarity, 60.0);
        assert_eq!(stats.ux, 50.0);
        assert_eq!(stats.value_proposition, 40.0);
    }

    #[test]
    fn test_no_completed_agents_is_none() {
        assert_eq!(aggregate(&[]), None);
        assert_eq!(aggregate(&[pending_agent(1, "A")]), None);
    }

    #[test]
    fn test_zero_mean_distinct_from_none() {
        let stats = aggregate(&[completed_agent(1, "A", 0.0, "bad")]).unwrap();
        assert_eq!(stats.overall, 0.0);
    }

    #[test]
    fn test_pending_agents_do_not_change_aggregate() {
        let mut agents = vec![
            completed_agent(1, "A", 80.0, "ok"),
            completed_agent(2, "B", 60.0, "ok"),
        ];
        let before = aggregate(&agents);
        assert_eq!(aggregate(&agents), before);

        agents.push(pending_agent(3, "C"));
        assert_eq!(aggregate(&agents), before);
    }

    #[test]
    fn test_completed_without_ratings_skipped() {
        let mut broken = completed_agent(2, "B", 0.0, "ok");
        broken.ratings = None;
        let agents = vec![completed_agent(1, "A", 50.0, "ok"), broken];

        let stats = aggregate(&agents).unwrap();
        assert_eq!(stats.overall, 50.0);
        assert_eq!(stats.sample_size, 1);
    }

    #[test]
    fn test_progress_counts() {
        let mut reviewing = pending_agent(2, "B");
        reviewing.status = AgentStatus::Reviewing;
        let agents = vec![
            pending_agent(1, "A"),
            reviewing,
            completed_agent(3, "C", 70.0, "ok"),
            completed_agent(4, "D", 70.0, "ok"),
        ];

        let progress = progress(&agents);
        assert_eq!(progress.total, 4);
        assert_eq!(progress.pending, 1);
        assert_eq!(progress.reviewing, 1);
        assert_eq!(progress.completed, 2);
        assert_eq!(progress.percent_complete(), 50);
        assert!(!progress.is_finished());
    }

    #[test]
    fn test_empty_progress() {
        let progress = progress(&[]);
        assert_eq!(progress.percent_complete(), 0);
        assert!(!progress.is_finished());
    }

    #[test]
    fn test_summary_line() {
        let agents = vec![completed_agent(1, "A", 80.0, "ok"), pending_agent(2, "B")];
        let line = summary_line(&progress(&agents), aggregate(&agents).as_ref());
        assert!(line.starts_with("1/2 reviews (50%)"));
        assert!(line.contains("overall 80"));

        let line = summary_line(&Progress::default(), None);
        assert!(line.contains("waiting for first review"));
    }
}
