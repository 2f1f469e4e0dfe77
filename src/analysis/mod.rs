//! Derived views over the agent collection.
//!
//! Everything here is a pure function of the current snapshot, apart from
//! `Insights`, which memoizes those functions against the live store.

pub mod aggregator;
pub mod insights;
pub mod themes;
pub mod views;

pub use aggregator::{summary_line, AggregateStatistics, Progress};
pub use insights::Insights;
pub use themes::{ThemeConfig, ThemeMatch, ThemeReport};
pub use views::{sort_completed, ScoreTier, SortOrder};
