pub mod bracket;
pub mod config;
pub mod error;
pub mod league;
pub mod model;
pub mod playoffs;
pub mod profile;
pub mod rankings;
pub mod report;
pub mod schedule;
pub mod store;
pub mod week;

pub use error::{ErrorKind, LeagueError, Result};
pub use league::{League, LeagueStatus, PlayoffProgress, ScheduleSummary};
