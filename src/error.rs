use serde::Serialize;

pub type Result<T, E = LeagueError> = std::result::Result<T, E>;

/// Coarse classification the calling shell uses to decide how to present a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    Validation,
    StateConflict,
    Precondition,
    ConfirmationRequired,
    NotFound,
    StorageUnavailable,
}

#[derive(Debug, thiserror::Error)]
pub enum LeagueError {
    #[error("{0}")]
    Validation(String),
    #[error("game {game}: {reason}")]
    InvalidScore { game: usize, reason: String },
    #[error("{0}")]
    StateConflict(String),
    #[error("{0}")]
    Precondition(String),
    #[error("{action} affects {impact} match(es); confirmation required")]
    ConfirmationRequired { action: String, impact: usize },
    #[error("{0} not found")]
    NotFound(String),
    #[error("league storage unavailable: {0}")]
    Storage(#[from] rusqlite::Error),
}

impl LeagueError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) | Self::InvalidScore { .. } => ErrorKind::Validation,
            Self::StateConflict(_) => ErrorKind::StateConflict,
            Self::Precondition(_) => ErrorKind::Precondition,
            Self::ConfirmationRequired { .. } => ErrorKind::ConfirmationRequired,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Storage(_) => ErrorKind::StorageUnavailable,
        }
    }

    /// Number of matches the rejected action would have touched, if it was held for confirmation.
    pub fn impact(&self) -> Option<usize> {
        match self {
            Self::ConfirmationRequired { impact, .. } => Some(*impact),
            _ => None,
        }
    }

    pub(crate) fn confirmation(action: impl Into<String>, impact: usize) -> Self {
        Self::ConfirmationRequired {
            action: action.into(),
            impact,
        }
    }

    pub(crate) fn invalid_score(game: usize, reason: impl Into<String>) -> Self {
        Self::InvalidScore {
            game,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ErrorKind, LeagueError};

    #[test]
    fn kinds_follow_taxonomy() {
        assert_eq!(
            LeagueError::invalid_score(2, "tie").kind(),
            ErrorKind::Validation
        );
        let err = LeagueError::confirmation("advance week", 3);
        assert_eq!(err.kind(), ErrorKind::ConfirmationRequired);
        assert_eq!(err.impact(), Some(3));
        assert_eq!(err.to_string(), "advance week affects 3 match(es); confirmation required");
    }
}
