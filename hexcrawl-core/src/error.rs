//! Rule errors raised by session commands

use crate::figure::FigureId;
use crate::hex::HexCoord;
use thiserror::Error;

/// Why a command was refused.
///
/// Everything except [`RulesError::EmptyResource`] is recoverable: the acting
/// player or monster is denied the action and may pick another one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RulesError {
    /// No path, out of range, or no line of sight when one is required
    #[error("invalid target: {0}")]
    InvalidTarget(String),

    /// Blocked by a condition (Immobilize, Disarm, Stun) or by figure state
    #[error("illegal action for {figure}: {reason}")]
    IllegalAction { figure: FigureId, reason: String },

    /// Attack modifier deck has no cards in either pile
    #[error("modifier deck of {0} is empty across both piles")]
    EmptyResource(FigureId),

    /// Coordinate is not part of the board
    #[error("hex {0} is not on the board")]
    OutOfBounds(HexCoord),

    #[error("no figure with id {0} in this session")]
    UnknownFigure(FigureId),

    /// A deck modification named a card the deck does not hold
    #[error("deck does not contain card {0}")]
    UnknownCard(String),
}

impl RulesError {
    /// Data-integrity faults that should abort the scenario session
    pub fn is_fatal(&self) -> bool {
        matches!(self, RulesError::EmptyResource(_))
    }

    pub(crate) fn illegal(figure: FigureId, reason: impl Into<String>) -> Self {
        RulesError::IllegalAction {
            figure,
            reason: reason.into(),
        }
    }
}

pub type RulesResult<T> = Result<T, RulesError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_empty_resource_is_fatal() {
        assert!(RulesError::EmptyResource(FigureId(1)).is_fatal());
        assert!(!RulesError::OutOfBounds(HexCoord::new(9, 9)).is_fatal());
        assert!(!RulesError::illegal(FigureId(2), "immobilized").is_fatal());
        assert!(!RulesError::InvalidTarget("no path".into()).is_fatal());
    }

    #[test]
    fn test_messages() {
        let err = RulesError::illegal(FigureId(3), "disarmed");
        assert_eq!(err.to_string(), "illegal action for #3: disarmed");
        assert_eq!(
            RulesError::OutOfBounds(HexCoord::new(1, -2)).to_string(),
            "hex (1, -2) is not on the board"
        );
    }
}
