//! Quiz error types.
//!
//! Load-time failures (`Load`, `InvalidRecord`) are recovered by the bank
//! loader's fallback policy. Everything else is returned synchronously to the
//! caller of the operation that triggered it, and the operation leaves the
//! in-memory state untouched.

use thiserror::Error;

/// Errors raised by the quiz core.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuizError {
    /// The bank source was unreachable, unparseable, or held no questions.
    #[error("failed to load question bank from {source_name}: {message}")]
    Load {
        source_name: String,
        message: String,
    },

    /// A record broke the text/options/answer contract.
    #[error("invalid question record #{index}: {reason}")]
    InvalidRecord { index: usize, reason: String },

    /// The topic filter matched no records.
    #[error("no questions match topic '{topic}'")]
    EmptySelection { topic: String },

    /// Navigation or an indexed answer outside `[0, len)`.
    #[error("question index {index} is out of range (session has {len} questions)")]
    OutOfRange { index: usize, len: usize },

    /// `previous()` was called on the first question.
    #[error("already at the first question")]
    BeforeFirst,

    /// The chosen key is not one of the question's option keys.
    #[error("question {index} has no option '{key}'")]
    UnknownOption { index: usize, key: String },

    /// The slot already showed instant feedback and cannot be changed.
    #[error("question {index} is locked after feedback")]
    SlotLocked { index: usize },

    /// The session was submitted; answers are frozen.
    #[error("session has already been submitted")]
    AlreadySubmitted,

    /// Scoring requires at least one question.
    #[error("a session must contain at least one question")]
    EmptySession,

    /// The answer vector does not line up with the session items.
    #[error("expected {expected} answers, got {actual}")]
    AnswerCountMismatch { expected: usize, actual: usize },

    /// A permutation source returned something that is not a permutation of `0..len`.
    #[error("permutation source returned an invalid permutation of length {len}")]
    InvalidPermutation { len: usize },
}

impl QuizError {
    /// Returns `true` for conditions that should be shown to the user, as
    /// opposed to programming-contract violations.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            QuizError::Load { .. }
                | QuizError::InvalidRecord { .. }
                | QuizError::EmptySelection { .. }
        )
    }

    pub(crate) fn load(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        QuizError::Load {
            source_name: source_name.into(),
            message: message.into(),
        }
    }

    pub(crate) fn invalid(index: usize, reason: impl Into<String>) -> Self {
        QuizError::InvalidRecord {
            index,
            reason: reason.into(),
        }
    }
}
