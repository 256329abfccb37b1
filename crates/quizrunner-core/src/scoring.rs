//! Scoring: per-slot correctness, aggregate summary, and per-topic breakdown.
//!
//! Everything here is a pure function of `(session, answers)`; calling it
//! twice gives the same result.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::QuizError;
use crate::model::{Session, SessionQuestion};

/// Aggregate result of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreSummary {
    pub correct: usize,
    pub incorrect: usize,
    pub unanswered: usize,
    pub total: usize,
    /// `round(100 * correct / total)`, halves rounded up.
    pub percentage: u32,
}

impl ScoreSummary {
    pub fn performance(&self) -> Performance {
        Performance::from_percentage(self.percentage)
    }

    pub fn answered(&self) -> usize {
        self.correct + self.incorrect
    }
}

/// Whether `answer` matches the question's correct key.
pub fn is_correct(question: &SessionQuestion, answer: Option<&str>) -> bool {
    answer.is_some_and(|a| question.is_correct(a))
}

/// Integer percentage rounded half up. `total` must be non-zero.
pub fn percentage(correct: usize, total: usize) -> u32 {
    debug_assert!(total > 0);
    ((200 * correct + total) / (2 * total)) as u32
}

fn check_shape(session: &Session, answers: &[Option<String>]) -> Result<(), QuizError> {
    if session.is_empty() {
        return Err(QuizError::EmptySession);
    }
    if answers.len() != session.len() {
        return Err(QuizError::AnswerCountMismatch {
            expected: session.len(),
            actual: answers.len(),
        });
    }
    Ok(())
}

/// Score a session against an answer vector.
pub fn score(session: &Session, answers: &[Option<String>]) -> Result<ScoreSummary, QuizError> {
    check_shape(session, answers)?;

    let total = session.len();
    let mut correct = 0;
    let mut unanswered = 0;
    for (question, answer) in session.items.iter().zip(answers) {
        match answer.as_deref() {
            None => unanswered += 1,
            Some(key) if question.is_correct(key) => correct += 1,
            Some(_) => {}
        }
    }

    Ok(ScoreSummary {
        correct,
        incorrect: total - correct - unanswered,
        unanswered,
        total,
        percentage: percentage(correct, total),
    })
}

/// Correct/total for one topic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicStats {
    pub correct: usize,
    pub total: usize,
}

impl TopicStats {
    pub fn percentage(&self) -> u32 {
        if self.total == 0 {
            0
        } else {
            percentage(self.correct, self.total)
        }
    }
}

/// Per-topic breakdown; untagged questions are left out.
pub fn per_topic(
    session: &Session,
    answers: &[Option<String>],
) -> Result<BTreeMap<String, TopicStats>, QuizError> {
    check_shape(session, answers)?;

    let mut stats: BTreeMap<String, TopicStats> = BTreeMap::new();
    for (question, answer) in session.items.iter().zip(answers) {
        let Some(topic) = question.topic.as_deref().filter(|t| !t.trim().is_empty()) else {
            continue;
        };
        let entry = stats.entry(topic.to_string()).or_default();
        entry.total += 1;
        if is_correct(question, answer.as_deref()) {
            entry.correct += 1;
        }
    }
    Ok(stats)
}

/// Coarse performance band for the results screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Performance {
    Excellent,
    Great,
    Good,
    KeepPracticing,
}

impl Performance {
    pub fn from_percentage(percentage: u32) -> Self {
        match percentage {
            90.. => Performance::Excellent,
            70..=89 => Performance::Great,
            50..=69 => Performance::Good,
            _ => Performance::KeepPracticing,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Performance::Excellent => "Excellent job! You have mastered this material.",
            Performance::Great => "Great work! You are doing well.",
            Performance::Good => "Good effort. Keep practicing to improve further.",
            Performance::KeepPracticing => "Keep practicing. You will get better with more study.",
        }
    }
}

impl fmt::Display for Performance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}
