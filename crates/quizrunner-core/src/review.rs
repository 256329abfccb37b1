//! Per-question review and the plain-text results transcript.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::QuizError;
use crate::model::{QuizOption, Session};
use crate::scoring::ScoreSummary;

/// Outcome of a single question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewStatus {
    Correct,
    Incorrect,
    Unanswered,
}

impl ReviewStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ReviewStatus::Correct => "Correct",
            ReviewStatus::Incorrect => "Incorrect",
            ReviewStatus::Unanswered => "Not answered",
        }
    }
}

impl fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReviewStatus::Correct => write!(f, "correct"),
            ReviewStatus::Incorrect => write!(f, "incorrect"),
            ReviewStatus::Unanswered => write!(f, "unanswered"),
        }
    }
}

impl FromStr for ReviewStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "correct" => Ok(ReviewStatus::Correct),
            "incorrect" | "wrong" => Ok(ReviewStatus::Incorrect),
            "unanswered" | "skipped" => Ok(ReviewStatus::Unanswered),
            other => Err(format!("unknown review status: {other}")),
        }
    }
}

/// Which review items to show.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReviewFilter {
    #[default]
    All,
    Only(ReviewStatus),
}

impl ReviewFilter {
    pub fn accepts(&self, status: ReviewStatus) -> bool {
        match self {
            ReviewFilter::All => true,
            ReviewFilter::Only(wanted) => *wanted == status,
        }
    }
}

impl FromStr for ReviewFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            Ok(ReviewFilter::All)
        } else {
            s.parse().map(ReviewFilter::Only)
        }
    }
}

/// Review entry for one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewItem {
    /// One-based position in the session.
    pub number: usize,
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    pub status: ReviewStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chosen: Option<QuizOption>,
    pub correct: QuizOption,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

/// One review item per session question, in session order.
pub fn build_review(
    session: &Session,
    answers: &[Option<String>],
) -> Result<Vec<ReviewItem>, QuizError> {
    if answers.len() != session.len() {
        return Err(QuizError::AnswerCountMismatch {
            expected: session.len(),
            actual: answers.len(),
        });
    }

    let items = session
        .items
        .iter()
        .zip(answers)
        .enumerate()
        .map(|(i, (question, answer))| {
            let chosen = answer.as_deref().map(|key| {
                QuizOption::new(key, question.option_text(key).unwrap_or_default())
            });
            let status = match answer.as_deref() {
                None => ReviewStatus::Unanswered,
                Some(key) if question.is_correct(key) => ReviewStatus::Correct,
                Some(_) => ReviewStatus::Incorrect,
            };
            ReviewItem {
                number: i + 1,
                prompt: question.text.clone(),
                topic: question.topic.clone(),
                status,
                chosen,
                correct: question.correct_option().clone(),
                explanation: question
                    .explanation
                    .clone()
                    .filter(|e| !e.trim().is_empty()),
            }
        })
        .collect();
    Ok(items)
}

/// Items matching `filter`, in their original order.
pub fn filter(items: &[ReviewItem], filter: ReviewFilter) -> Vec<&ReviewItem> {
    items.iter().filter(|item| filter.accepts(item.status)).collect()
}

fn option_line(option: &QuizOption) -> String {
    format!("{}. {}", option.key.to_uppercase(), option.text)
}

/// Deterministic plain-text transcript of a scored session.
///
/// Identical inputs give byte-identical output; no clock or locale is read.
pub fn export_text(
    session: &Session,
    answers: &[Option<String>],
    summary: &ScoreSummary,
) -> Result<String, QuizError> {
    let items = build_review(session, answers)?;
    Ok(render_transcript(&items, summary))
}

/// Render review items and their summary as the text transcript.
pub fn render_transcript(items: &[ReviewItem], summary: &ScoreSummary) -> String {
    let mut out = String::from("QUIZ RESULTS\n\n");
    out.push_str(&format!(
        "Score: {}/{} ({}%)\n",
        summary.correct, summary.total, summary.percentage
    ));
    out.push_str(&format!("Correct: {}\n", summary.correct));
    out.push_str(&format!("Incorrect: {}\n", summary.incorrect));
    out.push_str(&format!("Unanswered: {}\n\n", summary.unanswered));
    out.push_str("QUESTION DETAILS:\n\n");

    for item in items {
        out.push_str(&format!("Question {}: {}\n", item.number, item.prompt));
        if let Some(topic) = &item.topic {
            out.push_str(&format!("({topic})\n"));
        }
        match &item.chosen {
            Some(chosen) => out.push_str(&format!("Your answer: {}\n", option_line(chosen))),
            None => out.push_str("Not answered.\n"),
        }
        if item.status != ReviewStatus::Correct {
            out.push_str(&format!("Correct answer: {}\n", option_line(&item.correct)));
        }
        out.push_str(&format!("Result: {}\n", item.status.label()));
        if let Some(explanation) = &item.explanation {
            out.push_str(&format!("Explanation: {explanation}\n"));
        }
        out.push('\n');
    }
    out
}

/// Pull `(correct, total, percentage)` back out of a transcript header.
pub fn parse_score_line(transcript: &str) -> Option<(usize, usize, u32)> {
    let line = transcript.lines().find_map(|l| l.strip_prefix("Score: "))?;
    let (fraction, pct) = line.split_once(' ')?;
    let (correct, total) = fraction.split_once('/')?;
    let pct = pct.strip_prefix('(')?.strip_suffix("%)")?;
    Some((correct.parse().ok()?, total.parse().ok()?, pct.parse().ok()?))
}
