//! Submitted-session reports with JSON persistence and attempt comparison.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::QuizError;
use crate::model::{FeedbackPolicy, TopicFilter};
use crate::review::{render_transcript, ReviewItem, ReviewStatus};
use crate::scoring::{per_topic, Performance, ScoreSummary, TopicStats};
use crate::session::{SessionState, Submission};

/// Everything worth keeping about one submitted attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizReport {
    /// Id of the session the report was taken from.
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub submitted_at: DateTime<Utc>,
    pub policy: FeedbackPolicy,
    pub topic: TopicFilter,
    pub summary: ScoreSummary,
    pub performance: Performance,
    /// Review items in session order.
    pub items: Vec<ReviewItem>,
    /// Per-topic breakdown; empty when no question carries a topic.
    #[serde(default)]
    pub per_topic: BTreeMap<String, TopicStats>,
}

impl QuizReport {
    /// Build a report from a state and the submission it produced.
    pub fn from_submission(
        state: &SessionState,
        submission: &Submission,
    ) -> Result<Self, QuizError> {
        let session = state.session();
        Ok(Self {
            id: session.id,
            created_at: session.created_at,
            submitted_at: submission.submitted_at,
            policy: state.policy(),
            topic: session.topic.clone(),
            summary: submission.summary,
            performance: submission.summary.performance(),
            items: submission.review.clone(),
            per_topic: per_topic(session, state.answers())?,
        })
    }

    /// The plain-text transcript for this attempt.
    pub fn transcript(&self) -> String {
        render_transcript(&self.items, &self.summary)
    }

    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: QuizReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }

    /// Compare this attempt against an earlier one.
    ///
    /// Questions are matched by prompt text. Only a flip into or out of
    /// `Correct` counts as a change.
    pub fn compare(&self, baseline: &QuizReport) -> ReportComparison {
        let by_prompt = |report: &QuizReport| -> HashMap<String, ReviewStatus> {
            let mut map = HashMap::new();
            for item in &report.items {
                map.entry(item.prompt.clone()).or_insert(item.status);
            }
            map
        };

        let baseline_status = by_prompt(baseline);

        let mut regressions = Vec::new();
        let mut improvements = Vec::new();
        let mut unchanged = 0usize;
        let mut new_questions = 0usize;
        let mut seen = HashSet::new();

        for item in &self.items {
            if !seen.insert(item.prompt.as_str()) {
                continue;
            }
            let Some(&before) = baseline_status.get(&item.prompt) else {
                new_questions += 1;
                continue;
            };
            let change = QuestionChange {
                prompt: item.prompt.clone(),
                baseline: before,
                current: item.status,
            };
            match (
                before == ReviewStatus::Correct,
                item.status == ReviewStatus::Correct,
            ) {
                (true, false) => regressions.push(change),
                (false, true) => improvements.push(change),
                _ => unchanged += 1,
            }
        }

        let removed_questions = baseline_status
            .keys()
            .filter(|p| !seen.contains(p.as_str()))
            .count();

        ReportComparison {
            baseline_percentage: baseline.summary.percentage,
            current_percentage: self.summary.percentage,
            delta: i64::from(self.summary.percentage) - i64::from(baseline.summary.percentage),
            regressions,
            improvements,
            unchanged,
            new_questions,
            removed_questions,
        }
    }
}

/// Result of comparing two attempts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportComparison {
    pub baseline_percentage: u32,
    pub current_percentage: u32,
    /// Percentage points gained (negative when lost).
    pub delta: i64,
    /// Questions answered correctly before but not now.
    pub regressions: Vec<QuestionChange>,
    /// Questions answered correctly now but not before.
    pub improvements: Vec<QuestionChange>,
    pub unchanged: usize,
    /// Questions in current but not baseline.
    pub new_questions: usize,
    /// Questions in baseline but not current.
    pub removed_questions: usize,
}

/// A question whose outcome flipped between attempts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionChange {
    pub prompt: String,
    pub baseline: ReviewStatus,
    pub current: ReviewStatus,
}

impl ReportComparison {
    /// Format the comparison as markdown.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();

        md.push_str(&format!(
            "**Score:** {}% -> {}% ({:+} points)\n\n",
            self.baseline_percentage, self.current_percentage, self.delta
        ));
        md.push_str(&format!(
            "**Summary:** {} regressions, {} improvements, {} unchanged, {} new, {} removed\n\n",
            self.regressions.len(),
            self.improvements.len(),
            self.unchanged,
            self.new_questions,
            self.removed_questions
        ));

        for (title, changes) in [
            ("Regressions", &self.regressions),
            ("Improvements", &self.improvements),
        ] {
            if changes.is_empty() {
                continue;
            }
            md.push_str(&format!("### {title}\n\n"));
            md.push_str("| Question | Before | Now |\n");
            md.push_str("|----------|--------|-----|\n");
            for c in changes {
                md.push_str(&format!(
                    "| {} | {} | {} |\n",
                    c.prompt.replace('|', "\\|"),
                    c.baseline,
                    c.current
                ));
            }
            md.push('\n');
        }

        md
    }

    /// Returns true if any question went from correct to not correct.
    pub fn has_regressions(&self) -> bool {
        !self.regressions.is_empty()
    }
}
