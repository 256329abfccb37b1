//! Mutable per-session state: position, answers, running score, submission.
//!
//! One engine serves both feedback policies. Under `Instant` the running score
//! is kept incrementally and, unless disabled, a slot locks once its feedback
//! has been shown. Under `Deferred` nothing is scored until [`SessionState::submit`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::builder::reshuffle_options;
use crate::error::QuizError;
use crate::model::{FeedbackPolicy, QuizOption, Session, SessionQuestion};
use crate::review::{build_review, ReviewItem};
use crate::scoring::{score, ScoreSummary};
use crate::shuffle::Shuffler;

/// Feedback revealed right after an instant-mode answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feedback {
    pub correct: bool,
    pub correct_key: String,
    pub explanation: Option<String>,
}

/// What the caller learns from a successful [`SessionState::answer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerOutcome {
    /// Index of the answered slot.
    pub index: usize,
    /// Answer held by the slot before this call.
    pub previous: Option<String>,
    /// Present only under the instant policy.
    pub feedback: Option<Feedback>,
}

/// Whether a submission needs confirmation first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitCheck {
    Ready,
    /// Some slots are still unanswered; submitting is allowed once confirmed.
    Unanswered { count: usize },
}

/// Position and completion counters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    /// Zero-based current slot.
    pub index: usize,
    pub total: usize,
    pub answered: usize,
}

impl Progress {
    /// Share of answered slots in `[0, 1]`.
    pub fn fraction_answered(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.answered as f64 / self.total as f64
        }
    }
}

/// An option as the presentation layer should draw it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionView {
    pub key: String,
    pub text: String,
    pub selected: bool,
    /// `Some` only once correctness may be revealed for this slot.
    pub correct: Option<bool>,
}

/// Read-only snapshot of the current question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionView {
    /// One-based question number.
    pub number: usize,
    pub total: usize,
    pub text: String,
    pub topic: Option<String>,
    pub options: Vec<OptionView>,
    pub locked: bool,
    pub feedback: Option<Feedback>,
}

/// Final result of a submission.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub submitted_at: DateTime<Utc>,
    pub summary: ScoreSummary,
    pub review: Vec<ReviewItem>,
}

/// The mutable record of one running session.
#[derive(Debug, Clone)]
pub struct SessionState {
    session: Session,
    policy: FeedbackPolicy,
    lock_after_feedback: bool,
    current: usize,
    answers: Vec<Option<String>>,
    locked: Vec<bool>,
    score: usize,
    submitted_at: Option<DateTime<Utc>>,
}

impl SessionState {
    /// Start a session at its first question with every slot unanswered.
    ///
    /// Fails with [`QuizError::EmptySession`] for a session without items.
    pub fn new(session: Session, policy: FeedbackPolicy) -> Result<Self, QuizError> {
        if session.is_empty() {
            return Err(QuizError::EmptySession);
        }
        let len = session.len();
        Ok(Self {
            session,
            policy,
            lock_after_feedback: true,
            current: 0,
            answers: vec![None; len],
            locked: vec![false; len],
            score: 0,
            submitted_at: None,
        })
    }

    /// Allow changing an answer after instant feedback.
    ///
    /// Has no effect under the deferred policy, where slots never lock.
    #[must_use]
    pub fn with_answer_lock(mut self, lock: bool) -> Self {
        self.lock_after_feedback = lock;
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn policy(&self) -> FeedbackPolicy {
        self.policy
    }

    pub fn len(&self) -> usize {
        self.session.len()
    }

    pub fn is_empty(&self) -> bool {
        self.session.is_empty()
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn answers(&self) -> &[Option<String>] {
        &self.answers
    }

    pub fn answer_at(&self, index: usize) -> Option<&str> {
        self.answers.get(index).and_then(|a| a.as_deref())
    }

    /// Running score. Under the deferred policy this stays 0 until submission.
    pub fn score(&self) -> usize {
        self.score
    }

    /// `score/total` as shown next to the question.
    pub fn score_display(&self) -> String {
        format!("{}/{}", self.score, self.len())
    }

    pub fn is_locked(&self, index: usize) -> bool {
        self.locked.get(index).copied().unwrap_or(false)
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted_at.is_some()
    }

    pub fn submitted_at(&self) -> Option<DateTime<Utc>> {
        self.submitted_at
    }

    fn check_index(&self, index: usize) -> Result<&SessionQuestion, QuizError> {
        self.session.items.get(index).ok_or(QuizError::OutOfRange {
            index,
            len: self.len(),
        })
    }

    /// Record `key` as the answer for slot `index`.
    ///
    /// All-or-nothing: on any error the answers, locks and score are unchanged.
    pub fn answer(&mut self, index: usize, key: &str) -> Result<AnswerOutcome, QuizError> {
        if self.is_submitted() {
            return Err(QuizError::AlreadySubmitted);
        }
        let question = self.check_index(index)?;
        if !question.has_option(key) {
            return Err(QuizError::UnknownOption {
                index,
                key: key.to_string(),
            });
        }
        if self.locked[index] {
            return Err(QuizError::SlotLocked { index });
        }

        let now_correct = question.is_correct(key);
        let feedback = match self.policy {
            FeedbackPolicy::Instant => Some(Feedback {
                correct: now_correct,
                correct_key: question.correct_key.clone(),
                explanation: question.explanation.clone(),
            }),
            FeedbackPolicy::Deferred => None,
        };
        let was_correct = self.answers[index]
            .as_deref()
            .is_some_and(|prev| question.is_correct(prev));

        let previous = self.answers[index].replace(key.to_string());

        if self.policy == FeedbackPolicy::Instant {
            match (was_correct, now_correct) {
                (false, true) => self.score += 1,
                (true, false) => self.score -= 1,
                _ => {}
            }
            if self.lock_after_feedback {
                self.locked[index] = true;
            }
        }

        tracing::debug!(
            "answered question {} with '{}' (previous: {:?})",
            index + 1,
            key,
            previous
        );

        Ok(AnswerOutcome {
            index,
            previous,
            feedback,
        })
    }

    /// Answer the current slot.
    pub fn answer_current(&mut self, key: &str) -> Result<AnswerOutcome, QuizError> {
        self.answer(self.current, key)
    }

    /// Move to `index`. Never touches answers.
    pub fn go_to(&mut self, index: usize) -> Result<(), QuizError> {
        self.check_index(index)?;
        self.current = index;
        Ok(())
    }

    pub fn has_next(&self) -> bool {
        self.current + 1 < self.len()
    }

    pub fn has_previous(&self) -> bool {
        self.current > 0
    }

    /// Advance one slot; fails at the last slot.
    pub fn next(&mut self) -> Result<usize, QuizError> {
        self.go_to(self.current + 1)?;
        Ok(self.current)
    }

    /// Step back one slot; fails at the first slot.
    pub fn previous(&mut self) -> Result<usize, QuizError> {
        let index = self.current.checked_sub(1).ok_or(QuizError::BeforeFirst)?;
        self.go_to(index)?;
        Ok(self.current)
    }

    pub fn answered_count(&self) -> usize {
        self.answers.iter().filter(|a| a.is_some()).count()
    }

    pub fn unanswered_count(&self) -> usize {
        self.len() - self.answered_count()
    }

    pub fn progress(&self) -> Progress {
        Progress {
            index: self.current,
            total: self.len(),
            answered: self.answered_count(),
        }
    }

    /// Submitted, or sitting on the answered last slot.
    pub fn is_complete(&self) -> bool {
        self.is_submitted() || (!self.has_next() && self.answers[self.current].is_some())
    }

    /// Whether `submit` should be confirmed first.
    pub fn submit_check(&self) -> SubmitCheck {
        match self.unanswered_count() {
            0 => SubmitCheck::Ready,
            count => SubmitCheck::Unanswered { count },
        }
    }

    /// Score every slot against its correct key and freeze the answers.
    ///
    /// Submission is always allowed; unanswered slots count as such.
    /// Submitting twice re-scores the same answers and keeps the first
    /// submission time.
    pub fn submit(&mut self) -> Result<Submission, QuizError> {
        let summary = score(&self.session, &self.answers)?;
        if self.policy == FeedbackPolicy::Instant {
            debug_assert_eq!(self.score, summary.correct, "running tally drifted");
        }
        self.score = summary.correct;
        let submitted_at = *self.submitted_at.get_or_insert_with(Utc::now);

        tracing::info!(
            "session {} submitted: {}/{} ({}%), {} unanswered",
            self.session.id,
            summary.correct,
            summary.total,
            summary.percentage,
            summary.unanswered
        );

        Ok(Submission {
            submitted_at,
            summary,
            review: build_review(&self.session, &self.answers)?,
        })
    }

    /// Whether correctness may be shown for `index` right now.
    fn reveals(&self, index: usize) -> bool {
        self.is_submitted()
            || (self.policy == FeedbackPolicy::Instant && self.answers[index].is_some())
    }

    /// Snapshot of the current question for the presentation layer.
    pub fn current_view(&self) -> QuestionView {
        let index = self.current;
        let question = &self.session.items[index];
        let chosen = self.answers[index].as_deref();
        let reveal = self.reveals(index);

        let options = question
            .options
            .iter()
            .map(|QuizOption { key, text }| OptionView {
                key: key.clone(),
                text: text.clone(),
                selected: chosen == Some(key.as_str()),
                correct: reveal.then(|| question.is_correct(key)),
            })
            .collect();

        let feedback = match chosen {
            Some(key) if reveal => Some(Feedback {
                correct: question.is_correct(key),
                correct_key: question.correct_key.clone(),
                explanation: question.explanation.clone(),
            }),
            _ => None,
        };

        QuestionView {
            number: index + 1,
            total: self.len(),
            text: question.text.clone(),
            topic: question.topic.clone(),
            options,
            locked: self.locked[index] || self.is_submitted(),
            feedback,
        }
    }

    /// A fresh state over the same questions, in the same order, with options
    /// shuffled again. Policy and lock setting carry over.
    pub fn retake(&self, shuffler: &mut dyn Shuffler) -> Result<SessionState, QuizError> {
        let session = reshuffle_options(&self.session, shuffler)?;
        Ok(SessionState::new(session, self.policy)?.with_answer_lock(self.lock_after_feedback))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TopicFilter;
    use crate::shuffle::RandomShuffler;
    use uuid::Uuid;

    fn question(correct: &str) -> SessionQuestion {
        SessionQuestion {
            source_index: 0,
            text: format!("answer is {correct}"),
            options: ["a", "b", "c"]
                .iter()
                .map(|k| QuizOption::new(*k, k.to_uppercase()))
                .collect(),
            correct_key: correct.into(),
            topic: Some("T".into()),
            explanation: Some("because".into()),
            sequence_hint: None,
        }
    }

    fn session(correct: &[&str]) -> Session {
        Session {
            id: Uuid::nil(),
            created_at: Utc::now(),
            topic: TopicFilter::All,
            items: correct.iter().map(|c| question(c)).collect(),
        }
    }

    fn state(policy: FeedbackPolicy) -> SessionState {
        SessionState::new(session(&["a", "c", "b"]), policy).unwrap()
    }

    #[test]
    fn empty_session_is_rejected() {
        let err = SessionState::new(session(&[]), FeedbackPolicy::Instant).unwrap_err();
        assert_eq!(err, QuizError::EmptySession);
    }

    #[test]
    fn instant_answer_locks_and_counts_once() {
        let mut s = state(FeedbackPolicy::Instant);
        let outcome = s.answer(0, "a").unwrap();
        assert_eq!(outcome.feedback.as_ref().map(|f| f.correct), Some(true));
        assert_eq!(s.score(), 1);
        assert!(s.is_locked(0));

        let err = s.answer(0, "b").unwrap_err();
        assert_eq!(err, QuizError::SlotLocked { index: 0 });
        assert_eq!(s.score(), 1);
        assert_eq!(s.answer_at(0), Some("a"));
    }

    #[test]
    fn instant_without_lock_adjusts_up_and_down() {
        let mut s = state(FeedbackPolicy::Instant).with_answer_lock(false);
        s.answer(1, "a").unwrap(); // wrong
        assert_eq!(s.score(), 0);
        s.answer(1, "c").unwrap(); // wrong -> right
        assert_eq!(s.score(), 1);
        s.answer(1, "c").unwrap(); // right -> right
        assert_eq!(s.score(), 1);
        s.answer(1, "b").unwrap(); // right -> wrong
        assert_eq!(s.score(), 0);
        s.answer(0, "a").unwrap(); // first-time right
        assert_eq!(s.score(), 1);
        assert!(!s.is_locked(1));
    }

    #[test]
    fn instant_running_tally_matches_submission() {
        let mut s = state(FeedbackPolicy::Instant).with_answer_lock(false);
        for (i, k) in [(0, "b"), (0, "a"), (2, "b"), (2, "a"), (1, "c")] {
            s.answer(i, k).unwrap();
        }
        let running = s.score();
        let submission = s.submit().unwrap();
        assert_eq!(running, submission.summary.correct);
    }

    #[test]
    fn deferred_scores_only_on_submit() {
        let mut s = state(FeedbackPolicy::Deferred);
        let outcome = s.answer(0, "a").unwrap();
        assert!(outcome.feedback.is_none());
        s.answer(0, "b").unwrap();
        s.answer(0, "a").unwrap();
        s.answer(2, "b").unwrap();
        assert_eq!(s.score(), 0);
        assert!(!s.is_locked(0));

        let submission = s.submit().unwrap();
        assert_eq!(submission.summary.correct, 2);
        assert_eq!(submission.summary.unanswered, 1);
        assert_eq!(s.score(), 2);
    }

    #[test]
    fn deferred_score_depends_only_on_final_answers() {
        let mut direct = state(FeedbackPolicy::Deferred);
        for (i, k) in [(0, "a"), (1, "b"), (2, "b")] {
            direct.answer(i, k).unwrap();
        }

        let mut winding = state(FeedbackPolicy::Deferred);
        for (i, k) in [(1, "c"), (0, "c"), (2, "b"), (0, "a"), (1, "b")] {
            winding.answer(i, k).unwrap();
        }

        assert_eq!(
            direct.submit().unwrap().summary,
            winding.submit().unwrap().summary
        );
    }

    #[test]
    fn invalid_answers_leave_state_unchanged() {
        let mut s = state(FeedbackPolicy::Instant);
        assert_eq!(
            s.answer(3, "a").unwrap_err(),
            QuizError::OutOfRange { index: 3, len: 3 }
        );
        assert_eq!(
            s.answer(0, "z").unwrap_err(),
            QuizError::UnknownOption {
                index: 0,
                key: "z".into()
            }
        );
        assert_eq!(s.answered_count(), 0);
        assert_eq!(s.score(), 0);
        assert!(!s.is_locked(0));
    }

    #[test]
    fn navigation_is_bounds_checked() {
        let mut s = state(FeedbackPolicy::Deferred);
        assert_eq!(s.previous().unwrap_err(), QuizError::BeforeFirst);
        assert_eq!(
            s.previous().unwrap_err().to_string(),
            "already at the first question"
        );
        assert_eq!(s.current_index(), 0);
        assert_eq!(s.next().unwrap(), 1);
        assert_eq!(s.next().unwrap(), 2);
        assert_eq!(
            s.next().unwrap_err(),
            QuizError::OutOfRange { index: 3, len: 3 }
        );
        assert_eq!(s.current_index(), 2);
        assert_eq!(s.previous().unwrap(), 1);
        assert!(s.go_to(7).is_err());
        assert_eq!(s.current_index(), 1);
        s.go_to(0).unwrap();
        assert!(!s.has_previous());
        assert!(s.has_next());
    }

    #[test]
    fn navigation_never_alters_answers() {
        let mut s = state(FeedbackPolicy::Deferred);
        s.answer_current("b").unwrap();
        s.next().unwrap();
        s.answer_current("c").unwrap();
        s.previous().unwrap();
        s.go_to(2).unwrap();
        assert_eq!(
            s.answers(),
            &[Some("b".to_string()), Some("c".to_string()), None]
        );
    }

    #[test]
    fn completion_requires_last_slot_answered_or_submit() {
        let mut s = state(FeedbackPolicy::Deferred);
        s.answer(2, "b").unwrap();
        assert!(!s.is_complete());
        s.go_to(2).unwrap();
        assert!(s.is_complete());

        let mut t = state(FeedbackPolicy::Deferred);
        assert!(!t.is_complete());
        t.submit().unwrap();
        assert!(t.is_complete());
    }

    #[test]
    fn submit_check_counts_unanswered() {
        let mut s = state(FeedbackPolicy::Instant);
        assert_eq!(s.submit_check(), SubmitCheck::Unanswered { count: 3 });
        s.answer(0, "a").unwrap();
        s.answer(1, "a").unwrap();
        s.answer(2, "a").unwrap();
        assert_eq!(s.submit_check(), SubmitCheck::Ready);
    }

    #[test]
    fn submitted_sessions_are_frozen_and_rescoring_is_stable() {
        let mut s = state(FeedbackPolicy::Deferred);
        s.answer(0, "a").unwrap();
        let first = s.submit().unwrap();
        let second = s.submit().unwrap();
        assert_eq!(first.summary, second.summary);
        assert_eq!(first.submitted_at, second.submitted_at);
        assert_eq!(s.answer(1, "c").unwrap_err(), QuizError::AlreadySubmitted);
    }

    #[test]
    fn view_hides_correctness_until_allowed() {
        let mut s = state(FeedbackPolicy::Deferred);
        s.answer(0, "b").unwrap();
        let view = s.current_view();
        assert_eq!(view.number, 1);
        assert_eq!(view.total, 3);
        assert!(view.options.iter().all(|o| o.correct.is_none()));
        assert!(view.options.iter().any(|o| o.selected && o.key == "b"));
        assert!(view.feedback.is_none());

        s.submit().unwrap();
        let view = s.current_view();
        assert!(view.locked);
        assert_eq!(view.feedback.map(|f| f.correct), Some(false));
    }

    #[test]
    fn instant_view_shows_feedback_after_answer() {
        let mut s = state(FeedbackPolicy::Instant);
        assert!(s.current_view().feedback.is_none());
        s.answer_current("a").unwrap();
        let view = s.current_view();
        assert!(view.locked);
        let fb = view.feedback.unwrap();
        assert!(fb.correct);
        assert_eq!(fb.explanation.as_deref(), Some("because"));
        assert_eq!(
            view.options.iter().filter(|o| o.correct == Some(true)).count(),
            1
        );
    }

    #[test]
    fn progress_and_score_display() {
        let mut s = state(FeedbackPolicy::Instant);
        s.answer(0, "a").unwrap();
        let p = s.progress();
        assert_eq!((p.index, p.total, p.answered), (0, 3, 1));
        assert!((p.fraction_answered() - 1.0 / 3.0).abs() < 1e-9);
        assert_eq!(s.score_display(), "1/3");
    }

    #[test]
    fn retake_resets_answers_and_keeps_order() {
        let mut s = state(FeedbackPolicy::Instant).with_answer_lock(false);
        s.answer(0, "a").unwrap();
        s.submit().unwrap();

        let mut shuffler = RandomShuffler::seeded(4);
        let again = s.retake(&mut shuffler).unwrap();
        assert_eq!(again.answered_count(), 0);
        assert_eq!(again.score(), 0);
        assert!(!again.is_submitted());
        assert_eq!(again.policy(), FeedbackPolicy::Instant);
        for (before, after) in s.session().items.iter().zip(&again.session().items) {
            assert_eq!(before.text, after.text);
            assert_eq!(
                before.option_text(&before.correct_key),
                after.option_text(&after.correct_key)
            );
        }
    }
}
