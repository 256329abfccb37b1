//! Session construction: topic filter, sampling, and per-question option shuffle.

use chrono::Utc;
use uuid::Uuid;

use crate::bank::QuestionBank;
use crate::error::QuizError;
use crate::model::{
    QuestionCount, QuestionRecord, QuizOption, Session, SessionQuestion, TopicFilter,
};
use crate::shuffle::{is_permutation, Shuffler};

/// Builds a [`Session`] from a bank.
#[derive(Debug, Clone)]
pub struct SessionBuilder<'a> {
    bank: &'a QuestionBank,
    count: QuestionCount,
    topic: TopicFilter,
    shuffle_options: bool,
}

impl<'a> SessionBuilder<'a> {
    #[must_use]
    pub fn new(bank: &'a QuestionBank) -> Self {
        Self {
            bank,
            count: QuestionCount::All,
            topic: TopicFilter::All,
            shuffle_options: true,
        }
    }

    #[must_use]
    pub fn with_count(mut self, count: QuestionCount) -> Self {
        self.count = count;
        self
    }

    #[must_use]
    pub fn with_topic(mut self, topic: TopicFilter) -> Self {
        self.topic = topic;
        self
    }

    /// Enable or disable the per-question option shuffle.
    #[must_use]
    pub fn with_option_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle_options = shuffle;
        self
    }

    /// Filter, permute, take the resolved count, then shuffle each question's options.
    ///
    /// Fails with [`QuizError::EmptySelection`] when the topic matches nothing.
    /// An oversized count is clamped, never padded.
    pub fn build(&self, shuffler: &mut dyn Shuffler) -> Result<Session, QuizError> {
        let pool = self.bank.filtered(&self.topic);
        if pool.is_empty() {
            return Err(QuizError::EmptySelection {
                topic: self.topic.to_string(),
            });
        }

        let order = checked_permutation(shuffler, pool.len())?;
        let take = self.count.resolve(pool.len());

        let mut items = Vec::with_capacity(take);
        for &position in order.iter().take(take) {
            let (source_index, record) = pool[position];
            let question = if self.shuffle_options {
                shuffle_question(items.len(), source_index, record, shuffler)?
            } else {
                snapshot(source_index, record)
            };
            items.push(question);
        }

        tracing::debug!(
            "built session: {} of {} questions (topic: {}, option shuffle: {})",
            items.len(),
            pool.len(),
            self.topic,
            self.shuffle_options
        );

        Ok(Session {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            topic: self.topic.clone(),
            items,
        })
    }
}

fn checked_permutation(shuffler: &mut dyn Shuffler, len: usize) -> Result<Vec<usize>, QuizError> {
    let perm = shuffler.permutation(len);
    if is_permutation(&perm, len) {
        Ok(perm)
    } else {
        Err(QuizError::InvalidPermutation { len })
    }
}

fn snapshot(source_index: usize, record: &QuestionRecord) -> SessionQuestion {
    SessionQuestion {
        source_index,
        text: record.text.clone(),
        options: record.options.clone(),
        correct_key: record.correct_key.clone(),
        topic: record.topic.clone(),
        explanation: record.explanation.clone(),
        sequence_hint: record.sequence_hint.clone(),
    }
}

fn shuffle_question(
    slot: usize,
    source_index: usize,
    record: &QuestionRecord,
    shuffler: &mut dyn Shuffler,
) -> Result<SessionQuestion, QuizError> {
    let (options, correct_key) =
        relabel(slot, &record.options, &record.correct_key, shuffler)?;
    Ok(SessionQuestion {
        options,
        correct_key,
        ..snapshot(source_index, record)
    })
}

/// Move option texts between the fixed key slots.
///
/// Slot `i` keeps key `options[i].key` and receives the text from
/// `options[perm[i]]`. The returned key is whichever slot now holds the text
/// that was under `correct_key`. `question` is the session slot, used in
/// errors.
pub fn relabel(
    question: usize,
    options: &[QuizOption],
    correct_key: &str,
    shuffler: &mut dyn Shuffler,
) -> Result<(Vec<QuizOption>, String), QuizError> {
    let perm = checked_permutation(shuffler, options.len())?;
    let original_correct = options
        .iter()
        .position(|o| o.key == correct_key)
        .ok_or_else(|| QuizError::UnknownOption {
            index: question,
            key: correct_key.to_string(),
        })?;

    let mut new_correct = String::new();
    let shuffled = options
        .iter()
        .zip(&perm)
        .map(|(slot, &from)| {
            if from == original_correct {
                new_correct = slot.key.clone();
            }
            QuizOption {
                key: slot.key.clone(),
                text: options[from].text.clone(),
            }
        })
        .collect();

    Ok((shuffled, new_correct))
}

/// Convenience wrapper: `build(bank, requestedCount, topicFilter)`.
pub fn build_session(
    bank: &QuestionBank,
    count: QuestionCount,
    topic: TopicFilter,
    shuffler: &mut dyn Shuffler,
) -> Result<Session, QuizError> {
    SessionBuilder::new(bank)
        .with_count(count)
        .with_topic(topic)
        .build(shuffler)
}

/// Same questions in the same order, with every question's options shuffled
/// again. Used for retakes.
pub fn reshuffle_options(
    session: &Session,
    shuffler: &mut dyn Shuffler,
) -> Result<Session, QuizError> {
    let items = session
        .items
        .iter()
        .enumerate()
        .map(|(slot, q)| {
            let (options, correct_key) = relabel(slot, &q.options, &q.correct_key, shuffler)?;
            Ok(SessionQuestion {
                options,
                correct_key,
                ..q.clone()
            })
        })
        .collect::<Result<Vec<_>, QuizError>>()?;

    Ok(Session {
        id: Uuid::new_v4(),
        created_at: Utc::now(),
        topic: session.topic.clone(),
        items,
    })
}
