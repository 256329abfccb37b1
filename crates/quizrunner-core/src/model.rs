//! Core data model types for quizrunner.
//!
//! These are the fundamental types the rest of the system uses to represent
//! bank records, session questions, and the knobs that configure a session.

use std::fmt;
use std::num::NonZeroUsize;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One selectable answer: a stable key slot and the text it currently holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizOption {
    /// Key label (conventionally "a".."d", treated as an opaque string).
    pub key: String,
    /// Text shown for this option.
    pub text: String,
}

impl QuizOption {
    pub fn new(key: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            text: text.into(),
        }
    }
}

/// A question as it sits in the bank.
///
/// Records are validated at load time, so `correct_key` always names one of
/// `options`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionRecord {
    /// The prompt.
    pub text: String,
    /// Options in source order.
    pub options: Vec<QuizOption>,
    /// Key of the correct option.
    pub correct_key: String,
    /// Optional grouping tag used for filtering.
    #[serde(default)]
    pub topic: Option<String>,
    /// Optional explanation shown in feedback and review.
    #[serde(default)]
    pub explanation: Option<String>,
    /// Sortable tag from the source; presentation only.
    #[serde(default)]
    pub sequence_hint: Option<String>,
}

impl QuestionRecord {
    /// Text of the option stored under `key`.
    pub fn option_text(&self, key: &str) -> Option<&str> {
        self.options
            .iter()
            .find(|o| o.key == key)
            .map(|o| o.text.as_str())
    }

    /// Text of the correct option.
    pub fn correct_text(&self) -> Option<&str> {
        self.option_text(&self.correct_key)
    }
}

/// A question snapshot owned by a [`Session`], with its options already in
/// their session order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionQuestion {
    /// Position of the originating record in the bank.
    pub source_index: usize,
    pub text: String,
    /// Same key sequence as the source record; texts may have moved.
    pub options: Vec<QuizOption>,
    /// Key slot that now holds the correct text.
    pub correct_key: String,
    pub topic: Option<String>,
    pub explanation: Option<String>,
    pub sequence_hint: Option<String>,
}

impl SessionQuestion {
    pub fn option_text(&self, key: &str) -> Option<&str> {
        self.options
            .iter()
            .find(|o| o.key == key)
            .map(|o| o.text.as_str())
    }

    pub fn has_option(&self, key: &str) -> bool {
        self.options.iter().any(|o| o.key == key)
    }

    /// The option under `correct_key`.
    pub fn correct_option(&self) -> &QuizOption {
        // The builder only emits keys drawn from `options`.
        self.options
            .iter()
            .find(|o| o.key == self.correct_key)
            .unwrap_or(&self.options[0])
    }

    pub fn is_correct(&self, key: &str) -> bool {
        key == self.correct_key
    }

    /// Key at a 1-based position, for "press 2 to pick b" style input.
    pub fn key_at(&self, position: usize) -> Option<&str> {
        position
            .checked_sub(1)
            .and_then(|i| self.options.get(i))
            .map(|o| o.key.as_str())
    }
}

/// One randomized, fixed-order quiz instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Unique session identifier.
    pub id: Uuid,
    /// When the session was built.
    pub created_at: DateTime<Utc>,
    /// The filter the session was built with.
    pub topic: TopicFilter,
    /// Questions in presentation order.
    pub items: Vec<SessionQuestion>,
}

impl Session {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn correct_keys(&self) -> Vec<&str> {
        self.items.iter().map(|q| q.correct_key.as_str()).collect()
    }
}

/// When correctness is revealed to the user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackPolicy {
    /// Reveal right after each answer.
    #[default]
    Instant,
    /// Reveal only after submission.
    Deferred,
}

impl fmt::Display for FeedbackPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedbackPolicy::Instant => write!(f, "instant"),
            FeedbackPolicy::Deferred => write!(f, "deferred"),
        }
    }
}

impl FromStr for FeedbackPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "instant" | "immediate" => Ok(FeedbackPolicy::Instant),
            "deferred" | "end" => Ok(FeedbackPolicy::Deferred),
            other => Err(format!("unknown feedback policy: {other}")),
        }
    }
}

/// How many questions a session should draw.
///
/// Serializes as `"all"` or `"N"`; deserializes from either a string or a
/// bare integer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(into = "String")]
pub enum QuestionCount {
    /// Every record that survives the topic filter.
    #[default]
    All,
    /// At most this many.
    Limit(NonZeroUsize),
}

impl QuestionCount {
    pub fn limit(n: usize) -> Option<Self> {
        NonZeroUsize::new(n).map(QuestionCount::Limit)
    }

    /// Count actually used for a pool of `available` records.
    pub fn resolve(self, available: usize) -> usize {
        match self {
            QuestionCount::All => available,
            QuestionCount::Limit(n) => n.get().min(available),
        }
    }
}

impl fmt::Display for QuestionCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionCount::All => write!(f, "all"),
            QuestionCount::Limit(n) => write!(f, "{n}"),
        }
    }
}

impl FromStr for QuestionCount {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("all") {
            return Ok(QuestionCount::All);
        }
        s.parse::<usize>()
            .ok()
            .and_then(QuestionCount::limit)
            .ok_or_else(|| format!("question count must be 'all' or a positive integer, got '{s}'"))
    }
}

impl From<QuestionCount> for String {
    fn from(count: QuestionCount) -> Self {
        count.to_string()
    }
}

struct QuestionCountVisitor;

impl Visitor<'_> for QuestionCountVisitor {
    type Value = QuestionCount;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("\"all\" or a positive integer")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<QuestionCount, E> {
        usize::try_from(v)
            .ok()
            .and_then(QuestionCount::limit)
            .ok_or_else(|| E::invalid_value(de::Unexpected::Unsigned(v), &self))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<QuestionCount, E> {
        match u64::try_from(v) {
            Ok(v) => self.visit_u64(v),
            Err(_) => Err(E::invalid_value(de::Unexpected::Signed(v), &self)),
        }
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<QuestionCount, E> {
        v.parse().map_err(E::custom)
    }
}

impl<'de> Deserialize<'de> for QuestionCount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(QuestionCountVisitor)
    }
}

/// Which part of the bank a session draws from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum TopicFilter {
    #[default]
    All,
    Topic(String),
}

impl TopicFilter {
    pub fn matches(&self, topic: Option<&str>) -> bool {
        match self {
            TopicFilter::All => true,
            TopicFilter::Topic(wanted) => topic == Some(wanted.as_str()),
        }
    }
}

impl fmt::Display for TopicFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TopicFilter::All => write!(f, "all"),
            TopicFilter::Topic(t) => write!(f, "{t}"),
        }
    }
}

impl From<&str> for TopicFilter {
    fn from(s: &str) -> Self {
        let s = s.trim();
        if s.is_empty() || s == "all" {
            TopicFilter::All
        } else {
            TopicFilter::Topic(s.to_string())
        }
    }
}

impl From<String> for TopicFilter {
    fn from(s: String) -> Self {
        TopicFilter::from(s.as_str())
    }
}

impl From<Option<&str>> for TopicFilter {
    fn from(s: Option<&str>) -> Self {
        s.map(TopicFilter::from).unwrap_or_default()
    }
}

impl From<TopicFilter> for String {
    fn from(filter: TopicFilter) -> Self {
        filter.to_string()
    }
}

impl FromStr for TopicFilter {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(TopicFilter::from(s))
    }
}
