//! JSON question-bank loader.
//!
//! Parses banks in the `{ question, options, answer, lesson?, explanation?, order? }`
//! record shape, validates every record, probes candidate paths, and falls
//! back to a built-in sample when no candidate loads.
//!
//! A single invalid record rejects the whole source.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::Value;

use crate::error::QuizError;
use crate::model::{QuestionCount, QuestionRecord, QuizOption, TopicFilter};

const FALLBACK_BANK: &str = include_str!("../data/fallback.json");

/// Preset session sizes offered when the pool is big enough.
pub const PRESET_COUNTS: [usize; 3] = [10, 20, 50];

/// Intermediate structure for one record of the external data contract.
#[derive(Debug, Deserialize)]
struct RawRecord {
    #[serde(default)]
    question: Option<String>,
    #[serde(default)]
    options: Option<serde_json::Map<String, Value>>,
    #[serde(default)]
    answer: Option<String>,
    #[serde(default)]
    lesson: Option<String>,
    #[serde(default)]
    explanation: Option<String>,
    #[serde(default)]
    order: Option<Value>,
}

/// An immutable, validated collection of question records.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionBank {
    records: Vec<QuestionRecord>,
}

impl QuestionBank {
    /// Build a bank from already-shaped records, enforcing the record contract.
    pub fn from_records(records: Vec<QuestionRecord>) -> Result<Self, QuizError> {
        if records.is_empty() {
            return Err(QuizError::load("records", "bank contains no questions"));
        }
        for (index, record) in records.iter().enumerate() {
            validate_record(index, record)?;
        }
        Ok(Self { records })
    }

    pub fn records(&self) -> &[QuestionRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sorted, distinct, non-empty topic values.
    pub fn topics(&self) -> Vec<String> {
        extract_topics(&self.records)
    }

    /// Number of records per topic, sorted by topic.
    pub fn topic_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for topic in self.records.iter().filter_map(|r| non_blank(r.topic.as_deref())) {
            *counts.entry(topic.to_string()).or_insert(0) += 1;
        }
        counts
    }

    /// Records surviving `filter`, paired with their bank index.
    pub fn filtered(&self, filter: &TopicFilter) -> Vec<(usize, &QuestionRecord)> {
        self.records
            .iter()
            .enumerate()
            .filter(|(_, r)| filter.matches(r.topic.as_deref()))
            .collect()
    }

    /// Session sizes worth offering for `filter`: `all`, then each preset the
    /// filtered pool can fill.
    pub fn count_choices(&self, filter: &TopicFilter) -> Vec<QuestionCount> {
        let available = self.filtered(filter).len();
        std::iter::once(QuestionCount::All)
            .chain(
                PRESET_COUNTS
                    .iter()
                    .filter(|&&n| available >= n)
                    .filter_map(|&n| QuestionCount::limit(n)),
            )
            .collect()
    }
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.trim().is_empty())
}

fn validate_record(index: usize, record: &QuestionRecord) -> Result<(), QuizError> {
    if record.text.trim().is_empty() {
        return Err(QuizError::invalid(index, "question text is empty"));
    }
    if record.options.len() < 2 {
        return Err(QuizError::invalid(
            index,
            format!("expected at least 2 options, found {}", record.options.len()),
        ));
    }
    let mut seen = HashSet::new();
    for option in &record.options {
        if option.key.is_empty() {
            return Err(QuizError::invalid(index, "option key is empty"));
        }
        if !seen.insert(option.key.as_str()) {
            return Err(QuizError::invalid(
                index,
                format!("duplicate option key '{}'", option.key),
            ));
        }
    }
    if !seen.contains(record.correct_key.as_str()) {
        return Err(QuizError::invalid(
            index,
            format!("answer '{}' is not an option key", record.correct_key),
        ));
    }
    Ok(())
}

fn convert_record(index: usize, value: Value) -> Result<QuestionRecord, QuizError> {
    let raw: RawRecord = serde_json::from_value(value)
        .map_err(|e| QuizError::invalid(index, format!("malformed record: {e}")))?;

    let text = raw
        .question
        .ok_or_else(|| QuizError::invalid(index, "missing 'question'"))?;
    let options = raw
        .options
        .ok_or_else(|| QuizError::invalid(index, "missing 'options'"))?
        .into_iter()
        .map(|(key, value)| match value {
            Value::String(text) => Ok(QuizOption { key, text }),
            other => Err(QuizError::invalid(
                index,
                format!("option '{key}' must be a string, found {other}"),
            )),
        })
        .collect::<Result<Vec<_>, _>>()?;
    let correct_key = raw
        .answer
        .ok_or_else(|| QuizError::invalid(index, "missing 'answer'"))?;

    let sequence_hint = raw.order.and_then(|v| match v {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    });

    let record = QuestionRecord {
        text,
        options,
        correct_key,
        topic: raw.lesson,
        explanation: raw.explanation,
        sequence_hint,
    };
    validate_record(index, &record)?;
    Ok(record)
}

/// Parse a JSON bank from a string. `source_name` only labels errors.
pub fn parse_bank_str(content: &str, source_name: &str) -> Result<QuestionBank, QuizError> {
    let parsed: Value = serde_json::from_str(content)
        .map_err(|e| QuizError::load(source_name, format!("invalid JSON: {e}")))?;

    let Value::Array(items) = parsed else {
        return Err(QuizError::load(
            source_name,
            "expected a JSON array of questions",
        ));
    };
    if items.is_empty() {
        return Err(QuizError::load(source_name, "bank contains no questions"));
    }

    let records = items
        .into_iter()
        .enumerate()
        .map(|(index, value)| convert_record(index, value))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(QuestionBank { records })
}

/// Parse a single JSON bank file.
pub fn load_bank(path: &Path) -> Result<QuestionBank, QuizError> {
    let source_name = path.display().to_string();
    let content = std::fs::read_to_string(path)
        .map_err(|e| QuizError::load(&source_name, format!("failed to read file: {e}")))?;
    parse_bank_str(&content, &source_name)
}

/// Try each candidate path in order and return the first bank that loads.
pub fn load_first_available(paths: &[PathBuf]) -> Result<(QuestionBank, PathBuf), QuizError> {
    let mut last_error = None;
    for path in paths {
        match load_bank(path) {
            Ok(bank) => {
                tracing::debug!("loaded {} questions from {}", bank.len(), path.display());
                return Ok((bank, path.clone()));
            }
            Err(e) => {
                tracing::warn!("skipping {}: {}", path.display(), e);
                last_error = Some(e);
            }
        }
    }
    Err(last_error.unwrap_or_else(|| QuizError::load("bank paths", "no candidate paths given")))
}

/// Where a loaded bank came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BankOrigin {
    File(PathBuf),
    Fallback,
}

/// A bank together with its origin.
#[derive(Debug, Clone)]
pub struct LoadedBank {
    pub bank: QuestionBank,
    pub origin: BankOrigin,
}

/// Probe `paths`, substituting the built-in sample when none loads, so the
/// rest of the core never sees an empty bank.
pub fn load_or_fallback(paths: &[PathBuf]) -> LoadedBank {
    match load_first_available(paths) {
        Ok((bank, path)) => LoadedBank {
            bank,
            origin: BankOrigin::File(path),
        },
        Err(e) => {
            tracing::warn!("all bank paths failed ({e}); using built-in fallback questions");
            LoadedBank {
                bank: fallback_bank(),
                origin: BankOrigin::Fallback,
            }
        }
    }
}

/// The built-in sample bank.
pub fn fallback_bank() -> QuestionBank {
    // Embedded at compile time and covered by `fallback_bank_is_valid`.
    parse_bank_str(FALLBACK_BANK, "built-in fallback").expect("built-in fallback bank is valid")
}

/// Raw JSON of the built-in sample, for scaffolding new projects.
pub fn fallback_bank_json() -> &'static str {
    FALLBACK_BANK
}

/// Sorted set of distinct non-empty topic values.
pub fn extract_topics(records: &[QuestionRecord]) -> Vec<String> {
    records
        .iter()
        .filter_map(|r| non_blank(r.topic.as_deref()))
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// A non-fatal issue found while validating a bank.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// Index of the record, if the warning concerns one.
    pub record: Option<usize>,
    /// Warning message.
    pub message: String,
}

/// Check a bank for issues that do not break the record contract.
pub fn validate_bank(bank: &QuestionBank) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    let mut seen_text = HashSet::new();
    for (i, record) in bank.records().iter().enumerate() {
        if !seen_text.insert(record.text.trim()) {
            warnings.push(ValidationWarning {
                record: Some(i),
                message: "duplicate question text".into(),
            });
        }
    }

    for (i, record) in bank.records().iter().enumerate() {
        if record.topic.as_deref().is_some_and(|t| t.trim().is_empty()) {
            warnings.push(ValidationWarning {
                record: Some(i),
                message: "topic is blank and will be ignored by topic filters".into(),
            });
        }
        if record
            .explanation
            .as_deref()
            .is_some_and(|e| e.trim().is_empty())
        {
            warnings.push(ValidationWarning {
                record: Some(i),
                message: "explanation is blank".into(),
            });
        }
        if record.options.iter().any(|o| o.text.trim().is_empty()) {
            warnings.push(ValidationWarning {
                record: Some(i),
                message: "an option has empty text".into(),
            });
        }
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_JSON: &str = r#"[
  {
    "question": "2 + 2?",
    "options": { "d": "5", "a": "4", "c": "3" },
    "answer": "a",
    "lesson": "Math",
    "order": 3
  },
  {
    "question": "Capital of France?",
    "options": { "a": "Paris", "b": "Rome" },
    "answer": "a",
    "lesson": "Geography",
    "explanation": "Paris has been the capital since 987.",
    "order": "2.1"
  },
  {
    "question": "Untagged?",
    "options": { "a": "yes", "b": "no" },
    "answer": "b"
  }
]"#;

    #[test]
    fn parse_valid_bank() {
        let bank = parse_bank_str(VALID_JSON, "test.json").unwrap();
        assert_eq!(bank.len(), 3);
        let first = &bank.records()[0];
        assert_eq!(first.text, "2 + 2?");
        assert_eq!(first.correct_text(), Some("4"));
        assert_eq!(first.topic.as_deref(), Some("Math"));
        assert_eq!(first.sequence_hint.as_deref(), Some("3"));
        assert_eq!(
            bank.records()[1].explanation.as_deref(),
            Some("Paris has been the capital since 987.")
        );
        assert!(bank.records()[2].topic.is_none());
    }

    #[test]
    fn option_keys_keep_source_order() {
        let bank = parse_bank_str(VALID_JSON, "test.json").unwrap();
        let keys: Vec<&str> = bank.records()[0]
            .options
            .iter()
            .map(|o| o.key.as_str())
            .collect();
        assert_eq!(keys, vec!["d", "a", "c"]);
    }

    #[test]
    fn answer_outside_options_is_rejected() {
        let json = r#"[
  { "question": "ok", "options": { "a": "1", "b": "2" }, "answer": "a" },
  { "question": "bad", "options": { "a": "1", "b": "2" }, "answer": "e" }
]"#;
        let err = parse_bank_str(json, "bad.json").unwrap_err();
        assert_eq!(
            err,
            QuizError::InvalidRecord {
                index: 1,
                reason: "answer 'e' is not an option key".into()
            }
        );
    }

    #[test]
    fn single_option_is_rejected() {
        let json = r#"[{ "question": "q", "options": { "a": "1" }, "answer": "a" }]"#;
        let err = parse_bank_str(json, "bad.json").unwrap_err();
        assert!(matches!(err, QuizError::InvalidRecord { index: 0, .. }));
    }

    #[test]
    fn missing_fields_are_rejected() {
        for json in [
            r#"[{ "options": { "a": "1", "b": "2" }, "answer": "a" }]"#,
            r#"[{ "question": "q", "answer": "a" }]"#,
            r#"[{ "question": "q", "options": { "a": "1", "b": "2" } }]"#,
            r#"[{ "question": "  ", "options": { "a": "1", "b": "2" }, "answer": "a" }]"#,
            r#"[{ "question": "q", "options": { "a": 1, "b": "2" }, "answer": "a" }]"#,
        ] {
            let err = parse_bank_str(json, "bad.json").unwrap_err();
            assert!(
                matches!(err, QuizError::InvalidRecord { index: 0, .. }),
                "{json} gave {err:?}"
            );
        }
    }

    #[test]
    fn unparseable_or_empty_sources_are_load_errors() {
        for json in ["not json", "{}", "[]"] {
            let err = parse_bank_str(json, "src").unwrap_err();
            assert!(matches!(err, QuizError::Load { .. }), "{json} gave {err:?}");
        }
    }

    #[test]
    fn from_records_enforces_contract() {
        assert!(matches!(
            QuestionBank::from_records(vec![]),
            Err(QuizError::Load { .. })
        ));
        let bad = QuestionRecord {
            text: "q".into(),
            options: vec![QuizOption::new("a", "1"), QuizOption::new("a", "2")],
            correct_key: "a".into(),
            topic: None,
            explanation: None,
            sequence_hint: None,
        };
        assert!(matches!(
            QuestionBank::from_records(vec![bad]),
            Err(QuizError::InvalidRecord { index: 0, .. })
        ));
    }

    #[test]
    fn topics_are_sorted_and_distinct() {
        let bank = parse_bank_str(VALID_JSON, "test.json").unwrap();
        assert_eq!(bank.topics(), vec!["Geography", "Math"]);
        let counts = bank.topic_counts();
        assert_eq!(counts.get("Math"), Some(&1));
        assert_eq!(counts.len(), 2);
    }

    #[test]
    fn count_choices_only_offer_fillable_presets() {
        let bank = fallback_bank();
        assert_eq!(bank.count_choices(&TopicFilter::All), vec![QuestionCount::All]);

        let records: Vec<QuestionRecord> = (0..25)
            .map(|i| QuestionRecord {
                text: format!("q{i}"),
                options: vec![QuizOption::new("a", "x"), QuizOption::new("b", "y")],
                correct_key: "a".into(),
                topic: None,
                explanation: None,
                sequence_hint: None,
            })
            .collect();
        let bank = QuestionBank::from_records(records).unwrap();
        let choices: Vec<String> = bank
            .count_choices(&TopicFilter::All)
            .iter()
            .map(|c| c.to_string())
            .collect();
        assert_eq!(choices, vec!["all", "10", "20"]);
    }

    #[test]
    fn fallback_bank_is_valid() {
        let bank = fallback_bank();
        assert!(bank.len() >= 2);
        assert!(!bank.topics().is_empty());
        assert!(validate_bank(&bank).is_empty());
    }

    #[test]
    fn probing_skips_bad_candidates() {
        let dir = tempfile::tempdir().unwrap();
        let broken = dir.path().join("broken.json");
        let good = dir.path().join("good.json");
        std::fs::write(&broken, "[").unwrap();
        std::fs::write(&good, VALID_JSON).unwrap();

        let paths = vec![dir.path().join("missing.json"), broken, good.clone()];
        let (bank, path) = load_first_available(&paths).unwrap();
        assert_eq!(bank.len(), 3);
        assert_eq!(path, good);
    }

    #[test]
    fn fallback_used_when_nothing_loads() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = load_or_fallback(&[dir.path().join("nope.json")]);
        assert_eq!(loaded.origin, BankOrigin::Fallback);
        assert_eq!(loaded.bank, fallback_bank());

        let loaded = load_or_fallback(&[]);
        assert_eq!(loaded.origin, BankOrigin::Fallback);
    }

    #[test]
    fn validate_warns_on_duplicates_and_blanks() {
        let json = r#"[
  { "question": "same", "options": { "a": "1", "b": "2" }, "answer": "a", "explanation": " " },
  { "question": "same", "options": { "a": "1", "b": "" }, "answer": "b", "lesson": "" }
]"#;
        let bank = parse_bank_str(json, "w.json").unwrap();
        let warnings = validate_bank(&bank);
        assert!(warnings.iter().any(|w| w.message.contains("duplicate")));
        assert!(warnings.iter().any(|w| w.message.contains("explanation is blank")));
        assert!(warnings.iter().any(|w| w.message.contains("topic is blank")));
        assert!(warnings.iter().any(|w| w.message.contains("empty text")));
        assert!(bank.topics().is_empty());
    }
}
