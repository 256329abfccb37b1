//! quizrunner-report: Result exports for submitted quiz sessions.

pub mod html;
pub mod text;

use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::NaiveDate;
use quizrunner_core::report::QuizReport;

/// An export format the CLI can write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Text,
    Json,
    Html,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 3] = [ExportFormat::Text, ExportFormat::Json, ExportFormat::Html];

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Text => "txt",
            ExportFormat::Json => "json",
            ExportFormat::Html => "html",
        }
    }

    /// Parse a comma-separated list such as `text,json` or `all`.
    pub fn parse_list(s: &str) -> Result<Vec<ExportFormat>, String> {
        let mut formats = Vec::new();
        for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            match part.to_lowercase().as_str() {
                "all" => return Ok(Self::ALL.to_vec()),
                "text" | "txt" => formats.push(ExportFormat::Text),
                "json" => formats.push(ExportFormat::Json),
                "html" => formats.push(ExportFormat::Html),
                other => return Err(format!("unknown export format: {other}")),
            }
        }
        formats.dedup();
        if formats.is_empty() {
            return Err("no export format given".into());
        }
        Ok(formats)
    }
}

/// First export stem for `date` under which `dir` holds no export of any format.
pub fn free_export_stem(dir: &Path, date: NaiveDate) -> String {
    let mut attempt = 1;
    loop {
        let stem = text::export_stem(date, attempt);
        let taken = ExportFormat::ALL
            .iter()
            .any(|f| dir.join(format!("{stem}.{}", f.extension())).exists());
        if !taken {
            return stem;
        }
        attempt += 1;
    }
}

/// Write `report` into `dir` in each of `formats`, returning the written paths.
///
/// All formats of one report share a file stem. Earlier exports from the same
/// day are never overwritten.
pub fn write_exports(
    report: &QuizReport,
    dir: &Path,
    formats: &[ExportFormat],
) -> Result<Vec<PathBuf>> {
    let stem = free_export_stem(dir, report.submitted_at.date_naive());
    let mut written = Vec::new();
    for format in formats {
        let path = dir.join(format!("{stem}.{}", format.extension()));
        match format {
            ExportFormat::Text => text::write_text_export(report, &path)?,
            ExportFormat::Json => report.save_json(&path)?,
            ExportFormat::Html => html::write_html_report(report, &path)?,
        }
        tracing::info!("wrote {}", path.display());
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
pub(crate) fn sample_report() -> QuizReport {
    use quizrunner_core::bank::fallback_bank;
    use quizrunner_core::builder::SessionBuilder;
    use quizrunner_core::model::FeedbackPolicy;
    use quizrunner_core::session::SessionState;
    use quizrunner_core::shuffle::RandomShuffler;

    let bank = fallback_bank();
    let session = SessionBuilder::new(&bank)
        .build(&mut RandomShuffler::seeded(11))
        .unwrap();
    let first_correct = session.items[0].correct_key.clone();
    let wrong = session.items[1]
        .options
        .iter()
        .find(|o| o.key != session.items[1].correct_key)
        .unwrap()
        .key
        .clone();
    let mut state = SessionState::new(session, FeedbackPolicy::Deferred).unwrap();
    state.answer(0, &first_correct).unwrap();
    state.answer(1, &wrong).unwrap();
    let submission = state.submit().unwrap();
    QuizReport::from_submission(&state, &submission).unwrap()
}
