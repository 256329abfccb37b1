//! Plain-text transcript export.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;

use quizrunner_core::report::QuizReport;

/// `quiz-results-YYYY-MM-DD.<ext>` for the day the session ended.
pub fn export_file_name(date: NaiveDate, extension: &str) -> String {
    format!("{}.{extension}", export_stem(date, 1))
}

/// File stem for the `attempt`-th export of a day; attempts after the first
/// get a `-N` suffix.
pub fn export_stem(date: NaiveDate, attempt: u32) -> String {
    let day = date.format("%Y-%m-%d");
    if attempt <= 1 {
        format!("quiz-results-{day}")
    } else {
        format!("quiz-results-{day}-{attempt}")
    }
}

/// Write the report's transcript to `path`.
pub fn write_text_export(report: &QuizReport, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, report.transcript())
        .with_context(|| format!("failed to write transcript to {}", path.display()))?;
    Ok(())
}
