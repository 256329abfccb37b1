//! The `quizrunner review` command.

use std::path::PathBuf;

use anyhow::Result;

use quizrunner_core::report::QuizReport;
use quizrunner_core::review::{filter, render_transcript, ReviewFilter};

pub fn execute(report_path: PathBuf, status: ReviewFilter) -> Result<()> {
    let report = QuizReport::load_json(&report_path)?;

    let items: Vec<_> = filter(&report.items, status).into_iter().cloned().collect();
    print!("{}", render_transcript(&items, &report.summary));
    if let ReviewFilter::Only(status) = status {
        println!(
            "Showing {} of {} questions ({status}).",
            items.len(),
            report.items.len()
        );
    }
    println!("{}", report.performance.message());

    if !report.per_topic.is_empty() {
        println!("{}", super::topic_table(&report.per_topic));
    }

    Ok(())
}
