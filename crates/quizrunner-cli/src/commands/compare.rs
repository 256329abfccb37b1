//! The `quizrunner compare` command.

use std::path::PathBuf;

use anyhow::Result;

use quizrunner_core::report::QuizReport;

pub fn execute(
    baseline_path: PathBuf,
    current_path: PathBuf,
    fail_on_regression: bool,
    format: String,
) -> Result<()> {
    let baseline = QuizReport::load_json(&baseline_path)?;
    let current = QuizReport::load_json(&current_path)?;

    let report = current.compare(&baseline);

    match format.as_str() {
        "markdown" | "md" => {
            println!("{}", report.to_markdown());
        }
        "json" => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        _ => {
            println!(
                "Score: {}% -> {}% ({:+} points)",
                report.baseline_percentage, report.current_percentage, report.delta
            );
            println!(
                "Comparison: {} regressions, {} improvements, {} unchanged",
                report.regressions.len(),
                report.improvements.len(),
                report.unchanged
            );

            if !report.regressions.is_empty() {
                println!("\nRegressions:");
                for r in &report.regressions {
                    println!("  {} ({} -> {})", r.prompt, r.baseline, r.current);
                }
            }

            if !report.improvements.is_empty() {
                println!("\nImprovements:");
                for i in &report.improvements {
                    println!("  {} ({} -> {})", i.prompt, i.baseline, i.current);
                }
            }

            if report.new_questions > 0 {
                println!("\n{} new question(s)", report.new_questions);
            }
            if report.removed_questions > 0 {
                println!("{} removed question(s)", report.removed_questions);
            }
        }
    }

    if fail_on_regression && report.has_regressions() {
        std::process::exit(1);
    }

    Ok(())
}
