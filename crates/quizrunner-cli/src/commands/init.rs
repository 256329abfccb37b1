//! The `quizrunner init` command.

use std::path::Path;

use anyhow::Result;

use quizrunner_core::bank::fallback_bank_json;

pub fn execute() -> Result<()> {
    // Create quizrunner.toml
    if Path::new("quizrunner.toml").exists() {
        println!("quizrunner.toml already exists, skipping.");
    } else {
        std::fs::write("quizrunner.toml", SAMPLE_CONFIG)?;
        println!("Created quizrunner.toml");
    }

    // Create sample question bank
    std::fs::create_dir_all("data")?;
    let bank_path = Path::new("data/questions.json");
    if bank_path.exists() {
        println!("data/questions.json already exists, skipping.");
    } else {
        std::fs::write(bank_path, fallback_bank_json())?;
        println!("Created data/questions.json");
    }

    println!("\nNext steps:");
    println!("  1. Add your own questions to data/questions.json");
    println!("  2. Run: quizrunner validate --bank data/questions.json");
    println!("  3. Run: quizrunner play");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# quizrunner configuration

# Candidate question banks, tried in order. ${VAR} references are expanded.
bank_paths = ["data/questions.json", "../data/questions.json", "questions.json"]

# "all" or a number of questions per session
question_count = "all"

# "all" or one topic (the "lesson" field of each question)
topic = "all"

# "instant" shows correctness after each answer, "deferred" only after submitting
feedback = "instant"

shuffle_options = true
lock_after_feedback = true
output_dir = "./quiz-results"

[server]
port = 3000
root = "."
"#;
