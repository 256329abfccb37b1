//! CLI integration tests using assert_cmd.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const SAMPLE_BANK: &str = "../../data/questions.json";

/// Every answer is "a", so with option shuffling off the outcome does not
/// depend on question order.
const ALL_A_BANK: &str = r#"[
    {"question": "First?", "options": {"a": "yes", "b": "no"}, "answer": "a", "lesson": "One"},
    {"question": "Second?", "options": {"a": "yes", "b": "no"}, "answer": "a", "lesson": "One",
     "explanation": "always a"},
    {"question": "Third?", "options": {"a": "yes", "b": "no", "c": "maybe"}, "answer": "a", "lesson": "Two"}
]"#;

fn quizrunner(home: &Path) -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("quizrunner").unwrap();
    cmd.env("HOME", home).env_remove("QUIZRUNNER_BANK");
    cmd
}

fn write_bank(dir: &Path) -> PathBuf {
    let path = dir.join("bank.json");
    std::fs::write(&path, ALL_A_BANK).unwrap();
    path
}

fn play(dir: &Path, bank: &Path, output: &Path, feedback: &str, script: &str) -> String {
    let assert = quizrunner(dir)
        .current_dir(dir)
        .args(["play", "--no-shuffle-options", "--seed", "7", "--format", "all"])
        .arg("--feedback")
        .arg(feedback)
        .arg("--bank")
        .arg(bank)
        .arg("--output")
        .arg(output)
        .write_stdin(script)
        .assert()
        .success();
    String::from_utf8(assert.get_output().stdout.clone()).unwrap()
}

fn report_json(output: &Path) -> PathBuf {
    std::fs::read_dir(output)
        .unwrap()
        .map(|e| e.unwrap().path())
        .find(|p| p.extension().is_some_and(|e| e == "json"))
        .expect("a JSON report was written")
}

#[test]
fn validate_sample_bank() {
    let home = TempDir::new().unwrap();
    quizrunner(home.path())
        .arg("validate")
        .arg("--bank")
        .arg(SAMPLE_BANK)
        .assert()
        .success()
        .stdout(predicate::str::contains("12 questions"))
        .stdout(predicate::str::contains("Concurrency, Ownership, Rust Basics"))
        .stdout(predicate::str::contains("Bank is valid."));
}

#[test]
fn validate_reports_warnings() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("dupes.json");
    std::fs::write(
        &path,
        r#"[
            {"question": "Same?", "options": {"a": "x", "b": "y"}, "answer": "a"},
            {"question": "Same?", "options": {"a": "x", "b": "y"}, "answer": "b", "explanation": " "}
        ]"#,
    )
    .unwrap();

    quizrunner(dir.path())
        .arg("validate")
        .arg("--bank")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Topics: none"))
        .stdout(predicate::str::contains("duplicate question text"))
        .stdout(predicate::str::contains("warning(s) found"));
}

#[test]
fn validate_rejects_invalid_record() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.json");
    std::fs::write(
        &path,
        r#"[{"question": "Q?", "options": {"a": "x", "b": "y"}, "answer": "z"}]"#,
    )
    .unwrap();

    quizrunner(dir.path())
        .arg("validate")
        .arg("--bank")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"))
        .stderr(predicate::str::contains("invalid question record"));
}

#[test]
fn validate_nonexistent_file() {
    let home = TempDir::new().unwrap();
    quizrunner(home.path())
        .arg("validate")
        .arg("--bank")
        .arg("nonexistent.json")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn topics_lists_counts() {
    let home = TempDir::new().unwrap();
    quizrunner(home.path())
        .arg("topics")
        .arg("--bank")
        .arg(SAMPLE_BANK)
        .assert()
        .success()
        .stdout(predicate::str::contains("Concurrency"))
        .stdout(predicate::str::contains("Ownership"))
        .stdout(predicate::str::contains("Rust Basics"))
        .stdout(predicate::str::contains("all"));
}

#[test]
fn topics_falls_back_to_builtin_sample() {
    let dir = TempDir::new().unwrap();
    quizrunner(dir.path())
        .current_dir(dir.path())
        .arg("topics")
        .assert()
        .success()
        .stdout(predicate::str::contains("built-in sample"));
}

#[test]
fn topics_uses_bank_from_env() {
    let dir = TempDir::new().unwrap();
    let bank = write_bank(dir.path());
    quizrunner(dir.path())
        .current_dir(dir.path())
        .env("QUIZRUNNER_BANK", &bank)
        .arg("topics")
        .assert()
        .success()
        .stdout(predicate::str::contains("bank.json (3 questions)"));
}

#[test]
fn init_creates_files() {
    let dir = TempDir::new().unwrap();

    quizrunner(dir.path())
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created quizrunner.toml"))
        .stdout(predicate::str::contains("Created data/questions.json"));

    assert!(dir.path().join("quizrunner.toml").exists());
    assert!(dir.path().join("data/questions.json").exists());

    // The scaffolded project is picked up without flags.
    quizrunner(dir.path())
        .current_dir(dir.path())
        .arg("topics")
        .assert()
        .success()
        .stdout(predicate::str::contains("data/questions.json"));
}

#[test]
fn init_skips_existing() {
    let dir = TempDir::new().unwrap();

    quizrunner(dir.path())
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success();

    quizrunner(dir.path())
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

#[test]
fn play_deferred_full_marks_and_exports() {
    let dir = TempDir::new().unwrap();
    let bank = write_bank(dir.path());
    let output = dir.path().join("results");

    let stdout = play(dir.path(), &bank, &output, "deferred", "a\na\na\ns\n");

    assert!(stdout.contains("QUIZ RESULTS"));
    assert!(stdout.contains("Score: 3/3 (100%)"));
    assert!(stdout.contains("Excellent"));

    let mut extensions: Vec<String> = std::fs::read_dir(&output)
        .unwrap()
        .map(|e| {
            let path = e.unwrap().path();
            assert!(path
                .file_name()
                .unwrap()
                .to_string_lossy()
                .starts_with("quiz-results-"));
            path.extension().unwrap().to_string_lossy().into_owned()
        })
        .collect();
    extensions.sort();
    assert_eq!(extensions, vec!["html", "json", "txt"]);
}

#[test]
fn play_instant_feedback_and_confirmation() {
    let dir = TempDir::new().unwrap();
    let bank = write_bank(dir.path());
    let output = dir.path().join("results");

    let stdout = play(dir.path(), &bank, &output, "instant", "1\nb\ns\ny\n");

    assert!(stdout.contains("Correct!"));
    assert!(stdout.contains("Incorrect. The correct answer is A. yes"));
    assert!(stdout.contains("1 question(s) unanswered"));
    assert!(stdout.contains("Score: 1/3 (33%)"));
    assert!(stdout.contains("Not answered."));
}

#[test]
fn play_quit_saves_nothing() {
    let dir = TempDir::new().unwrap();
    let bank = write_bank(dir.path());
    let output = dir.path().join("results");

    let stdout = play(dir.path(), &bank, &output, "instant", "a\nq\n");

    assert!(stdout.contains("Quiz abandoned"));
    assert!(!output.exists());
}

#[test]
fn play_retake_starts_over() {
    let dir = TempDir::new().unwrap();
    let bank = write_bank(dir.path());
    let output = dir.path().join("results");

    let stdout = play(
        dir.path(),
        &bank,
        &output,
        "deferred",
        "a\na\na\ns\ny\na\ns\ny\nn\n",
    );

    assert!(stdout.contains("Score: 3/3 (100%)"));
    assert!(stdout.contains("Score: 1/3 (33%)"));

    let transcripts: Vec<String> = std::fs::read_dir(&output)
        .unwrap()
        .map(|e| e.unwrap().path())
        .filter(|p| p.extension().is_some_and(|e| e == "txt"))
        .map(|p| std::fs::read_to_string(p).unwrap())
        .collect();
    assert_eq!(transcripts.len(), 2, "each attempt keeps its own transcript");
    assert!(transcripts.iter().any(|t| t.contains("Score: 3/3 (100%)")));
    assert!(transcripts.iter().any(|t| t.contains("Score: 1/3 (33%)")));
}

#[test]
fn play_count_and_topic_limit_the_session() {
    let dir = TempDir::new().unwrap();
    let bank = write_bank(dir.path());
    let output = dir.path().join("results");

    quizrunner(dir.path())
        .current_dir(dir.path())
        .args(["play", "--count", "1", "--topic", "One", "--format", "text"])
        .arg("--bank")
        .arg(&bank)
        .arg("--output")
        .arg(&output)
        .write_stdin("q\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Starting quiz: 1 questions"))
        .stdout(predicate::str::contains("[One]"));
}

#[test]
fn play_unknown_topic_fails() {
    let dir = TempDir::new().unwrap();
    let bank = write_bank(dir.path());

    quizrunner(dir.path())
        .current_dir(dir.path())
        .args(["play", "--topic", "Nope"])
        .arg("--bank")
        .arg(&bank)
        .write_stdin("q\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no questions match topic 'Nope'"));
}

#[test]
fn play_rejects_zero_count() {
    let home = TempDir::new().unwrap();
    quizrunner(home.path())
        .args(["play", "--count", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("positive integer"));
}

#[test]
fn review_filters_saved_report() {
    let dir = TempDir::new().unwrap();
    let bank = write_bank(dir.path());
    let output = dir.path().join("results");
    play(dir.path(), &bank, &output, "deferred", "a\nb\ns\ny\n");

    quizrunner(dir.path())
        .arg("review")
        .arg("--report")
        .arg(report_json(&output))
        .arg("--filter")
        .arg("incorrect")
        .assert()
        .success()
        .stdout(predicate::str::contains("Showing 1 of 3 questions (incorrect)"))
        .stdout(predicate::str::contains("Result: Incorrect"))
        .stdout(predicate::str::contains("Result: Correct").not());
}

#[test]
fn review_rejects_unknown_filter() {
    let home = TempDir::new().unwrap();
    quizrunner(home.path())
        .args(["review", "--report", "r.json", "--filter", "sometimes"])
        .assert()
        .failure();
}

#[test]
fn compare_reports() {
    let dir = TempDir::new().unwrap();
    let bank = write_bank(dir.path());
    let first = dir.path().join("first");
    let second = dir.path().join("second");
    play(dir.path(), &bank, &first, "deferred", "a\na\na\ns\n");
    play(dir.path(), &bank, &second, "deferred", "a\nb\nb\ns\n");

    quizrunner(dir.path())
        .arg("compare")
        .arg("--baseline")
        .arg(report_json(&first))
        .arg("--current")
        .arg(report_json(&second))
        .assert()
        .success()
        .stdout(predicate::str::contains("100% -> 33% (-67 points)"))
        .stdout(predicate::str::contains("2 regressions"));

    quizrunner(dir.path())
        .arg("compare")
        .arg("--baseline")
        .arg(report_json(&first))
        .arg("--current")
        .arg(report_json(&second))
        .args(["--format", "markdown"])
        .assert()
        .success()
        .stdout(predicate::str::contains("### Regressions"));

    quizrunner(dir.path())
        .arg("compare")
        .arg("--baseline")
        .arg(report_json(&first))
        .arg("--current")
        .arg(report_json(&second))
        .arg("--fail-on-regression")
        .assert()
        .code(1);
}

#[test]
fn compare_nonexistent_report() {
    let home = TempDir::new().unwrap();
    quizrunner(home.path())
        .arg("compare")
        .arg("--baseline")
        .arg("no_such_file.json")
        .arg("--current")
        .arg("also_no_file.json")
        .assert()
        .failure();
}

#[test]
fn help_output() {
    let home = TempDir::new().unwrap();
    quizrunner(home.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Multiple-choice quiz runner"));
}

#[test]
fn version_output() {
    let home = TempDir::new().unwrap();
    quizrunner(home.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("quizrunner"));
}
