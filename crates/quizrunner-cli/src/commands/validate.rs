//! The `quizrunner validate` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use quizrunner_core::bank::{load_bank, load_or_fallback, validate_bank, BankOrigin, QuestionBank};

use crate::config::load_config_from;

/// Load an explicit bank, or probe the configured paths with fallback.
/// Returns the bank and a printable description of where it came from.
pub(crate) fn resolve_bank(
    bank_path: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> Result<(QuestionBank, String)> {
    if let Some(path) = bank_path {
        let bank = load_bank(&path)
            .with_context(|| format!("failed to load bank {}", path.display()))?;
        return Ok((bank, path.display().to_string()));
    }
    let config = load_config_from(config_path.as_deref())?;
    let loaded = load_or_fallback(&config.bank_paths);
    let source = match loaded.origin {
        BankOrigin::File(path) => path.display().to_string(),
        BankOrigin::Fallback => "built-in sample".to_string(),
    };
    Ok((loaded.bank, source))
}

pub fn execute(bank_path: PathBuf) -> Result<()> {
    let bank = load_bank(&bank_path)
        .with_context(|| format!("failed to load bank {}", bank_path.display()))?;

    println!("Bank: {} ({} questions)", bank_path.display(), bank.len());
    let topics = bank.topics();
    if topics.is_empty() {
        println!("Topics: none");
    } else {
        println!("Topics: {}", topics.join(", "));
    }

    let warnings = validate_bank(&bank);
    for w in &warnings {
        let prefix = w
            .record
            .map(|i| format!("  [#{i}]"))
            .unwrap_or_else(|| "  ".to_string());
        println!("{prefix} WARNING: {}", w.message);
    }

    if warnings.is_empty() {
        println!("Bank is valid.");
    } else {
        println!("\n{} warning(s) found.", warnings.len());
    }

    Ok(())
}
