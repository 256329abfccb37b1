//! The `quizrunner topics` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use quizrunner_core::model::TopicFilter;

use super::validate::resolve_bank;

pub fn execute(bank_path: Option<PathBuf>, config_path: Option<PathBuf>) -> Result<()> {
    let (bank, source) = resolve_bank(bank_path, config_path)?;
    println!("Bank: {source} ({} questions)", bank.len());

    let counts = bank.topic_counts();
    if counts.is_empty() {
        println!("No topics defined; every question is untagged.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Topic", "Questions", "Session sizes"]);
    for (topic, count) in &counts {
        let sizes: Vec<String> = bank
            .count_choices(&TopicFilter::Topic(topic.clone()))
            .iter()
            .map(ToString::to_string)
            .collect();
        table.add_row(vec![
            Cell::new(topic),
            Cell::new(count),
            Cell::new(sizes.join(", ")),
        ]);
    }
    println!("{table}");

    let untagged = bank.len() - counts.values().sum::<usize>();
    if untagged > 0 {
        println!("{untagged} question(s) have no topic.");
    }

    Ok(())
}
