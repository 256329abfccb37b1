pub mod compare;
pub mod init;
pub mod play;
pub mod review;
pub mod serve;
pub mod topics;
pub mod validate;

use std::collections::BTreeMap;

use comfy_table::{Cell, Table};
use quizrunner_core::scoring::TopicStats;

/// Per-topic score table shown after a quiz and by `review`.
pub(crate) fn topic_table(per_topic: &BTreeMap<String, TopicStats>) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Topic", "Correct", "Total", "Score"]);
    for (topic, stats) in per_topic {
        table.add_row(vec![
            Cell::new(topic),
            Cell::new(stats.correct),
            Cell::new(stats.total),
            Cell::new(format!("{}%", stats.percentage())),
        ]);
    }
    table
}
