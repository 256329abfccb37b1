//! HTML review page generator.
//!
//! Produces a self-contained HTML file with all CSS/JS inlined.

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::path::Path;

use quizrunner_core::report::QuizReport;
use quizrunner_core::review::{ReviewItem, ReviewStatus};
use quizrunner_core::scoring::TopicStats;

/// Escape a string for safe HTML insertion.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// Generate the review page for a submitted attempt.
pub fn generate_html(report: &QuizReport) -> String {
    let summary = &report.summary;
    let mut html = String::new();

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str(&format!(
        "<title>Quiz results: {}/{} ({}%)</title>\n",
        summary.correct, summary.total, summary.percentage
    ));
    html.push_str("<style>\n");
    html.push_str(CSS);
    html.push_str("</style>\n");
    html.push_str("</head>\n<body>\n");

    // Header
    html.push_str("<header>\n");
    html.push_str("<h1>Quiz results</h1>\n");
    html.push_str(&format!(
        "<p class=\"meta\">Topic: <strong>{}</strong> | {} feedback | submitted {}</p>\n",
        html_escape(&report.topic.to_string()),
        report.policy,
        report.submitted_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    html.push_str("</header>\n");

    // Score dashboard
    html.push_str("<section class=\"dashboard\">\n");
    html.push_str(&format!(
        "<p class=\"score\">{}/{} <span>({}%)</span></p>\n",
        summary.correct, summary.total, summary.percentage
    ));
    html.push_str(&format!(
        "<p class=\"performance\">{}</p>\n",
        html_escape(report.performance.message())
    ));
    html.push_str("<table class=\"summary\">\n");
    html.push_str("<thead><tr><th>Correct</th><th>Incorrect</th><th>Unanswered</th></tr></thead>\n");
    html.push_str(&format!(
        "<tbody><tr><td class=\"correct\">{}</td><td class=\"incorrect\">{}</td><td class=\"unanswered\">{}</td></tr></tbody>\n",
        summary.correct, summary.incorrect, summary.unanswered
    ));
    html.push_str("</table>\n");

    if !report.per_topic.is_empty() {
        html.push_str("<h2>By topic</h2>\n");
        html.push_str(&generate_bar_chart(&report.per_topic));
    }
    html.push_str("</section>\n");

    // Review list
    html.push_str("<section class=\"review\">\n");
    html.push_str("<h2>Review</h2>\n");
    html.push_str("<div class=\"filters\">\n");
    for (filter, label) in [
        ("all", "All"),
        ("correct", "Correct"),
        ("incorrect", "Incorrect"),
        ("unanswered", "Unanswered"),
    ] {
        html.push_str(&format!(
            "<button data-filter=\"{filter}\" onclick=\"filterReview('{filter}')\">{label}</button>\n"
        ));
    }
    html.push_str("</div>\n");
    html.push_str("<ol id=\"review\">\n");
    for item in &report.items {
        html.push_str(&review_entry(item));
    }
    html.push_str("</ol>\n");
    html.push_str("</section>\n");

    // Raw JSON
    html.push_str("<section class=\"raw-data\">\n");
    html.push_str("<details>\n<summary>Raw JSON Data</summary>\n");
    html.push_str("<pre><code>");
    html.push_str(&html_escape(
        &serde_json::to_string_pretty(report).unwrap_or_default(),
    ));
    html.push_str("</code></pre>\n");
    html.push_str("</details>\n</section>\n");

    html.push_str("<script>\n");
    html.push_str(JS);
    html.push_str("</script>\n");

    html.push_str("</body>\n</html>");
    html
}

fn review_entry(item: &ReviewItem) -> String {
    let mut li = format!(
        "<li class=\"item {}\" data-status=\"{}\" value=\"{}\">\n",
        item.status, item.status, item.number
    );
    li.push_str(&format!("<p class=\"prompt\">{}</p>\n", html_escape(&item.prompt)));
    if let Some(topic) = &item.topic {
        li.push_str(&format!("<p class=\"topic\">{}</p>\n", html_escape(topic)));
    }
    match &item.chosen {
        Some(chosen) => li.push_str(&format!(
            "<p>Your answer: <strong>{}.</strong> {}</p>\n",
            html_escape(&chosen.key.to_uppercase()),
            html_escape(&chosen.text)
        )),
        None => li.push_str("<p>Not answered.</p>\n"),
    }
    if item.status != ReviewStatus::Correct {
        li.push_str(&format!(
            "<p>Correct answer: <strong>{}.</strong> {}</p>\n",
            html_escape(&item.correct.key.to_uppercase()),
            html_escape(&item.correct.text)
        ));
    }
    li.push_str(&format!(
        "<p class=\"verdict\">{}</p>\n",
        item.status.label()
    ));
    if let Some(explanation) = &item.explanation {
        li.push_str(&format!(
            "<p class=\"explanation\">{}</p>\n",
            html_escape(explanation)
        ));
    }
    li.push_str("</li>\n");
    li
}

/// Write the review page to a file.
pub fn write_html_report(report: &QuizReport, path: &Path) -> Result<()> {
    let html = generate_html(report);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, html)
        .with_context(|| format!("failed to write HTML report to {}", path.display()))?;
    Ok(())
}

fn generate_bar_chart(per_topic: &BTreeMap<String, TopicStats>) -> String {
    let bar_height = 30;
    let max_width = 400;
    let padding = 10;
    let label_width = 200;

    let total_height = per_topic.len() * (bar_height + padding) + padding;

    let mut svg = format!(
        "<svg width=\"{}\" height=\"{}\" xmlns=\"http://www.w3.org/2000/svg\">\n",
        label_width + max_width + 90,
        total_height
    );

    for (i, (topic, stats)) in per_topic.iter().enumerate() {
        let y = i * (bar_height + padding) + padding;
        let pct = stats.percentage();
        let width = pct as usize * max_width / 100;

        let color = if pct >= 80 {
            "#22c55e"
        } else if pct >= 50 {
            "#eab308"
        } else {
            "#ef4444"
        };

        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"14\" fill=\"currentColor\" text-anchor=\"end\" dominant-baseline=\"middle\">{}</text>\n",
            label_width - 10,
            y + bar_height / 2,
            html_escape(topic)
        ));
        svg.push_str(&format!(
            "  <rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"{}\" rx=\"4\"/>\n",
            label_width, y, width, bar_height, color
        ));
        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"12\" fill=\"currentColor\" dominant-baseline=\"middle\">{}/{} ({}%)</text>\n",
            label_width + width + 8,
            y + bar_height / 2,
            stats.correct,
            stats.total,
            pct
        ));
    }

    svg.push_str("</svg>\n");
    svg
}

const CSS: &str = r#"
:root { --bg: #fff; --fg: #1a1a1a; --border: #e5e7eb; --correct: #dcfce7; --incorrect: #fde2e2; --unanswered: #fef9c3; }
@media (prefers-color-scheme: dark) {
  :root { --bg: #111827; --fg: #f9fafb; --border: #374151; --correct: #064e3b; --incorrect: #7f1d1d; --unanswered: #713f12; }
}
body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif; margin: 0; padding: 2rem; background: var(--bg); color: var(--fg); }
h1, h2 { margin-top: 2rem; }
.meta, .topic { color: #6b7280; }
.score { font-size: 2.5rem; font-weight: bold; margin: 0.5rem 0; }
.score span { font-size: 1.5rem; color: #6b7280; }
table { border-collapse: collapse; margin: 1rem 0; }
th, td { border: 1px solid var(--border); padding: 0.5rem 1rem; text-align: left; }
th { background: var(--border); }
.correct { background: var(--correct); }
.incorrect { background: var(--incorrect); }
.unanswered { background: var(--unanswered); }
.filters button { margin-right: 0.5rem; padding: 0.4rem 1rem; border: 1px solid var(--border); border-radius: 6px; background: var(--bg); color: var(--fg); cursor: pointer; }
.filters button.active { background: var(--border); font-weight: bold; }
#review { padding-left: 1.5rem; }
.item { border: 1px solid var(--border); border-radius: 8px; padding: 0.5rem 1rem; margin: 0.75rem 0; }
.item p { margin: 0.3rem 0; }
.prompt { font-weight: bold; }
.verdict { font-style: italic; }
.explanation { border-left: 3px solid var(--border); padding-left: 0.75rem; }
pre { overflow-x: auto; padding: 1rem; background: var(--border); border-radius: 8px; }
code { font-family: 'JetBrains Mono', 'Fira Code', monospace; font-size: 0.85rem; }
details { margin: 1rem 0; }
summary { cursor: pointer; font-weight: bold; }
svg { margin: 1rem 0; }
"#;

const JS: &str = r#"
function filterReview(status) {
  document.querySelectorAll('#review .item').forEach(li => {
    li.style.display = status === 'all' || li.dataset.status === status ? '' : 'none';
  });
  document.querySelectorAll('.filters button').forEach(b => {
    b.classList.toggle('active', b.dataset.filter === status);
  });
}
filterReview('all');
"#;
