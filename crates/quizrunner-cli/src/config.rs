//! quizrunner configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use quizrunner_core::model::{FeedbackPolicy, QuestionCount, TopicFilter};

/// Env var whose value is probed before the configured bank paths.
pub const BANK_ENV_VAR: &str = "QUIZRUNNER_BANK";

/// Top-level quizrunner configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizrunnerConfig {
    /// Candidate bank files, probed in order.
    #[serde(default = "default_bank_paths")]
    pub bank_paths: Vec<PathBuf>,
    /// Default number of questions per session.
    #[serde(default)]
    pub question_count: QuestionCount,
    /// Default topic filter.
    #[serde(default)]
    pub topic: TopicFilter,
    /// Default feedback timing.
    #[serde(default)]
    pub feedback: FeedbackPolicy,
    /// Shuffle option texts between key slots.
    #[serde(default = "default_true")]
    pub shuffle_options: bool,
    /// Lock an instant-mode answer once its feedback is shown.
    #[serde(default = "default_true")]
    pub lock_after_feedback: bool,
    /// Where result exports are written.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default)]
    pub server: ServerConfig,
}

/// Settings for `quizrunner serve`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_root")]
    pub root: PathBuf,
}

fn default_bank_paths() -> Vec<PathBuf> {
    ["data/questions.json", "../data/questions.json", "questions.json"]
        .into_iter()
        .map(PathBuf::from)
        .collect()
}
fn default_true() -> bool {
    true
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("./quiz-results")
}
fn default_port() -> u16 {
    3000
}
fn default_root() -> PathBuf {
    PathBuf::from(".")
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            root: default_root(),
        }
    }
}

impl Default for QuizrunnerConfig {
    fn default() -> Self {
        Self {
            bank_paths: default_bank_paths(),
            question_count: QuestionCount::All,
            topic: TopicFilter::All,
            feedback: FeedbackPolicy::Instant,
            shuffle_options: true,
            lock_after_feedback: true,
            output_dir: default_output_dir(),
            server: ServerConfig::default(),
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
///
/// Substituted values are not expanded again.
fn resolve_env_vars(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find("${") {
        let Some(end) = rest[start..].find('}') else {
            break;
        };
        let var_name = &rest[start + 2..start + end];
        result.push_str(&rest[..start]);
        result.push_str(&std::env::var(var_name).unwrap_or_default());
        rest = &rest[start + end + 1..];
    }
    result.push_str(rest);
    result
}

fn resolve_path(path: &Path) -> PathBuf {
    PathBuf::from(resolve_env_vars(&path.to_string_lossy()))
}

/// Load config from an explicit path, or search the default locations.
///
/// Search order:
/// 1. `quizrunner.toml` in the current directory
/// 2. `~/.config/quizrunner/config.toml`
///
/// `QUIZRUNNER_BANK` prepends a bank path to the probe list.
pub fn load_config_from(path: Option<&Path>) -> Result<QuizrunnerConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("quizrunner.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            tracing::debug!("loading config from {}", path.display());
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<QuizrunnerConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => QuizrunnerConfig::default(),
    };

    if let Ok(bank) = std::env::var(BANK_ENV_VAR) {
        if !bank.trim().is_empty() {
            config.bank_paths.insert(0, PathBuf::from(bank));
        }
    }

    config.bank_paths = config.bank_paths.iter().map(|p| resolve_path(p)).collect();
    config.output_dir = resolve_path(&config.output_dir);
    config.server.root = resolve_path(&config.server.root);

    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("quizrunner"))
}
