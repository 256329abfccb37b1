//! The `quizrunner play` command.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use quizrunner_core::bank::{load_bank, load_or_fallback, BankOrigin, LoadedBank};
use quizrunner_core::builder::SessionBuilder;
use quizrunner_core::model::{FeedbackPolicy, QuestionCount, SessionQuestion, TopicFilter};
use quizrunner_core::report::QuizReport;
use quizrunner_core::session::{AnswerOutcome, SessionState, SubmitCheck, Submission};
use quizrunner_core::shuffle::{IdentityShuffler, RandomShuffler};
use quizrunner_report::{write_exports, ExportFormat};

use crate::config::load_config_from;

#[derive(Debug, Args)]
pub struct PlayArgs {
    /// Question bank JSON (default: probe configured paths, then built-in sample)
    #[arg(long)]
    pub bank: Option<PathBuf>,

    /// Number of questions: "all" or a positive integer
    #[arg(long)]
    pub count: Option<QuestionCount>,

    /// Only ask questions from this topic ("all" for every topic)
    #[arg(long)]
    pub topic: Option<TopicFilter>,

    /// When to reveal correctness: instant or deferred
    #[arg(long)]
    pub feedback: Option<FeedbackPolicy>,

    /// Keep option texts under their original keys
    #[arg(long)]
    pub no_shuffle_options: bool,

    /// Allow changing an answer after instant feedback
    #[arg(long)]
    pub allow_changes: bool,

    /// Seed for reproducible question and option order
    #[arg(long)]
    pub seed: Option<u64>,

    /// Output directory for result exports
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Export formats: text, json, html, all (comma-separated)
    #[arg(long, default_value = "text,json")]
    pub format: String,

    /// Config file path
    #[arg(long)]
    pub config: Option<PathBuf>,
}

pub fn execute(args: PlayArgs) -> Result<()> {
    let config = load_config_from(args.config.as_deref())?;
    let formats = ExportFormat::parse_list(&args.format).map_err(anyhow::Error::msg)?;

    let LoadedBank { bank, origin } = match &args.bank {
        Some(path) => LoadedBank {
            bank: load_bank(path)
                .with_context(|| format!("failed to load bank {}", path.display()))?,
            origin: BankOrigin::File(path.clone()),
        },
        None => load_or_fallback(&config.bank_paths),
    };
    match &origin {
        BankOrigin::File(path) => {
            eprintln!("Loaded {} questions from {}", bank.len(), path.display())
        }
        BankOrigin::Fallback => eprintln!(
            "No question bank found; using {} built-in sample questions",
            bank.len()
        ),
    }

    let count = args.count.unwrap_or(config.question_count);
    let topic = args.topic.unwrap_or(config.topic);
    let policy = args.feedback.unwrap_or(config.feedback);
    let shuffle_options = config.shuffle_options && !args.no_shuffle_options;
    let lock = config.lock_after_feedback && !args.allow_changes;
    let output_dir = args.output.unwrap_or(config.output_dir);

    let mut shuffler = match args.seed {
        Some(seed) => RandomShuffler::seeded(seed),
        None => RandomShuffler::from_entropy(),
    };

    let session = SessionBuilder::new(&bank)
        .with_count(count)
        .with_topic(topic)
        .with_option_shuffle(shuffle_options)
        .build(&mut shuffler)?;
    let mut state = SessionState::new(session, policy)?.with_answer_lock(lock);

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut quiz = TerminalQuiz::new(stdin.lock(), stdout.lock());

    loop {
        let Some(submission) = quiz.run(&mut state)? else {
            quiz.say("Quiz abandoned; nothing was saved.")?;
            return Ok(());
        };

        let report = QuizReport::from_submission(&state, &submission)?;
        quiz.print_results(&report)?;
        for path in write_exports(&report, &output_dir, &formats)? {
            quiz.say(&format!("Saved {}", path.display()))?;
        }

        if !quiz.confirm("Retake with reshuffled options? [y/N]")? {
            return Ok(());
        }
        state = if shuffle_options {
            state.retake(&mut shuffler)?
        } else {
            state.retake(&mut IdentityShuffler)?
        };
    }
}

/// One parsed line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Input {
    Answer(String),
    Next,
    Previous,
    GoTo(usize),
    Submit,
    Quit,
    Help,
    Invalid(String),
}

fn parse_input(line: &str, question: &SessionQuestion) -> Input {
    let line = line.trim();
    match line {
        "n" | "next" => return Input::Next,
        "p" | "prev" | "previous" => return Input::Previous,
        "s" | "submit" => return Input::Submit,
        "q" | "quit" => return Input::Quit,
        "h" | "help" | "?" => return Input::Help,
        _ => {}
    }
    if let Some(rest) = line.strip_prefix("g ").or_else(|| line.strip_prefix("go ")) {
        return match rest.trim().parse::<usize>() {
            Ok(n) if n >= 1 => Input::GoTo(n - 1),
            _ => Input::Invalid(format!("'{}' is not a question number", rest.trim())),
        };
    }
    if question.has_option(line) {
        return Input::Answer(line.to_string());
    }
    let lower = line.to_lowercase();
    if question.has_option(&lower) {
        return Input::Answer(lower);
    }
    if let Some(key) = line.parse::<usize>().ok().and_then(|n| question.key_at(n)) {
        return Input::Answer(key.to_string());
    }
    Input::Invalid(format!("'{line}' is not an option or command (h for help)"))
}

const HELP: &str = "\
Answer with an option key (a, b, ...) or its number (1, 2, ...).
  n  next question        p  previous question
  g <n>  go to question n s  submit
  q  quit without saving  h  this help";

/// Line-oriented quiz loop over any reader/writer pair.
pub struct TerminalQuiz<R, W> {
    input: R,
    out: W,
}

impl<R: BufRead, W: Write> TerminalQuiz<R, W> {
    pub fn new(input: R, out: W) -> Self {
        Self { input, out }
    }

    pub fn say(&mut self, message: &str) -> Result<()> {
        writeln!(self.out, "{message}")?;
        Ok(())
    }

    /// Next input line, or `None` at end of input.
    fn read_line(&mut self) -> Result<Option<String>> {
        write!(self.out, "> ")?;
        self.out.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            writeln!(self.out)?;
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    pub fn confirm(&mut self, prompt: &str) -> Result<bool> {
        self.say(prompt)?;
        Ok(self
            .read_line()?
            .is_some_and(|l| matches!(l.to_lowercase().as_str(), "y" | "yes")))
    }

    /// Drive `state` until it is submitted (`Some`) or the user quits (`None`).
    pub fn run(&mut self, state: &mut SessionState) -> Result<Option<Submission>> {
        writeln!(
            self.out,
            "Starting quiz: {} questions, {} feedback. Type h for help.",
            state.len(),
            state.policy()
        )?;
        let mut show = true;
        loop {
            if show {
                self.render(state)?;
            }
            show = true;

            let Some(line) = self.read_line()? else {
                return Ok(None);
            };
            let question = &state.session().items[state.current_index()];
            match parse_input(&line, question) {
                Input::Answer(key) => match state.answer_current(&key) {
                    Ok(outcome) => {
                        self.print_feedback(state, &outcome)?;
                        if state.has_next() {
                            state.next()?;
                        } else {
                            show = false;
                            self.say("That was the last question. Type s to submit.")?;
                        }
                    }
                    Err(e) => {
                        show = false;
                        self.say(&e.to_string())?;
                    }
                },
                Input::Next => {
                    if state.next().is_err() {
                        show = false;
                        self.say("Already at the last question.")?;
                    }
                }
                Input::Previous => {
                    if state.previous().is_err() {
                        show = false;
                        self.say("Already at the first question.")?;
                    }
                }
                Input::GoTo(index) => {
                    if let Err(e) = state.go_to(index) {
                        show = false;
                        self.say(&e.to_string())?;
                    }
                }
                Input::Submit => {
                    if let SubmitCheck::Unanswered { count } = state.submit_check() {
                        let prompt =
                            format!("{count} question(s) unanswered. Submit anyway? [y/N]");
                        if !self.confirm(&prompt)? {
                            continue;
                        }
                    }
                    return Ok(Some(state.submit()?));
                }
                Input::Quit => return Ok(None),
                Input::Help => {
                    show = false;
                    self.say(HELP)?;
                }
                Input::Invalid(message) => {
                    show = false;
                    self.say(&message)?;
                }
            }
        }
    }

    fn render(&mut self, state: &SessionState) -> Result<()> {
        let view = state.current_view();
        let progress = state.progress();

        writeln!(self.out)?;
        write!(self.out, "Question {} of {}", view.number, view.total)?;
        if let Some(topic) = &view.topic {
            write!(self.out, " [{topic}]")?;
        }
        write!(
            self.out,
            "   Answered: {}/{}",
            progress.answered, progress.total
        )?;
        if state.policy() == FeedbackPolicy::Instant {
            write!(self.out, "   Score: {}", state.score_display())?;
        }
        writeln!(self.out)?;
        writeln!(self.out, "{}", view.text)?;

        for (i, option) in view.options.iter().enumerate() {
            let marker = if option.selected { '*' } else { ' ' };
            let verdict = match option.correct {
                Some(true) => "  [correct]",
                Some(false) if option.selected => "  [your answer]",
                _ => "",
            };
            writeln!(
                self.out,
                "{marker} {}. ({}) {}{verdict}",
                i + 1,
                option.key.to_uppercase(),
                option.text
            )?;
        }
        if view.locked && !state.is_submitted() {
            writeln!(self.out, "  (answer locked)")?;
        }
        Ok(())
    }

    fn print_feedback(&mut self, state: &SessionState, outcome: &AnswerOutcome) -> Result<()> {
        let Some(feedback) = &outcome.feedback else {
            return Ok(());
        };
        if feedback.correct {
            writeln!(self.out, "Correct!")?;
        } else {
            let question = &state.session().items[outcome.index];
            writeln!(
                self.out,
                "Incorrect. The correct answer is {}. {}",
                feedback.correct_key.to_uppercase(),
                question.option_text(&feedback.correct_key).unwrap_or_default()
            )?;
        }
        if let Some(explanation) = &feedback.explanation {
            writeln!(self.out, "Explanation: {explanation}")?;
        }
        Ok(())
    }

    pub fn print_results(&mut self, report: &QuizReport) -> Result<()> {
        writeln!(self.out)?;
        write!(self.out, "{}", report.transcript())?;
        writeln!(self.out, "{}", report.performance.message())?;
        if !report.per_topic.is_empty() {
            writeln!(self.out, "{}", super::topic_table(&report.per_topic))?;
        }
        Ok(())
    }
}
