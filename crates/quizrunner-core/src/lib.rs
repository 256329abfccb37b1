//! quizrunner-core: Question bank, session engine, scoring, and review.
//!
//! This crate holds the quiz logic with no terminal or browser attached:
//! load and validate a bank, build a shuffled session, record answers under
//! a feedback policy, then score and review the submission.

pub mod bank;
pub mod builder;
pub mod error;
pub mod model;
pub mod report;
pub mod review;
pub mod scoring;
pub mod session;
pub mod shuffle;

pub use error::QuizError;
