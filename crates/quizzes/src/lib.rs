//! Multiple-choice quizzes about everyday policy and living tips.

pub mod quiz;

pub use quiz::{Grade, NewQuiz, Quiz};
