use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use lifetip_core::{DomainError, DomainResult, QuizId, text};

pub const QUESTION_MAX_CHARS: usize = 500;
pub const CHOICE_MAX_CHARS: usize = 200;
pub const EXPLANATION_MAX_CHARS: usize = 2000;
pub const MIN_CHOICES: usize = 2;
pub const MAX_CHOICES: usize = 6;

/// A multiple-choice quiz.
///
/// # Invariants
/// - `MIN_CHOICES <= choices.len() <= MAX_CHOICES`
/// - `answer_index < choices.len()`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quiz {
    pub id: QuizId,
    pub question: String,
    pub choices: Vec<String>,
    pub answer_index: u32,
    pub explanation: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Outcome of answering a quiz.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grade {
    pub correct: bool,
    pub answer_index: u32,
    pub explanation: Option<String>,
}

impl Quiz {
    pub fn create(new: NewQuiz, now: DateTime<Utc>) -> Self {
        Self {
            id: QuizId::new(),
            question: new.question,
            choices: new.choices,
            answer_index: new.answer_index,
            explanation: new.explanation,
            created_at: now,
        }
    }

    /// Grade a submitted choice. Out-of-range choices are a validation error,
    /// not a wrong answer.
    pub fn grade(&self, choice: u32) -> DomainResult<Grade> {
        if choice as usize >= self.choices.len() {
            return Err(DomainError::validation(
                "choice",
                format!("must be between 0 and {}", self.choices.len() - 1),
            ));
        }
        Ok(Grade {
            correct: choice == self.answer_index,
            answer_index: self.answer_index,
            explanation: self.explanation.clone(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewQuiz {
    pub question: String,
    pub choices: Vec<String>,
    pub answer_index: u32,
    pub explanation: Option<String>,
}

impl NewQuiz {
    pub fn new(
        question: &str,
        choices: &[String],
        answer_index: u32,
        explanation: Option<&str>,
    ) -> DomainResult<Self> {
        if !(MIN_CHOICES..=MAX_CHOICES).contains(&choices.len()) {
            return Err(DomainError::validation(
                "choices",
                format!("must have {MIN_CHOICES} to {MAX_CHOICES} entries"),
            ));
        }
        let choices = choices
            .iter()
            .map(|c| text::bounded("choices", c, 1, CHOICE_MAX_CHARS))
            .collect::<DomainResult<Vec<_>>>()?;
        if answer_index as usize >= choices.len() {
            return Err(DomainError::validation(
                "answerIndex",
                "must point at one of the choices",
            ));
        }
        Ok(Self {
            question: text::bounded("question", question, 1, QUESTION_MAX_CHARS)?,
            choices,
            answer_index,
            explanation: text::optional("explanation", explanation, EXPLANATION_MAX_CHARS)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn choices(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("choice {i}")).collect()
    }

    fn quiz(answer: u32) -> Quiz {
        let new = NewQuiz::new(
            "Which office issues resident cards?",
            &choices(3),
            answer,
            Some("Community service centers handle it."),
        )
        .unwrap();
        Quiz::create(new, Utc::now())
    }

    #[test]
    fn choice_count_is_bounded() {
        assert!(NewQuiz::new("q", &choices(1), 0, None).is_err());
        assert!(NewQuiz::new("q", &choices(MAX_CHOICES + 1), 0, None).is_err());
        assert!(NewQuiz::new("q", &choices(MAX_CHOICES), 0, None).is_ok());
    }

    #[test]
    fn answer_must_be_a_choice() {
        let err = NewQuiz::new("q", &choices(2), 2, None).unwrap_err();
        assert!(matches!(err, DomainError::Validation { field: "answerIndex", .. }));
    }

    #[test]
    fn blank_choice_rejected() {
        let mut c = choices(3);
        c[1] = "  ".to_string();
        assert!(NewQuiz::new("q", &c, 0, None).is_err());
    }

    #[test]
    fn grade_reveals_answer_and_explanation() {
        let q = quiz(1);
        let wrong = q.grade(0).unwrap();
        assert!(!wrong.correct);
        assert_eq!(wrong.answer_index, 1);
        assert!(wrong.explanation.is_some());
        assert!(q.grade(1).unwrap().correct);
    }

    #[test]
    fn out_of_range_choice_is_validation_error() {
        assert!(matches!(
            quiz(0).grade(3),
            Err(DomainError::Validation { field: "choice", .. })
        ));
    }

    proptest! {
        #[test]
        fn exactly_one_choice_is_correct(answer in 0u32..3) {
            let q = quiz(answer);
            let correct = (0..3).filter(|c| q.grade(*c).unwrap().correct).count();
            prop_assert_eq!(correct, 1);
        }
    }
}
