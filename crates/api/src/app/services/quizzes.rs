use chrono::Utc;

use lifetip_core::{Page, QuizId};
use lifetip_quizzes::{Grade, NewQuiz, Quiz};

use super::{AppServices, ServiceResult};
use crate::app::errors::ApiError;

impl AppServices {
    pub async fn list_quizzes(&self, page: Page) -> ServiceResult<Vec<Quiz>> {
        Ok(self.store.list_quizzes(page).await?)
    }

    pub async fn get_quiz(&self, quiz_id: QuizId) -> ServiceResult<Quiz> {
        self.store
            .find_quiz(quiz_id)
            .await?
            .ok_or(ApiError::NotFound("quiz"))
    }

    pub async fn create_quiz(&self, new: NewQuiz) -> ServiceResult<Quiz> {
        let quiz = Quiz::create(new, Utc::now());
        self.store.insert_quiz(&quiz).await?;
        tracing::info!(quiz_id = %quiz.id, "quiz created");
        Ok(quiz)
    }

    pub async fn answer_quiz(&self, quiz_id: QuizId, choice: u32) -> ServiceResult<Grade> {
        let quiz = self.get_quiz(quiz_id).await?;
        Ok(quiz.grade(choice)?)
    }
}
