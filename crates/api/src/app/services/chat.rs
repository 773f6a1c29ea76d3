use lifetip_core::{UserId, text};

use super::{AppServices, ServiceResult};

pub const MESSAGE_MAX_CHARS: usize = 2000;

impl AppServices {
    /// Forward a user message to the completion API.
    pub async fn chat(&self, user_id: UserId, message: &str) -> ServiceResult<String> {
        let message = text::bounded("message", message, 1, MESSAGE_MAX_CHARS)?;
        let reply = self.chat.complete(&message).await?;
        tracing::info!(user_id = %user_id, reply_len = reply.len(), "chat reply");
        Ok(reply)
    }
}
