//! Progress target that edits a status message in place.

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::MessageId;
use teloxide::RequestError;

use crate::progress::{ProgressTarget, RenderError};

/// Edits one chat message with each rendered snapshot.
#[derive(Debug, Clone)]
pub struct MessageEditTarget {
    bot: Bot,
    chat_id: ChatId,
    message_id: MessageId,
}

impl MessageEditTarget {
    #[must_use]
    pub const fn new(bot: Bot, chat_id: ChatId, message_id: MessageId) -> Self {
        Self {
            bot,
            chat_id,
            message_id,
        }
    }
}

#[async_trait]
impl ProgressTarget for MessageEditTarget {
    async fn render(&self, text: &str) -> Result<(), RenderError> {
        self.bot
            .edit_message_text(self.chat_id, self.message_id, text)
            .await
            .map(|_| ())
            .map_err(render_error)
    }
}

fn render_error(err: RequestError) -> RenderError {
    match err {
        RequestError::RetryAfter(wait) => RenderError::RetryAfter(wait),
        other => RenderError::Failed(other.to_string()),
    }
}
