//! Update dispatching and the `/checkbio` flow.

use std::convert::Infallible;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use teloxide::net::Download;
use teloxide::prelude::*;
use teloxide::types::{Document, InputFile};
use tracing::{debug, info, warn};

use super::input::{attached_documents, collect_numbers, is_text_document};
use super::progress::MessageEditTarget;
use super::TelegramError;
use crate::check::{BioChecker, CheckError, Report};
use crate::commands::{CommandHandler, Dispatch, Sender};
use crate::config::BotSettings;
use crate::progress::{ProgressSink, ThrottledProgress};

/// File name the report is delivered under.
pub const REPORT_FILE_NAME: &str = "bio_check_result.txt";

const STARTING_TEXT: &str = "⏳ Starting bio check...";

/// Shared state handed to every update handler.
pub struct AppState {
    pub handler: CommandHandler,
    pub checker: BioChecker,
    pub settings: BotSettings,

    /// Largest document downloaded for number extraction.
    pub max_document_bytes: u32,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("settings", &self.settings)
            .field("max_document_bytes", &self.max_document_bytes)
            .finish_non_exhaustive()
    }
}

/// Drops any webhook and pending updates, then long-polls until Ctrl+C.
///
/// # Errors
///
/// Returns an error if the webhook cannot be removed.
pub async fn run_polling(bot: Bot, state: Arc<AppState>) -> Result<(), TelegramError> {
    bot.delete_webhook().drop_pending_updates(true).await?;
    info!("Webhook removed, pending updates dropped");

    let handler = Update::filter_message().endpoint(handle_message);

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .distribution_function(no_chat_ordering)
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}

/// Lets every update run concurrently, so a long `/checkbio` does not hold up
/// later commands from the same chat.
fn no_chat_ordering(_update: &Update) -> Option<Infallible> {
    None
}

/// Handles one incoming message.
pub async fn handle_message(bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(text) = msg.text().or_else(|| msg.caption()) else {
        return Ok(());
    };
    let Some(user) = msg.from() else {
        return Ok(());
    };
    let Ok(user_id) = i64::try_from(user.id.0) else {
        return Ok(());
    };

    let sender = Sender {
        id: user_id,
        first_name: user.first_name.clone(),
    };

    let Some(dispatch) = state.handler.try_handle(&sender, text).await else {
        return Ok(());
    };

    match dispatch {
        Dispatch::Reply(result) => {
            bot.send_message(msg.chat.id, result.message).await?;
        }
        Dispatch::CheckBio(args) => run_check(&bot, &msg, &state, user_id, &args).await?,
    }

    Ok(())
}

/// Gathers input, runs the workflow with live progress and delivers the report.
async fn run_check(
    bot: &Bot,
    msg: &Message,
    state: &AppState,
    user_id: i64,
    args: &str,
) -> ResponseResult<()> {
    let chat_id = msg.chat.id;

    let mut bodies = Vec::new();
    for doc in attached_documents(msg) {
        let name = doc.file_name.as_deref().unwrap_or("document");
        match download_text(bot, doc, state.max_document_bytes).await {
            Ok(body) => bodies.push(body),
            Err(e) => {
                warn!("Could not read document '{}': {}", name, e);
                bot.send_message(chat_id, format!("⚠️ Could not read {name}: {e}"))
                    .await?;
            }
        }
    }

    let numbers = collect_numbers(args, &bodies);
    if numbers.is_empty() {
        bot.send_message(chat_id, CheckError::EmptyInput.user_message())
            .await?;
        return Ok(());
    }

    info!(
        "User {} started a bio check with {} numbers",
        user_id,
        numbers.len()
    );

    let status = bot.send_message(chat_id, STARTING_TEXT).await?;
    let target = MessageEditTarget::new(bot.clone(), chat_id, status.id);
    let mut progress = ThrottledProgress::new(
        target,
        state.settings.check.progress_interval(),
        STARTING_TEXT,
    );

    let report = match state.checker.check_bio(&numbers, &mut progress).await {
        Ok(report) => report,
        Err(e) => {
            warn!("Bio check for user {} failed: {}", user_id, e);
            progress.finish(&e.user_message()).await;
            return Ok(());
        }
    };

    deliver_report(bot, chat_id, &state.settings.data_dir, user_id, &report).await;
    Ok(())
}

/// Downloads a text document into memory.
async fn download_text(bot: &Bot, doc: &Document, limit: u32) -> Result<String, TelegramError> {
    let mime = doc.mime_type.as_ref().map(|m| m.essence_str());
    if !is_text_document(doc.file_name.as_deref(), mime) {
        return Err(TelegramError::UnsupportedDocument(
            doc.file_name.clone().unwrap_or_default(),
        ));
    }
    if doc.file.size > limit {
        return Err(TelegramError::DocumentTooLarge {
            size: doc.file.size,
            limit,
        });
    }

    let file = bot.get_file(doc.file.id.clone()).await?;
    let mut dst: Vec<u8> = Vec::with_capacity(doc.file.size as usize);
    bot.download_file(&file.path, &mut dst).await?;

    debug!("Downloaded {} bytes", dst.len());
    Ok(String::from_utf8_lossy(&dst).into_owned())
}

/// Path the report is staged at before upload.
fn report_path(data_dir: &Path, user_id: i64) -> PathBuf {
    data_dir.join(format!(
        "result_{user_id}_{}.txt",
        Utc::now().timestamp_millis()
    ))
}

/// Writes the report, uploads it and removes the staged file.
async fn deliver_report(bot: &Bot, chat_id: ChatId, data_dir: &Path, user_id: i64, report: &Report) {
    let path = report_path(data_dir, user_id);

    if let Err(e) = tokio::fs::create_dir_all(data_dir).await {
        warn!("Failed to create data dir {}: {}", data_dir.display(), e);
    }
    if let Err(e) = tokio::fs::write(&path, report.render()).await {
        warn!("Failed to write report {}: {}", path.display(), e);
        return;
    }

    let upload = bot
        .send_document(chat_id, InputFile::file(&path).file_name(REPORT_FILE_NAME))
        .caption(report.summary())
        .await;
    match upload {
        Ok(_) => info!("Report delivered to user {}", user_id),
        Err(e) => warn!("Failed to send report to user {}: {}", user_id, e),
    }

    if let Err(e) = tokio::fs::remove_file(&path).await {
        warn!("Failed to remove report {}: {}", path.display(), e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_updates_are_not_serialized_per_chat() {
        let update: Update = serde_json::from_str(
            r#"{
                "update_id": 1,
                "message": {
                    "message_id": 10,
                    "date": 1700000000,
                    "chat": {"id": 5, "type": "private", "first_name": "A"},
                    "from": {"id": 5, "is_bot": false, "first_name": "A"},
                    "text": "/checkbio 628123456"
                }
            }"#,
        )
        .unwrap();

        assert!(no_chat_ordering(&update).is_none());
    }

    #[test]
    fn test_report_path_layout() {
        let path = report_path(Path::new("/data"), 42);
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("result_42_"));
        assert!(name.ends_with(".txt"));
        assert_eq!(path.parent(), Some(Path::new("/data")));
    }
}
