//! Command handler implementation.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::types::{BotCommand, CommandResult};
use crate::access::{AccessLevel, AccessPolicy};
use crate::numbers::mask_phone;
use crate::whatsapp::MessagingClient;

/// What the transport should do with a parsed command.
#[derive(Debug, Clone)]
pub enum Dispatch {
    /// Send this reply.
    Reply(CommandResult),

    /// Run a bio check. Carries the inline text after the command.
    CheckBio(String),
}

/// The user who sent a command.
#[derive(Debug, Clone)]
pub struct Sender {
    pub id: i64,
    pub first_name: String,
}

/// Handles bot commands and enforces access levels.
pub struct CommandHandler {
    /// Owner id and premium allowlist.
    access: AccessPolicy,

    /// WhatsApp client used for pairing.
    client: Arc<dyn MessagingClient>,

    /// Username of this bot, for `/cmd@username` addressing.
    bot_username: Option<String>,
}

impl CommandHandler {
    /// Creates a new command handler.
    #[must_use]
    pub fn new(access: AccessPolicy, client: Arc<dyn MessagingClient>) -> Self {
        Self {
            access,
            client,
            bot_username: None,
        }
    }

    /// Sets the bot username used to filter addressed commands.
    #[must_use]
    pub fn with_bot_username(mut self, username: Option<String>) -> Self {
        self.bot_username = username;
        self
    }

    #[must_use]
    pub const fn access(&self) -> &AccessPolicy {
        &self.access
    }

    /// Tries to parse, authorize and execute a command from a message.
    ///
    /// Returns `None` if the message is not a command.
    pub async fn try_handle(&self, sender: &Sender, message_text: &str) -> Option<Dispatch> {
        let command = BotCommand::parse(message_text, self.bot_username.as_deref())?;

        debug!("Handling command from {}: {}", sender.id, command);

        if let Some(denied) = self.authorize(sender.id, &command) {
            info!("Denied '{}' for user {}", command.name(), sender.id);
            return Some(Dispatch::Reply(denied));
        }

        let dispatch = match command {
            BotCommand::CheckBio(args) => Dispatch::CheckBio(args),
            other => {
                let result = self.execute(sender, other).await;
                info!("Command result: success={}", result.success);
                Dispatch::Reply(result)
            }
        };
        Some(dispatch)
    }

    /// Returns the denial reply if `user_id` may not run `command`.
    fn authorize(&self, user_id: i64, command: &BotCommand) -> Option<CommandResult> {
        let level = command.required_access();
        if self.access.allows(user_id, level) {
            return None;
        }

        let message = match level {
            AccessLevel::Owner => "🚫 Owner only.",
            AccessLevel::Premium | AccessLevel::Public => {
                "💎 Premium feature. Contact the owner for access."
            }
        };
        Some(CommandResult::error(message))
    }

    /// Executes a parsed command other than a bio check.
    async fn execute(&self, sender: &Sender, command: BotCommand) -> CommandResult {
        match command {
            BotCommand::Start => handle_start(&sender.first_name),
            BotCommand::Pairing(phone) => self.handle_pairing(&phone).await,
            BotCommand::AddAccess(raw) => self.handle_add_access(&raw),
            BotCommand::RemoveAccess(raw) => self.handle_remove_access(&raw),
            BotCommand::ListAccess => self.handle_list_access(),
            BotCommand::CheckBio(_) => {
                CommandResult::error("Bio checks are handled by the transport.")
            }
        }
    }

    async fn handle_pairing(&self, raw_phone: &str) -> CommandResult {
        let phone: String = raw_phone.chars().filter(char::is_ascii_digit).collect();
        if phone.is_empty() {
            return CommandResult::error("Format: /pairing 628xxx");
        }

        match self.client.request_pairing_code(&phone).await {
            Ok(code) => {
                info!("Pairing code issued for {}", mask_phone(&phone));
                CommandResult::success(format!("📲 Pairing code:\n{code}"))
            }
            Err(e) => {
                warn!("Pairing request failed: {}", e);
                CommandResult::error(format!("❌ Failed: {e}"))
            }
        }
    }

    fn handle_add_access(&self, raw: &str) -> CommandResult {
        let Some(id) = parse_user_id(raw) else {
            return CommandResult::error("Format: /addaccess <ID>");
        };

        let store = self.access.store();
        let mut list = store.load();
        if !list.insert(id) {
            return CommandResult::success(format!("ℹ️ ID {id} already has premium access."));
        }

        if let Err(e) = store.save(&list) {
            warn!("Failed to save access list: {}", e);
            return CommandResult::error(format!("Failed to save: {e}"));
        }

        CommandResult::success(format!("✅ ID {id} added to premium."))
    }

    fn handle_remove_access(&self, raw: &str) -> CommandResult {
        let Some(id) = parse_user_id(raw) else {
            return CommandResult::error("Format: /removeaccess <ID>");
        };

        let store = self.access.store();
        let mut list = store.load();
        if !list.remove(id) {
            return CommandResult::success(format!("ℹ️ ID {id} is not on the premium list."));
        }

        if let Err(e) = store.save(&list) {
            warn!("Failed to save access list: {}", e);
            return CommandResult::error(format!("Failed to save: {e}"));
        }

        CommandResult::success(format!("✅ ID {id} removed from premium."))
    }

    fn handle_list_access(&self) -> CommandResult {
        let list = self.access.store().load();
        if list.is_empty() {
            return CommandResult::success("No premium users.");
        }

        let mut lines = vec![format!("Premium users ({}):", list.len())];
        lines.extend(list.ids().iter().map(|id| format!("• {id}")));
        CommandResult::success(lines.join("\n"))
    }
}

impl std::fmt::Debug for CommandHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandHandler")
            .field("access", &self.access)
            .field("bot_username", &self.bot_username)
            .finish_non_exhaustive()
    }
}

fn handle_start(first_name: &str) -> CommandResult {
    let mut lines = vec![
        format!("🤖 Hi {first_name}!"),
        String::new(),
        "Use this bot to bulk-check WhatsApp bios.".to_owned(),
        String::new(),
        "How to use:".to_owned(),
        "1. Send /checkbio 62812xxx 62813xxx".to_owned(),
        "2. Reply to a .txt file with /checkbio".to_owned(),
        "3. Upload a .txt file with the caption /checkbio".to_owned(),
        String::new(),
        "Commands:".to_owned(),
    ];

    for (cmd, desc) in BotCommand::all_commands() {
        lines.push(format!("  /{cmd} - {desc}"));
    }

    CommandResult::success(lines.join("\n"))
}

/// Parses a Telegram user id argument.
fn parse_user_id(raw: &str) -> Option<i64> {
    raw.trim().parse::<i64>().ok().filter(|&id| id > 0)
}
