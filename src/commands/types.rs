//! Command types and definitions.

use std::fmt;

use crate::access::AccessLevel;

/// Available bot commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotCommand {
    /// Show usage information.
    Start,

    /// Request a WhatsApp pairing code for a phone number.
    Pairing(String),

    /// Grant premium access to a user id.
    AddAccess(String),

    /// Revoke premium access from a user id.
    RemoveAccess(String),

    /// List the premium allowlist.
    ListAccess,

    /// Check WhatsApp bios. Carries the text after the command.
    CheckBio(String),
}

impl BotCommand {
    /// Parses a command from a message text or caption.
    ///
    /// `bot_username` filters out commands addressed to other bots
    /// (`/cmd@other_bot`). Returns `None` if the text is not a known command.
    #[must_use]
    pub fn parse(text: &str, bot_username: Option<&str>) -> Option<Self> {
        let text = text.trim_start();
        let after_slash = text.strip_prefix('/')?;

        let (head, args) = match after_slash.split_once(char::is_whitespace) {
            Some((head, args)) => (head, args.trim()),
            None => (after_slash, ""),
        };

        let cmd = match head.split_once('@') {
            Some((cmd, target)) => {
                let addressed_to_us = bot_username
                    .is_some_and(|name| name.trim_start_matches('@').eq_ignore_ascii_case(target));
                if !addressed_to_us {
                    return None;
                }
                cmd
            }
            None => head,
        };

        match cmd.to_lowercase().as_str() {
            "start" | "help" => Some(Self::Start),
            "pairing" => Some(Self::Pairing(first_arg(args))),
            "addaccess" | "addakses" => Some(Self::AddAccess(first_arg(args))),
            "removeaccess" | "delaccess" | "delakses" => Some(Self::RemoveAccess(first_arg(args))),
            "listaccess" | "listakses" => Some(Self::ListAccess),
            "checkbio" | "cekbio" => Some(Self::CheckBio(args.to_owned())),
            _ => None,
        }
    }

    /// Returns the command name as it appears in help.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Pairing(_) => "pairing",
            Self::AddAccess(_) => "addaccess",
            Self::RemoveAccess(_) => "removeaccess",
            Self::ListAccess => "listaccess",
            Self::CheckBio(_) => "checkbio",
        }
    }

    /// Access level needed to run the command.
    #[must_use]
    pub const fn required_access(&self) -> AccessLevel {
        match self {
            Self::Start => AccessLevel::Public,
            Self::Pairing(_) | Self::AddAccess(_) | Self::RemoveAccess(_) | Self::ListAccess => {
                AccessLevel::Owner
            }
            Self::CheckBio(_) => AccessLevel::Premium,
        }
    }

    /// Returns all available commands with their descriptions.
    #[must_use]
    pub fn all_commands() -> Vec<(&'static str, &'static str)> {
        vec![
            ("checkbio <numbers>", "Check WhatsApp bios (or reply to a .txt file)"),
            ("pairing <phone>", "Get a WhatsApp pairing code (owner)"),
            ("addaccess <id>", "Grant premium access (owner)"),
            ("removeaccess <id>", "Revoke premium access (owner)"),
            ("listaccess", "List premium users (owner)"),
            ("start", "Show this help message"),
        ]
    }
}

fn first_arg(args: &str) -> String {
    args.split_whitespace().next().unwrap_or_default().to_owned()
}

impl fmt::Display for BotCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pairing(phone) => write!(f, "pairing {phone}"),
            Self::AddAccess(id) => write!(f, "addaccess {id}"),
            Self::RemoveAccess(id) => write!(f, "removeaccess {id}"),
            Self::CheckBio(args) => write!(f, "checkbio ({} chars)", args.len()),
            _ => write!(f, "{}", self.name()),
        }
    }
}

/// Result of command execution.
#[derive(Debug, Clone)]
pub struct CommandResult {
    /// Whether the command was successful.
    pub success: bool,

    /// Response message to show the user.
    pub message: String,
}

impl CommandResult {
    /// Creates a successful result.
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    /// Creates an error result.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_start() {
        assert_eq!(BotCommand::parse("/start", None), Some(BotCommand::Start));
        assert_eq!(BotCommand::parse("/help", None), Some(BotCommand::Start));
    }

    #[test]
    fn test_parse_checkbio_with_numbers() {
        assert_eq!(
            BotCommand::parse("/checkbio 628123456 628654321", None),
            Some(BotCommand::CheckBio("628123456 628654321".to_owned()))
        );
        assert_eq!(
            BotCommand::parse("/cekbio\n628123456", None),
            Some(BotCommand::CheckBio("628123456".to_owned()))
        );
    }

    #[test]
    fn test_parse_checkbio_without_args() {
        assert_eq!(
            BotCommand::parse("/checkbio", None),
            Some(BotCommand::CheckBio(String::new()))
        );
    }

    #[test]
    fn test_parse_access_aliases() {
        assert_eq!(
            BotCommand::parse("/addakses 12345", None),
            Some(BotCommand::AddAccess("12345".to_owned()))
        );
        assert_eq!(
            BotCommand::parse("/delakses 12345 extra", None),
            Some(BotCommand::RemoveAccess("12345".to_owned()))
        );
        assert_eq!(
            BotCommand::parse("/listaccess", None),
            Some(BotCommand::ListAccess)
        );
    }

    #[test]
    fn test_parse_pairing_without_arg() {
        assert_eq!(
            BotCommand::parse("/pairing", None),
            Some(BotCommand::Pairing(String::new()))
        );
    }

    #[test]
    fn test_parse_bot_mention() {
        assert_eq!(
            BotCommand::parse("/start@BioBot", Some("biobot")),
            Some(BotCommand::Start)
        );
        assert_eq!(BotCommand::parse("/start@OtherBot", Some("biobot")), None);
        assert_eq!(BotCommand::parse("/start@BioBot", None), None);
    }

    #[test]
    fn test_parse_not_a_command() {
        assert_eq!(BotCommand::parse("checkbio 628123456", None), None);
        assert_eq!(BotCommand::parse("/unknown", None), None);
        assert_eq!(BotCommand::parse("", None), None);
    }

    #[test]
    fn test_parse_case_insensitive() {
        assert_eq!(
            BotCommand::parse("/CheckBio 628123456", None),
            Some(BotCommand::CheckBio("628123456".to_owned()))
        );
    }

    #[test]
    fn test_required_access() {
        assert_eq!(BotCommand::Start.required_access(), AccessLevel::Public);
        assert_eq!(BotCommand::ListAccess.required_access(), AccessLevel::Owner);
        assert_eq!(
            BotCommand::CheckBio(String::new()).required_access(),
            AccessLevel::Premium
        );
    }
}
