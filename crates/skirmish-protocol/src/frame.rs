//! Client frames parsed into closed enums.
//!
//! A frame is split on ASCII whitespace exactly once, here, and the rest of
//! the server matches on the resulting variants. Nothing downstream ever
//! looks at raw tokens again.

use crate::{HotbarSlot, ProtocolError, WeaponId};

// ---------------------------------------------------------------------------
// Handshake
// ---------------------------------------------------------------------------

/// A frame received before the connection is authenticated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandshakeFrame {
    /// The literal `quit`: the client leaves before logging in.
    Quit,

    /// `REGISTER <username> <email> <password>`.
    Register {
        username: String,
        email: String,
        password: String,
    },

    /// `REGISTER` followed by the wrong number of tokens.
    MalformedRegister { tokens: usize },

    /// `<email> <password>`.
    Login { email: String, password: String },

    /// A login frame with the wrong number of tokens.
    Malformed { tokens: usize },

    /// A blank line.
    Empty,
}

impl HandshakeFrame {
    /// Parses the first handshake frame, where `quit` and `REGISTER` are
    /// recognised before falling back to a login attempt.
    pub fn parse(line: &str) -> Self {
        let tokens: Vec<&str> = line.split_ascii_whitespace().collect();
        match tokens.as_slice() {
            ["quit"] => HandshakeFrame::Quit,
            ["REGISTER", username, email, password] => HandshakeFrame::Register {
                username: (*username).to_string(),
                email: (*email).to_string(),
                password: (*password).to_string(),
            },
            ["REGISTER", rest @ ..] => HandshakeFrame::MalformedRegister {
                tokens: rest.len(),
            },
            _ => Self::login_from_tokens(&tokens),
        }
    }

    /// Parses a frame in the login retry loop, where every frame is a
    /// credential pair.
    pub fn parse_login(line: &str) -> Self {
        let tokens: Vec<&str> = line.split_ascii_whitespace().collect();
        Self::login_from_tokens(&tokens)
    }

    fn login_from_tokens(tokens: &[&str]) -> Self {
        match tokens {
            [] => HandshakeFrame::Empty,
            [email, password] => HandshakeFrame::Login {
                email: (*email).to_string(),
                password: (*password).to_string(),
            },
            other => HandshakeFrame::Malformed {
                tokens: other.len(),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

/// Actions on the weapon hotbar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HotbarCommand {
    /// `HOTBAR OPEN`
    Open,
    /// `HOTBAR SET <slot> <item>`
    Set { slot: HotbarSlot, item: WeaponId },
    /// `HOTBAR CLOSE`
    Close,
}

/// A frame received after authentication.
///
/// The reserved heads keep their arguments so a future handler can use them
/// without touching the parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Hotbar(HotbarCommand),
    Shop(Vec<String>),
    Friends(Vec<String>),
    Weapons(Vec<String>),
    Cosmetics(Vec<String>),
    Fight(Vec<String>),
    Quit,
    /// A blank line; skipped by the session.
    Empty,
    /// Any head the server does not know, kept for logging.
    Unknown(String),
}

impl Command {
    /// Parses a post-login frame.
    ///
    /// # Errors
    /// Returns a [`ProtocolError`] only for `HOTBAR` frames whose arguments
    /// are missing or invalid. Every other frame parses to some variant.
    pub fn parse(line: &str) -> Result<Self, ProtocolError> {
        let mut tokens = line.split_ascii_whitespace();
        let Some(head) = tokens.next() else {
            return Ok(Command::Empty);
        };
        if head == "HOTBAR" {
            return parse_hotbar(tokens);
        }

        let args: Vec<String> = tokens.map(str::to_string).collect();
        let command = match head {
            "SHOP" => Command::Shop(args),
            "FRIENDS" => Command::Friends(args),
            "WEAPONS" => Command::Weapons(args),
            "COSMETICS" => Command::Cosmetics(args),
            "FIGHT" => Command::Fight(args),
            "QUIT" => Command::Quit,
            other => Command::Unknown(other.to_string()),
        };
        Ok(command)
    }

    /// The head token, for logging.
    pub fn head(&self) -> &str {
        match self {
            Command::Hotbar(_) => "HOTBAR",
            Command::Shop(_) => "SHOP",
            Command::Friends(_) => "FRIENDS",
            Command::Weapons(_) => "WEAPONS",
            Command::Cosmetics(_) => "COSMETICS",
            Command::Fight(_) => "FIGHT",
            Command::Quit => "QUIT",
            Command::Empty => "",
            Command::Unknown(head) => head,
        }
    }
}

fn parse_hotbar<'a>(
    mut tokens: impl Iterator<Item = &'a str>,
) -> Result<Command, ProtocolError> {
    let action = tokens
        .next()
        .ok_or(ProtocolError::MissingArgument("hotbar action"))?;
    let hotbar = match action {
        "OPEN" => HotbarCommand::Open,
        "CLOSE" => HotbarCommand::Close,
        "SET" => {
            let slot = tokens
                .next()
                .ok_or(ProtocolError::MissingArgument("slot"))?
                .parse()?;
            let item = tokens
                .next()
                .ok_or(ProtocolError::MissingArgument("item"))?
                .parse()?;
            HotbarCommand::Set { slot, item }
        }
        other => return Ok(Command::Unknown(format!("HOTBAR {other}"))),
    };
    Ok(Command::Hotbar(hotbar))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(n: u8) -> HotbarSlot {
        HotbarSlot::try_from(n).unwrap()
    }

    // =====================================================================
    // HandshakeFrame::parse()
    // =====================================================================

    #[test]
    fn test_parse_quit_literal() {
        assert_eq!(HandshakeFrame::parse("quit"), HandshakeFrame::Quit);
        assert_eq!(HandshakeFrame::parse("  quit \r"), HandshakeFrame::Quit);
    }

    #[test]
    fn test_parse_quit_is_case_sensitive() {
        // `QUIT` before login is one token, so it is a malformed login.
        assert_eq!(
            HandshakeFrame::parse("QUIT"),
            HandshakeFrame::Malformed { tokens: 1 }
        );
    }

    #[test]
    fn test_parse_register_with_three_arguments() {
        assert_eq!(
            HandshakeFrame::parse("REGISTER alice alice@example.com secret"),
            HandshakeFrame::Register {
                username: "alice".into(),
                email: "alice@example.com".into(),
                password: "secret".into(),
            }
        );
    }

    #[test]
    fn test_parse_register_with_wrong_argument_count() {
        assert_eq!(
            HandshakeFrame::parse("REGISTER alice alice@example.com"),
            HandshakeFrame::MalformedRegister { tokens: 2 }
        );
        assert_eq!(
            HandshakeFrame::parse("REGISTER a b c d"),
            HandshakeFrame::MalformedRegister { tokens: 4 }
        );
    }

    #[test]
    fn test_parse_credentials() {
        assert_eq!(
            HandshakeFrame::parse("alice@example.com secret"),
            HandshakeFrame::Login {
                email: "alice@example.com".into(),
                password: "secret".into(),
            }
        );
    }

    #[test]
    fn test_parse_empty_and_malformed() {
        assert_eq!(HandshakeFrame::parse("   "), HandshakeFrame::Empty);
        assert_eq!(
            HandshakeFrame::parse("a b c"),
            HandshakeFrame::Malformed { tokens: 3 }
        );
    }

    #[test]
    fn test_parse_login_ignores_register_and_quit() {
        assert_eq!(
            HandshakeFrame::parse_login("quit"),
            HandshakeFrame::Malformed { tokens: 1 }
        );
        assert_eq!(
            HandshakeFrame::parse_login("REGISTER a b c"),
            HandshakeFrame::Malformed { tokens: 4 }
        );
    }

    // =====================================================================
    // Command::parse()
    // =====================================================================

    #[test]
    fn test_command_hotbar_open_and_close() {
        assert_eq!(
            Command::parse("HOTBAR OPEN").unwrap(),
            Command::Hotbar(HotbarCommand::Open)
        );
        assert_eq!(
            Command::parse("HOTBAR CLOSE").unwrap(),
            Command::Hotbar(HotbarCommand::Close)
        );
    }

    #[test]
    fn test_command_hotbar_set() {
        assert_eq!(
            Command::parse("HOTBAR SET 1 12").unwrap(),
            Command::Hotbar(HotbarCommand::Set {
                slot: slot(1),
                item: WeaponId(12),
            })
        );
    }

    #[test]
    fn test_command_hotbar_set_bad_slot_is_error() {
        let err = Command::parse("HOTBAR SET 3 1").unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidSlot(ref s) if s == "3"));
    }

    #[test]
    fn test_command_hotbar_set_bad_item_is_error() {
        let err = Command::parse("HOTBAR SET 0 axe").unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidItem(_)));
    }

    #[test]
    fn test_command_hotbar_set_missing_arguments() {
        assert!(matches!(
            Command::parse("HOTBAR SET").unwrap_err(),
            ProtocolError::MissingArgument("slot")
        ));
        assert!(matches!(
            Command::parse("HOTBAR SET 0").unwrap_err(),
            ProtocolError::MissingArgument("item")
        ));
        assert!(matches!(
            Command::parse("HOTBAR").unwrap_err(),
            ProtocolError::MissingArgument("hotbar action")
        ));
    }

    #[test]
    fn test_command_hotbar_unknown_action_is_ignored() {
        assert_eq!(
            Command::parse("HOTBAR SPIN").unwrap(),
            Command::Unknown("HOTBAR SPIN".into())
        );
    }

    #[test]
    fn test_command_reserved_heads_keep_arguments() {
        assert_eq!(
            Command::parse("SHOP buy 3").unwrap(),
            Command::Shop(vec!["buy".into(), "3".into()])
        );
        assert_eq!(Command::parse("FRIENDS").unwrap(), Command::Friends(vec![]));
        assert_eq!(Command::parse("WEAPONS list").unwrap().head(), "WEAPONS");
        assert_eq!(Command::parse("COSMETICS").unwrap().head(), "COSMETICS");
        assert_eq!(Command::parse("FIGHT 2").unwrap().head(), "FIGHT");
    }

    #[test]
    fn test_command_quit_empty_and_unknown() {
        assert_eq!(Command::parse("QUIT").unwrap(), Command::Quit);
        assert_eq!(Command::parse("").unwrap(), Command::Empty);
        assert_eq!(
            Command::parse("dance now").unwrap(),
            Command::Unknown("dance".into())
        );
    }
}
