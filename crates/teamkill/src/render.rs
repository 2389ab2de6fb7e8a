//! Reply text for command outcomes.
//!
//! Rendering is a pure function of an [`Outcome`]; nothing here touches state.

use crate::command::Verb;
use crate::event::Mention;
use crate::store::CounterRecord;

/// Message sent when the leaderboard has no non-zero entries.
pub const NO_DATA_MESSAGE: &str = "📊 No team kills recorded yet!";

const LEADERBOARD_HEADER: &str = "📊 **Team Kill Leaderboard**";

pub const HELP_MESSAGE: &str = "\
🎮 **Team Kill Tracker Bot - Commands**

**Everyone:**
• `!showtotals` - Display the team kill leaderboard
• `!tkhelp` - Show this help message

**Admins Only:**
• `!addtk @user` - Add a team kill to a user
• `!subtk @user` - Subtract a team kill from a user (for corrections)
• `!resettks` - Reset all team kill data (requires confirmation)
";

/// What handling a command produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Not a command, or a command that is answered with silence.
    Ignored,
    /// The actor failed the authorization check.
    Denied(Verb),
    /// A targeted command was sent without mentioning anyone.
    MissingTarget(Verb),
    KillAdded { target: Mention, count: u64 },
    KillSubtracted { target: Mention, count: u64 },
    /// `tracked` is false when the target has never had a kill recorded.
    NothingToSubtract { target: Mention, tracked: bool },
    Leaderboard(Vec<CounterRecord>),
    ResetRequested,
    ResetExecuted,
    ResetExpired,
    NoPendingReset,
    Help,
}

/// "1 TK", "2 TKs".
pub fn tk_count(count: u64) -> String {
    if count == 1 {
        "1 TK".to_string()
    } else {
        format!("{count} TKs")
    }
}

/// One leaderboard line without decoration.
pub fn leaderboard_line(record: &CounterRecord) -> String {
    format!("{} has {}", record.display_name, tk_count(record.count))
}

pub fn leaderboard(records: &[CounterRecord]) -> String {
    if records.is_empty() {
        return NO_DATA_MESSAGE.to_string();
    }
    let mut message = format!("{LEADERBOARD_HEADER}\n\n");
    for record in records {
        message.push_str("• ");
        message.push_str(&leaderboard_line(record));
        message.push('\n');
    }
    message
}

fn denial(verb: Verb) -> Option<String> {
    let action = match verb {
        Verb::AddKill => "add",
        Verb::SubKill => "subtract",
        Verb::RequestReset => "reset",
        // Unauthorized confirmations get no reply at all.
        Verb::ConfirmReset | Verb::ShowTotals | Verb::Help => return None,
    };
    Some(format!("❌ Only admins can {action} team kills."))
}

/// Text to send back, or `None` when the bot stays silent.
pub fn render(outcome: &Outcome) -> Option<String> {
    let text = match outcome {
        Outcome::Ignored => return None,
        Outcome::Denied(verb) => return denial(*verb),
        Outcome::MissingTarget(verb) => {
            format!("❌ Please mention a user: `{verb} @username`")
        }
        Outcome::KillAdded { target, count } => {
            let tag = target.tag();
            format!(
                "✅ One kill added to {tag}'s total. {tag} now has **{}**.",
                tk_count(*count)
            )
        }
        Outcome::KillSubtracted { target, count } => {
            let tag = target.tag();
            format!(
                "✅ One kill subtracted from {tag}'s total. {tag} now has **{}**.",
                tk_count(*count)
            )
        }
        Outcome::NothingToSubtract {
            target,
            tracked: true,
        } => format!("❌ {} already has 0 team kills.", target.tag()),
        Outcome::NothingToSubtract {
            target,
            tracked: false,
        } => format!("❌ {} has no team kills recorded.", target.tag()),
        Outcome::Leaderboard(records) => leaderboard(records),
        Outcome::ResetRequested => "⚠️ **WARNING:** This will delete ALL team kill data and start fresh.\n\
             Type `!confirmreset` within 30 seconds to confirm, or ignore this message to cancel."
            .to_string(),
        Outcome::ResetExecuted => "✅ All team kill data has been reset. Starting fresh!".to_string(),
        Outcome::ResetExpired => {
            "❌ Reset confirmation timed out. Please use `!resettks` again if you want to reset."
                .to_string()
        }
        Outcome::NoPendingReset => "❌ No pending reset. Use `!resettks` first.".to_string(),
        Outcome::Help => HELP_MESSAGE.to_string(),
    };
    Some(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, count: u64) -> CounterRecord {
        CounterRecord {
            user_id: name.to_lowercase(),
            display_name: name.to_string(),
            count,
        }
    }

    #[test]
    fn pluralization() {
        assert_eq!(tk_count(1), "1 TK");
        assert_eq!(tk_count(0), "0 TKs");
        assert_eq!(tk_count(2), "2 TKs");
    }

    #[test]
    fn empty_leaderboard_is_canned_message() {
        assert_eq!(leaderboard(&[]), NO_DATA_MESSAGE);
        assert!(!leaderboard(&[]).contains("Leaderboard**"));
    }

    #[test]
    fn leaderboard_lists_records_in_order() {
        let text = leaderboard(&[record("Alice", 2), record("Bob", 1)]);
        let alice = text.find("Alice has 2 TKs").unwrap();
        let bob = text.find("Bob has 1 TK\n").unwrap();
        assert!(alice < bob);
        assert!(text.starts_with(LEADERBOARD_HEADER));
    }

    #[test]
    fn unauthorized_confirm_is_silent() {
        assert_eq!(render(&Outcome::Denied(Verb::ConfirmReset)), None);
        assert_eq!(render(&Outcome::Ignored), None);
        assert_eq!(
            render(&Outcome::Denied(Verb::AddKill)).unwrap(),
            "❌ Only admins can add team kills."
        );
    }

    #[test]
    fn kill_added_mentions_target() {
        let text = render(&Outcome::KillAdded {
            target: Mention::new("7", "Alice"),
            count: 1,
        })
        .unwrap();
        assert_eq!(
            text,
            "✅ One kill added to <@7>'s total. <@7> now has **1 TK**."
        );
    }

    #[test]
    fn untracked_and_zero_targets_read_differently() {
        let target = Mention::new("2", "Bob");
        assert_eq!(
            render(&Outcome::NothingToSubtract {
                target: target.clone(),
                tracked: false,
            })
            .unwrap(),
            "❌ <@2> has no team kills recorded."
        );
        assert_eq!(
            render(&Outcome::NothingToSubtract {
                target,
                tracked: true,
            })
            .unwrap(),
            "❌ <@2> already has 0 team kills."
        );
    }

    #[test]
    fn help_lists_the_public_and_admin_commands() {
        for trigger in ["!showtotals", "!tkhelp", "!addtk", "!subtk", "!resettks"] {
            assert!(HELP_MESSAGE.contains(trigger), "{trigger}");
        }
        assert!(!HELP_MESSAGE.contains("!confirmreset"));
    }

    #[test]
    fn missing_target_names_the_command() {
        let text = render(&Outcome::MissingTarget(Verb::SubKill)).unwrap();
        assert!(text.contains("`!subtk @username`"));
    }
}
