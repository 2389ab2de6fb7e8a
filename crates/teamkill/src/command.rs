//! Command verbs and text parsing.

use std::fmt;

/// A recognized bot command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    AddKill,
    SubKill,
    ShowTotals,
    RequestReset,
    ConfirmReset,
    Help,
}

impl Verb {
    pub const ALL: [Verb; 6] = [
        Verb::AddKill,
        Verb::SubKill,
        Verb::ShowTotals,
        Verb::RequestReset,
        Verb::ConfirmReset,
        Verb::Help,
    ];

    /// Literal text that introduces the command.
    pub fn trigger(self) -> &'static str {
        match self {
            Verb::AddKill => "!addtk",
            Verb::SubKill => "!subtk",
            Verb::ShowTotals => "!showtotals",
            Verb::RequestReset => "!resettks",
            Verb::ConfirmReset => "!confirmreset",
            Verb::Help => "!tkhelp",
        }
    }

    /// Whether the actor must pass the authorization policy.
    pub fn is_privileged(self) -> bool {
        matches!(
            self,
            Verb::AddKill | Verb::SubKill | Verb::RequestReset | Verb::ConfirmReset
        )
    }

    /// Whether the command acts on the first mentioned user.
    pub fn needs_target(self) -> bool {
        matches!(self, Verb::AddKill | Verb::SubKill)
    }

    /// Case-sensitive prefix match against raw message text.
    ///
    /// Returns `None` for ordinary chatter.
    pub fn parse(text: &str) -> Option<Verb> {
        Verb::ALL
            .into_iter()
            .find(|verb| text.starts_with(verb.trigger()))
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.trigger())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_trigger() {
        for verb in Verb::ALL {
            assert_eq!(Verb::parse(verb.trigger()), Some(verb));
        }
    }

    #[test]
    fn prefix_match_allows_arguments() {
        assert_eq!(Verb::parse("!addtk <@123>"), Some(Verb::AddKill));
        assert_eq!(Verb::parse("!subtk <@123> extra"), Some(Verb::SubKill));
    }

    #[test]
    fn matching_is_case_sensitive() {
        assert_eq!(Verb::parse("!AddTK <@1>"), None);
        assert_eq!(Verb::parse("!SHOWTOTALS"), None);
    }

    #[test]
    fn chatter_is_not_a_command() {
        assert_eq!(Verb::parse("gg everyone"), None);
        assert_eq!(Verb::parse(" !addtk"), None);
        assert_eq!(Verb::parse("!ping"), None);
    }

    #[test]
    fn privilege_table() {
        assert!(Verb::AddKill.is_privileged());
        assert!(Verb::SubKill.is_privileged());
        assert!(Verb::RequestReset.is_privileged());
        assert!(Verb::ConfirmReset.is_privileged());
        assert!(!Verb::ShowTotals.is_privileged());
        assert!(!Verb::Help.is_privileged());
    }

    #[test]
    fn only_counter_verbs_need_a_target() {
        let targeted: Vec<_> = Verb::ALL.into_iter().filter(|v| v.needs_target()).collect();
        assert_eq!(targeted, vec![Verb::AddKill, Verb::SubKill]);
    }
}
