//! Inbound command events.
//!
//! Gateway clients translate their native message type into a
//! [`CommandEvent`] before handing it to the dispatcher. The core never sees
//! anything beyond these fields.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// The user who sent a command, as resolved by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// Stable platform identifier.
    pub id: String,
    /// Last-seen display name.
    #[serde(default)]
    pub display_name: String,
    /// Names of every role the actor holds in the server.
    #[serde(default)]
    pub roles: BTreeSet<String>,
    /// Whether the actor holds the platform-level administrator permission.
    #[serde(default)]
    pub has_admin_permission: bool,
}

impl Actor {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            roles: BTreeSet::new(),
            has_admin_permission: false,
        }
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.insert(role.into());
        self
    }

    pub fn with_admin_permission(mut self) -> Self {
        self.has_admin_permission = true;
        self
    }
}

/// A user mentioned in the message body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mention {
    pub user_id: String,
    pub display_name: String,
}

impl Mention {
    pub fn new(user_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            display_name: display_name.into(),
        }
    }

    /// Platform mention tag that pings the user when rendered.
    pub fn tag(&self) -> String {
        format!("<@{}>", self.user_id)
    }
}

/// One inbound message, already stripped of gateway-specific types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandEvent {
    /// Channel the reply is addressed to.
    pub channel_id: String,
    pub actor: Actor,
    /// Raw message text.
    pub text: String,
    /// Mentioned users, in message order.
    #[serde(default)]
    pub mentions: SmallVec<[Mention; 2]>,
}

impl CommandEvent {
    pub fn new(channel_id: impl Into<String>, actor: Actor, text: impl Into<String>) -> Self {
        Self {
            channel_id: channel_id.into(),
            actor,
            text: text.into(),
            mentions: SmallVec::new(),
        }
    }

    pub fn mentioning(mut self, mention: Mention) -> Self {
        self.mentions.push(mention);
        self
    }

    /// The command target: the first mentioned user. Further mentions are ignored.
    pub fn target(&self) -> Option<&Mention> {
        self.mentions.first()
    }
}

/// A single text reply to the originating channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    pub channel_id: String,
    pub text: String,
}
