use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, Display, AsRefStr, EnumIter, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Root,
    Admin,
    Marketing,
    User,
}

impl Role {
    /// Update and delete of rooms, attendees and meetings.
    pub fn can_write(self) -> bool {
        matches!(self, Role::Root | Role::Admin | Role::Marketing)
    }

    /// Creation of rooms, attendees and meetings.
    pub fn can_create(self) -> bool {
        matches!(self, Role::Root | Role::Admin | Role::User)
    }

    pub fn can_manage_events(self) -> bool {
        matches!(self, Role::Root | Role::Marketing)
    }

    /// System settings, factory reset and whole-system transfer.
    pub fn is_root(self) -> bool {
        self == Role::Root
    }

    // イベント単位のアクセス制限を無視できるロール
    pub fn bypasses_event_access(self) -> bool {
        matches!(self, Role::Root | Role::Marketing)
    }
}
