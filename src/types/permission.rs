#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single capability bit granted to groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Permission {
    Movement,
    Economy,
    Land,
    Grooming,
    Inventory,
    Interact,
    Mute,
    Database,
    Notifications,
    Talk,
    Directory,
    System,
    Friendship,
    Execute,
    Group,
    Filter,
    Schedule,
    Tool,
}

const PERMISSION_NAMES: &[(Permission, &str)] = &[
    (Permission::Movement, "movement"),
    (Permission::Economy, "economy"),
    (Permission::Land, "land"),
    (Permission::Grooming, "grooming"),
    (Permission::Inventory, "inventory"),
    (Permission::Interact, "interact"),
    (Permission::Mute, "mute"),
    (Permission::Database, "database"),
    (Permission::Notifications, "notifications"),
    (Permission::Talk, "talk"),
    (Permission::Directory, "directory"),
    (Permission::System, "system"),
    (Permission::Friendship, "friendship"),
    (Permission::Execute, "execute"),
    (Permission::Group, "group"),
    (Permission::Filter, "filter"),
    (Permission::Schedule, "schedule"),
    (Permission::Tool, "tool"),
];

impl Permission {
    pub const ALL: [Self; 18] = [
        Self::Movement,
        Self::Economy,
        Self::Land,
        Self::Grooming,
        Self::Inventory,
        Self::Interact,
        Self::Mute,
        Self::Database,
        Self::Notifications,
        Self::Talk,
        Self::Directory,
        Self::System,
        Self::Friendship,
        Self::Execute,
        Self::Group,
        Self::Filter,
        Self::Schedule,
        Self::Tool,
    ];

    #[must_use]
    pub const fn bit(self) -> u32 {
        1 << (self as u32)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        PERMISSION_NAMES
            .iter()
            .find(|(permission, _)| *permission == self)
            .map_or("unknown", |(_, name)| name)
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Permission {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, String> {
        let wanted = value.trim();
        PERMISSION_NAMES
            .iter()
            .find(|(_, name)| name.eq_ignore_ascii_case(wanted))
            .map(|(permission, _)| *permission)
            .ok_or_else(|| format!("Unknown permission: {value}"))
    }
}

/// Bitmask of permissions granted to one group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PermissionMask(u32);

impl PermissionMask {
    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    #[must_use]
    pub const fn with(self, permission: Permission) -> Self {
        Self(self.0 | permission.bit())
    }

    #[must_use]
    pub const fn contains(self, permission: Permission) -> bool {
        self.0 & permission.bit() != 0
    }

    #[must_use]
    pub fn permissions(self) -> Vec<Permission> {
        Permission::ALL
            .into_iter()
            .filter(|permission| self.contains(*permission))
            .collect()
    }
}

impl FromIterator<Permission> for PermissionMask {
    fn from_iter<T: IntoIterator<Item = Permission>>(iter: T) -> Self {
        iter.into_iter().fold(Self::empty(), Self::with)
    }
}
