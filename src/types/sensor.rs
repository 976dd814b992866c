use super::identifiers::CorrelationToken;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Sensor object-type mask.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SensorTypeFlags(u32);

const SENSOR_TYPE_NAMES: &[(SensorTypeFlags, &str)] = &[
    (SensorTypeFlags::AGENT, "agent"),
    (SensorTypeFlags::ACTIVE, "active"),
    (SensorTypeFlags::PASSIVE, "passive"),
    (SensorTypeFlags::SCRIPTED, "scripted"),
];

impl SensorTypeFlags {
    pub const AGENT: Self = Self(1);
    pub const ACTIVE: Self = Self(2);
    pub const PASSIVE: Self = Self(4);
    pub const SCRIPTED: Self = Self(8);

    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        SENSOR_TYPE_NAMES
            .iter()
            .find(|(_, candidate)| candidate.eq_ignore_ascii_case(name.trim()))
            .map(|(flag, _)| *flag)
    }

    /// Names of the set flags, in table order.
    #[must_use]
    pub fn names(self) -> Vec<&'static str> {
        SENSOR_TYPE_NAMES
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vector3 {
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

impl fmt::Display for Vector3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}, {}, {}>", self.x, self.y, self.z)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quaternion {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Quaternion {
    pub const IDENTITY: Self = Self::new(0.0, 0.0, 0.0, 1.0);

    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl fmt::Display for Quaternion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}, {}, {}, {}>", self.x, self.y, self.z, self.w)
    }
}

/// A sensor sweep reply as delivered by the world client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorReply {
    pub requestor: CorrelationToken,
    pub group: Uuid,
    pub name: String,
    pub item: Uuid,
    pub owner: Uuid,
    pub position: Vector3,
    pub range: f32,
    pub rotation: Quaternion,
    pub velocity: Vector3,
    pub kind: SensorTypeFlags,
}

impl SensorReply {
    /// Field/value sequence in the documented order: group, name, item,
    /// owner, position, range, rotation, velocity, then `type` followed by
    /// the names of every set type flag.
    #[must_use]
    pub fn fields(&self) -> Vec<String> {
        let mut fields = vec![
            "group".to_string(),
            self.group.to_string(),
            "name".to_string(),
            self.name.clone(),
            "item".to_string(),
            self.item.to_string(),
            "owner".to_string(),
            self.owner.to_string(),
            "position".to_string(),
            self.position.to_string(),
            "range".to_string(),
            self.range.to_string(),
            "rotation".to_string(),
            self.rotation.to_string(),
            "velocity".to_string(),
            self.velocity.to_string(),
            "type".to_string(),
        ];
        fields.extend(self.kind.names().into_iter().map(str::to_string));
        fields
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn sensor_type_names_map_both_ways() {
        for name in ["agent", "active", "passive", "scripted"] {
            let flag = SensorTypeFlags::from_name(name).unwrap();
            assert_eq!(flag.names(), vec![name]);
        }
        assert_eq!(
            SensorTypeFlags::from_name("Scripted"),
            Some(SensorTypeFlags::SCRIPTED)
        );
        assert_eq!(SensorTypeFlags::from_name("physical"), None);
    }

    #[test]
    fn combined_flags_list_names_in_table_order() {
        let flags = SensorTypeFlags::SCRIPTED.union(SensorTypeFlags::AGENT);
        assert_eq!(flags.names(), vec!["agent", "scripted"]);
        assert!(flags.contains(SensorTypeFlags::SCRIPTED));
        assert!(!flags.contains(SensorTypeFlags::PASSIVE));
    }

    #[test]
    fn reply_fields_follow_documented_order() {
        let reply = SensorReply {
            requestor: CorrelationToken::generate(),
            group: Uuid::nil(),
            name: "Door".to_string(),
            item: Uuid::nil(),
            owner: Uuid::nil(),
            position: Vector3::new(128.0, 64.5, 22.0),
            range: 3.5,
            rotation: Quaternion::IDENTITY,
            velocity: Vector3::default(),
            kind: SensorTypeFlags::ACTIVE.union(SensorTypeFlags::SCRIPTED),
        };

        let fields = reply.fields();
        let keys = fields
            .iter()
            .step_by(2)
            .take(9)
            .map(String::as_str)
            .collect::<Vec<_>>();

        assert_eq!(
            keys,
            vec!["group", "name", "item", "owner", "position", "range", "rotation", "velocity", "type"]
        );
        assert_eq!(fields[9], "<128, 64.5, 22>");
        assert_eq!(fields[11], "3.5");
        assert_eq!(fields[13], "<0, 0, 0, 1>");
        assert_eq!(&fields[17..], ["active", "scripted"]);
    }
}
