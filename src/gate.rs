#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![forbid(unsafe_code)]

use crate::error::{BridgeError, Result};
use crate::types::{GroupId, Permission, PermissionMask};
use std::sync::Arc;

/// Read-only view of per-group configuration.
pub trait GroupDirectory: Send + Sync {
    /// Capability bitmask granted to `group`; empty for unknown groups.
    fn group_capabilities(&self, group: &GroupId) -> PermissionMask;

    /// Maximum number of live scheduled entries `group` may own.
    fn schedule_limit(&self, group: &GroupId) -> usize;
}

#[derive(Clone)]
pub struct PermissionGate {
    directory: Arc<dyn GroupDirectory>,
}

impl PermissionGate {
    #[must_use]
    pub fn new(directory: Arc<dyn GroupDirectory>) -> Self {
        Self { directory }
    }

    #[must_use]
    pub fn check(&self, group: &GroupId, permission: Permission) -> bool {
        self.directory
            .group_capabilities(group)
            .contains(permission)
    }

    /// # Errors
    /// Returns `PermissionDenied` when `group` lacks `permission`.
    pub fn require(&self, group: &GroupId, permission: Permission) -> Result<()> {
        if self.check(group, permission) {
            Ok(())
        } else {
            Err(BridgeError::PermissionDenied {
                group: group.value().to_string(),
                permission: permission.as_str().to_string(),
            })
        }
    }
}

impl std::fmt::Debug for PermissionGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PermissionGate").finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::config::{BridgeConfig, GroupConfig};

    fn gate() -> PermissionGate {
        let config = BridgeConfig::default().with_group(
            GroupConfig::new("builders")
                .with_permission(Permission::Schedule)
                .with_schedules(2),
        );
        PermissionGate::new(Arc::new(config))
    }

    #[test]
    fn given_granted_permission_when_checking_then_true() {
        assert!(gate().check(&GroupId::new("Builders"), Permission::Schedule));
    }

    #[test]
    fn given_missing_permission_when_checking_then_false() {
        assert!(!gate().check(&GroupId::new("builders"), Permission::Interact));
        assert!(!gate().check(&GroupId::new("strangers"), Permission::Schedule));
    }

    #[test]
    fn given_missing_permission_when_requiring_then_permission_denied() {
        let error = gate()
            .require(&GroupId::new("builders"), Permission::Economy)
            .unwrap_err();

        assert!(matches!(
            error,
            BridgeError::PermissionDenied { ref group, ref permission }
                if group == "builders" && permission == "economy"
        ));
    }
}
