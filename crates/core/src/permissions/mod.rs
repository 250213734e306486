//! Caller access scope
//!
//! The authentication layer resolves who is calling; this crate only sees
//! the result. Administrators may act on any event, staff members are bound
//! to exactly one.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum AccessScope {
    Administrator,
    Staff { event_id: Uuid },
}

impl AccessScope {
    pub fn staff(event_id: Uuid) -> Self {
        AccessScope::Staff { event_id }
    }

    /// Check if the scope covers an event
    pub fn allows(&self, event_id: Uuid) -> bool {
        match self {
            AccessScope::Administrator => true,
            AccessScope::Staff { event_id: bound } => *bound == event_id,
        }
    }

    /// Reject requests that target an event outside the scope
    pub fn ensure_event(&self, event_id: Uuid) -> Result<()> {
        if self.allows(event_id) {
            Ok(())
        } else {
            Err(Error::PermissionDenied(format!(
                "staff scope does not cover event {event_id}"
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_administrator_allows_everything() {
        assert!(AccessScope::Administrator.allows(Uuid::new_v4()));
    }

    #[test]
    fn test_staff_bound_to_event() {
        let event_id = Uuid::new_v4();
        let scope = AccessScope::staff(event_id);

        assert!(scope.ensure_event(event_id).is_ok());
        assert!(matches!(
            scope.ensure_event(Uuid::new_v4()),
            Err(Error::PermissionDenied(_))
        ));
    }
}
