//! Authorization predicate over `(principal, capsule)` pairs.
//!
//! Only the creator may read, update, delete or contribute. The communal flag
//! is stored but grants nothing to other principals yet.

use crate::error::{CapsuleError, CapsuleResult};
use crate::model::capsule::{Capsule, CapsuleId, PrincipalId};
use crate::repo::capsule_repo::CapsuleStore;
use log::warn;

/// Operation being authorized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapsuleAction {
    Read,
    Update,
    Delete,
    Contribute,
}

impl CapsuleAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Contribute => "contribute",
        }
    }
}

/// Pure creator-only access policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccessControl;

impl AccessControl {
    pub fn is_allowed(
        &self,
        principal: &PrincipalId,
        capsule: &Capsule,
        _action: CapsuleAction,
    ) -> bool {
        capsule.is_created_by(principal)
    }

    /// Returns the error a denied principal must see.
    ///
    /// Contributors to a foreign capsule get `NotFound`; every other action
    /// gets a generic forbidden error.
    pub fn authorize(
        &self,
        principal: &PrincipalId,
        capsule: &Capsule,
        action: CapsuleAction,
    ) -> CapsuleResult<()> {
        if self.is_allowed(principal, capsule, action) {
            return Ok(());
        }
        warn!(
            "event=access_denied module=access status=rejected action={} capsule_id={}",
            action.as_str(),
            capsule.id
        );
        match action {
            CapsuleAction::Contribute => Err(CapsuleError::NotFound),
            _ => Err(CapsuleError::forbidden()),
        }
    }

    /// Loads a capsule and authorizes `action` on it.
    pub fn load_authorized<S: CapsuleStore>(
        &self,
        store: &S,
        principal: &PrincipalId,
        capsule_id: CapsuleId,
        action: CapsuleAction,
    ) -> CapsuleResult<Capsule> {
        let capsule = store.get_capsule(capsule_id)?.ok_or(CapsuleError::NotFound)?;
        self.authorize(principal, &capsule, action)?;
        Ok(capsule)
    }
}

#[cfg(test)]
mod tests {
    use super::{AccessControl, CapsuleAction};
    use crate::error::{AuthFailure, CapsuleError};
    use crate::model::capsule::{Capsule, PrincipalId};
    use uuid::Uuid;

    fn communal_capsule() -> Capsule {
        Capsule {
            id: Uuid::new_v4(),
            creator_id: PrincipalId::new("owner"),
            title: "T".to_string(),
            description: None,
            unlock_at: 10,
            is_communal: true,
            created_at: 0,
        }
    }

    #[test]
    fn creator_is_allowed_everything() {
        let capsule = communal_capsule();
        let owner = PrincipalId::new("owner");
        for action in [
            CapsuleAction::Read,
            CapsuleAction::Update,
            CapsuleAction::Delete,
            CapsuleAction::Contribute,
        ] {
            assert!(AccessControl.authorize(&owner, &capsule, action).is_ok());
        }
    }

    #[test]
    fn communal_flag_grants_nothing_to_others() {
        let capsule = communal_capsule();
        let stranger = PrincipalId::new("stranger");
        for action in [CapsuleAction::Read, CapsuleAction::Update, CapsuleAction::Delete] {
            assert!(matches!(
                AccessControl.authorize(&stranger, &capsule, action),
                Err(CapsuleError::Auth(AuthFailure::Forbidden))
            ));
        }
        assert!(matches!(
            AccessControl.authorize(&stranger, &capsule, CapsuleAction::Contribute),
            Err(CapsuleError::NotFound)
        ));
    }
}
