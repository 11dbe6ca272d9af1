use std::sync::Arc;

use crate::{domain::PrincipalId, principals::PrincipalStore};

/// Operations that need more than "any user" rights.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PrivilegedAction {
    Ban,
    Mute,
    Kick,
    DeleteMessage,
    AddCoOwner,
    RemoveCoOwner,
}

impl PrivilegedAction {
    /// Membership edits are reserved to the primary owner; co-owners may only moderate.
    pub fn requires_primary_owner(self) -> bool {
        matches!(
            self,
            PrivilegedAction::AddCoOwner | PrivilegedAction::RemoveCoOwner
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PrivilegedAction::Ban => "ban",
            PrivilegedAction::Mute => "mute",
            PrivilegedAction::Kick => "kick",
            PrivilegedAction::DeleteMessage => "delete",
            PrivilegedAction::AddCoOwner => "add_co_owner",
            PrivilegedAction::RemoveCoOwner => "remove_co_owner",
        }
    }
}

// ============== Authorization ==============

#[derive(Clone)]
pub struct Authority {
    store: Arc<PrincipalStore>,
}

impl Authority {
    pub fn new(store: Arc<PrincipalStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<PrincipalStore> {
        &self.store
    }

    pub fn is_primary_owner(&self, principal: PrincipalId) -> bool {
        principal == self.store.primary_owner()
    }

    pub async fn is_authorized(&self, principal: PrincipalId) -> bool {
        self.is_primary_owner(principal) || self.store.contains(principal).await
    }

    /// The primary owner may only be moderated by themselves.
    pub fn may_target(&self, actor: PrincipalId, target: PrincipalId) -> bool {
        !self.is_primary_owner(target) || self.is_primary_owner(actor)
    }

    /// Fail-closed: an update without a sender is never permitted anything.
    pub async fn permits(&self, principal: Option<PrincipalId>, action: PrivilegedAction) -> bool {
        let Some(principal) = principal else {
            return false;
        };
        if action.requires_primary_owner() {
            return self.is_primary_owner(principal);
        }
        self.is_authorized(principal).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MemoryRepository;

    const ALL: [PrivilegedAction; 6] = [
        PrivilegedAction::Ban,
        PrivilegedAction::Mute,
        PrivilegedAction::Kick,
        PrivilegedAction::DeleteMessage,
        PrivilegedAction::AddCoOwner,
        PrivilegedAction::RemoveCoOwner,
    ];

    async fn authority(owner: i64, co_owners: &[i64]) -> Authority {
        let repo = Arc::new(MemoryRepository::with_ids(
            co_owners.iter().copied().map(PrincipalId).collect(),
        ));
        let store = PrincipalStore::open(PrincipalId(owner), repo).await.unwrap();
        Authority::new(Arc::new(store))
    }

    #[tokio::test]
    async fn authorized_iff_owner_or_co_owner() {
        let auth = authority(100, &[200, 201]).await;
        for id in [1, 99, 100, 101, 199, 200, 201, 202, -100] {
            let expected = id == 100 || id == 200 || id == 201;
            assert_eq!(
                auth.is_authorized(PrincipalId(id)).await,
                expected,
                "principal {id}"
            );
        }
    }

    #[tokio::test]
    async fn only_owner_is_primary() {
        let auth = authority(100, &[200]).await;
        assert!(auth.is_primary_owner(PrincipalId(100)));
        assert!(!auth.is_primary_owner(PrincipalId(200)));
    }

    #[tokio::test]
    async fn co_owners_moderate_but_cannot_edit_membership() {
        let auth = authority(100, &[200]).await;
        for action in ALL {
            assert!(auth.permits(Some(PrincipalId(100)), action).await);
            assert_eq!(
                auth.permits(Some(PrincipalId(200)), action).await,
                !action.requires_primary_owner(),
                "{action:?}"
            );
            assert!(!auth.permits(Some(PrincipalId(999)), action).await);
        }
    }

    #[tokio::test]
    async fn primary_owner_is_shielded_from_co_owners() {
        let auth = authority(100, &[200, 201]).await;
        assert!(!auth.may_target(PrincipalId(200), PrincipalId(100)));
        assert!(auth.may_target(PrincipalId(100), PrincipalId(100)));
        assert!(auth.may_target(PrincipalId(200), PrincipalId(201)));
        assert!(auth.may_target(PrincipalId(100), PrincipalId(300)));
    }

    #[tokio::test]
    async fn missing_sender_is_denied() {
        let auth = authority(100, &[]).await;
        for action in ALL {
            assert!(!auth.permits(None, action).await);
        }
    }
}
