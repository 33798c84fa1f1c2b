//! Role groups and the membership check
//!
//! Groups are plain sets of role ids and may overlap freely. Nothing is
//! inherited; a role is allowed only if its id is in the set.

use std::collections::{BTreeSet, HashMap};
use std::sync::LazyLock;

use shared::models::Role;

use super::pipeline::AuthError;
use super::principal::Principal;

/// Set of allowed role ids
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleSet(BTreeSet<i32>);

impl RoleSet {
    pub const fn empty() -> Self {
        Self(BTreeSet::new())
    }

    pub fn of(roles: &[Role]) -> Self {
        Self(roles.iter().map(|r| r.id()).collect())
    }

    pub fn from_ids(ids: impl IntoIterator<Item = i32>) -> Self {
        Self(ids.into_iter().collect())
    }

    pub fn contains(&self, role_id: i32) -> bool {
        self.0.contains(&role_id)
    }

    pub fn ids(&self) -> impl Iterator<Item = i32> + '_ {
        self.0.iter().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoleGroup {
    /// superadmin
    AdminOnly,
    /// superadmin, admin
    AdminsAndAbove,
    /// every seeded role
    AllAuthenticated,
}

impl RoleGroup {
    pub const ALL: [RoleGroup; 3] = [
        RoleGroup::AdminOnly,
        RoleGroup::AdminsAndAbove,
        RoleGroup::AllAuthenticated,
    ];

    pub fn name(self) -> &'static str {
        match self {
            RoleGroup::AdminOnly => "AdminOnly",
            RoleGroup::AdminsAndAbove => "AdminsAndAbove",
            RoleGroup::AllAuthenticated => "AllAuthenticated",
        }
    }

    pub fn members(self) -> &'static RoleSet {
        static NONE: RoleSet = RoleSet::empty();
        ROLE_GROUPS.get(&self).unwrap_or(&NONE)
    }
}

/// Built once, read concurrently afterwards
static ROLE_GROUPS: LazyLock<HashMap<RoleGroup, RoleSet>> = LazyLock::new(|| {
    HashMap::from([
        (RoleGroup::AdminOnly, RoleSet::of(&[Role::SuperAdmin])),
        (
            RoleGroup::AdminsAndAbove,
            RoleSet::of(&[Role::SuperAdmin, Role::Admin]),
        ),
        (RoleGroup::AllAuthenticated, RoleSet::of(&Role::ALL)),
    ])
});

/// Pure membership test
pub fn authorize(role_id: i32, allowed: &RoleSet) -> bool {
    allowed.contains(role_id)
}

/// No principal fails closed, whatever the allowed set.
pub fn check_access(principal: Option<&Principal>, allowed: &RoleSet) -> Result<(), AuthError> {
    let principal = principal.ok_or(AuthError::Unauthenticated)?;
    if !authorize(principal.role_id(), allowed) {
        return Err(AuthError::Forbidden {
            role_id: principal.role_id(),
        });
    }
    Ok(())
}

/// Groups a role belongs to
pub fn groups_of(role_id: i32) -> Vec<RoleGroup> {
    RoleGroup::ALL
        .into_iter()
        .filter(|g| g.members().contains(role_id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::RoleRef;

    fn principal(role: Role) -> Principal {
        Principal {
            subject_id: 1,
            credential_record_id: 1,
            name: "n".into(),
            email: "e@example.com".into(),
            user_name: None,
            profile_image: None,
            is_verified: false,
            role: RoleRef::from(role),
        }
    }

    #[test]
    fn group_membership() {
        assert_eq!(RoleGroup::AdminOnly.members().ids().collect::<Vec<_>>(), vec![1]);
        assert_eq!(RoleGroup::AdminsAndAbove.members().ids().collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(
            RoleGroup::AllAuthenticated.members().ids().collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
    }

    #[test]
    fn authorize_is_set_membership() {
        let admins = RoleGroup::AdminsAndAbove.members();
        assert!(authorize(1, admins));
        assert!(authorize(2, admins));
        assert!(!authorize(3, admins));
        assert!(!authorize(99, admins));
        assert!(!authorize(1, &RoleSet::empty()));
    }

    #[test]
    fn overlapping_groups_are_allowed() {
        assert_eq!(
            groups_of(Role::SuperAdmin.id()),
            vec![
                RoleGroup::AdminOnly,
                RoleGroup::AdminsAndAbove,
                RoleGroup::AllAuthenticated
            ]
        );
        assert_eq!(groups_of(Role::User.id()), vec![RoleGroup::AllAuthenticated]);

        // Ad-hoc sets need not follow any hierarchy
        let odd = RoleSet::of(&[Role::SuperAdmin, Role::User]);
        assert!(authorize(Role::User.id(), &odd));
        assert!(!authorize(Role::Admin.id(), &odd));
    }

    #[test]
    fn absent_principal_fails_closed_for_every_set() {
        for group in RoleGroup::ALL {
            assert!(matches!(
                check_access(None, group.members()),
                Err(AuthError::Unauthenticated)
            ));
        }
        // Every known role plus ids no role uses
        let universal = RoleSet::from_ids(Role::ALL.iter().map(|r| r.id()).chain([0, 4, 99, -1]));
        assert!(Role::ALL.iter().all(|r| universal.contains(r.id())));
        assert!(matches!(check_access(None, &universal), Err(AuthError::Unauthenticated)));
    }

    #[test]
    fn wrong_role_is_forbidden() {
        let user = principal(Role::User);
        assert!(matches!(
            check_access(Some(&user), RoleGroup::AdminsAndAbove.members()),
            Err(AuthError::Forbidden { role_id: 3 })
        ));
        assert!(check_access(Some(&user), RoleGroup::AllAuthenticated.members()).is_ok());

        let root = principal(Role::SuperAdmin);
        assert!(check_access(Some(&root), RoleGroup::AdminOnly.members()).is_ok());
    }
}
