use serde::{Deserialize, Serialize};

/// Caller roles, ordered from most to least privileged.
///
/// The set is closed: there is no wildcard role and membership checks are
/// exact-match. A caller whose role cannot be resolved defaults to
/// [`Role::Guest`], never to an authorized role.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
    #[default]
    Guest,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::User => "user",
            Self::Guest => "guest",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Check whether `caller` may use a capability restricted to `allowed`.
///
/// Pure and total: an empty `allowed` set denies every caller (the registry
/// rejects such capabilities at registration, but the gate does not rely on
/// that).
pub fn authorize(allowed: &[Role], caller: Role) -> bool {
    allowed.contains(&caller)
}

#[cfg(test)]
mod tests {
    use super::{authorize, Role};

    #[test]
    fn membership_is_exact_match() {
        let allowed = [Role::Admin, Role::User];
        assert!(authorize(&allowed, Role::Admin));
        assert!(authorize(&allowed, Role::User));
        assert!(!authorize(&allowed, Role::Guest));
    }

    #[test]
    fn guest_is_never_implicitly_authorized() {
        assert!(!authorize(&[Role::Admin], Role::Guest));
        assert!(!authorize(&[Role::User], Role::Guest));
    }

    #[test]
    fn empty_allowed_set_denies_everyone() {
        assert!(!authorize(&[], Role::Admin));
        assert!(!authorize(&[], Role::User));
        assert!(!authorize(&[], Role::Guest));
    }

    #[test]
    fn unresolvable_role_defaults_to_guest() {
        assert_eq!(Role::default(), Role::Guest);
    }

    #[test]
    fn role_round_trips_through_serde() {
        let json = serde_json::to_string(&Role::Admin).expect("serialize");
        assert_eq!(json, "\"admin\"");
        let role: Role = serde_json::from_str("\"user\"").expect("deserialize");
        assert_eq!(role, Role::User);
    }
}
