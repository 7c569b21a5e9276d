//! Who is running a command.
//!
//! The kernel never looks identities up itself; callers pass an `Identity`
//! into every operation. `IdentityProvider` is the seam for front ends that
//! know the current user.

/// Name of the superuser. Permission checks always pass for it.
pub const SUPERUSER: &str = "root";

/// A user and the groups they belong to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user: String,
    pub groups: Vec<String>,
}

impl Identity {
    /// Create an identity. The first group is the primary group.
    pub fn new(user: impl Into<String>, groups: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            user: user.into(),
            groups: groups.into_iter().map(Into::into).collect(),
        }
    }

    /// The superuser, member of group `root`.
    pub fn root() -> Self {
        Self::new(SUPERUSER, [SUPERUSER])
    }

    pub fn is_superuser(&self) -> bool {
        self.user == SUPERUSER
    }

    /// Group new nodes are created with: the first listed group, or a group
    /// named after the user.
    pub fn primary_group(&self) -> &str {
        self.groups.first().map(String::as_str).unwrap_or(&self.user)
    }

    pub fn in_group(&self, group: &str) -> bool {
        self.groups.iter().any(|g| g == group)
    }

    /// `/root` for the superuser, `/home/<user>` for everyone else.
    pub fn home_dir(&self) -> String {
        if self.is_superuser() {
            "/root".to_string()
        } else {
            format!("/home/{}", self.user)
        }
    }
}

/// Source of the current identity.
pub trait IdentityProvider: Send + Sync {
    fn current_user(&self) -> Identity;
}

/// An identity provider that always returns the same identity.
#[derive(Debug, Clone)]
pub struct StaticIdentity(pub Identity);

impl IdentityProvider for StaticIdentity {
    fn current_user(&self) -> Identity {
        self.0.clone()
    }
}
