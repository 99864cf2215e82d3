//! Role-based access for the back-office.
//!
//! A user holds one role; a role carries a numeric level and a list of
//! resource/action grants. [`PermissionGate`] combines a grant check, a
//! role-name check and a level check, either all required or any sufficient.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resource { Dashboard, Products, Categories, Orders, Customers, Permissions, All }

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action { View, Create, Edit, Delete, Manage }

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission { pub resource: Resource, pub action: Action }

impl Permission {
    pub fn new(resource: Resource, action: Action) -> Self { Self { resource, action } }

    /// `All` covers every resource and `Manage` covers every action.
    pub fn grants(&self, resource: Resource, action: Action) -> bool {
        (self.resource == Resource::All || self.resource == resource)
            && (self.action == Action::Manage || self.action == action)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Role {
    pub name: String,
    pub level: u8,
    #[serde(default)]
    pub description: Option<String>,
    pub permissions: Vec<Permission>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: String,
}

/// A user joined with their role.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CurrentUser {
    pub user: User,
    pub role: Role,
}

impl CurrentUser {
    pub fn resolve(user: &User, roles: &[Role]) -> Option<Self> {
        roles
            .iter()
            .find(|r| r.name.eq_ignore_ascii_case(&user.role))
            .map(|role| Self { user: user.clone(), role: role.clone() })
    }

    pub fn can(&self, resource: Resource, action: Action) -> bool {
        self.role.permissions.iter().any(|p| p.grants(resource, action))
    }

    pub fn has_role(&self, names: &[&str]) -> bool { names.iter().any(|n| n.eq_ignore_ascii_case(&self.role.name)) }

    pub fn has_min_level(&self, level: u8) -> bool { self.role.level >= level }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PermissionGate {
    pub permission: Option<(Resource, Action)>,
    pub roles: Vec<&'static str>,
    pub min_level: Option<u8>,
    pub require_all: bool,
}

impl PermissionGate {
    pub fn permission(resource: Resource, action: Action) -> Self {
        Self { permission: Some((resource, action)), ..Default::default() }
    }

    pub fn roles(roles: &[&'static str]) -> Self { Self { roles: roles.to_vec(), ..Default::default() } }

    pub fn min_level(level: u8) -> Self { Self { min_level: Some(level), ..Default::default() } }

    pub fn or_role(mut self, role: &'static str) -> Self { self.roles.push(role); self }

    pub fn and_min_level(mut self, level: u8) -> Self { self.min_level = Some(level); self.require_all = true; self }

    pub fn allows(&self, user: Option<&CurrentUser>) -> bool {
        let Some(user) = user else { return false };
        let checks = [
            self.permission.map(|(resource, action)| user.can(resource, action)),
            (!self.roles.is_empty()).then(|| user.has_role(&self.roles)),
            self.min_level.map(|level| user.has_min_level(level)),
        ];
        let mut specified = checks.into_iter().flatten().peekable();
        if specified.peek().is_none() {
            return true;
        }
        if self.require_all { specified.all(|ok| ok) } else { specified.any(|ok| ok) }
    }
}
