//! Role catalog: the read-only role registry

use crate::core::model::Model;
use crate::expert::role::{ExpertKind, ExpertRole};

/// An immutable snapshot of the role registry.
///
/// Reconfiguration never mutates a catalog in place: [`RoleCatalog::with_role`]
/// returns a new snapshot, so sessions that already hold the old one keep a
/// consistent view.
#[derive(Debug, Clone, PartialEq)]
pub struct RoleCatalog {
    roles: Vec<ExpertRole>,
}

impl RoleCatalog {
    /// All built-in roles bound to the default model
    pub fn builtin() -> Self {
        Self::builtin_with_model(&Model::default())
    }

    /// All built-in roles bound to `model`
    pub fn builtin_with_model(model: &Model) -> Self {
        Self {
            roles: ExpertKind::ALL
                .iter()
                .map(|kind| ExpertRole::builtin(*kind, model.clone()))
                .collect(),
        }
    }

    /// Look a role up by key, kebab-case key or alias
    pub fn get_role(&self, name: &str) -> Option<&ExpertRole> {
        let kind: ExpertKind = name.parse().ok()?;
        self.get(kind)
    }

    pub fn get(&self, kind: ExpertKind) -> Option<&ExpertRole> {
        self.roles.iter().find(|r| r.kind == kind)
    }

    pub fn roles(&self) -> &[ExpertRole] {
        &self.roles
    }

    pub fn contains(&self, kind: ExpertKind) -> bool {
        self.get(kind).is_some()
    }

    /// A new snapshot with `role` added or replacing the role of the same kind
    pub fn with_role(&self, role: ExpertRole) -> Self {
        let mut roles = self.roles.clone();
        match roles.iter_mut().find(|r| r.kind == role.kind) {
            Some(existing) => *existing = role,
            None => roles.push(role),
        }
        Self { roles }
    }
}

impl Default for RoleCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}
