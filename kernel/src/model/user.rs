use crate::model::{id::UserId, role::Role};
use shared::error::{AppError, AppResult};

/// Caller identity as supplied by the upstream identity provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub user_id: UserId,
    pub role: Role,
}

impl Identity {
    pub fn new(user_id: UserId, role: Role) -> Self {
        Self { user_id, role }
    }

    pub fn ensure_can_write(&self) -> AppResult<()> {
        self.ensure(self.role.can_write(), "modify")
    }

    pub fn ensure_can_create(&self) -> AppResult<()> {
        self.ensure(self.role.can_create(), "create")
    }

    pub fn ensure_can_manage_events(&self) -> AppResult<()> {
        self.ensure(self.role.can_manage_events(), "manage events")
    }

    pub fn ensure_root(&self) -> AppResult<()> {
        self.ensure(self.role.is_root(), "administer the system")
    }

    fn ensure(&self, allowed: bool, action: &str) -> AppResult<()> {
        if allowed {
            Ok(())
        } else {
            Err(AppError::Forbidden(format!(
                "Role '{}' is not allowed to {action}",
                self.role
            )))
        }
    }
}
