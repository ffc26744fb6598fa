//! Employee directory port.
//!
//! Resolves users and the populations that batch computations run over.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{DepartmentId, DomainError, UserId};

/// The slice of a user record the engine cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub id: UserId,
    pub department_id: Option<DepartmentId>,
    pub active: bool,
}

#[async_trait]
pub trait EmployeeDirectory: Send + Sync {
    /// Looks up a user regardless of active flag. `None` if unknown.
    async fn find_employee(&self, user_id: UserId) -> Result<Option<Employee>, DomainError>;

    /// Active users currently assigned to `department_id`, ordered by id.
    async fn active_in_department(
        &self,
        department_id: DepartmentId,
    ) -> Result<Vec<Employee>, DomainError>;

    /// Every active user, ordered by id.
    async fn all_active(&self) -> Result<Vec<Employee>, DomainError>;
}
