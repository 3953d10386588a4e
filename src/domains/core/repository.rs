use crate::errors::DomainResult;
use async_trait::async_trait;
use uuid::Uuid;

/// Trait for finding entities by ID.
///
/// Implementations return `DomainError::EntityNotFound` for unknown ids so
/// services can tell a missing record apart from a storage failure.
#[async_trait]
pub trait FindById<T> {
    async fn find_by_id(&self, id: Uuid) -> DomainResult<T>;
}
