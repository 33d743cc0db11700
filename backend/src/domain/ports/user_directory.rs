//! Driving port for user registry operations.

use async_trait::async_trait;

use crate::domain::{Error, User, UserId, UserName};

/// Use-case port for managing registered users.
///
/// Missing users surface as `not_found` errors.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn create_user(&self, name: UserName) -> Result<User, Error>;

    async fn rename_user(&self, id: UserId, name: UserName) -> Result<User, Error>;

    async fn delete_user(&self, id: UserId) -> Result<(), Error>;

    async fn get_user(&self, id: UserId) -> Result<User, Error>;

    async fn list_users(&self) -> Result<Vec<User>, Error>;
}
