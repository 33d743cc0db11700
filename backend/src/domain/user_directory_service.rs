//! User registry service implementing [`UserDirectory`].

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::info;

use crate::domain::ports::{UserDirectory, UserPersistenceError, UserRepository};
use crate::domain::{Error, User, UserId, UserName};

/// Plain CRUD over a [`UserRepository`].
#[derive(Clone)]
pub struct UserDirectoryService<R> {
    repo: Arc<R>,
    clock: Arc<dyn Clock>,
}

impl<R> UserDirectoryService<R> {
    pub fn new(repo: Arc<R>, clock: Arc<dyn Clock>) -> Self {
        Self { repo, clock }
    }
}

fn map_persistence_error(error: UserPersistenceError) -> Error {
    match error {
        UserPersistenceError::Connection { message } => {
            Error::service_unavailable(format!("user repository unavailable: {message}"))
        }
        UserPersistenceError::Query { message } => {
            Error::internal(format!("user repository error: {message}"))
        }
    }
}

fn user_not_found(id: UserId) -> Error {
    Error::not_found(format!("user {id} not found"))
}

#[async_trait]
impl<R> UserDirectory for UserDirectoryService<R>
where
    R: UserRepository,
{
    async fn create_user(&self, name: UserName) -> Result<User, Error> {
        let user = self
            .repo
            .create(&name, self.clock.utc())
            .await
            .map_err(map_persistence_error)?;
        info!(user_id = %user.id, "user created");
        Ok(user)
    }

    async fn rename_user(&self, id: UserId, name: UserName) -> Result<User, Error> {
        self.repo
            .rename(id, &name)
            .await
            .map_err(map_persistence_error)?
            .ok_or_else(|| user_not_found(id))
    }

    async fn delete_user(&self, id: UserId) -> Result<(), Error> {
        let deleted = self.repo.delete(id).await.map_err(map_persistence_error)?;
        if !deleted {
            return Err(user_not_found(id));
        }
        info!(user_id = %id, "user deleted");
        Ok(())
    }

    async fn get_user(&self, id: UserId) -> Result<User, Error> {
        self.repo
            .find_by_id(id)
            .await
            .map_err(map_persistence_error)?
            .ok_or_else(|| user_not_found(id))
    }

    async fn list_users(&self) -> Result<Vec<User>, Error> {
        self.repo.list().await.map_err(map_persistence_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;
    use crate::domain::ports::MockUserRepository;
    use mockable::DefaultClock;
    use rstest::rstest;

    fn make_service(repo: MockUserRepository) -> UserDirectoryService<MockUserRepository> {
        UserDirectoryService::new(Arc::new(repo), Arc::new(DefaultClock))
    }

    fn user_id() -> UserId {
        UserId::new(7).expect("valid user id")
    }

    #[rstest]
    #[tokio::test]
    async fn missing_user_is_not_found() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_id().times(1).returning(|_| Ok(None));

        let error = make_service(repo)
            .get_user(user_id())
            .await
            .expect_err("missing user");
        assert_eq!(error.code(), ErrorCode::NotFound);
        assert_eq!(error.message(), "user 7 not found");
    }

    #[rstest]
    #[tokio::test]
    async fn deleting_unknown_user_is_not_found() {
        let mut repo = MockUserRepository::new();
        repo.expect_delete().times(1).returning(|_| Ok(false));

        let error = make_service(repo)
            .delete_user(user_id())
            .await
            .expect_err("missing user");
        assert_eq!(error.code(), ErrorCode::NotFound);
    }

    #[rstest]
    #[case(UserPersistenceError::connection("refused"), ErrorCode::ServiceUnavailable)]
    #[case(UserPersistenceError::query("syntax"), ErrorCode::InternalError)]
    #[tokio::test]
    async fn repository_errors_are_mapped(
        #[case] failure: UserPersistenceError,
        #[case] expected: ErrorCode,
    ) {
        let mut repo = MockUserRepository::new();
        repo.expect_list().times(1).return_once(move || Err(failure));

        let error = make_service(repo)
            .list_users()
            .await
            .expect_err("list fails");
        assert_eq!(error.code(), expected);
    }
}
