use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use crate::domain::user::models::ListUsersQuery;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::user::errors::UserError;
use crate::user::ports::UserRepository;
use crate::user::ports::UserServicePort;

/// Domain service implementation for user administration.
///
/// Concrete implementation of UserServicePort with dependency injection.
pub struct UserService<UR>
where
    UR: UserRepository,
{
    repository: Arc<UR>,
}

impl<UR> UserService<UR>
where
    UR: UserRepository,
{
    /// Create a new user service.
    ///
    /// # Arguments
    /// * `repository` - User persistence implementation
    pub fn new(repository: Arc<UR>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl<UR> UserServicePort for UserService<UR>
where
    UR: UserRepository,
{
    async fn get_user(&self, id: &UserId) -> Result<User, UserError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(UserError::NotFound(id.to_string()))
    }

    async fn list_users(&self, query: ListUsersQuery) -> Result<Vec<User>, UserError> {
        self.repository.list(query).await
    }

    async fn set_active(&self, id: &UserId, is_active: bool) -> Result<User, UserError> {
        let mut user = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or(UserError::NotFound(id.to_string()))?;

        user.is_active = is_active;
        user.updated_at = Some(Utc::now());

        let updated_user = self.repository.update(user).await?;

        tracing::info!(
            user_id = %updated_user.id,
            is_active = updated_user.is_active,
            "User activation changed"
        );

        Ok(updated_user)
    }
}

#[cfg(test)]
mod tests {
    use mockall::mock;

    use super::*;
    use crate::domain::user::models::EmailAddress;
    use crate::domain::user::models::Role;
    use crate::domain::user::models::Username;

    mock! {
        pub TestUserRepository {}

        #[async_trait]
        impl UserRepository for TestUserRepository {
            async fn create(&self, user: User) -> Result<User, UserError>;
            async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserError>;
            async fn find_by_username(&self, username: &Username) -> Result<Option<User>, UserError>;
            async fn find_by_email(&self, email: &str) -> Result<Option<User>, UserError>;
            async fn list(&self, query: ListUsersQuery) -> Result<Vec<User>, UserError>;
            async fn update(&self, user: User) -> Result<User, UserError>;
        }
    }

    fn sample_user(username: &str) -> User {
        User {
            id: UserId::new(),
            username: Username::new(username.to_string()).unwrap(),
            email: EmailAddress::new(format!("{}@example.com", username)).unwrap(),
            password_hash: "$argon2id$test_hash".to_string(),
            role: Role::User,
            is_active: true,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_get_user_success() {
        let mut repository = MockTestUserRepository::new();

        let expected_user = sample_user("testuser");
        let user_id = expected_user.id;

        let returned_user = expected_user.clone();
        repository
            .expect_find_by_id()
            .withf(move |id| *id == user_id)
            .times(1)
            .returning(move |_| Ok(Some(returned_user.clone())));

        let service = UserService::new(Arc::new(repository));

        let user = service.get_user(&user_id).await.unwrap();
        assert_eq!(user.id, user_id);
        assert_eq!(user.username.as_str(), "testuser");
    }

    #[tokio::test]
    async fn test_get_user_not_found() {
        let mut repository = MockTestUserRepository::new();

        repository
            .expect_find_by_id()
            .times(1)
            .returning(|_| Ok(None));

        let service = UserService::new(Arc::new(repository));

        let result = service.get_user(&UserId::new()).await;
        assert!(matches!(result.unwrap_err(), UserError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_list_users_passes_window_through() {
        let mut repository = MockTestUserRepository::new();

        repository
            .expect_list()
            .withf(|query| query.skip == 10 && query.limit == 25)
            .times(1)
            .returning(|_| Ok(vec![sample_user("first"), sample_user("second")]));

        let service = UserService::new(Arc::new(repository));

        let users = service
            .list_users(ListUsersQuery::new(Some(10), Some(25)).unwrap())
            .await
            .unwrap();
        assert_eq!(users.len(), 2);
    }

    #[tokio::test]
    async fn test_set_active_updates_flag_and_timestamp() {
        let mut repository = MockTestUserRepository::new();

        let user = sample_user("testuser");
        let user_id = user.id;

        repository
            .expect_find_by_id()
            .times(1)
            .returning(move |_| Ok(Some(user.clone())));
        repository
            .expect_update()
            .withf(|user| !user.is_active && user.updated_at.is_some())
            .times(1)
            .returning(Ok);

        let service = UserService::new(Arc::new(repository));

        let updated = service.set_active(&user_id, false).await.unwrap();
        assert!(!updated.is_active);
        assert!(updated.updated_at.is_some());
    }

    #[tokio::test]
    async fn test_set_active_unknown_user() {
        let mut repository = MockTestUserRepository::new();

        repository
            .expect_find_by_id()
            .times(1)
            .returning(|_| Ok(None));
        repository.expect_update().times(0);

        let service = UserService::new(Arc::new(repository));

        let result = service.set_active(&UserId::new(), true).await;
        assert!(matches!(result.unwrap_err(), UserError::NotFound(_)));
    }
}
