use std::sync::Arc;
use validator::Validate;

use crate::error::{UserError, UserResult};
use crate::models::{CreateUser, User};
use crate::repository::UserRepository;

/// Service layer for user registration business logic
#[derive(Clone)]
pub struct UserService<R: UserRepository> {
    repository: Arc<R>,
}

impl<R: UserRepository> UserService<R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository: Arc::new(repository),
        }
    }

    /// Sign up a new user, enforcing case-insensitive email uniqueness
    ///
    /// The uniqueness check runs against the lowercased email, but the record
    /// is stored with the casing the user submitted.
    pub async fn create_user(&self, input: CreateUser) -> UserResult<User> {
        input
            .validate()
            .map_err(|e| UserError::Validation(e.to_string()))?;

        let normalized_email = input.email.to_lowercase();
        if self.repository.exists_by_email(&normalized_email).await? {
            return Err(UserError::DuplicateEmail(input.email));
        }

        self.repository.save(input).await
    }

    /// List every registered user
    pub async fn get_all_users(&self) -> UserResult<Vec<User>> {
        self.repository.find_all().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MockUserRepository;
    use mockall::predicate::eq;

    fn signup(email: &str) -> CreateUser {
        CreateUser {
            first_name: Some("Ada".to_string()),
            last_name: None,
            user_name: "ada".to_string(),
            email: email.to_string(),
            password: "secret".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_user_checks_normalized_email() {
        let mut mock_repo = MockUserRepository::new();

        // The existence check must see the lowercased email
        mock_repo
            .expect_exists_by_email()
            .with(eq("ada@example.com"))
            .returning(|_| Ok(false));
        mock_repo
            .expect_save()
            .returning(|input| Ok(User::from_create(1, input)));

        let service = UserService::new(mock_repo);
        let user = service.create_user(signup("Ada@Example.COM")).await.unwrap();

        // The stored record keeps the submitted casing
        assert_eq!(user.email, "Ada@Example.COM");
        assert_eq!(user.id, 1);
    }

    #[tokio::test]
    async fn test_create_user_rejects_duplicate_email() {
        let mut mock_repo = MockUserRepository::new();

        mock_repo
            .expect_exists_by_email()
            .with(eq("a@b.com"))
            .returning(|_| Ok(true));
        // save must never run when the email is taken
        mock_repo.expect_save().never();

        let service = UserService::new(mock_repo);
        let result = service.create_user(signup("A@B.com")).await;

        // The error carries the email as submitted, not the normalized form
        match result {
            Err(UserError::DuplicateEmail(email)) => assert_eq!(email, "A@B.com"),
            other => panic!("expected DuplicateEmail, got {:?}", other.map(|u| u.id)),
        }
    }

    #[tokio::test]
    async fn test_create_user_rejects_invalid_email() {
        let mut mock_repo = MockUserRepository::new();
        mock_repo.expect_exists_by_email().never();
        mock_repo.expect_save().never();

        let service = UserService::new(mock_repo);
        let result = service.create_user(signup("not-an-email")).await;

        assert!(matches!(result, Err(UserError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_user_propagates_storage_fault() {
        let mut mock_repo = MockUserRepository::new();

        mock_repo
            .expect_exists_by_email()
            .returning(|_| Err(UserError::Internal("connection lost".to_string())));

        let service = UserService::new(mock_repo);
        let result = service.create_user(signup("ada@example.com")).await;

        assert!(matches!(result, Err(UserError::Internal(_))));
    }

    #[tokio::test]
    async fn test_get_all_users_delegates_to_repository() {
        let mut mock_repo = MockUserRepository::new();

        mock_repo.expect_find_all().returning(|| {
            Ok(vec![
                User::from_create(1, signup("ada@example.com")),
                User::from_create(2, signup("alan@example.com")),
            ])
        });

        let service = UserService::new(mock_repo);
        let users = service.get_all_users().await.unwrap();

        assert_eq!(users.len(), 2);
        assert_eq!(users[0].id, 1);
        assert_eq!(users[1].id, 2);
    }
}
