use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::{UserError, UserResult};
use crate::models::{CreateUser, User};

/// Repository trait for User persistence
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// List every user, in insertion (id) order
    async fn find_all(&self) -> UserResult<Vec<User>>;

    /// Look up a user by email, exact match against the stored casing
    async fn find_by_email(&self, email: &str) -> UserResult<Option<User>>;

    /// Look up a user by username, exact match
    async fn find_by_user_name(&self, user_name: &str) -> UserResult<Option<User>>;

    /// Check whether an email is taken, compared case-insensitively
    async fn exists_by_email(&self, email: &str) -> UserResult<bool>;

    /// Check whether a username is taken
    async fn exists_by_user_name(&self, user_name: &str) -> UserResult<bool>;

    /// Persist a new user and return it with its assigned id
    async fn save(&self, input: CreateUser) -> UserResult<User>;
}

/// In-memory implementation of UserRepository (for development/testing)
#[derive(Debug, Default, Clone)]
pub struct InMemoryUserRepository {
    store: Arc<RwLock<Store>>,
}

#[derive(Debug, Default)]
struct Store {
    users: BTreeMap<i32, User>,
    next_id: i32,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_all(&self) -> UserResult<Vec<User>> {
        let store = self.store.read().await;
        Ok(store.users.values().cloned().collect())
    }

    async fn find_by_email(&self, email: &str) -> UserResult<Option<User>> {
        let store = self.store.read().await;
        Ok(store.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_user_name(&self, user_name: &str) -> UserResult<Option<User>> {
        let store = self.store.read().await;
        Ok(store
            .users
            .values()
            .find(|u| u.user_name == user_name)
            .cloned())
    }

    async fn exists_by_email(&self, email: &str) -> UserResult<bool> {
        let store = self.store.read().await;
        let needle = email.to_lowercase();
        Ok(store
            .users
            .values()
            .any(|u| u.email.to_lowercase() == needle))
    }

    async fn exists_by_user_name(&self, user_name: &str) -> UserResult<bool> {
        let store = self.store.read().await;
        Ok(store.users.values().any(|u| u.user_name == user_name))
    }

    async fn save(&self, input: CreateUser) -> UserResult<User> {
        let mut store = self.store.write().await;

        // Mirrors the unique index on LOWER(email) in the real table
        let needle = input.email.to_lowercase();
        if store
            .users
            .values()
            .any(|u| u.email.to_lowercase() == needle)
        {
            return Err(UserError::DuplicateEmail(input.email));
        }

        store.next_id += 1;
        let user = User::from_create(store.next_id, input);
        store.users.insert(user.id, user.clone());

        tracing::info!(user_id = user.id, "Created user");
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signup(user_name: &str, email: &str) -> CreateUser {
        CreateUser {
            first_name: None,
            last_name: None,
            user_name: user_name.to_string(),
            email: email.to_string(),
            password: "secret".to_string(),
        }
    }

    #[tokio::test]
    async fn test_save_assigns_sequential_ids() {
        let repo = InMemoryUserRepository::new();

        let first = repo.save(signup("ada", "ada@example.com")).await.unwrap();
        let second = repo.save(signup("alan", "alan@example.com")).await.unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
    }

    #[tokio::test]
    async fn test_save_preserves_email_casing() {
        let repo = InMemoryUserRepository::new();

        let user = repo.save(signup("ada", "Ada@Example.COM")).await.unwrap();
        assert_eq!(user.email, "Ada@Example.COM");

        let fetched = repo.find_by_email("Ada@Example.COM").await.unwrap();
        assert_eq!(fetched.unwrap().id, user.id);
    }

    #[tokio::test]
    async fn test_save_rejects_case_insensitive_duplicate() {
        let repo = InMemoryUserRepository::new();

        repo.save(signup("ada", "A@B.com")).await.unwrap();
        let result = repo.save(signup("alan", "a@b.com")).await;

        assert!(matches!(result, Err(UserError::DuplicateEmail(_))));
        assert_eq!(repo.find_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_exists_by_email_is_case_insensitive() {
        let repo = InMemoryUserRepository::new();
        repo.save(signup("ada", "Ada@Example.com")).await.unwrap();

        assert!(repo.exists_by_email("ada@example.com").await.unwrap());
        assert!(repo.exists_by_email("ADA@EXAMPLE.COM").await.unwrap());
        assert!(!repo.exists_by_email("other@example.com").await.unwrap());
    }

    #[tokio::test]
    async fn test_find_by_email_matches_stored_casing_only() {
        let repo = InMemoryUserRepository::new();
        repo.save(signup("ada", "Ada@Example.com")).await.unwrap();

        assert!(repo.find_by_email("Ada@Example.com").await.unwrap().is_some());
        assert!(repo.find_by_email("ada@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_find_by_user_name() {
        let repo = InMemoryUserRepository::new();
        repo.save(signup("ada", "ada@example.com")).await.unwrap();

        assert!(repo.find_by_user_name("ada").await.unwrap().is_some());
        assert!(repo.find_by_user_name("alan").await.unwrap().is_none());
        assert!(repo.exists_by_user_name("ada").await.unwrap());
    }

    #[tokio::test]
    async fn test_find_all_returns_insertion_order() {
        let repo = InMemoryUserRepository::new();

        repo.save(signup("ada", "ada@example.com")).await.unwrap();
        repo.save(signup("alan", "alan@example.com")).await.unwrap();
        repo.save(signup("grace", "grace@example.com")).await.unwrap();

        let names: Vec<String> = repo
            .find_all()
            .await
            .unwrap()
            .into_iter()
            .map(|u| u.user_name)
            .collect();
        assert_eq!(names, vec!["ada", "alan", "grace"]);
    }

    #[tokio::test]
    async fn test_find_all_empty_store() {
        let repo = InMemoryUserRepository::new();
        assert!(repo.find_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_find_all_is_stable_without_writes() {
        let repo = InMemoryUserRepository::new();

        repo.save(signup("ada", "ada@example.com")).await.unwrap();
        repo.save(signup("alan", "alan@example.com")).await.unwrap();

        // Reading must not mutate the store; repeated calls return the
        // same sequence
        let first = repo.find_all().await.unwrap();
        let second = repo.find_all().await.unwrap();

        assert_eq!(first.len(), 2);
        assert_eq!(first, second);
    }
}
