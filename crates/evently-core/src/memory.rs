//! In-memory credential store
//!
//! Backs local development when no `DATABASE_URL` is configured, and the
//! test suites. Also exposes the administrative mutations (deactivation,
//! role change) that live outside the [`CredentialStore`] contract.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{Credential, CredentialStore, EventlyError, NewCredential, Result, Role};

/// Credential store held in process memory
#[derive(Default)]
pub struct InMemoryCredentialStore {
    users: RwLock<HashMap<Uuid, Credential>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored accounts
    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }

    /// Flip the active flag of an account
    pub async fn set_active(&self, id: Uuid, is_active: bool) -> Result<()> {
        self.modify(id, |user| user.is_active = is_active).await
    }

    /// Change the role of an account
    pub async fn set_role(&self, id: Uuid, role: Role) -> Result<()> {
        self.modify(id, |user| user.role = role).await
    }

    async fn modify<F>(&self, id: Uuid, apply: F) -> Result<()>
    where
        F: FnOnce(&mut Credential),
    {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(&id)
            .ok_or_else(|| EventlyError::NotFound(format!("user {id}")))?;
        apply(user);
        user.updated_at = Utc::now();
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<Credential>> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Credential>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn insert(&self, credential: NewCredential) -> Result<Credential> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == credential.email) {
            return Err(EventlyError::Conflict(format!(
                "email already in use: {}",
                credential.email
            )));
        }

        let now = Utc::now();
        let user = Credential {
            id: Uuid::new_v4(),
            email: credential.email,
            first_name: credential.first_name,
            last_name: credential.last_name,
            password_hash: credential.password_hash,
            role: credential.role.unwrap_or_default(),
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        users.insert(user.id, user.clone());

        Ok(user)
    }

    async fn update_password_hash(&self, id: Uuid, new_hash: &str) -> Result<()> {
        let new_hash = new_hash.to_string();
        self.modify(id, move |user| user.password_hash = new_hash).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str) -> NewCredential {
        NewCredential {
            email: email.to_string(),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            password_hash: "hash".to_string(),
            role: None,
        }
    }

    #[tokio::test]
    async fn test_insert_and_find() {
        let store = InMemoryCredentialStore::new();
        let created = store.insert(new_user("a@b.com")).await.unwrap();

        assert_eq!(created.role, Role::Customer);
        assert!(created.is_active);

        let by_email = store.find_by_email("a@b.com").await.unwrap().unwrap();
        let by_id = store.find_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(by_email, created);
        assert_eq!(by_id, created);
    }

    #[tokio::test]
    async fn test_email_match_is_case_sensitive() {
        let store = InMemoryCredentialStore::new();
        store.insert(new_user("a@b.com")).await.unwrap();

        assert!(store.find_by_email("A@B.com").await.unwrap().is_none());
        // Different case is a different account
        assert!(store.insert(new_user("A@B.com")).await.is_ok());
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let store = InMemoryCredentialStore::new();
        store.insert(new_user("a@b.com")).await.unwrap();

        let result = store.insert(new_user("a@b.com")).await;
        assert!(matches!(result, Err(EventlyError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_update_password_hash_bumps_updated_at() {
        let store = InMemoryCredentialStore::new();
        let created = store.insert(new_user("a@b.com")).await.unwrap();

        store.update_password_hash(created.id, "new-hash").await.unwrap();
        let updated = store.find_by_id(created.id).await.unwrap().unwrap();

        assert_eq!(updated.password_hash, "new-hash");
        assert!(updated.updated_at >= created.updated_at);
        assert_eq!(updated.created_at, created.created_at);
    }

    #[tokio::test]
    async fn test_mutations_on_missing_user() {
        let store = InMemoryCredentialStore::new();
        let missing = Uuid::new_v4();

        assert!(matches!(
            store.update_password_hash(missing, "x").await,
            Err(EventlyError::NotFound(_))
        ));
        assert!(matches!(
            store.set_active(missing, false).await,
            Err(EventlyError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_deactivate_and_change_role() {
        let store = InMemoryCredentialStore::new();
        let created = store.insert(new_user("a@b.com")).await.unwrap();

        store.set_active(created.id, false).await.unwrap();
        store.set_role(created.id, Role::Organizer).await.unwrap();

        let user = store.find_by_id(created.id).await.unwrap().unwrap();
        assert!(!user.is_active);
        assert_eq!(user.role, Role::Organizer);
    }

    #[test]
    fn test_empty_store() {
        let store = InMemoryCredentialStore::default();
        tokio_test::block_on(async {
            assert!(store.is_empty().await);
            assert!(store.find_by_email("a@b.com").await.unwrap().is_none());
            assert!(store.find_by_id(Uuid::new_v4()).await.unwrap().is_none());
        });
    }
}
