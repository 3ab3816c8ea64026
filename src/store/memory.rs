//! 进程内 User Store（RwLock<HashMap>），ID 为 UUID v4

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::auth::Identity;
use crate::core::StoreError;
use crate::store::UserStore;

#[derive(Debug, Clone)]
struct UserRecord {
    id: String,
    username: String,
    email: String,
    password: String,
}

impl UserRecord {
    fn identity(&self) -> Identity {
        Identity {
            subject_id: self.id.clone(),
            display_name: self.username.clone(),
        }
    }
}

#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    users: RwLock<HashMap<String, UserRecord>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 空库时写入演示账号，返回是否写入
    pub async fn seed_demo_user(&self) -> bool {
        if !self.users.read().await.is_empty() {
            return false;
        }
        match self.register("testuser", "test@example.com", "test123").await {
            Ok(identity) => {
                tracing::info!(subject = %identity.subject_id, "seeded demo user");
                true
            }
            Err(e) => {
                tracing::warn!("failed to seed demo user: {}", e);
                false
            }
        }
    }

    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_subject_id(&self, subject_id: &str) -> Result<Option<Identity>, StoreError> {
        Ok(self.users.read().await.get(subject_id).map(UserRecord::identity))
    }

    async fn find_by_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<Identity>, StoreError> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .find(|u| u.email == email && u.password == password)
            .map(UserRecord::identity))
    }

    async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<Identity, StoreError> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == email) {
            return Err(StoreError::Conflict("Email already registered".to_string()));
        }
        if users.values().any(|u| u.username == username) {
            return Err(StoreError::Conflict("Username already taken".to_string()));
        }
        let record = UserRecord {
            id: uuid::Uuid::new_v4().to_string(),
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        };
        let identity = record.identity();
        users.insert(record.id.clone(), record);
        Ok(identity)
    }
}
