use chrono::Utc;
use tracing::{debug, instrument};

use crate::{auth::AuthUser, errors::ServiceError, models::User, repositories::Repositories};

/// Mirrors identity-provider profiles on authenticated access.
pub struct UserService {
    repos: Repositories,
}

impl UserService {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    /// Creates or refreshes the caller's profile and returns the stored record.
    #[instrument(skip(self, caller), fields(user_id = %caller.user_id))]
    pub async fn touch(&self, caller: &AuthUser) -> Result<User, ServiceError> {
        let now = Utc::now();
        let user = User {
            id: caller.user_id.clone(),
            email: caller.email.clone().unwrap_or_default(),
            display_name: caller.name.clone(),
            created_at: now,
            last_seen_at: now,
        };
        let saved = self.repos.users.upsert(&user).await?;
        debug!("user profile refreshed");
        Ok(saved)
    }

    pub async fn get(&self, user_id: &str) -> Result<User, ServiceError> {
        self.repos
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("User {} not found", user_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn touch_creates_then_refreshes() {
        let service = UserService::new(Repositories::in_memory());
        let caller = AuthUser {
            user_id: "user-1".into(),
            email: Some("a@example.com".into()),
            name: None,
        };
        let first = service.touch(&caller).await.unwrap();

        let renamed = AuthUser {
            name: Some("Alex".into()),
            ..caller
        };
        let second = service.touch(&renamed).await.unwrap();
        assert_eq!(second.created_at, first.created_at);
        assert_eq!(second.display_name.as_deref(), Some("Alex"));
        assert_eq!(service.get("user-1").await.unwrap(), second);
    }
}
