use async_trait::async_trait;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use std::sync::Arc;

use super::{BaseRepository, RepoResult, UserRepository};
use crate::entities::user;
use crate::models::User;

#[derive(Debug, Clone)]
pub struct SeaOrmUserRepository {
    base: BaseRepository,
}

impl SeaOrmUserRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }
}

#[async_trait]
impl UserRepository for SeaOrmUserRepository {
    async fn upsert(&self, user: &User) -> RepoResult<User> {
        let db = self.base.get_db();
        let saved = match user::Entity::find_by_id(user.id.clone()).one(db).await? {
            Some(existing) => {
                let mut active: user::ActiveModel = existing.into();
                active.email = Set(user.email.clone());
                active.display_name = Set(user.display_name.clone());
                active.last_seen_at = Set(user.last_seen_at);
                active.update(db).await?
            }
            None => user::ActiveModel::from(user).insert(db).await?,
        };
        Ok(User::from(saved))
    }

    async fn find_by_id(&self, id: &str) -> RepoResult<Option<User>> {
        let model = user::Entity::find_by_id(id.to_string()).one(self.base.get_db()).await?;
        Ok(model.map(User::from))
    }
}
