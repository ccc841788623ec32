use sea_orm::{DatabaseTransaction, prelude::*};

use crate::{EngineError, ResultEngine, User, users};

use super::Engine;

impl Engine {
    pub(super) async fn require_user(
        &self,
        db: &DatabaseTransaction,
        user_id: &str,
    ) -> ResultEngine<User> {
        users::Entity::find_by_id(user_id.to_string())
            .one(db)
            .await?
            .map(User::from)
            .ok_or_else(|| EngineError::KeyNotFound("user not exists".to_string()))
    }

    /// Funding request management and the full contribution list are
    /// reserved to superusers.
    pub(super) async fn require_superuser(
        &self,
        db: &DatabaseTransaction,
        user_id: &str,
    ) -> ResultEngine<User> {
        let user = self.require_user(db, user_id).await?;
        if !user.is_superuser {
            return Err(EngineError::Forbidden("superuser required".to_string()));
        }
        Ok(user)
    }
}
