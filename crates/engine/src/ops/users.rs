use sea_orm::{ActiveValue, TransactionTrait, prelude::*};

use crate::{
    EngineError, ResultEngine, User,
    password::{hash_password, validate_password, verify_password},
    users,
    util::normalize_required_text,
};

use super::{Engine, with_tx};

impl Engine {
    /// Register a user. Fails with `ExistingKey` if the username is taken.
    ///
    /// The password must be at least three characters long and must not
    /// contain the username. Only a salted hash is stored.
    pub async fn new_user(
        &self,
        username: &str,
        password: &str,
        is_superuser: bool,
    ) -> ResultEngine<User> {
        let (username, hashed_password) = credentials(username, password)?;
        with_tx!(self, |db_tx| {
            if users::Entity::find_by_id(username.clone())
                .one(&db_tx)
                .await?
                .is_some()
            {
                return Err(EngineError::ExistingKey(username));
            }
            let model = users::ActiveModel {
                username: ActiveValue::Set(username.clone()),
                hashed_password: ActiveValue::Set(hashed_password),
                is_superuser: ActiveValue::Set(is_superuser),
            }
            .insert(&db_tx)
            .await?;
            tracing::info!(%username, is_superuser, "user created");
            Ok(User::from(model))
        })
    }

    /// Check credentials and return the caller.
    ///
    /// Unknown users and wrong passwords give the same error.
    pub async fn authenticate(&self, username: &str, password: &str) -> ResultEngine<User> {
        let invalid = || EngineError::KeyNotFound("invalid credentials".to_string());
        if username.is_empty() || password.is_empty() {
            return Err(invalid());
        }
        let model = users::Entity::find_by_id(username.to_string())
            .one(&self.database)
            .await?
            .ok_or_else(invalid)?;
        if !verify_password(password, &model.hashed_password) {
            return Err(invalid());
        }
        Ok(User::from(model))
    }

    /// Make sure a superuser with these credentials exists.
    ///
    /// Used at startup to bootstrap the first administrator. An existing user
    /// is promoted and gets the given password.
    pub async fn ensure_superuser(&self, username: &str, password: &str) -> ResultEngine<User> {
        let (username, hashed_password) = credentials(username, password)?;
        with_tx!(self, |db_tx| {
            let model = users::ActiveModel {
                username: ActiveValue::Set(username.clone()),
                hashed_password: ActiveValue::Set(hashed_password),
                is_superuser: ActiveValue::Set(true),
            };
            let existing = users::Entity::find_by_id(username.clone())
                .one(&db_tx)
                .await?;
            let model = match existing {
                Some(_) => model.update(&db_tx).await?,
                None => {
                    tracing::info!(%username, "bootstrapping superuser");
                    model.insert(&db_tx).await?
                }
            };
            Ok(User::from(model))
        })
    }

    /// Look up a user by username.
    pub async fn user(&self, username: &str) -> ResultEngine<User> {
        with_tx!(self, |db_tx| self.require_user(&db_tx, username).await)
    }
}

/// Normalizes the username, applies the password rules and hashes the
/// password.
fn credentials(username: &str, password: &str) -> ResultEngine<(String, String)> {
    let username = normalize_required_text(username, "username")?;
    // Basic auth splits on the first ':'.
    if username.contains(':') {
        return Err(EngineError::InvalidName(
            "username must not contain ':'".to_string(),
        ));
    }
    validate_password(&username, password)?;
    Ok((username, hash_password(password)))
}
