// SPDX-FileCopyrightText: 2026 Waybill Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Registration, login, and first-run admin seeding.

use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info};
use waybill_core::{StorageAdapter, User, WaybillError};
use waybill_storage::queries::users;

use crate::password::PasswordHashing;

/// Role given to self-registered accounts.
pub const USER_ROLE: &str = "user";
/// Role that unlocks the back office.
pub const ADMIN_ROLE: &str = "admin";

/// Create a `user` account after checking the confirmation matches.
pub async fn register(
    store: &dyn StorageAdapter,
    hashing: &PasswordHashing,
    username: &str,
    password: &SecretString,
    confirm: &SecretString,
) -> Result<User, WaybillError> {
    if password.expose_secret() != confirm.expose_secret() {
        return Err(WaybillError::Auth("passwords do not match".to_string()));
    }
    if username.trim().is_empty() {
        return Err(WaybillError::Auth("username must not be empty".to_string()));
    }

    let hash = hashing.hash(password)?;
    let id = match users::create(store, username, &hash, USER_ROLE).await {
        Ok(id) => id,
        Err(e) if e.is_constraint_violation() => {
            return Err(WaybillError::Auth("username already exists".to_string()));
        }
        Err(e) => return Err(e),
    };

    info!(username, "user registered");
    Ok(User {
        id,
        username: username.to_string(),
        password: hash,
        role: USER_ROLE.to_string(),
    })
}

/// Check a username/password pair.
///
/// An unknown user and a wrong password both yield `None`.
pub async fn authenticate(
    store: &dyn StorageAdapter,
    hashing: &PasswordHashing,
    username: &str,
    password: &SecretString,
) -> Result<Option<User>, WaybillError> {
    let Some(user) = users::find_by_username(store, username).await? else {
        debug!(username, "login for unknown user");
        return Ok(None);
    };
    if hashing.verify(password, &user.password) {
        Ok(Some(user))
    } else {
        debug!(username, "login with wrong password");
        Ok(None)
    }
}

/// Create an admin account unless one with this name already exists.
///
/// Returns whether a user was created. An existing account is left as is,
/// including its password and role.
pub async fn ensure_admin(
    store: &dyn StorageAdapter,
    hashing: &PasswordHashing,
    username: &str,
    password: &SecretString,
) -> Result<bool, WaybillError> {
    if users::find_by_username(store, username).await?.is_some() {
        debug!(username, "admin account already present");
        return Ok(false);
    }

    let hash = hashing.hash(password)?;
    match users::create(store, username, &hash, ADMIN_ROLE).await {
        Ok(_) => {
            info!(username, "admin account created");
            Ok(true)
        }
        // Lost a race with another creator.
        Err(e) if e.is_constraint_violation() => Ok(false),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::password::fast_config;
    use waybill_config::model::StorageConfig;
    use waybill_storage::SqliteStore;

    fn secret(s: &str) -> SecretString {
        SecretString::from(s.to_string())
    }

    fn setup() -> (SqliteStore, PasswordHashing, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::new(StorageConfig {
            database_path: dir.path().join("auth.db").to_string_lossy().into_owned(),
            ..StorageConfig::default()
        });
        (store, PasswordHashing::new(&fast_config()).unwrap(), dir)
    }

    #[tokio::test]
    async fn register_then_login() {
        let (store, hashing, _dir) = setup();
        let user = register(&store, &hashing, "kwesi", &secret("p4ss"), &secret("p4ss"))
            .await
            .unwrap();
        assert_eq!(user.role, USER_ROLE);
        assert!(!user.is_admin());

        let logged_in = authenticate(&store, &hashing, "kwesi", &secret("p4ss"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(logged_in.id, user.id);
    }

    #[tokio::test]
    async fn register_rejects_mismatched_confirmation() {
        let (store, hashing, _dir) = setup();
        let err = register(&store, &hashing, "kwesi", &secret("a"), &secret("b"))
            .await
            .unwrap_err();
        assert!(matches!(err, WaybillError::Auth(ref m) if m == "passwords do not match"));
        assert_eq!(users::count(&store).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn register_duplicate_username() {
        let (store, hashing, _dir) = setup();
        register(&store, &hashing, "adjoa", &secret("x"), &secret("x"))
            .await
            .unwrap();
        let err = register(&store, &hashing, "adjoa", &secret("y"), &secret("y"))
            .await
            .unwrap_err();
        assert!(matches!(err, WaybillError::Auth(ref m) if m == "username already exists"));
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_user_look_the_same() {
        let (store, hashing, _dir) = setup();
        register(&store, &hashing, "esi", &secret("right"), &secret("right"))
            .await
            .unwrap();

        let wrong = authenticate(&store, &hashing, "esi", &secret("wrong")).await.unwrap();
        let unknown = authenticate(&store, &hashing, "nobody", &secret("right"))
            .await
            .unwrap();
        assert!(wrong.is_none());
        assert!(unknown.is_none());
    }

    #[tokio::test]
    async fn ensure_admin_creates_once() {
        let (store, hashing, _dir) = setup();
        assert!(ensure_admin(&store, &hashing, "admin", &secret("first")).await.unwrap());
        assert!(!ensure_admin(&store, &hashing, "admin", &secret("second")).await.unwrap());

        let admin = authenticate(&store, &hashing, "admin", &secret("first"))
            .await
            .unwrap()
            .unwrap();
        assert!(admin.is_admin());
        assert!(
            authenticate(&store, &hashing, "admin", &secret("second"))
                .await
                .unwrap()
                .is_none()
        );
    }
}
