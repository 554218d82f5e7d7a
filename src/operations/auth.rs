use crate::db::connection::Database;
use crate::db::user_repository;
use crate::error::{FinanceError, Result};
use crate::models::user::User;
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use std::fmt;
use tracing::{info, warn};

/// Plain-text password. `Debug` is redacted so it never reaches the logs.
#[derive(Clone)]
pub struct Password(String);

impl Password {
    pub fn new(password: impl Into<String>) -> Self {
        Self(password.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(***)")
    }
}

/// Salted Argon2id hash in PHC string form.
pub fn hash_password(password: &Password) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_str().as_bytes(), &salt)
        .map_err(|e| FinanceError::PasswordHash(e.to_string()))?;
    Ok(hash.to_string())
}

pub fn verify_password(password: &Password, password_hash: &str) -> bool {
    match PasswordHash::new(password_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_str().as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

pub fn register(db: &Database, username: &str, password: &Password) -> Result<User> {
    let username = username.trim();
    if username.is_empty() {
        return Err(FinanceError::validation("Username cannot be empty"));
    }
    if password.as_str().is_empty() {
        return Err(FinanceError::validation("Password cannot be empty"));
    }
    let password_hash = hash_password(password)?;

    let user = db.with_connection(|conn| {
        if user_repository::user_exists(conn, username)? {
            return Err(FinanceError::UsernameTaken(username.to_string()));
        }
        let id = user_repository::add_user(conn, username, &password_hash)?;
        Ok(User {
            id,
            username: username.to_string(),
            password_hash,
        })
    })?;
    info!(user_id = user.id, username = %user.username, "registered user");
    Ok(user)
}

pub fn login(db: &Database, username: &str, password: &Password) -> Result<User> {
    let username = username.trim();
    let user = db.with_connection(|conn| user_repository::get_user_by_name(conn, username))?;
    match user {
        Some(user) if verify_password(password, &user.password_hash) => {
            info!(user_id = user.id, "login succeeded");
            Ok(user)
        }
        _ => {
            warn!(username, "login failed");
            Err(FinanceError::InvalidCredentials)
        }
    }
}
