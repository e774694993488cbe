use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use sqlx::SqlitePool;

use crate::db::models::User;
use crate::error::{AppError, AppResult};

/// Creates an account, hashing the password with Argon2id. A second signup
/// with the same email trips the unique index and comes back as
/// [`AppError::DuplicateEmail`] for the handler to turn into a field error.
pub async fn insert(pool: &SqlitePool, name: &str, email: &str, password: &str) -> AppResult<()> {
    let salt = SaltString::generate(&mut OsRng);
    let hashed = Argon2::default()
        .hash_password(password.as_bytes(), &salt)?
        .to_string();

    sqlx::query(
        "INSERT INTO users (name, email, hashed_password, created)
         VALUES (?, ?, ?, ?)",
    )
    .bind(name)
    .bind(email)
    .bind(&hashed)
    .bind(chrono::Utc::now())
    .execute(pool)
    .await
    .map_err(|err| {
        let unique = err
            .as_database_error()
            .is_some_and(|db| db.is_unique_violation());
        if unique {
            AppError::DuplicateEmail
        } else {
            AppError::Database(err)
        }
    })?;

    Ok(())
}

/// Checks an email/password pair and returns the account id.
///
/// An unknown email and a wrong password both come back as
/// [`AppError::InvalidCredentials`]; the login handler shows one generic
/// message for either, so the response does not reveal which half failed.
pub async fn authenticate(pool: &SqlitePool, email: &str, password: &str) -> AppResult<i64> {
    let user = sqlx::query_as::<_, User>(
        "SELECT id, name, email, hashed_password, created FROM users WHERE email = ?",
    )
    .bind(email)
    .fetch_one(pool)
    .await
    .map_err(|err| match err {
        sqlx::Error::RowNotFound => AppError::InvalidCredentials,
        _ => AppError::Database(err),
    })?;

    let parsed = PasswordHash::new(&user.hashed_password)?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(user.id),
        Err(argon2::password_hash::Error::Password) => Err(AppError::InvalidCredentials),
        Err(err) => Err(AppError::PasswordHash(err)),
    }
}
