// src/users.rs
//! Registration, anonymous visits and login.

use chrono::Utc;
use sha2::{Digest, Sha256};

use crate::error::{AppError, StoreError};
use crate::models::{LoginData, Session, User, UserCreationData};
use crate::pipeline::Pipeline;
use crate::services::Services;

pub const PASSWORDS_DO_NOT_MATCH: &str = "Passwords don't match";
pub const INVALID_CREDENTIALS: &str = "User and password invalid";

pub fn hash_password(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

/// Build a registered user from the form. The password is stored hashed.
pub fn create_user_from_data(services: &Services, data: UserCreationData) -> Result<User, AppError> {
    if data.password != data.password_confirm {
        return Err(AppError::InvalidInput(PASSWORDS_DO_NOT_MATCH.to_string()));
    }
    if data.password.is_empty() {
        return Err(AppError::InvalidInput("Password can't be empty".to_string()));
    }

    Ok(User {
        id: services.ids.next_id(),
        login: data.login,
        name: data.name,
        password: hash_password(&data.password),
        created_at: Utc::now(),
    })
}

pub async fn create_user(services: &Services, data: UserCreationData) -> Result<User, AppError> {
    Pipeline::start("create user", data)
        .step("create user", |data| async move { create_user_from_data(services, data) })
        .await
        .step("check login", |user| async move {
            if services.login_in_use(&user.login).await? {
                return Err(AppError::Conflict(format!("Login {} already in use.", user.login)));
            }
            Ok(user)
        })
        .await
        .step("save user", |user| async move { services.save_user(user).await.map_err(AppError::from) })
        .await
        .finish()
}

/// Anonymous user plus a session for it.
pub async fn visit(services: &Services) -> Result<Session, AppError> {
    let user = services.create_anon_user().await?;
    Ok(services.create_session(&user).await?)
}

pub async fn login(services: &Services, data: LoginData) -> Result<Session, AppError> {
    Pipeline::start("login", data)
        .step("authenticate", |data| async move {
            services
                .find_user_by_login_and_password(&data.login, &hash_password(&data.password))
                .await
                .map_err(|e| match e {
                    StoreError::NotFound(_) => AppError::InvalidInput(INVALID_CREDENTIALS.to_string()),
                    e => AppError::from(e),
                })
        })
        .await
        .step("create session", |user| async move {
            services.create_session(&user).await.map_err(AppError::from)
        })
        .await
        .finish()
}
