// src/guard.rs
//! Request helper and the session guards in front of every pipeline.
//!
//! `execute_sessioned` only needs a valid session; `execute_authenticated`
//! also needs the session's user to be registered. A guard failure skips the
//! pipeline and goes out through [`HttpHelper::forbid`].

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use axum::{
    body::Bytes,
    response::{IntoResponse, Response},
    Json,
};
use http::{HeaderMap, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::json;
use tracing::{debug, warn};

use crate::error::{AppError, StoreError};
use crate::ids::parse_id;
use crate::models::{Session, User, UserId};
use crate::services::Services;

/// Header carrying the session token (`sessionId`, matched case-insensitively).
pub const SESSION_HEADER: &str = "sessionid";

pub const MISSING_SESSION: &str = "Must be logged to perform this action. Missing value.";
pub const INVALID_SESSION: &str = "Must be logged to perform this action. Session invalid.";
pub const NOT_AUTHENTICATED: &str = "Must be logged to perform this action. Not authenticated.";

/// The resolved session of the request.
#[derive(Debug, Clone)]
pub struct Caller {
    pub session: Session,
    pub user: User,
}

impl Caller {
    pub fn is_registered_user(&self) -> bool {
        self.session.registered_user && self.user.is_registered()
    }

    pub fn logged_user_id(&self) -> UserId {
        self.session.user_id
    }
}

/// Everything a handler needs from the request.
pub struct HttpHelper {
    services: Arc<Services>,
    headers: HeaderMap,
    body: Bytes,
    vars: HashMap<&'static str, String>,
}

impl HttpHelper {
    pub fn new(services: Arc<Services>, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            services,
            headers,
            body,
            vars: HashMap::new(),
        }
    }

    pub fn with_var(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.vars.insert(name, value.into());
        self
    }

    /// Path parameter, empty when absent.
    pub fn get_var(&self, name: &str) -> &str {
        self.vars.get(name).map(String::as_str).unwrap_or_default()
    }

    pub fn request_session_id(&self) -> Result<&str, AppError> {
        self.headers
            .get(SESSION_HEADER)
            .and_then(|value| value.to_str().ok())
            .filter(|value| !value.is_empty())
            .ok_or_else(|| AppError::Unauthenticated(MISSING_SESSION.to_string()))
    }

    pub async fn validate_session(&self) -> Result<Caller, AppError> {
        let raw = self.request_session_id()?;
        let id = parse_id(raw).map_err(|e| AppError::Unauthenticated(e.to_string()))?;

        let session = self
            .services
            .find_session_by_id(id)
            .await
            .map_err(unresolved)?;
        let user = self
            .services
            .find_user_by_id(session.user_id)
            .await
            .map_err(unresolved)?;

        debug!(session = %session.id, user = %user.id, "session validated");
        Ok(Caller { session, user })
    }

    pub async fn check_authentication(&self) -> Result<Caller, AppError> {
        let caller = self.validate_session().await?;

        if !caller.is_registered_user() {
            return Err(AppError::Unauthenticated(NOT_AUTHENTICATED.to_string()));
        }

        Ok(caller)
    }

    /// Decode the body, run the pipeline and serialize what it returns.
    pub async fn process<T, R, F, Fut>(&self, run: F) -> Response
    where
        T: DeserializeOwned,
        R: Serialize,
        F: FnOnce(T) -> Fut,
        Fut: Future<Output = Result<R, AppError>>,
    {
        // no body decodes as JSON null
        let body: &[u8] = if self.body.is_empty() { b"null" } else { &self.body };

        let payload = match serde_json::from_slice::<T>(body) {
            Ok(payload) => payload,
            Err(e) => return AppError::MalformedPayload(e.to_string()).into_response(),
        };

        match run(payload).await {
            Ok(result) => Json(result).into_response(),
            Err(err) => err.into_response(),
        }
    }

    pub fn forbid(&self, err: AppError) -> Response {
        warn!(error = %err, "request forbidden");
        (StatusCode::FORBIDDEN, Json(json!({ "error": err.to_string() }))).into_response()
    }
}

/// A missing row means the session is invalid; any other store failure is
/// reported with its own message.
fn unresolved(err: StoreError) -> AppError {
    match err {
        StoreError::NotFound(_) => AppError::Unauthenticated(INVALID_SESSION.to_string()),
        StoreError::Database(e) => AppError::Unauthenticated(e.to_string()),
    }
}

pub async fn execute_sessioned<T, R, F, Fut>(helper: &HttpHelper, run: F) -> Response
where
    T: DeserializeOwned,
    R: Serialize,
    F: FnOnce(Caller, T) -> Fut,
    Fut: Future<Output = Result<R, AppError>>,
{
    match helper.validate_session().await {
        Ok(caller) => helper.process(|payload| run(caller, payload)).await,
        Err(err) => helper.forbid(err),
    }
}

pub async fn execute_authenticated<T, R, F, Fut>(helper: &HttpHelper, run: F) -> Response
where
    T: DeserializeOwned,
    R: Serialize,
    F: FnOnce(Caller, T) -> Fut,
    Fut: Future<Output = Result<R, AppError>>,
{
    match helper.check_authentication().await {
        Ok(caller) => helper.process(|payload| run(caller, payload)).await,
        Err(err) => helper.forbid(err),
    }
}
