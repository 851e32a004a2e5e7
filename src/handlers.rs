// handlers.rs
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    response::Response,
};
use http::HeaderMap;
use serde::de::IgnoredAny;

use crate::guard::{execute_authenticated, execute_sessioned, HttpHelper};
use crate::models::{CreatePollData, LoginData, OptionData, UserCreationData};
use crate::services::Services;
use crate::{poll, users, vote};

type AppState = State<Arc<Services>>;

/// Register a user
pub async fn create_user(State(services): AppState, headers: HeaderMap, body: Bytes) -> Response {
    let helper = HttpHelper::new(services.clone(), headers, body);

    helper
        .process(|data: UserCreationData| async move { users::create_user(&services, data).await })
        .await
}

/// Anonymous visit, returns a session for a fresh anonymous user
pub async fn visit(State(services): AppState, headers: HeaderMap, body: Bytes) -> Response {
    let helper = HttpHelper::new(services.clone(), headers, body);

    helper
        .process(|_: IgnoredAny| async move { users::visit(&services).await })
        .await
}

pub async fn login(State(services): AppState, headers: HeaderMap, body: Bytes) -> Response {
    let helper = HttpHelper::new(services.clone(), headers, body);

    helper
        .process(|data: LoginData| async move { users::login(&services, data).await })
        .await
}

/// Create a poll owned by the logged user
pub async fn start_create_poll(State(services): AppState, headers: HeaderMap, body: Bytes) -> Response {
    let helper = HttpHelper::new(services.clone(), headers, body);

    execute_authenticated(&helper, |caller, data: CreatePollData| async move {
        poll::start_create_poll(&services, &caller, data).await
    })
    .await
}

pub async fn add_option(
    State(services): AppState,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let helper = HttpHelper::new(services.clone(), headers, body).with_var("id", id);
    let id = helper.get_var("id");

    execute_authenticated(&helper, |caller, data: OptionData| async move {
        poll::add_option(&services, &caller, id, data).await
    })
    .await
}

pub async fn remove_option(
    State(services): AppState,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let helper = HttpHelper::new(services.clone(), headers, body).with_var("id", id);
    let id = helper.get_var("id");

    execute_authenticated(&helper, |caller, data: OptionData| async move {
        poll::remove_option(&services, &caller, id, data).await
    })
    .await
}

pub async fn publish(
    State(services): AppState,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let helper = HttpHelper::new(services.clone(), headers, body).with_var("id", id);
    let id = helper.get_var("id");

    execute_authenticated(&helper, |caller, _: IgnoredAny| async move {
        poll::publish(&services, &caller, id).await
    })
    .await
}

/// Vote on a poll; anonymous sessions may vote
pub async fn create_vote(
    State(services): AppState,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let helper = HttpHelper::new(services.clone(), headers, body).with_var("id", id);
    let id = helper.get_var("id");

    execute_sessioned(&helper, |caller, data: OptionData| async move {
        vote::create_vote(&services, &caller, id, data).await
    })
    .await
}

pub async fn get_poll(
    State(services): AppState,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let helper = HttpHelper::new(services.clone(), headers, body).with_var("id", id);
    let id = helper.get_var("id");

    execute_sessioned(&helper, |_caller, _: IgnoredAny| async move {
        poll::get_poll(&services, id).await
    })
    .await
}

/// Current tally of a poll
pub async fn counting_poll_votes(
    State(services): AppState,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let helper = HttpHelper::new(services.clone(), headers, body).with_var("id", id);
    let id = helper.get_var("id");

    execute_sessioned(&helper, |_caller, _: IgnoredAny| async move {
        vote::counting_poll_votes(&services, id).await
    })
    .await
}

pub async fn get_polls(State(services): AppState, headers: HeaderMap, body: Bytes) -> Response {
    let helper = HttpHelper::new(services.clone(), headers, body);

    execute_sessioned(&helper, |_caller, _: IgnoredAny| async move {
        poll::get_polls(&services).await
    })
    .await
}

/// Polls owned by the logged user
pub async fn get_polls_mine(State(services): AppState, headers: HeaderMap, body: Bytes) -> Response {
    let helper = HttpHelper::new(services.clone(), headers, body);

    execute_sessioned(&helper, |caller, _: IgnoredAny| async move {
        poll::get_polls_mine(&services, &caller).await
    })
    .await
}
