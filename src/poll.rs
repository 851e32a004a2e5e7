// src/poll.rs
//! Poll creation, reads and the mutation protocol.
//!
//! Add-option, remove-option and publish all go through [`change_poll`]:
//! resolve id, load, check the publication lock, check ownership, apply the
//! change, save. The lock is checked before ownership, so only the owner can
//! learn anything beyond "this poll exists".

use std::future::Future;

use chrono::Utc;
use tracing::info;

use crate::error::AppError;
use crate::guard::Caller;
use crate::ids::parse_id;
use crate::models::{CreatePollData, OptionData, Poll, PollId, PollOption};
use crate::pipeline::Pipeline;
use crate::services::Services;

pub const PUBLISHED_POLL: &str = "Can't change a published poll.";
pub const OTHER_USER_POLL: &str = "Can't change a poll from other user.";

pub fn duplicate_option(value: &str) -> String {
    format!("Option {value} already exists in this poll.")
}

pub async fn start_create_poll(
    services: &Services,
    caller: &Caller,
    data: CreatePollData,
) -> Result<Poll, AppError> {
    Pipeline::start("start create poll", data)
        .step("build poll", |data| async move {
            Ok(Poll {
                id: services.ids.next_id(),
                name: data.name,
                owner: caller.logged_user_id(),
                published: false,
                created_at: Utc::now(),
                options: Vec::new(),
            })
        })
        .await
        .step("persist poll", |poll| async move { services.save_poll(poll).await.map_err(AppError::from) })
        .await
        .finish()
}

fn ensure_unpublished(poll: Poll) -> Result<Poll, AppError> {
    if poll.published {
        return Err(AppError::NotChangePoll(PUBLISHED_POLL.to_string()));
    }
    Ok(poll)
}

fn ensure_owner(poll: Poll, caller: &Caller) -> Result<Poll, AppError> {
    if poll.owner != caller.logged_user_id() {
        return Err(AppError::NotChangePoll(OTHER_USER_POLL.to_string()));
    }
    Ok(poll)
}

/// Shared shape of every poll mutation. `change` only runs once the poll is
/// known to exist, to be unpublished and to belong to the caller.
pub async fn change_poll<F, Fut>(
    services: &Services,
    caller: &Caller,
    raw_id: &str,
    change: F,
) -> Result<Poll, AppError>
where
    F: FnOnce(Poll) -> Fut,
    Fut: Future<Output = Result<Poll, AppError>>,
{
    Pipeline::start("change poll", raw_id)
        .step("resolve poll id", |raw| async move {
            parse_id(raw).map_err(|e| AppError::NotChangePoll(e.to_string()))
        })
        .await
        .step("load poll", |id| async move { services.find_poll_by_id(id).await.map_err(AppError::from) })
        .await
        .step("check not published", |poll| async move { ensure_unpublished(poll) })
        .await
        .step("check ownership", |poll| async move { ensure_owner(poll, caller) })
        .await
        .step("effective change", change)
        .await
        .step("persist poll", |poll| async move { services.save_poll(poll).await.map_err(AppError::from) })
        .await
        .finish()
}

pub async fn add_option(
    services: &Services,
    caller: &Caller,
    raw_id: &str,
    data: OptionData,
) -> Result<Poll, AppError> {
    change_poll(services, caller, raw_id, |mut poll| async move {
        // votes are counted by content, so it must be unique within the poll
        if poll.options.iter().any(|option| option.content == data.value) {
            return Err(AppError::Conflict(duplicate_option(&data.value)));
        }
        let option = services
            .save_poll_option(PollOption {
                id: services.ids.next_id(),
                poll_id: poll.id,
                content: data.value,
            })
            .await?;
        poll.options.push(option);
        Ok::<_, AppError>(poll)
    })
    .await
}

pub async fn remove_option(
    services: &Services,
    caller: &Caller,
    raw_id: &str,
    data: OptionData,
) -> Result<Poll, AppError> {
    change_poll(services, caller, raw_id, |mut poll| async move {
        let option_id = parse_id(&data.value).map_err(|e| AppError::InvalidInput(e.to_string()))?;
        services.delete_poll_option(option_id).await?;
        poll.options.retain(|option| option.id != option_id);
        Ok::<_, AppError>(poll)
    })
    .await
}

pub async fn publish(services: &Services, caller: &Caller, raw_id: &str) -> Result<Poll, AppError> {
    change_poll(services, caller, raw_id, |mut poll| async move {
        info!(id = %poll.id, "Publishing poll");
        poll.published = true;
        Ok(poll)
    })
    .await
}

pub async fn get_poll(services: &Services, raw_id: &str) -> Result<Poll, AppError> {
    Pipeline::start("get poll", raw_id)
        .step("resolve poll id", |raw| async move { resolve_poll_id(raw) })
        .await
        .step("load poll", |id| async move { services.find_poll_by_id(id).await.map_err(AppError::from) })
        .await
        .finish()
}

pub async fn get_polls(services: &Services) -> Result<Vec<Poll>, AppError> {
    Ok(services.find_polls(None).await?)
}

pub async fn get_polls_mine(services: &Services, caller: &Caller) -> Result<Vec<Poll>, AppError> {
    Ok(services.find_polls(Some(caller.logged_user_id())).await?)
}

/// Path id for reads and votes; a bad id is invalid input.
pub fn resolve_poll_id(raw: &str) -> Result<PollId, AppError> {
    parse_id(raw).map_err(|e| AppError::InvalidInput(e.to_string()))
}
