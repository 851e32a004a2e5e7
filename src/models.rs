// models.rs
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type UserId = Uuid;
pub type SessionId = Uuid;
pub type PollId = Uuid;
pub type PollOptionId = Uuid;
pub type PollVoteId = Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: UserId,
    pub login: String,
    pub name: String,
    /// Hex digest of the password, empty for anonymous visitors.
    #[serde(skip_serializing)]
    pub password: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn is_registered(&self) -> bool {
        !self.password.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Session {
    pub id: SessionId,
    pub user_id: UserId,
    pub registered_user: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Poll {
    pub id: PollId,
    pub name: String,
    pub owner: UserId,
    pub published: bool,
    pub created_at: DateTime<Utc>,
    #[sqlx(skip)]
    pub options: Vec<PollOption>,
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct PollOption {
    pub id: PollOptionId,
    pub poll_id: PollId,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct PollVote {
    pub id: PollVoteId,
    pub poll_id: PollId,
    pub user_id: UserId,
    pub chosen_option: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCreationData {
    #[serde(default)]
    pub login: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub password_confirm: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginData {
    #[serde(default)]
    pub login: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct CreatePollData {
    #[serde(default)]
    pub name: String,
}

/// Body of add-option, remove-option and vote requests.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct OptionData {
    #[serde(default)]
    pub value: String,
}

/// Percentages per option plus a `"total"` entry.
pub type VoteCounting = BTreeMap<String, f64>;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PollVoteResult {
    pub vote_id: PollVoteId,
    pub vote_counting: VoteCounting,
}
