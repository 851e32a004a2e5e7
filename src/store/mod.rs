// src/store/mod.rs
//! Persistence port.
//!
//! Each entity is stored through a [`Store`] and filtered with a [`Query`]
//! built from per-entity helpers, e.g. `Query::<PollOption>::all().by_owner(id)`.
//! [`MemoryStore`] and [`PgStore`] are the two implementations.

mod memory;
mod postgres;

use std::marker::PhantomData;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{Poll, PollOption, PollVote, Session, User};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// A column value, used both for filters and for writing rows.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Uuid(Uuid),
    Text(String),
    Bool(bool),
    Timestamp(DateTime<Utc>),
}

impl From<Uuid> for Value {
    fn from(v: Uuid) -> Self {
        Value::Uuid(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Timestamp(v)
    }
}

pub trait Record: Clone + Send + Sync + Unpin + 'static {
    const TABLE: &'static str;
    /// Used in not-found messages.
    const NAME: &'static str;

    fn id(&self) -> Uuid;

    /// Every persisted column, `id` first.
    fn columns(&self) -> Vec<(&'static str, Value)>;

    fn column(&self, name: &str) -> Option<Value> {
        self.columns()
            .into_iter()
            .find(|(column, _)| *column == name)
            .map(|(_, value)| value)
    }
}

/// Equality filters joined with AND. An empty query matches everything.
#[derive(Debug)]
pub struct Query<R> {
    filters: Vec<(&'static str, Value)>,
    _record: PhantomData<fn() -> R>,
}

impl<R: Record> Query<R> {
    pub fn all() -> Self {
        Self {
            filters: Vec::new(),
            _record: PhantomData,
        }
    }

    pub fn by_id(id: Uuid) -> Self {
        Self::all().filter("id", id)
    }

    fn filter(mut self, column: &'static str, value: impl Into<Value>) -> Self {
        self.filters.push((column, value.into()));
        self
    }

    pub fn filters(&self) -> &[(&'static str, Value)] {
        &self.filters
    }

    pub fn matches(&self, record: &R) -> bool {
        self.filters
            .iter()
            .all(|(column, value)| record.column(column).as_ref() == Some(value))
    }
}

impl Query<User> {
    pub fn by_login(self, login: &str) -> Self {
        self.filter("login", login)
    }

    pub fn by_password(self, password: &str) -> Self {
        self.filter("password", password)
    }
}

impl Query<Poll> {
    pub fn by_owner(self, owner: Uuid) -> Self {
        self.filter("owner", owner)
    }
}

impl Query<PollOption> {
    pub fn by_owner(self, poll_id: Uuid) -> Self {
        self.filter("poll_id", poll_id)
    }

    pub fn by_content(self, content: &str) -> Self {
        self.filter("content", content)
    }
}

impl Query<PollVote> {
    pub fn by_poll(self, poll_id: Uuid) -> Self {
        self.filter("poll_id", poll_id)
    }

    pub fn by_user(self, user_id: Uuid) -> Self {
        self.filter("user_id", user_id)
    }

    pub fn by_chosen_option(self, option: &str) -> Self {
        self.filter("chosen_option", option)
    }
}

#[async_trait]
pub trait Store<R: Record>: Send + Sync {
    /// Insert or replace by id. Returns `true` when an existing row was updated.
    async fn save(&self, record: &R) -> Result<bool, StoreError>;

    async fn find_one(&self, query: &Query<R>) -> Result<R, StoreError>;

    async fn find_all(&self, query: &Query<R>) -> Result<Vec<R>, StoreError>;

    async fn delete(&self, record: &R) -> Result<(), StoreError>;

    async fn count(&self, query: &Query<R>) -> Result<i64, StoreError>;
}

impl Record for User {
    const TABLE: &'static str = "poll_user";
    const NAME: &'static str = "user";

    fn id(&self) -> Uuid {
        self.id
    }

    fn columns(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("id", self.id.into()),
            ("login", self.login.clone().into()),
            ("name", self.name.clone().into()),
            ("password", self.password.clone().into()),
            ("created_at", self.created_at.into()),
        ]
    }
}

impl Record for Session {
    const TABLE: &'static str = "poll_session";
    const NAME: &'static str = "session";

    fn id(&self) -> Uuid {
        self.id
    }

    fn columns(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("id", self.id.into()),
            ("user_id", self.user_id.into()),
            ("registered_user", self.registered_user.into()),
            ("created_at", self.created_at.into()),
        ]
    }
}

impl Record for Poll {
    const TABLE: &'static str = "poll";
    const NAME: &'static str = "poll";

    fn id(&self) -> Uuid {
        self.id
    }

    // options live in their own table
    fn columns(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("id", self.id.into()),
            ("name", self.name.clone().into()),
            ("owner", self.owner.into()),
            ("published", self.published.into()),
            ("created_at", self.created_at.into()),
        ]
    }
}

impl Record for PollOption {
    const TABLE: &'static str = "poll_option";
    const NAME: &'static str = "poll option";

    fn id(&self) -> Uuid {
        self.id
    }

    fn columns(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("id", self.id.into()),
            ("poll_id", self.poll_id.into()),
            ("content", self.content.clone().into()),
        ]
    }
}

impl Record for PollVote {
    const TABLE: &'static str = "poll_vote";
    const NAME: &'static str = "poll vote";

    fn id(&self) -> Uuid {
        self.id
    }

    fn columns(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("id", self.id.into()),
            ("poll_id", self.poll_id.into()),
            ("user_id", self.user_id.into()),
            ("chosen_option", self.chosen_option.clone().into()),
            ("created_at", self.created_at.into()),
        ]
    }
}
