#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;

use poll_backend::error::StoreError;
use poll_backend::guard::Caller;
use poll_backend::ids::SequentialIds;
use poll_backend::models::{Poll, PollOption, User};
use poll_backend::store::{MemoryStore, Query, Record, Store};
use poll_backend::users::hash_password;
use poll_backend::Services;

pub fn services() -> Services {
    Services::in_memory(Arc::new(SequentialIds::new()))
}

pub async fn registered(services: &Services, login: &str) -> Caller {
    let user = services
        .save_user(User {
            id: services.ids.next_id(),
            login: login.to_string(),
            name: login.to_string(),
            password: hash_password("summer"),
            created_at: Utc::now(),
        })
        .await
        .unwrap();
    caller_for(services, user).await
}

pub async fn anonymous(services: &Services) -> Caller {
    let user = services.create_anon_user().await.unwrap();
    caller_for(services, user).await
}

async fn caller_for(services: &Services, user: User) -> Caller {
    let session = services.create_session(&user).await.unwrap();
    Caller { session, user }
}

pub async fn poll_with_options(services: &Services, owner: &Caller, options: &[&str]) -> Poll {
    let mut poll = services
        .save_poll(Poll {
            id: services.ids.next_id(),
            name: "Favourite colour".to_string(),
            owner: owner.logged_user_id(),
            published: false,
            created_at: Utc::now(),
            options: Vec::new(),
        })
        .await
        .unwrap();

    for content in options {
        let option = services
            .save_poll_option(PollOption {
                id: services.ids.next_id(),
                poll_id: poll.id,
                content: content.to_string(),
            })
            .await
            .unwrap();
        poll.options.push(option);
    }

    poll
}

/// Memory store that remembers which calls reached it.
pub struct RecordingStore<R> {
    inner: MemoryStore<R>,
    saves: AtomicUsize,
    counts: Mutex<Vec<Vec<&'static str>>>,
    count_error: Option<&'static str>,
}

impl<R: Record> RecordingStore<R> {
    pub fn new() -> Self {
        Self {
            inner: MemoryStore::new(),
            saves: AtomicUsize::new(0),
            counts: Mutex::new(Vec::new()),
            count_error: None,
        }
    }

    /// Like `new`, but every count fails with `message`.
    pub fn failing_counts(message: &'static str) -> Self {
        Self {
            count_error: Some(message),
            ..Self::new()
        }
    }

    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Count queries that filtered on `column`.
    pub fn counts_on(&self, column: &str) -> usize {
        self.counts
            .lock()
            .unwrap()
            .iter()
            .filter(|columns| columns.iter().any(|c| *c == column))
            .count()
    }
}

#[async_trait]
impl<R: Record> Store<R> for RecordingStore<R> {
    async fn save(&self, record: &R) -> Result<bool, StoreError> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        self.inner.save(record).await
    }

    async fn find_one(&self, query: &Query<R>) -> Result<R, StoreError> {
        self.inner.find_one(query).await
    }

    async fn find_all(&self, query: &Query<R>) -> Result<Vec<R>, StoreError> {
        self.inner.find_all(query).await
    }

    async fn delete(&self, record: &R) -> Result<(), StoreError> {
        self.inner.delete(record).await
    }

    async fn count(&self, query: &Query<R>) -> Result<i64, StoreError> {
        let columns = query.filters().iter().map(|(column, _)| *column).collect();
        self.counts.lock().unwrap().push(columns);
        if let Some(message) = self.count_error {
            return Err(StoreError::NotFound(message.to_string()));
        }
        self.inner.count(query).await
    }
}

/// Store where every call fails, either as a missing row or as a database error.
pub struct FailingStore {
    message: &'static str,
    database: bool,
}

impl FailingStore {
    pub fn not_found(message: &'static str) -> Self {
        Self {
            message,
            database: false,
        }
    }

    pub fn database(message: &'static str) -> Self {
        Self {
            message,
            database: true,
        }
    }

    fn error(&self) -> StoreError {
        if self.database {
            StoreError::Database(sqlx::Error::Protocol(self.message.to_string()))
        } else {
            StoreError::NotFound(self.message.to_string())
        }
    }
}

#[async_trait]
impl<R: Record> Store<R> for FailingStore {
    async fn save(&self, _record: &R) -> Result<bool, StoreError> {
        Err(self.error())
    }

    async fn find_one(&self, _query: &Query<R>) -> Result<R, StoreError> {
        Err(self.error())
    }

    async fn find_all(&self, _query: &Query<R>) -> Result<Vec<R>, StoreError> {
        Err(self.error())
    }

    async fn delete(&self, _record: &R) -> Result<(), StoreError> {
        Err(self.error())
    }

    async fn count(&self, _query: &Query<R>) -> Result<i64, StoreError> {
        Err(self.error())
    }
}
