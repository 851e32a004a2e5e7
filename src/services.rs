// services.rs
use std::sync::Arc;

use chrono::Utc;
use sqlx::PgPool;
use tracing::{info, warn};

use crate::error::StoreError;
use crate::ids::{IdGenerator, SortableIds};
use crate::models::{
    Poll, PollId, PollOption, PollOptionId, PollVote, Session, SessionId, User, UserId,
};
use crate::store::{MemoryStore, PgStore, Query, Store};

/// Stores and id generation shared by every request.
pub struct Services {
    pub users: Arc<dyn Store<User>>,
    pub sessions: Arc<dyn Store<Session>>,
    pub polls: Arc<dyn Store<Poll>>,
    pub options: Arc<dyn Store<PollOption>>,
    pub votes: Arc<dyn Store<PollVote>>,
    pub ids: Arc<dyn IdGenerator>,
}

impl Services {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            users: Arc::new(PgStore::<User>::new(pool.clone())),
            sessions: Arc::new(PgStore::<Session>::new(pool.clone())),
            polls: Arc::new(PgStore::<Poll>::new(pool.clone())),
            options: Arc::new(PgStore::<PollOption>::new(pool.clone())),
            votes: Arc::new(PgStore::<PollVote>::new(pool)),
            ids: Arc::new(SortableIds),
        }
    }

    pub fn in_memory(ids: Arc<dyn IdGenerator>) -> Self {
        Self {
            users: Arc::new(MemoryStore::<User>::new()),
            sessions: Arc::new(MemoryStore::<Session>::new()),
            polls: Arc::new(MemoryStore::<Poll>::new()),
            options: Arc::new(MemoryStore::<PollOption>::new()),
            votes: Arc::new(MemoryStore::<PollVote>::new()),
            ids,
        }
    }

    // Users

    pub async fn save_user(&self, user: User) -> Result<User, StoreError> {
        info!(id = %user.id, login = %user.login, "Saving user");
        self.users.save(&user).await?;
        Ok(user)
    }

    pub async fn find_user_by_id(&self, id: UserId) -> Result<User, StoreError> {
        self.users.find_one(&Query::by_id(id)).await
    }

    pub async fn login_in_use(&self, login: &str) -> Result<bool, StoreError> {
        let count = self.users.count(&Query::<User>::all().by_login(login)).await?;
        Ok(count > 0)
    }

    pub async fn find_user_by_login_and_password(
        &self,
        login: &str,
        password_hash: &str,
    ) -> Result<User, StoreError> {
        let query = Query::<User>::all().by_login(login).by_password(password_hash);
        self.users.find_one(&query).await
    }

    pub async fn create_anon_user(&self) -> Result<User, StoreError> {
        let id = self.ids.next_id();
        let name = format!("Anon{id}");

        self.save_user(User {
            id,
            login: name.clone(),
            name,
            password: String::new(),
            created_at: Utc::now(),
        })
        .await
    }

    // Sessions

    pub async fn create_session(&self, user: &User) -> Result<Session, StoreError> {
        let session = Session {
            id: self.ids.next_id(),
            user_id: user.id,
            registered_user: user.is_registered(),
            created_at: Utc::now(),
        };

        info!(id = %session.id, user = %user.id, registered = session.registered_user, "Saving session");
        self.sessions.save(&session).await?;
        Ok(session)
    }

    pub async fn find_session_by_id(&self, id: SessionId) -> Result<Session, StoreError> {
        self.sessions.find_one(&Query::by_id(id)).await
    }

    // Polls

    pub async fn save_poll(&self, poll: Poll) -> Result<Poll, StoreError> {
        info!(id = %poll.id, published = poll.published, "Saving poll");
        self.polls.save(&poll).await?;
        Ok(poll)
    }

    /// Load a poll together with its options.
    pub async fn find_poll_by_id(&self, id: PollId) -> Result<Poll, StoreError> {
        let mut poll = self.polls.find_one(&Query::by_id(id)).await?;
        poll.options = self.find_poll_options(id).await?;
        Ok(poll)
    }

    /// Polls ordered by creation, all of them or only those of `owner`.
    pub async fn find_polls(&self, owner: Option<UserId>) -> Result<Vec<Poll>, StoreError> {
        let query = match owner {
            Some(owner) => Query::<Poll>::all().by_owner(owner),
            None => Query::<Poll>::all(),
        };

        let mut polls = self.polls.find_all(&query).await?;
        for poll in polls.iter_mut() {
            poll.options = self.find_poll_options(poll.id).await?;
        }
        polls.sort_by_key(|poll| poll.created_at);

        Ok(polls)
    }

    // Options

    pub async fn save_poll_option(&self, option: PollOption) -> Result<PollOption, StoreError> {
        info!(id = %option.id, poll = %option.poll_id, content = %option.content, "Adding poll option");
        self.options.save(&option).await?;
        Ok(option)
    }

    /// Look the option up first so a missing id is reported, then delete it.
    pub async fn delete_poll_option(&self, id: PollOptionId) -> Result<(), StoreError> {
        info!(%id, "Removing poll option");
        let option = self.options.find_one(&Query::by_id(id)).await?;
        self.options.delete(&option).await
    }

    pub async fn find_poll_options(&self, poll_id: PollId) -> Result<Vec<PollOption>, StoreError> {
        self.options.find_all(&Query::<PollOption>::all().by_owner(poll_id)).await
    }

    pub async fn exists_option(&self, poll_id: PollId, candidate: &str) -> Result<bool, StoreError> {
        let query = Query::<PollOption>::all().by_owner(poll_id).by_content(candidate);
        let count = self.options.count(&query).await?;
        Ok(count > 0)
    }

    // Votes

    pub async fn poll_already_voted_by_user(
        &self,
        poll_id: PollId,
        user_id: UserId,
    ) -> Result<bool, StoreError> {
        let count = self
            .votes
            .count(&Query::<PollVote>::all().by_poll(poll_id).by_user(user_id))
            .await?;
        Ok(count > 0)
    }

    /// Votes cast for `option`, or `None` when the count could not be read.
    pub async fn votes_for(&self, poll_id: PollId, option: &str) -> Option<i64> {
        let query = Query::<PollVote>::all().by_poll(poll_id).by_chosen_option(option);

        match self.votes.count(&query).await {
            Ok(count) => Some(count),
            Err(e) => {
                warn!(poll = %poll_id, option, error = %e, "Failed to count votes");
                None
            }
        }
    }

    pub async fn save_vote(&self, vote: PollVote) -> Result<PollVote, StoreError> {
        info!(id = %vote.id, poll = %vote.poll_id, user = %vote.user_id, "Registering vote");
        self.votes.save(&vote).await?;
        Ok(vote)
    }
}
