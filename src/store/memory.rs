// src/store/memory.rs
use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use super::{Query, Record, Store};
use crate::error::StoreError;

/// In-process store. Rows keep insertion order.
pub struct MemoryStore<R> {
    rows: RwLock<Vec<R>>,
}

impl<R: Record> MemoryStore<R> {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(Vec::new()),
        }
    }
}

impl<R: Record> Default for MemoryStore<R> {
    fn default() -> Self {
        Self::new()
    }
}

fn not_found<R: Record>() -> StoreError {
    StoreError::NotFound(format!("{} not found", R::NAME))
}

#[async_trait]
impl<R: Record> Store<R> for MemoryStore<R> {
    async fn save(&self, record: &R) -> Result<bool, StoreError> {
        let mut rows = self.rows.write().await;

        match rows.iter_mut().find(|row| row.id() == record.id()) {
            Some(row) => {
                *row = record.clone();
                debug!(table = R::TABLE, id = %record.id(), "row updated");
                Ok(true)
            }
            None => {
                rows.push(record.clone());
                debug!(table = R::TABLE, id = %record.id(), "row inserted");
                Ok(false)
            }
        }
    }

    async fn find_one(&self, query: &Query<R>) -> Result<R, StoreError> {
        let rows = self.rows.read().await;

        rows.iter()
            .find(|row| query.matches(row))
            .cloned()
            .ok_or_else(not_found::<R>)
    }

    async fn find_all(&self, query: &Query<R>) -> Result<Vec<R>, StoreError> {
        let rows = self.rows.read().await;

        Ok(rows.iter().filter(|row| query.matches(row)).cloned().collect())
    }

    async fn delete(&self, record: &R) -> Result<(), StoreError> {
        let mut rows = self.rows.write().await;

        let position = rows
            .iter()
            .position(|row| row.id() == record.id())
            .ok_or_else(not_found::<R>)?;
        rows.remove(position);

        Ok(())
    }

    async fn count(&self, query: &Query<R>) -> Result<i64, StoreError> {
        let rows = self.rows.read().await;

        Ok(rows.iter().filter(|row| query.matches(row)).count() as i64)
    }
}
