// src/ids.rs
use std::sync::atomic::{AtomicU64, Ordering};

use uuid::Uuid;

/// Source of primary keys for every entity.
pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> Uuid;
}

/// Time-ordered UUID v7, so ids sort by creation.
#[derive(Debug, Default)]
pub struct SortableIds;

impl IdGenerator for SortableIds {
    fn next_id(&self) -> Uuid {
        Uuid::now_v7()
    }
}

/// Deterministic ids (1, 2, 3, ...) for tests.
#[derive(Debug, Default)]
pub struct SequentialIds {
    next: AtomicU64,
}

impl SequentialIds {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&self) -> Uuid {
        let n = self.next.fetch_add(1, Ordering::SeqCst) + 1;
        Uuid::from_u128(n as u128)
    }
}

/// Parse a path or payload supplied identifier.
pub fn parse_id(raw: &str) -> Result<Uuid, uuid::Error> {
    Uuid::parse_str(raw.trim())
}
