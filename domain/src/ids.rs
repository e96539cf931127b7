//! User id generation strategies.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::{CoreError, IdGenerator, UserId};

/// Deterministic generator producing 24-character lowercase hex ids
/// (`000000000000000000000001`, ...). Intended for tests and local demos;
/// the server plugs in a random generator.
#[derive(Debug, Default)]
pub struct SequentialIdGenerator {
    next: AtomicU64,
}

impl SequentialIdGenerator {
    pub fn new(start: u64) -> Self {
        Self {
            next: AtomicU64::new(start),
        }
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn next_id(&self) -> Result<UserId, CoreError> {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        UserId::new(format!("{:024x}", n))
    }
}
