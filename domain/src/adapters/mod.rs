//! Test-only adapters that live inside the domain crate for convenience.
//!
//! These are intended for unit testing and local runs with
//! `DATABASE_URL=memory://`. The file-backed store lives in its own crate.

pub mod memory_repo;
