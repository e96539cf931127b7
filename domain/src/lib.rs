//! Domain library for the exercise tracker.
//!
//! Holds the domain types, ports (traits), and error definitions. The only
//! crates pulled in are `serde` (so adapters can embed exercises as documents)
//! and `chrono` for calendar dates. Keep adapters and IO concerns out of this
//! crate.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Opaque identifier of a stored user.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UserId(String);

impl UserId {
    pub fn new<S: Into<String>>(s: S) -> Result<Self, CoreError> {
        let val = s.into();
        if val.is_empty() {
            return Err(CoreError::Invalid("user id is mandatory".into()));
        }
        Ok(Self(val))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Unique, non-empty user name.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Username(String);

impl Username {
    pub fn new<S: Into<String>>(s: S) -> Result<Self, CoreError> {
        let val = s.into();
        if val.is_empty() {
            return Err(CoreError::Invalid(validate::required_message("username")));
        }
        Ok(Self(val))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// One logged exercise. Embedded in exactly one [`User`] and never mutated
/// after it has been appended.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    pub description: String,
    pub duration: f64,
    pub date: NaiveDate,
}

/// Stored user document with its embedded exercise log.
#[derive(Clone, Debug, PartialEq)]
pub struct User {
    pub id: UserId,
    pub username: Username,
    /// Append order is log order.
    pub exercises: Vec<Exercise>,
}

impl User {
    /// Create a user with an empty exercise log.
    pub fn new(id: UserId, username: Username) -> Self {
        Self {
            id,
            username,
            exercises: Vec::new(),
        }
    }
}

/// Raw input for appending an exercise, exactly as received from a client.
///
/// Every field is optional here; [`validate::validate_new_exercise`] decides
/// what is missing or malformed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NewExercise {
    pub user_id: Option<String>,
    pub description: Option<String>,
    pub duration: Option<String>,
    pub date: Option<String>,
}

/// Outcome of a successful append.
#[derive(Clone, Debug, PartialEq)]
pub struct ExerciseAdded {
    pub user_id: UserId,
    pub username: Username,
    pub exercise: Exercise,
}

/// Raw log query parameters.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LogQuery {
    pub user_id: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub limit: Option<String>,
}

/// Filtered exercise log for one user.
#[derive(Clone, Debug, PartialEq)]
pub struct ExerciseLog {
    pub user_id: UserId,
    pub log: Vec<Exercise>,
}

/// Source of "today" so default dates are testable.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Generator of opaque user identifiers.
pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> Result<UserId, CoreError>;
}

/// Repository port for user documents.
pub trait UserRepository: Send + Sync {
    fn get(&self, id: &UserId) -> Result<Option<User>, CoreError>;
    fn find_by_username(&self, username: &Username) -> Result<Option<User>, CoreError>;
    /// Persist a new user. Fails with `AlreadyExists` if the username is taken.
    fn insert(&self, user: User) -> Result<(), CoreError>;
    /// Atomically append an exercise to one user's log and return the updated
    /// document, or `None` when no user has this id.
    fn push_exercise(&self, id: &UserId, exercise: Exercise) -> Result<Option<User>, CoreError>;
    /// All users in creation order.
    fn list(&self) -> Result<Vec<User>, CoreError>;
}

impl<T: UserRepository + ?Sized> UserRepository for Arc<T> {
    fn get(&self, id: &UserId) -> Result<Option<User>, CoreError> {
        (**self).get(id)
    }

    fn find_by_username(&self, username: &Username) -> Result<Option<User>, CoreError> {
        (**self).find_by_username(username)
    }

    fn insert(&self, user: User) -> Result<(), CoreError> {
        (**self).insert(user)
    }

    fn push_exercise(&self, id: &UserId, exercise: Exercise) -> Result<Option<User>, CoreError> {
        (**self).push_exercise(id, exercise)
    }

    fn list(&self) -> Result<Vec<User>, CoreError> {
        (**self).list()
    }
}

/// Core domain errors (no external error crates to keep deps small).
#[derive(Debug)]
pub enum CoreError {
    /// A required field is missing or malformed. Carries the client message.
    Invalid(String),
    AlreadyExists,
    NotFound,
    Repository(String),
}

impl Display for CoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CoreError::Invalid(msg) => write!(f, "{}", msg),
            CoreError::AlreadyExists => write!(f, "Username already taken"),
            CoreError::NotFound => write!(f, "user not found"),
            CoreError::Repository(msg) => write!(f, "repository error: {}", msg),
        }
    }
}

impl Error for CoreError {}

pub mod adapters;
pub mod ids;
pub mod log_filter;
pub mod service;
pub mod validate;
