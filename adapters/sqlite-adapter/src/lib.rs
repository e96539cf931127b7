//! sqlite-adapter: SQLite implementation of the UserRepository port.
//!
//! Purpose
//! - Provide a lightweight, file-based document store so the service runs
//!   without an external database.
//! - Implements the `UserRepository` trait from the `domain` crate.
//!
//! Notes
//! - Uses `rusqlite` with the `bundled` feature for portability.
//! - One row per user. Exercises are embedded in the row as a JSON array, so
//!   appending is a single-row update inside one transaction.
//! - `username` carries a UNIQUE constraint; violations map to
//!   `CoreError::AlreadyExists`.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use domain::{CoreError, Exercise, User, UserId, UserRepository, Username};
use rusqlite::{params, Connection, OptionalExtension};

const SELECT_USER: &str = "SELECT id, username, exercises FROM users";

/// SQLite-backed user repository.
pub struct SqliteRepo {
    conn: Mutex<Connection>,
}

impl SqliteRepo {
    /// Open (or create) a SQLite database at the given path and ensure schema.
    /// Missing parent directories are created.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, CoreError> {
        if let Some(dir) = path.as_ref().parent() {
            if !dir.as_os_str().is_empty() {
                std::fs::create_dir_all(dir).map_err(map_sqerr)?;
            }
        }
        let conn = Connection::open(path).map_err(map_sqerr)?;
        init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open a private in-memory database. Handy for tests.
    pub fn in_memory() -> Result<Self, CoreError> {
        let conn = Connection::open_in_memory().map_err(map_sqerr)?;
        init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, CoreError> {
        self.conn
            .lock()
            .map_err(|_| CoreError::Repository("mutex poisoned".into()))
    }
}

fn init_schema(conn: &Connection) -> Result<(), CoreError> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            seq INTEGER PRIMARY KEY AUTOINCREMENT,
            id TEXT NOT NULL UNIQUE,
            username TEXT NOT NULL UNIQUE,
            exercises TEXT NOT NULL DEFAULT '[]'
        );
        "#,
    )
    .map_err(map_sqerr)
}

fn map_sqerr<E: std::fmt::Display>(e: E) -> CoreError {
    CoreError::Repository(format!("sqlite error: {e}"))
}

fn is_constraint_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _) if err.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

fn encode_exercises(exercises: &[Exercise]) -> Result<String, CoreError> {
    serde_json::to_string(exercises)
        .map_err(|e| CoreError::Repository(format!("encode exercises: {e}")))
}

fn decode_exercises(raw: &str) -> Result<Vec<Exercise>, CoreError> {
    serde_json::from_str(raw).map_err(|e| CoreError::Repository(format!("bad exercises in db: {e}")))
}

/// Raw column values of a `users` row.
type UserRow = (String, String, String);

fn read_row(row: &rusqlite::Row) -> rusqlite::Result<UserRow> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?))
}

fn row_to_user((id, username, exercises): UserRow) -> Result<User, CoreError> {
    let id = UserId::new(id).map_err(|e| CoreError::Repository(format!("bad id in db: {e}")))?;
    let username = Username::new(username)
        .map_err(|e| CoreError::Repository(format!("bad username in db: {e}")))?;
    Ok(User {
        id,
        username,
        exercises: decode_exercises(&exercises)?,
    })
}

fn query_one(conn: &Connection, sql: &str, key: &str) -> Result<Option<User>, CoreError> {
    let row = conn
        .query_row(sql, params![key], read_row)
        .optional()
        .map_err(map_sqerr)?;
    row.map(row_to_user).transpose()
}

impl UserRepository for SqliteRepo {
    fn get(&self, id: &UserId) -> Result<Option<User>, CoreError> {
        let conn = self.lock()?;
        query_one(&conn, &format!("{SELECT_USER} WHERE id = ?1"), id.as_str())
    }

    fn find_by_username(&self, username: &Username) -> Result<Option<User>, CoreError> {
        let conn = self.lock()?;
        query_one(
            &conn,
            &format!("{SELECT_USER} WHERE username = ?1"),
            username.as_str(),
        )
    }

    fn insert(&self, user: User) -> Result<(), CoreError> {
        let conn = self.lock()?;
        let exercises = encode_exercises(&user.exercises)?;
        match conn.execute(
            "INSERT INTO users(id, username, exercises) VALUES (?1, ?2, ?3)",
            params![user.id.as_str(), user.username.as_str(), exercises],
        ) {
            Ok(_) => Ok(()),
            Err(e) if is_constraint_violation(&e) => Err(CoreError::AlreadyExists),
            Err(e) => Err(map_sqerr(e)),
        }
    }

    fn push_exercise(&self, id: &UserId, exercise: Exercise) -> Result<Option<User>, CoreError> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction().map_err(map_sqerr)?;
        let Some(mut user) = query_one(&tx, &format!("{SELECT_USER} WHERE id = ?1"), id.as_str())?
        else {
            return Ok(None);
        };
        user.exercises.push(exercise);
        tx.execute(
            "UPDATE users SET exercises = ?1 WHERE id = ?2",
            params![encode_exercises(&user.exercises)?, id.as_str()],
        )
        .map_err(map_sqerr)?;
        tx.commit().map_err(map_sqerr)?;
        Ok(Some(user))
    }

    fn list(&self) -> Result<Vec<User>, CoreError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(&format!("{SELECT_USER} ORDER BY seq"))
            .map_err(map_sqerr)?;
        let rows = stmt.query_map([], read_row).map_err(map_sqerr)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row_to_user(row.map_err(map_sqerr)?)?);
        }
        Ok(out)
    }
}
