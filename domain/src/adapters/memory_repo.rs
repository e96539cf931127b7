use std::sync::{Mutex, MutexGuard};

use crate::{CoreError, Exercise, User, UserId, UserRepository, Username};

/// Simple in-memory repository for tests and local runs. A single mutex
/// guards the user list, so each call sees and updates one consistent
/// snapshot.
pub struct InMemoryRepo {
    // Vec keeps creation order for `list`.
    inner: Mutex<Vec<User>>,
}

impl InMemoryRepo {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Vec::new()),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<User>>, CoreError> {
        self.inner
            .lock()
            .map_err(|_| CoreError::Repository("mutex poisoned".into()))
    }
}

impl Default for InMemoryRepo {
    fn default() -> Self {
        Self::new()
    }
}

impl UserRepository for InMemoryRepo {
    fn get(&self, id: &UserId) -> Result<Option<User>, CoreError> {
        let users = self.lock()?;
        Ok(users.iter().find(|u| &u.id == id).cloned())
    }

    fn find_by_username(&self, username: &Username) -> Result<Option<User>, CoreError> {
        let users = self.lock()?;
        Ok(users.iter().find(|u| &u.username == username).cloned())
    }

    fn insert(&self, user: User) -> Result<(), CoreError> {
        let mut users = self.lock()?;
        if users
            .iter()
            .any(|u| u.username == user.username || u.id == user.id)
        {
            return Err(CoreError::AlreadyExists);
        }
        users.push(user);
        Ok(())
    }

    fn push_exercise(&self, id: &UserId, exercise: Exercise) -> Result<Option<User>, CoreError> {
        let mut users = self.lock()?;
        match users.iter_mut().find(|u| &u.id == id) {
            Some(user) => {
                user.exercises.push(exercise);
                Ok(Some(user.clone()))
            }
            None => Ok(None),
        }
    }

    fn list(&self) -> Result<Vec<User>, CoreError> {
        Ok(self.lock()?.clone())
    }
}
