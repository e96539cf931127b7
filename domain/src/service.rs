use crate::log_filter::LogFilter;
use crate::validate::{validate_new_exercise, validate_username};
use crate::{
    Clock, CoreError, ExerciseAdded, ExerciseLog, IdGenerator, LogQuery, NewExercise, User,
    UserId, UserRepository,
};

/// Application service implementing the exercise tracker operations.
///
/// Generic over repository, id generator, and clock so the domain stays
/// testable without external dependencies. Every operation validates its
/// input completely before it touches the repository.
pub struct ExerciseService<R: UserRepository, G: IdGenerator, C: Clock> {
    repo: R,
    ids: G,
    clock: C,
}

impl<R: UserRepository, G: IdGenerator, C: Clock> ExerciseService<R, G, C> {
    pub fn new(repo: R, ids: G, clock: C) -> Self {
        Self { repo, ids, clock }
    }

    /// Create a user with an empty log. Fails with `AlreadyExists` if the
    /// username is taken.
    pub fn create_user(&self, username: Option<&str>) -> Result<User, CoreError> {
        let username = validate_username(username)?;
        if self.repo.find_by_username(&username)?.is_some() {
            return Err(CoreError::AlreadyExists);
        }
        let user = User::new(self.ids.next_id()?, username);
        // The store enforces uniqueness too, covering concurrent creates.
        self.repo.insert(user.clone())?;
        Ok(user)
    }

    /// Append an exercise to a user's log.
    pub fn add_exercise(&self, input: &NewExercise) -> Result<ExerciseAdded, CoreError> {
        let (user_id, exercise) = validate_new_exercise(input, self.clock.today())?;
        let user = self
            .repo
            .push_exercise(&user_id, exercise)?
            .ok_or(CoreError::NotFound)?;
        let User {
            username,
            mut exercises,
            ..
        } = user;
        let exercise = exercises
            .pop()
            .ok_or_else(|| CoreError::Repository("appended exercise missing".into()))?;
        Ok(ExerciseAdded {
            user_id,
            username,
            exercise,
        })
    }

    /// Return a user's log filtered by date window and limit.
    pub fn query_log(&self, query: &LogQuery) -> Result<ExerciseLog, CoreError> {
        let user_id = UserId::new(query.user_id.clone().unwrap_or_default())?;
        let filter = LogFilter::parse(
            query.from.as_deref(),
            query.to.as_deref(),
            query.limit.as_deref(),
        );
        let user = self.repo.get(&user_id)?.ok_or(CoreError::NotFound)?;
        Ok(ExerciseLog {
            log: filter.apply(&user.exercises),
            user_id,
        })
    }

    /// Every stored user, exercises included, in creation order.
    pub fn list_users(&self) -> Result<Vec<User>, CoreError> {
        self.repo.list()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory_repo::InMemoryRepo;
    use crate::ids::SequentialIdGenerator;
    use chrono::NaiveDate;
    use std::sync::Arc;

    struct TestClock;
    impl Clock for TestClock {
        fn today(&self) -> NaiveDate {
            NaiveDate::from_ymd_opt(2021, 3, 4).unwrap()
        }
    }

    type Svc = ExerciseService<Arc<InMemoryRepo>, SequentialIdGenerator, TestClock>;

    fn svc() -> (Svc, Arc<InMemoryRepo>) {
        let repo = Arc::new(InMemoryRepo::new());
        let svc = ExerciseService::new(repo.clone(), SequentialIdGenerator::new(1), TestClock);
        (svc, repo)
    }

    fn add(svc: &Svc, id: &UserId, desc: &str, date: Option<&str>) -> Result<ExerciseAdded, CoreError> {
        svc.add_exercise(&NewExercise {
            user_id: Some(id.as_str().to_string()),
            description: Some(desc.to_string()),
            duration: Some("30".into()),
            date: date.map(str::to_string),
        })
    }

    #[test]
    fn duplicate_username_is_rejected() {
        let (svc, repo) = svc();
        svc.create_user(Some("ann")).unwrap();
        let err = svc.create_user(Some("ann")).unwrap_err();
        assert!(matches!(err, CoreError::AlreadyExists));
        let anns = repo
            .list()
            .unwrap()
            .into_iter()
            .filter(|u| u.username.as_str() == "ann")
            .count();
        assert_eq!(anns, 1);
    }

    #[test]
    fn add_defaults_date_and_appends_at_end() {
        let (svc, repo) = svc();
        let user = svc.create_user(Some("ann")).unwrap();
        add(&svc, &user.id, "first", Some("2020-01-01")).unwrap();

        let added = add(&svc, &user.id, "run", None).unwrap();
        assert_eq!(added.exercise.date, TestClock.today());
        assert_eq!(added.username.as_str(), "ann");
        assert_eq!(added.user_id, user.id);

        let stored = repo.get(&user.id).unwrap().unwrap();
        assert_eq!(stored.exercises.len(), 2);
        assert_eq!(stored.exercises[1].description, "run");
    }

    #[test]
    fn add_with_missing_duration_writes_nothing() {
        let (svc, repo) = svc();
        let user = svc.create_user(Some("ann")).unwrap();
        let err = svc
            .add_exercise(&NewExercise {
                user_id: Some(user.id.as_str().to_string()),
                description: Some("run".into()),
                duration: None,
                date: None,
            })
            .unwrap_err();
        assert!(matches!(err, CoreError::Invalid(_)));
        assert!(repo.get(&user.id).unwrap().unwrap().exercises.is_empty());
    }

    #[test]
    fn add_for_unknown_user_is_not_found() {
        let (svc, repo) = svc();
        let ghost = UserId::new("ffffffffffffffffffffffff").unwrap();
        let err = add(&svc, &ghost, "run", None).unwrap_err();
        assert!(matches!(err, CoreError::NotFound));
        assert!(repo.list().unwrap().is_empty());
    }

    #[test]
    fn query_log_filters_and_limits() {
        let (svc, _repo) = svc();
        let user = svc.create_user(Some("ann")).unwrap();
        for d in 1..=5 {
            add(&svc, &user.id, &format!("e{d}"), Some(&format!("2020-01-0{d}"))).unwrap();
        }

        let log = svc
            .query_log(&LogQuery {
                user_id: Some(user.id.as_str().to_string()),
                limit: Some("2".into()),
                ..LogQuery::default()
            })
            .unwrap();
        let got: Vec<_> = log.log.iter().map(|e| e.description.as_str()).collect();
        assert_eq!(got, vec!["e1", "e2"]);

        let log = svc
            .query_log(&LogQuery {
                user_id: Some(user.id.as_str().to_string()),
                from: Some("2020-01-02".into()),
                to: Some("2020-01-04".into()),
                limit: None,
            })
            .unwrap();
        let got: Vec<_> = log.log.iter().map(|e| e.description.as_str()).collect();
        assert_eq!(got, vec!["e2", "e3", "e4"]);
    }

    #[test]
    fn query_log_requires_known_user() {
        let (svc, _repo) = svc();
        let err = svc.query_log(&LogQuery::default()).unwrap_err();
        assert!(matches!(err, CoreError::Invalid(ref m) if m == "user id is mandatory"));

        let err = svc
            .query_log(&LogQuery {
                user_id: Some("nobody".into()),
                ..LogQuery::default()
            })
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound));
    }

    #[test]
    fn list_users_in_creation_order() {
        let (svc, _repo) = svc();
        svc.create_user(Some("b")).unwrap();
        svc.create_user(Some("a")).unwrap();
        let names: Vec<_> = svc
            .list_users()
            .unwrap()
            .into_iter()
            .map(|u| u.username.as_str().to_string())
            .collect();
        assert_eq!(names, vec!["b", "a"]);
    }
}
