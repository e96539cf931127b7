//! Date-range and limit filtering over an exercise log.

use chrono::NaiveDate;

use crate::validate::parse_date;
use crate::Exercise;

/// Inclusive date window plus an optional result cap. An absent bound is
/// unbounded on that side.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LogFilter {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub limit: Option<usize>,
}

impl LogFilter {
    /// Build a filter from raw query values. Unparseable dates fall back to
    /// unbounded; `limit` only applies when it is a non-negative integer.
    pub fn parse(from: Option<&str>, to: Option<&str>, limit: Option<&str>) -> Self {
        Self {
            from: from.and_then(parse_date),
            to: to.and_then(parse_date),
            limit: limit.and_then(|l| l.trim().parse::<usize>().ok()),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from.map_or(true, |from| date >= from) && self.to.map_or(true, |to| date <= to)
    }

    /// Keep matching entries in log order, then truncate to `limit`.
    pub fn apply(&self, exercises: &[Exercise]) -> Vec<Exercise> {
        exercises
            .iter()
            .filter(|ex| self.contains(ex.date))
            .take(self.limit.unwrap_or(usize::MAX))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ex(desc: &str, y: i32, m: u32, d: u32) -> Exercise {
        Exercise {
            description: desc.to_string(),
            duration: 10.0,
            date: NaiveDate::from_ymd_opt(y, m, d).unwrap(),
        }
    }

    fn descriptions(v: &[Exercise]) -> Vec<&str> {
        v.iter().map(|e| e.description.as_str()).collect()
    }

    #[test]
    fn bounds_are_inclusive() {
        let log = vec![
            ex("before", 2020, 1, 1),
            ex("start", 2020, 1, 2),
            ex("middle", 2020, 1, 3),
            ex("end", 2020, 1, 4),
            ex("after", 2020, 1, 5),
        ];
        let f = LogFilter::parse(Some("2020-01-02"), Some("2020-01-04"), None);
        assert_eq!(descriptions(&f.apply(&log)), vec!["start", "middle", "end"]);
    }

    #[test]
    fn missing_or_bad_bounds_are_unbounded() {
        let log = vec![ex("a", 1999, 12, 31), ex("b", 2030, 6, 1)];
        let f = LogFilter::parse(None, Some("not a date"), None);
        assert_eq!(f, LogFilter::default());
        assert_eq!(f.apply(&log).len(), 2);

        let f = LogFilter::parse(Some("2000-01-01"), None, None);
        assert_eq!(descriptions(&f.apply(&log)), vec!["b"]);
    }

    #[test]
    fn limit_truncates_from_the_start() {
        let log: Vec<_> = (1..=5).map(|d| ex(&format!("e{d}"), 2020, 1, d)).collect();
        let f = LogFilter::parse(None, None, Some("2"));
        assert_eq!(descriptions(&f.apply(&log)), vec!["e1", "e2"]);

        let f = LogFilter::parse(None, None, Some("0"));
        assert!(f.apply(&log).is_empty());
    }

    #[test]
    fn invalid_limit_is_ignored() {
        for raw in ["-1", "abc", "", "2.5"] {
            let f = LogFilter::parse(None, None, Some(raw));
            assert_eq!(f.limit, None, "limit {raw:?}");
        }
    }

    #[test]
    fn inverted_window_matches_nothing() {
        let log = vec![ex("a", 2020, 1, 3)];
        let f = LogFilter::parse(Some("2020-01-05"), Some("2020-01-01"), None);
        assert!(f.apply(&log).is_empty());
    }
}
