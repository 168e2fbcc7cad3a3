//! Daily-active-user bookkeeping
//!
//! The controller reports one activity per successful request. Recording is
//! best effort: a failing recorder is logged by the caller and never turns
//! into a failed response.

use chrono::NaiveDate;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ActivityError {
    #[error("activity store unavailable: {0}")]
    Unavailable(String),
}

/// Sink for "this user did something today" notifications
pub trait UserActivityRecorder: Send + Sync {
    fn report_user_activity(&self, user_id: &str, date: NaiveDate) -> Result<(), ActivityError>;

    /// Distinct users seen on `date`
    fn daily_active_users(&self, date: NaiveDate) -> Result<usize, ActivityError>;

    /// Forgets every day before `date`
    fn prune_before(&self, _date: NaiveDate) -> Result<(), ActivityError> {
        Ok(())
    }
}

/// In-memory recorder keeping the set of users seen per calendar day
#[derive(Debug, Default)]
pub struct DailyActivityLog {
    days: Mutex<HashMap<NaiveDate, HashSet<String>>>,
}

impl DailyActivityLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<NaiveDate, HashSet<String>>>, ActivityError> {
        self.days
            .lock()
            .map_err(|_| ActivityError::Unavailable("activity log lock poisoned".to_string()))
    }
}

impl UserActivityRecorder for DailyActivityLog {
    fn report_user_activity(&self, user_id: &str, date: NaiveDate) -> Result<(), ActivityError> {
        let mut days = self.lock()?;
        days.entry(date).or_default().insert(user_id.to_string());
        Ok(())
    }

    fn daily_active_users(&self, date: NaiveDate) -> Result<usize, ActivityError> {
        let days = self.lock()?;
        Ok(days.get(&date).map_or(0, HashSet::len))
    }

    fn prune_before(&self, date: NaiveDate) -> Result<(), ActivityError> {
        let mut days = self.lock()?;
        days.retain(|day, _| *day >= date);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn test_counts_distinct_users_per_day() {
        let log = DailyActivityLog::new();
        log.report_user_activity("A", day(1)).unwrap();
        log.report_user_activity("A", day(1)).unwrap();
        log.report_user_activity("B", day(1)).unwrap();
        log.report_user_activity("A", day(2)).unwrap();

        assert_eq!(log.daily_active_users(day(1)).unwrap(), 2);
        assert_eq!(log.daily_active_users(day(2)).unwrap(), 1);
        assert_eq!(log.daily_active_users(day(3)).unwrap(), 0);
    }

    #[test]
    fn test_prune_before() {
        let log = DailyActivityLog::new();
        log.report_user_activity("A", day(1)).unwrap();
        log.report_user_activity("B", day(5)).unwrap();

        log.prune_before(day(3)).unwrap();

        assert_eq!(log.daily_active_users(day(1)).unwrap(), 0);
        assert_eq!(log.daily_active_users(day(5)).unwrap(), 1);
    }
}
