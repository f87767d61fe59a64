use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Timelike, Utc};
use serde::{Deserialize, Serialize};

const DEFAULT_PER_DAY: u32 = 100;
const DEFAULT_PER_HOUR: u32 = 30;

/// Request allowance against the remote API.
#[derive(Debug, Clone, Copy)]
pub struct RequestBudget {
    pub per_day: u32,
    pub per_hour: u32,
}

impl Default for RequestBudget {
    fn default() -> Self {
        Self {
            per_day: DEFAULT_PER_DAY,
            per_hour: DEFAULT_PER_HOUR,
        }
    }
}

impl RequestBudget {
    pub fn from_env() -> Self {
        let per_day = env_u32("BET_API_DAILY_LIMIT", DEFAULT_PER_DAY);
        let per_hour = env_u32("BET_API_HOURLY_LIMIT", DEFAULT_PER_HOUR);
        Self { per_day, per_hour }
    }
}

fn env_u32(name: &str, default: u32) -> u32 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<u32>().ok())
        .unwrap_or(default)
}

/// Persisted counter state. Counts reset when the UTC day or hour rolls over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterSnapshot {
    pub day: NaiveDate,
    pub hour: u32,
    pub day_count: u32,
    pub hour_count: u32,
}

impl CounterSnapshot {
    fn fresh(now: DateTime<Utc>) -> Self {
        Self {
            day: now.date_naive(),
            hour: now.hour(),
            day_count: 0,
            hour_count: 0,
        }
    }
}

/// Where the counter lives between runs. The limiter itself never touches
/// file I/O directly.
pub trait CounterStore {
    fn load(&self) -> Result<Option<CounterSnapshot>>;
    fn save(&self, snapshot: &CounterSnapshot) -> Result<()>;
}

/// Daily/hourly request counter with reset-on-rollover.
pub struct RateLimiter {
    budget: RequestBudget,
    store: Box<dyn CounterStore>,
    snapshot: CounterSnapshot,
}

impl RateLimiter {
    pub fn new(budget: RequestBudget, store: Box<dyn CounterStore>) -> Result<Self> {
        let snapshot = store
            .load()
            .context("load request counter")?
            .unwrap_or_else(|| CounterSnapshot::fresh(Utc::now()));
        Ok(Self {
            budget,
            store,
            snapshot,
        })
    }

    /// Consume one request from the budget. Returns `false` (without
    /// counting) when either the daily or hourly allowance is spent.
    pub fn try_acquire(&mut self, now: DateTime<Utc>) -> Result<bool> {
        self.roll_over(now);

        if self.snapshot.day_count >= self.budget.per_day
            || self.snapshot.hour_count >= self.budget.per_hour
        {
            return Ok(false);
        }

        self.snapshot.day_count += 1;
        self.snapshot.hour_count += 1;
        self.store
            .save(&self.snapshot)
            .context("persist request counter")?;
        Ok(true)
    }

    pub fn remaining_today(&self) -> u32 {
        self.budget.per_day.saturating_sub(self.snapshot.day_count)
    }

    fn roll_over(&mut self, now: DateTime<Utc>) {
        let day = now.date_naive();
        let hour = now.hour();
        if day != self.snapshot.day {
            self.snapshot = CounterSnapshot::fresh(now);
        } else if hour != self.snapshot.hour {
            self.snapshot.hour = hour;
            self.snapshot.hour_count = 0;
        }
    }
}

/// Shared in-memory store, for tests and one-shot runs.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCounterStore {
    inner: Arc<Mutex<Option<CounterSnapshot>>>,
}

impl InMemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Option<CounterSnapshot> {
        *self.inner.lock().expect("counter store lock poisoned")
    }
}

impl CounterStore for InMemoryCounterStore {
    fn load(&self) -> Result<Option<CounterSnapshot>> {
        Ok(*self.inner.lock().expect("counter store lock poisoned"))
    }

    fn save(&self, snapshot: &CounterSnapshot) -> Result<()> {
        *self.inner.lock().expect("counter store lock poisoned") = Some(*snapshot);
        Ok(())
    }
}

/// JSON-file store used by the binaries.
#[derive(Debug, Clone)]
pub struct JsonCounterStore {
    path: PathBuf,
}

impl JsonCounterStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl CounterStore for JsonCounterStore {
    fn load(&self) -> Result<Option<CounterSnapshot>> {
        let Ok(raw) = fs::read_to_string(&self.path) else {
            return Ok(None);
        };
        Ok(serde_json::from_str::<CounterSnapshot>(&raw).ok())
    }

    fn save(&self, snapshot: &CounterSnapshot) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            let _ = fs::create_dir_all(parent);
        }
        let json = serde_json::to_string(snapshot).context("serialize request counter")?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).context("write request counter")?;
        fs::rename(&tmp, &self.path).context("swap request counter")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, day, hour, 15, 0).unwrap()
    }

    fn limiter(per_day: u32, per_hour: u32) -> (RateLimiter, InMemoryCounterStore) {
        let store = InMemoryCounterStore::new();
        let limiter = RateLimiter::new(
            RequestBudget { per_day, per_hour },
            Box::new(store.clone()),
        )
        .unwrap();
        (limiter, store)
    }

    #[test]
    fn hourly_budget_blocks_then_resets_next_hour() {
        let (mut limiter, _) = limiter(10, 2);
        assert!(limiter.try_acquire(at(1, 9)).unwrap());
        assert!(limiter.try_acquire(at(1, 9)).unwrap());
        assert!(!limiter.try_acquire(at(1, 9)).unwrap());
        // Hour rollover clears the hourly count but not the daily one.
        assert!(limiter.try_acquire(at(1, 10)).unwrap());
        assert_eq!(limiter.remaining_today(), 7);
    }

    #[test]
    fn daily_budget_survives_hour_rollover() {
        let (mut limiter, _) = limiter(2, 2);
        assert!(limiter.try_acquire(at(1, 9)).unwrap());
        assert!(limiter.try_acquire(at(1, 10)).unwrap());
        assert!(!limiter.try_acquire(at(1, 11)).unwrap());
        // New day resets everything.
        assert!(limiter.try_acquire(at(2, 0)).unwrap());
    }

    #[test]
    fn counter_is_persisted_through_the_store() {
        let (mut limiter, store) = limiter(5, 5);
        assert!(limiter.try_acquire(at(1, 9)).unwrap());
        let saved = store.snapshot().unwrap();
        assert_eq!(saved.day_count, 1);

        // A new limiter over the same store picks the count back up.
        let mut resumed =
            RateLimiter::new(RequestBudget { per_day: 5, per_hour: 5 }, Box::new(store)).unwrap();
        assert!(resumed.try_acquire(at(1, 9)).unwrap());
        assert_eq!(resumed.remaining_today(), 3);
    }
}
