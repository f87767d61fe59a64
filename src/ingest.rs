use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Result;
use chrono::NaiveDate;

use crate::api_fetch::ApiClient;
use crate::match_store::MatchStore;

/// Cooperative cancellation for long-running imports. Cloned freely; any
/// clone can cancel and every holder observes it.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone)]
pub struct ImportSummary {
    pub leagues_total: usize,
    pub leagues_succeeded: usize,
    pub matches_upserted: usize,
    pub cancelled: bool,
    pub errors: Vec<String>,
}

/// Fetch one date window of fixtures for each league and upsert into the
/// store. One league's failure is recorded and the rest continue; the token
/// is checked between leagues so a cancel takes effect at the next boundary.
pub fn import_fixture_window(
    store: &mut MatchStore,
    api: &mut ApiClient,
    league_ids: &[u32],
    date_from: NaiveDate,
    date_to: NaiveDate,
    token: &CancelToken,
) -> Result<ImportSummary> {
    let run_id = store.begin_import_run(league_ids.len())?;

    let mut leagues_succeeded = 0usize;
    let mut matches_upserted = 0usize;
    let mut errors: Vec<String> = Vec::new();
    let mut cancelled = false;

    for league_id in league_ids {
        if token.is_cancelled() {
            cancelled = true;
            log::info!("import cancelled before league {league_id}");
            break;
        }
        match api.fetch_fixtures(*league_id, date_from, date_to) {
            Ok(rows) => {
                let n = store.upsert_matches(&rows)?;
                matches_upserted += n;
                leagues_succeeded += 1;
                log::info!("league {league_id}: upserted {n} fixtures");
            }
            Err(err) => {
                log::warn!("league {league_id} import failed: {err:#}");
                errors.push(format!("league {league_id}: {err:#}"));
            }
        }
    }

    store.finish_import_run(run_id, leagues_succeeded, matches_upserted, cancelled, &errors)?;

    Ok(ImportSummary {
        leagues_total: league_ids.len(),
        leagues_succeeded,
        matches_upserted,
        cancelled,
        errors,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api_fetch::ApiConfig;
    use crate::rate_limit::{InMemoryCounterStore, RateLimiter, RequestBudget};

    #[test]
    fn cancel_token_is_shared_across_clones() {
        let token = CancelToken::new();
        let other = token.clone();
        assert!(!other.is_cancelled());
        token.cancel();
        assert!(other.is_cancelled());
    }

    #[test]
    fn cancelled_import_stops_before_any_request() {
        let mut store = MatchStore::open_in_memory().unwrap();
        let limiter = RateLimiter::new(
            RequestBudget::default(),
            Box::new(InMemoryCounterStore::new()),
        )
        .unwrap();
        let mut api = ApiClient::new(
            ApiConfig {
                base_url: "http://127.0.0.1:1".to_string(),
                api_key: None,
            },
            limiter,
        );

        let token = CancelToken::new();
        token.cancel();

        let from = NaiveDate::from_ymd_opt(2026, 4, 1).unwrap();
        let to = NaiveDate::from_ymd_opt(2026, 4, 7).unwrap();
        let summary =
            import_fixture_window(&mut store, &mut api, &[39, 140], from, to, &token).unwrap();

        assert!(summary.cancelled);
        assert_eq!(summary.leagues_total, 2);
        assert_eq!(summary.leagues_succeeded, 0);
        assert_eq!(summary.matches_upserted, 0);
        // No budget was spent because no request went out.
        assert_eq!(api.remaining_today(), RequestBudget::default().per_day);
    }
}
