use std::cmp::Ordering;

use anyhow::Result;
use chrono::{NaiveDate, NaiveDateTime};

use crate::scoring;
use crate::stats::{self, MatchRecord, TeamStats};

/// Hard minimum of qualifying historical matches per team. Candidates where
/// either side falls short are excluded from the output entirely.
pub const MIN_HISTORY_MATCHES: usize = 3;

/// Caller-supplied query window and limits for one ranking run.
#[derive(Debug, Clone, Copy)]
pub struct SearchParams {
    /// Inclusive lower bound on candidate kickoff date.
    pub date_from: NaiveDate,
    /// Inclusive upper bound on candidate kickoff date.
    pub date_to: NaiveDate,
    /// Maximum number of results returned.
    pub top_count: usize,
    /// Most-recent historical matches to aggregate per team.
    pub match_count: usize,
}

/// 1X2 market prices, when the odds provider had the fixture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarketOdds {
    pub home: f64,
    pub draw: f64,
    pub away: f64,
}

/// An upcoming, unfinished match under evaluation.
#[derive(Debug, Clone)]
pub struct CandidateFixture {
    pub id: i64,
    pub home_team: String,
    pub away_team: String,
    pub utc_time: NaiveDateTime,
    pub league_name: String,
    pub country: String,
    pub odds: Option<MarketOdds>,
}

/// One scored candidate. Built fresh per query, never persisted.
#[derive(Debug, Clone)]
pub struct RankedResult {
    pub fixture: CandidateFixture,
    pub score: f64,
    pub is_home_advantage: bool,
    pub home_stats: TeamStats,
    pub away_stats: TeamStats,
    pub recommendation: String,
}

/// Read-side capabilities the pipeline needs from the persistent store.
pub trait FixtureSource {
    /// Unfinished fixtures with kickoff in `[date_from, date_to]` (inclusive),
    /// ascending by kickoff.
    fn fetch_candidates(
        &self,
        date_from: NaiveDate,
        date_to: NaiveDate,
    ) -> Result<Vec<CandidateFixture>>;

    /// Up to `limit` most recent finished matches involving `team`, strictly
    /// before `before`, most recent first. Both goal counts are present.
    fn fetch_history(
        &self,
        team: &str,
        before: NaiveDateTime,
        limit: usize,
    ) -> Result<Vec<MatchRecord>>;
}

/// The "winner vs loser" strategy: rank candidates by comparative form edge.
///
/// History for each team is fetched strictly before the candidate's own
/// kickoff, so a team's later results never leak into an earlier fixture's
/// stats. A failure while processing one candidate drops that candidate and
/// never aborts the run.
pub fn rank_winner_vs_loser(
    source: &dyn FixtureSource,
    params: &SearchParams,
) -> Result<Vec<RankedResult>> {
    let candidates = source.fetch_candidates(params.date_from, params.date_to)?;

    let mut results: Vec<RankedResult> = Vec::new();
    for candidate in candidates {
        match score_candidate(source, &candidate, params.match_count) {
            Ok(Some(ranked)) => results.push(ranked),
            Ok(None) => {}
            Err(err) => {
                log::warn!(
                    "skipping {} vs {} ({}): {err:#}",
                    candidate.home_team,
                    candidate.away_team,
                    candidate.utc_time,
                );
            }
        }
    }

    // Stable sort: candidates with equal scores keep the ascending-kickoff
    // order they were fetched in.
    results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    results.truncate(params.top_count);
    Ok(results)
}

fn score_candidate(
    source: &dyn FixtureSource,
    candidate: &CandidateFixture,
    match_count: usize,
) -> Result<Option<RankedResult>> {
    let home_history = source.fetch_history(&candidate.home_team, candidate.utc_time, match_count)?;
    let away_history = source.fetch_history(&candidate.away_team, candidate.utc_time, match_count)?;

    if home_history.len() < MIN_HISTORY_MATCHES || away_history.len() < MIN_HISTORY_MATCHES {
        return Ok(None);
    }

    let home_stats = stats::aggregate_team_stats(&candidate.home_team, &home_history);
    let away_stats = stats::aggregate_team_stats(&candidate.away_team, &away_history);
    let scored = scoring::score_fixture(&home_stats, &away_stats);

    Ok(Some(RankedResult {
        fixture: candidate.clone(),
        score: scored.score,
        is_home_advantage: scored.is_home_advantage,
        home_stats,
        away_stats,
        recommendation: scored.recommendation,
    }))
}
