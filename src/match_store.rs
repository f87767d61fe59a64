use std::path::Path;

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime, Utc};
use rusqlite::{Connection, params};

use crate::ranking::{CandidateFixture, FixtureSource, MarketOdds};
use crate::stats::MatchRecord;

/// Kickoff timestamps are stored as ISO text so plain string comparison
/// orders them chronologically.
pub const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// One match row as ingested from the remote API, finished or not.
#[derive(Debug, Clone)]
pub struct StoredMatch {
    pub match_id: i64,
    pub league_id: u32,
    pub league_name: String,
    pub country: String,
    pub utc_time: NaiveDateTime,
    pub home_team: String,
    pub away_team: String,
    pub home_goals: Option<i32>,
    pub away_goals: Option<i32>,
    pub finished: bool,
    pub cancelled: bool,
    pub odds_home: Option<f64>,
    pub odds_draw: Option<f64>,
    pub odds_away: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct StoredLeague {
    pub league_id: u32,
    pub name: String,
    pub country: String,
    pub season: Option<String>,
}

/// SQLite-backed store for matches and leagues. The ranking pipeline only
/// sees it through the [`FixtureSource`] trait.
pub struct MatchStore {
    conn: Connection,
}

impl MatchStore {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let conn = Connection::open(path)
            .with_context(|| format!("open sqlite db {}", path.display()))?;
        init_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Private in-memory database, used by tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("open in-memory sqlite db")?;
        init_schema(&conn)?;
        Ok(Self { conn })
    }

    pub fn upsert_matches(&mut self, rows: &[StoredMatch]) -> Result<usize> {
        let tx = self.conn.transaction().context("begin upsert transaction")?;
        for row in rows {
            upsert_match(&tx, row)?;
        }
        tx.commit().context("commit upsert transaction")?;
        Ok(rows.len())
    }

    pub fn upsert_league(&self, league: &StoredLeague) -> Result<()> {
        self.conn
            .execute(
                r#"
                INSERT INTO leagues (league_id, name, country, season, updated_at)
                VALUES (?1, ?2, ?3, ?4, ?5)
                ON CONFLICT(league_id) DO UPDATE SET
                    name = excluded.name,
                    country = excluded.country,
                    season = excluded.season,
                    updated_at = excluded.updated_at
                "#,
                params![
                    league.league_id as i64,
                    league.name,
                    league.country,
                    league.season,
                    Utc::now().to_rfc3339(),
                ],
            )
            .context("upsert league")?;
        Ok(())
    }

    pub fn load_leagues(&self) -> Result<Vec<StoredLeague>> {
        let mut stmt = self
            .conn
            .prepare("SELECT league_id, name, country, season FROM leagues ORDER BY league_id")
            .context("prepare load leagues")?;
        let rows = stmt
            .query_map([], |row| {
                Ok(StoredLeague {
                    league_id: row.get::<_, u32>(0)?,
                    name: row.get(1)?,
                    country: row.get(2)?,
                    season: row.get(3)?,
                })
            })
            .context("query leagues")?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row.context("decode league row")?);
        }
        Ok(out)
    }

    /// Open an import-run record; returns the run id for [`Self::finish_import_run`].
    pub fn begin_import_run(&self, league_count: usize) -> Result<i64> {
        self.conn
            .execute(
                "INSERT INTO import_runs(started_at, finished_at, leagues_total, leagues_succeeded, matches_upserted, cancelled, errors_json)
                 VALUES (?1, NULL, ?2, 0, 0, 0, '[]')",
                params![Utc::now().to_rfc3339(), league_count as i64],
            )
            .context("insert import run")?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn finish_import_run(
        &self,
        run_id: i64,
        leagues_succeeded: usize,
        matches_upserted: usize,
        cancelled: bool,
        errors: &[String],
    ) -> Result<()> {
        let errors_json = serde_json::to_string(errors).unwrap_or_else(|_| "[]".to_string());
        self.conn
            .execute(
                "UPDATE import_runs
                 SET finished_at = ?1, leagues_succeeded = ?2, matches_upserted = ?3, cancelled = ?4, errors_json = ?5
                 WHERE run_id = ?6",
                params![
                    Utc::now().to_rfc3339(),
                    leagues_succeeded as i64,
                    matches_upserted as i64,
                    cancelled as i64,
                    errors_json,
                    run_id
                ],
            )
            .context("update import run")?;
        Ok(())
    }
}

impl FixtureSource for MatchStore {
    fn fetch_candidates(
        &self,
        date_from: NaiveDate,
        date_to: NaiveDate,
    ) -> Result<Vec<CandidateFixture>> {
        let from = date_from
            .and_hms_opt(0, 0, 0)
            .context("invalid date_from")?
            .format(TIME_FORMAT)
            .to_string();
        let to = date_to
            .and_hms_opt(23, 59, 59)
            .context("invalid date_to")?
            .format(TIME_FORMAT)
            .to_string();

        let mut stmt = self
            .conn
            .prepare(
                r#"
                SELECT match_id, home_team, away_team, utc_time, league_name, country,
                       odds_home, odds_draw, odds_away
                FROM matches
                WHERE finished = 0
                  AND cancelled = 0
                  AND utc_time >= ?1
                  AND utc_time <= ?2
                ORDER BY utc_time ASC, match_id ASC
                "#,
            )
            .context("prepare candidates query")?;

        let rows = stmt
            .query_map(params![from, to], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, Option<f64>>(6)?,
                    row.get::<_, Option<f64>>(7)?,
                    row.get::<_, Option<f64>>(8)?,
                ))
            })
            .context("query candidates")?;

        let mut out = Vec::new();
        for row in rows {
            let (id, home, away, raw_time, league_name, country, oh, od, oa) =
                row.context("decode candidate row")?;
            let utc_time = parse_stored_time(&raw_time)?;
            let odds = match (oh, od, oa) {
                (Some(home), Some(draw), Some(away)) => Some(MarketOdds { home, draw, away }),
                _ => None,
            };
            out.push(CandidateFixture {
                id,
                home_team: home,
                away_team: away,
                utc_time,
                league_name,
                country,
                odds,
            });
        }
        Ok(out)
    }

    fn fetch_history(
        &self,
        team: &str,
        before: NaiveDateTime,
        limit: usize,
    ) -> Result<Vec<MatchRecord>> {
        let before = before.format(TIME_FORMAT).to_string();
        let mut stmt = self
            .conn
            .prepare(
                r#"
                SELECT home_team, away_team, home_goals, away_goals, utc_time
                FROM matches
                WHERE (home_team = ?1 OR away_team = ?1)
                  AND finished = 1
                  AND cancelled = 0
                  AND home_goals IS NOT NULL
                  AND away_goals IS NOT NULL
                  AND utc_time < ?2
                ORDER BY utc_time DESC, match_id DESC
                LIMIT ?3
                "#,
            )
            .context("prepare history query")?;

        let rows = stmt
            .query_map(params![team, before, limit as i64], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, i64>(3)?,
                    row.get::<_, String>(4)?,
                ))
            })
            .context("query history")?;

        let mut out = Vec::new();
        for row in rows {
            let (home_team, away_team, home_goals, away_goals, raw_time) =
                row.context("decode history row")?;
            out.push(MatchRecord {
                home_team,
                away_team,
                home_goals: u32::try_from(home_goals).context("negative home goals")?,
                away_goals: u32::try_from(away_goals).context("negative away goals")?,
                utc_time: parse_stored_time(&raw_time)?,
            });
        }
        Ok(out)
    }
}

fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        PRAGMA journal_mode = WAL;
        CREATE TABLE IF NOT EXISTS matches (
            match_id INTEGER PRIMARY KEY,
            league_id INTEGER NOT NULL,
            league_name TEXT NOT NULL,
            country TEXT NOT NULL,
            utc_time TEXT NOT NULL,
            home_team TEXT NOT NULL,
            away_team TEXT NOT NULL,
            home_goals INTEGER NULL,
            away_goals INTEGER NULL,
            finished INTEGER NOT NULL,
            cancelled INTEGER NOT NULL,
            odds_home REAL NULL,
            odds_draw REAL NULL,
            odds_away REAL NULL,
            updated_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_matches_utc_time ON matches(utc_time);
        CREATE INDEX IF NOT EXISTS idx_matches_home_team ON matches(home_team);
        CREATE INDEX IF NOT EXISTS idx_matches_away_team ON matches(away_team);
        CREATE INDEX IF NOT EXISTS idx_matches_league ON matches(league_id);

        CREATE TABLE IF NOT EXISTS leagues (
            league_id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            country TEXT NOT NULL,
            season TEXT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS import_runs (
            run_id INTEGER PRIMARY KEY AUTOINCREMENT,
            started_at TEXT NOT NULL,
            finished_at TEXT NULL,
            leagues_total INTEGER NOT NULL,
            leagues_succeeded INTEGER NOT NULL,
            matches_upserted INTEGER NOT NULL,
            cancelled INTEGER NOT NULL,
            errors_json TEXT NOT NULL
        );
        "#,
    )
    .context("create sqlite schema")?;
    Ok(())
}

fn upsert_match(tx: &rusqlite::Transaction<'_>, m: &StoredMatch) -> Result<()> {
    tx.execute(
        r#"
        INSERT INTO matches (
            match_id, league_id, league_name, country, utc_time,
            home_team, away_team, home_goals, away_goals,
            finished, cancelled, odds_home, odds_draw, odds_away, updated_at
        ) VALUES (
            ?1, ?2, ?3, ?4, ?5,
            ?6, ?7, ?8, ?9,
            ?10, ?11, ?12, ?13, ?14, ?15
        )
        ON CONFLICT(match_id) DO UPDATE SET
            league_id = excluded.league_id,
            league_name = excluded.league_name,
            country = excluded.country,
            utc_time = excluded.utc_time,
            home_team = excluded.home_team,
            away_team = excluded.away_team,
            home_goals = excluded.home_goals,
            away_goals = excluded.away_goals,
            finished = excluded.finished,
            cancelled = excluded.cancelled,
            odds_home = COALESCE(excluded.odds_home, matches.odds_home),
            odds_draw = COALESCE(excluded.odds_draw, matches.odds_draw),
            odds_away = COALESCE(excluded.odds_away, matches.odds_away),
            updated_at = excluded.updated_at
        "#,
        params![
            m.match_id,
            m.league_id as i64,
            m.league_name,
            m.country,
            m.utc_time.format(TIME_FORMAT).to_string(),
            m.home_team,
            m.away_team,
            m.home_goals,
            m.away_goals,
            m.finished as i64,
            m.cancelled as i64,
            m.odds_home,
            m.odds_draw,
            m.odds_away,
            Utc::now().to_rfc3339(),
        ],
    )
    .context("upsert match")?;
    Ok(())
}

fn parse_stored_time(raw: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, TIME_FORMAT)
        .with_context(|| format!("invalid stored utc_time `{raw}`"))
}
