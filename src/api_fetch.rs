use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use chrono::{NaiveDate, NaiveDateTime, Utc};
use once_cell::sync::OnceCell;
use reqwest::blocking::Client;
use serde_json::Value;

use crate::match_store::{StoredLeague, StoredMatch};
use crate::ranking::MarketOdds;
use crate::rate_limit::RateLimiter;

const DEFAULT_BASE_URL: &str = "https://v3.football.api-sports.io";
const REQUEST_TIMEOUT_SECS: u64 = 10;

static CLIENT: OnceCell<Client> = OnceCell::new();

fn http_client() -> Result<&'static Client> {
    CLIENT.get_or_try_init(|| {
        Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("failed to build http client")
    })
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub api_key: Option<String>,
}

impl ApiConfig {
    pub fn from_env() -> Self {
        let base_url = std::env::var("BET_API_BASE_URL")
            .ok()
            .map(|s| s.trim().trim_end_matches('/').to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let api_key = std::env::var("BET_API_KEY")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        Self { base_url, api_key }
    }
}

/// Blocking client for the remote sports-data API. Every request spends one
/// unit of the injected rate-limiter budget.
pub struct ApiClient {
    config: ApiConfig,
    limiter: RateLimiter,
}

impl ApiClient {
    pub fn new(config: ApiConfig, limiter: RateLimiter) -> Self {
        Self { config, limiter }
    }

    pub fn remaining_today(&self) -> u32 {
        self.limiter.remaining_today()
    }

    pub fn fetch_leagues(&mut self) -> Result<Vec<StoredLeague>> {
        let body = self.get("/leagues")?;
        parse_leagues_json(&body)
    }

    pub fn fetch_fixtures(
        &mut self,
        league_id: u32,
        date_from: NaiveDate,
        date_to: NaiveDate,
    ) -> Result<Vec<StoredMatch>> {
        let path = format!("/fixtures?league={league_id}&from={date_from}&to={date_to}");
        let body = self.get(&path)?;
        parse_fixtures_json(&body)
    }

    /// 1X2 odds for one fixture, when the provider carries the market.
    pub fn fetch_odds(&mut self, fixture_id: i64) -> Result<Option<MarketOdds>> {
        let body = self.get(&format!("/odds?fixture={fixture_id}"))?;
        parse_odds_json(&body)
    }

    fn get(&mut self, path_and_query: &str) -> Result<String> {
        if !self.limiter.try_acquire(Utc::now())? {
            return Err(anyhow!(
                "request budget exhausted, not calling {path_and_query}"
            ));
        }

        let client = http_client()?;
        let url = format!("{}{}", self.config.base_url, path_and_query);
        let mut req = client.get(&url);
        if let Some(key) = self.config.api_key.as_deref() {
            req = req.header("x-apisports-key", key);
        }

        let resp = req.send().with_context(|| format!("request {url} failed"))?;
        let status = resp.status();
        let body = resp.text().context("failed reading body")?;
        if !status.is_success() {
            return Err(anyhow!("http {status}: {body}"));
        }
        Ok(body)
    }
}

pub fn parse_leagues_json(raw: &str) -> Result<Vec<StoredLeague>> {
    let root = parse_response(raw)?;
    let Some(items) = root.get("response").and_then(|v| v.as_array()) else {
        return Ok(Vec::new());
    };

    let mut out = Vec::new();
    for item in items {
        let Some(league) = item.get("league") else {
            continue;
        };
        let Some(league_id) = league.get("id").and_then(as_u32_any) else {
            continue;
        };
        let name = pick_string(league, &["name"]).unwrap_or_default();
        if name.is_empty() {
            continue;
        }
        let country = item
            .get("country")
            .and_then(|c| pick_string(c, &["name"]))
            .unwrap_or_default();
        let season = item
            .get("seasons")
            .and_then(|s| s.as_array())
            .and_then(|arr| arr.iter().find(|s| is_true(s.get("current"))))
            .and_then(|s| s.get("year"))
            .and_then(|y| y.as_i64())
            .map(|y| y.to_string());
        out.push(StoredLeague {
            league_id,
            name,
            country,
            season,
        });
    }
    Ok(out)
}

pub fn parse_fixtures_json(raw: &str) -> Result<Vec<StoredMatch>> {
    let root = parse_response(raw)?;
    let Some(items) = root.get("response").and_then(|v| v.as_array()) else {
        return Ok(Vec::new());
    };

    let mut out = Vec::new();
    for item in items {
        if let Some(row) = parse_fixture_item(item) {
            out.push(row);
        }
    }
    Ok(out)
}

/// Best average "Match Winner" prices across the bookmakers in the payload.
pub fn parse_odds_json(raw: &str) -> Result<Option<MarketOdds>> {
    let root = parse_response(raw)?;
    let Some(items) = root.get("response").and_then(|v| v.as_array()) else {
        return Ok(None);
    };

    let mut home = Vec::new();
    let mut draw = Vec::new();
    let mut away = Vec::new();
    for item in items {
        let Some(bookmakers) = item.get("bookmakers").and_then(|v| v.as_array()) else {
            continue;
        };
        for bookmaker in bookmakers {
            let Some(bets) = bookmaker.get("bets").and_then(|v| v.as_array()) else {
                continue;
            };
            for bet in bets {
                let name = pick_string(bet, &["name"]).unwrap_or_default();
                if !name.eq_ignore_ascii_case("Match Winner") {
                    continue;
                }
                let Some(values) = bet.get("values").and_then(|v| v.as_array()) else {
                    continue;
                };
                for value in values {
                    let side = pick_string(value, &["value"]).unwrap_or_default();
                    let Some(odd) = value.get("odd").and_then(as_f64_any) else {
                        continue;
                    };
                    match side.as_str() {
                        "Home" | "1" => home.push(odd),
                        "Draw" | "X" => draw.push(odd),
                        "Away" | "2" => away.push(odd),
                        _ => {}
                    }
                }
            }
        }
    }

    match (mean(&home), mean(&draw), mean(&away)) {
        (Some(home), Some(draw), Some(away)) => Ok(Some(MarketOdds { home, draw, away })),
        _ => Ok(None),
    }
}

fn parse_fixture_item(item: &Value) -> Option<StoredMatch> {
    let fixture = item.get("fixture")?;
    let match_id = fixture.get("id")?.as_i64()?;
    let utc_time = fixture
        .get("date")
        .and_then(|v| v.as_str())
        .and_then(parse_api_time)?;
    let status = fixture
        .get("status")
        .and_then(|s| s.get("short"))
        .and_then(|v| v.as_str())
        .unwrap_or("");

    let league = item.get("league")?;
    let league_id = league.get("id").and_then(as_u32_any).unwrap_or(0);
    let league_name = pick_string(league, &["name"]).unwrap_or_default();
    let country = pick_string(league, &["country"]).unwrap_or_default();

    let teams = item.get("teams")?;
    let home_team = teams.get("home").and_then(|t| pick_string(t, &["name"]))?;
    let away_team = teams.get("away").and_then(|t| pick_string(t, &["name"]))?;

    let goals = item.get("goals");
    let home_goals = goals.and_then(|g| g.get("home")).and_then(as_i32_any);
    let away_goals = goals.and_then(|g| g.get("away")).and_then(as_i32_any);

    Some(StoredMatch {
        match_id,
        league_id,
        league_name,
        country,
        utc_time,
        home_team,
        away_team,
        home_goals,
        away_goals,
        finished: is_finished_status(status),
        cancelled: is_cancelled_status(status),
        odds_home: None,
        odds_draw: None,
        odds_away: None,
    })
}

/// Full-time statuses, including extra time and penalty shootouts.
fn is_finished_status(short: &str) -> bool {
    matches!(short, "FT" | "AET" | "PEN")
}

/// Statuses that take a fixture out of play entirely. Postponed fixtures are
/// treated the same until the API re-announces them with a new date.
fn is_cancelled_status(short: &str) -> bool {
    matches!(short, "CANC" | "ABD" | "AWD" | "WO" | "PST")
}

/// The API wraps payloads as `{"errors": ..., "response": [...]}` and keeps
/// reporting 200 even for key/quota problems, so the errors field is checked
/// before anything else.
fn parse_response(raw: &str) -> Result<Value> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(Value::Null);
    }
    let root: Value = serde_json::from_str(trimmed).context("invalid api json")?;
    if let Some(errors) = root.get("errors") {
        let has_errors = match errors {
            Value::Array(items) => !items.is_empty(),
            Value::Object(map) => !map.is_empty(),
            _ => false,
        };
        if has_errors {
            return Err(anyhow!("api rejected request: {errors}"));
        }
    }
    Ok(root)
}

fn pick_string(value: &Value, keys: &[&str]) -> Option<String> {
    for key in keys {
        if let Some(s) = value.get(*key).and_then(|v| v.as_str()) {
            let trimmed = s.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
    }
    None
}

fn is_true(v: Option<&Value>) -> bool {
    v.and_then(|v| v.as_bool()).unwrap_or(false)
}

fn as_u32_any(v: &Value) -> Option<u32> {
    if let Some(n) = v.as_u64() {
        return u32::try_from(n).ok();
    }
    v.as_str()?.trim().parse::<u32>().ok()
}

fn as_i32_any(v: &Value) -> Option<i32> {
    if let Some(n) = v.as_i64() {
        return i32::try_from(n).ok();
    }
    v.as_str()?.trim().parse::<i32>().ok()
}

fn as_f64_any(v: &Value) -> Option<f64> {
    if let Some(n) = v.as_f64() {
        return Some(n);
    }
    v.as_str()?.trim().parse::<f64>().ok()
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// API timestamps look like `2026-03-14T18:30:00+00:00`; keep the naive UTC part.
fn parse_api_time(raw: &str) -> Option<NaiveDateTime> {
    let trimmed = raw.trim();
    if trimmed.len() < 19 {
        return None;
    }
    NaiveDateTime::parse_from_str(&trimmed[..19], "%Y-%m-%dT%H:%M:%S").ok()
}
