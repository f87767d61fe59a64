use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use chrono::{Duration, NaiveDate, Utc};

use bet_assistant::api_fetch::{ApiClient, ApiConfig};
use bet_assistant::ingest::{self, CancelToken};
use bet_assistant::match_store::MatchStore;
use bet_assistant::presets::{self, JsonPresetStore, PresetStore};
use bet_assistant::rate_limit::{JsonCounterStore, RateLimiter, RequestBudget};

const DEFAULT_LEAGUE_IDS: &[u32] = &[39, 140, 135, 78, 61];
const DEFAULT_WINDOW_DAYS: i64 = 7;

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let db_path = flag_value("--db")
        .map(PathBuf::from)
        .or_else(default_db_path)
        .context("unable to resolve sqlite path")?;

    let today = Utc::now().date_naive();
    let date_from = parse_date_flag("--from")?.unwrap_or(today);
    let date_to =
        parse_date_flag("--to")?.unwrap_or(date_from + Duration::days(DEFAULT_WINDOW_DAYS));
    if date_to < date_from {
        return Err(anyhow!("--to {date_to} is before --from {date_from}"));
    }

    let league_ids = parse_league_ids_flag().unwrap_or_else(league_ids_from_presets);
    if league_ids.is_empty() {
        return Err(anyhow!("no league ids resolved for import"));
    }

    let limiter = RateLimiter::new(
        RequestBudget::from_env(),
        Box::new(JsonCounterStore::new(counter_path())),
    )?;
    let mut api = ApiClient::new(ApiConfig::from_env(), limiter);
    let mut store = MatchStore::open(&db_path)?;

    let token = CancelToken::new();
    let summary = ingest::import_fixture_window(
        &mut store,
        &mut api,
        &league_ids,
        date_from,
        date_to,
        &token,
    )?;

    println!("Fixture import complete");
    println!("DB: {}", db_path.display());
    println!("Window: {date_from} .. {date_to}");
    println!(
        "Leagues: {}/{}",
        summary.leagues_succeeded, summary.leagues_total
    );
    println!("Matches upserted: {}", summary.matches_upserted);
    println!("Requests left today: {}", api.remaining_today());
    if summary.cancelled {
        println!("Import was cancelled before finishing");
    }
    if !summary.errors.is_empty() {
        println!("Errors: {}", summary.errors.len());
        for err in summary.errors.iter().take(6) {
            println!(" - {err}");
        }
    }

    Ok(())
}

fn flag_value(name: &str) -> Option<String> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let prefix = format!("{name}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(value) = arg.strip_prefix(&prefix) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if arg == name {
            let Some(next) = args.get(idx + 1) else {
                continue;
            };
            if !next.trim().is_empty() {
                return Some(next.trim().to_string());
            }
        }
    }
    None
}

fn parse_date_flag(name: &str) -> Result<Option<NaiveDate>> {
    let Some(raw) = flag_value(name) else {
        return Ok(None);
    };
    let date = NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
        .with_context(|| format!("{name} expects YYYY-MM-DD, got `{raw}`"))?;
    Ok(Some(date))
}

fn parse_league_ids_flag() -> Option<Vec<u32>> {
    let raw = flag_value("--leagues")?;
    let ids = raw
        .split(',')
        .filter_map(|part| part.trim().parse::<u32>().ok())
        .collect::<Vec<_>>();
    if ids.is_empty() { None } else { Some(ids) }
}

fn league_ids_from_presets() -> Vec<u32> {
    let store = JsonPresetStore::new(presets_path());
    match store.load() {
        Ok(loaded) if !loaded.is_empty() => presets::enabled_league_ids(&loaded),
        _ => DEFAULT_LEAGUE_IDS.to_vec(),
    }
}

fn default_db_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("BET_DB_PATH") {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }
    Some(PathBuf::from("bet_assistant.sqlite"))
}

fn presets_path() -> PathBuf {
    std::env::var("BET_PRESETS_PATH")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("league_presets.json"))
}

fn counter_path() -> PathBuf {
    std::env::var("BET_COUNTER_PATH")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("request_counter.json"))
}
