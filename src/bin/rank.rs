use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use chrono::{Duration, NaiveDate, Utc};

use bet_assistant::match_store::MatchStore;
use bet_assistant::ranking::SearchParams;
use bet_assistant::registry::{AlgorithmRegistry, StrategyError, WINNER_VS_LOSER};

const DEFAULT_WINDOW_DAYS: i64 = 7;
const DEFAULT_TOP_COUNT: usize = 10;
const DEFAULT_MATCH_COUNT: usize = 5;

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

    let params = SearchParams {
        date_from,
        date_to,
        top_count: parse_usize_flag("--top")?.unwrap_or(DEFAULT_TOP_COUNT),
        match_count: parse_usize_flag("--history")?.unwrap_or(DEFAULT_MATCH_COUNT),
    };
    let algorithm = flag_value("--algo").unwrap_or_else(|| WINNER_VS_LOSER.to_string());

    let store = MatchStore::open(&db_path)?;
    let registry = AlgorithmRegistry::new();

    let picks = match registry.rank(&algorithm, &store, &params) {
        Ok(picks) => picks,
        Err(err) => match err.downcast_ref::<StrategyError>() {
            Some(StrategyError::NotImplemented(_)) => {
                println!("Algorithm `{algorithm}` is coming soon.");
                return Ok(());
            }
            Some(StrategyError::Unknown(_)) => {
                println!("Unknown algorithm `{algorithm}`.");
                println!("Available: {}", registry.implemented_ids().join(", "));
                return Err(err);
            }
            None => return Err(err),
        },
    };

    if picks.is_empty() {
        println!("No candidates with enough history between {date_from} and {date_to}");
        return Ok(());
    }

    println!(
        "Top {} picks for {date_from} .. {date_to} ({} matches of history per team)",
        picks.len(),
        params.match_count
    );
    for (idx, pick) in picks.iter().enumerate() {
        let f = &pick.fixture;
        println!(
            "{:>2}. [{:>5.1}] {} vs {}  {}  ({}, {})",
            idx + 1,
            pick.score,
            f.home_team,
            f.away_team,
            f.utc_time.format("%Y-%m-%d %H:%M"),
            f.league_name,
            f.country,
        );
        println!("     {}", pick.recommendation);
        if let Some(odds) = f.odds {
            println!(
                "     market 1X2: {:.2} / {:.2} / {:.2}",
                odds.home, odds.draw, odds.away
            );
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

fn parse_usize_flag(name: &str) -> Result<Option<usize>> {
    let Some(raw) = flag_value(name) else {
        return Ok(None);
    };
    let value = raw
        .parse::<usize>()
        .with_context(|| format!("{name} expects a non-negative integer, got `{raw}`"))?;
    Ok(Some(value))
}

fn default_db_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("BET_DB_PATH") {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }
    Some(PathBuf::from("bet_assistant.sqlite"))
}
