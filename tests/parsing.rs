use bet_assistant::api_fetch::{parse_fixtures_json, parse_leagues_json, parse_odds_json};
use chrono::{NaiveDate, NaiveDateTime};

fn datetime(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, mo, d)
        .unwrap()
        .and_hms_opt(h, mi, 0)
        .unwrap()
}

#[test]
fn fixtures_payload_maps_statuses_and_goals() {
    let raw = r#"{
        "errors": [],
        "response": [
            {
                "fixture": {"id": 1001, "date": "2026-04-12T14:00:00+00:00", "status": {"short": "NS"}},
                "league": {"id": 39, "name": "Premier League", "country": "England"},
                "teams": {"home": {"name": "Arsenal"}, "away": {"name": "Chelsea"}},
                "goals": {"home": null, "away": null}
            },
            {
                "fixture": {"id": 1002, "date": "2026-04-05T16:30:00+00:00", "status": {"short": "FT"}},
                "league": {"id": 39, "name": "Premier League", "country": "England"},
                "teams": {"home": {"name": "Fulham"}, "away": {"name": "Spurs"}},
                "goals": {"home": 2, "away": 1}
            },
            {
                "fixture": {"id": 1003, "date": "2026-04-06T19:00:00+00:00", "status": {"short": "PST"}},
                "league": {"id": 39, "name": "Premier League", "country": "England"},
                "teams": {"home": {"name": "Leeds"}, "away": {"name": "Everton"}},
                "goals": {"home": null, "away": null}
            }
        ]
    }"#;

    let rows = parse_fixtures_json(raw).unwrap();
    assert_eq!(rows.len(), 3);

    let scheduled = &rows[0];
    assert_eq!(scheduled.match_id, 1001);
    assert_eq!(scheduled.utc_time, datetime(2026, 4, 12, 14, 0));
    assert!(!scheduled.finished);
    assert!(!scheduled.cancelled);
    assert_eq!(scheduled.home_goals, None);
    assert_eq!(scheduled.country, "England");

    let played = &rows[1];
    assert!(played.finished);
    assert_eq!(played.home_goals, Some(2));
    assert_eq!(played.away_goals, Some(1));

    let postponed = &rows[2];
    assert!(!postponed.finished);
    assert!(postponed.cancelled);
}

#[test]
fn fixture_without_team_names_is_dropped() {
    let raw = r#"{
        "response": [
            {
                "fixture": {"id": 1, "date": "2026-04-12T14:00:00+00:00", "status": {"short": "NS"}},
                "league": {"id": 39, "name": "Premier League", "country": "England"},
                "teams": {"home": {"name": ""}, "away": {"name": "Chelsea"}},
                "goals": {"home": null, "away": null}
            }
        ]
    }"#;
    assert!(parse_fixtures_json(raw).unwrap().is_empty());
}

#[test]
fn empty_or_null_body_is_no_rows() {
    assert!(parse_fixtures_json("").unwrap().is_empty());
    assert!(parse_fixtures_json("null").unwrap().is_empty());
    assert!(parse_leagues_json("{}").unwrap().is_empty());
    assert!(parse_odds_json("").unwrap().is_none());
}

#[test]
fn api_level_errors_fail_the_parse() {
    let raw = r#"{"errors": {"token": "Missing application key"}, "response": []}"#;
    let err = parse_fixtures_json(raw).unwrap_err();
    assert!(err.to_string().contains("Missing application key"));

    // An empty errors object is the API's way of saying all is well.
    let ok = r#"{"errors": {}, "response": []}"#;
    assert!(parse_fixtures_json(ok).unwrap().is_empty());
}

#[test]
fn leagues_payload_picks_current_season() {
    let raw = r#"{
        "response": [
            {
                "league": {"id": 39, "name": "Premier League"},
                "country": {"name": "England"},
                "seasons": [
                    {"year": 2024, "current": false},
                    {"year": 2025, "current": true}
                ]
            },
            {
                "league": {"id": 140, "name": "La Liga"},
                "country": {"name": "Spain"},
                "seasons": []
            }
        ]
    }"#;

    let leagues = parse_leagues_json(raw).unwrap();
    assert_eq!(leagues.len(), 2);
    assert_eq!(leagues[0].league_id, 39);
    assert_eq!(leagues[0].season.as_deref(), Some("2025"));
    assert_eq!(leagues[1].country, "Spain");
    assert_eq!(leagues[1].season, None);
}

#[test]
fn odds_payload_averages_match_winner_across_bookmakers() {
    let raw = r#"{
        "response": [
            {
                "bookmakers": [
                    {
                        "bets": [
                            {
                                "name": "Match Winner",
                                "values": [
                                    {"value": "Home", "odd": "1.80"},
                                    {"value": "Draw", "odd": "3.50"},
                                    {"value": "Away", "odd": "4.00"}
                                ]
                            },
                            {
                                "name": "Both Teams Score",
                                "values": [{"value": "Yes", "odd": "1.60"}]
                            }
                        ]
                    },
                    {
                        "bets": [
                            {
                                "name": "Match Winner",
                                "values": [
                                    {"value": "1", "odd": "2.00"},
                                    {"value": "X", "odd": "3.70"},
                                    {"value": "2", "odd": "4.40"}
                                ]
                            }
                        ]
                    }
                ]
            }
        ]
    }"#;

    let odds = parse_odds_json(raw).unwrap().expect("triple present");
    assert!((odds.home - 1.90).abs() < 1e-9);
    assert!((odds.draw - 3.60).abs() < 1e-9);
    assert!((odds.away - 4.20).abs() < 1e-9);
}

#[test]
fn incomplete_odds_market_yields_none() {
    let raw = r#"{
        "response": [
            {
                "bookmakers": [
                    {
                        "bets": [
                            {
                                "name": "Match Winner",
                                "values": [{"value": "Home", "odd": "1.80"}]
                            }
                        ]
                    }
                ]
            }
        ]
    }"#;
    assert!(parse_odds_json(raw).unwrap().is_none());
}
