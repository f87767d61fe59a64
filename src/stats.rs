use chrono::NaiveDateTime;

/// One finished match as read back from the store. Both goal counts are
/// known; rows with missing scores never reach the aggregator.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchRecord {
    pub home_team: String,
    pub away_team: String,
    pub home_goals: u32,
    pub away_goals: u32,
    pub utc_time: NaiveDateTime,
}

/// Summary of one team's recent form, recomputed per query.
///
/// All rate and average fields are 0 exactly when `played == 0`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TeamStats {
    pub played: u32,
    pub wins: u32,
    pub draws: u32,
    pub losses: u32,
    pub goals_scored: u32,
    pub goals_conceded: u32,
    pub win_rate: f64,
    pub draw_rate: f64,
    pub loss_rate: f64,
    pub avg_goals_scored: f64,
    pub avg_goals_conceded: f64,
}

/// Reduce a team's match history into a [`TeamStats`].
///
/// Each match is attributed by name: if `team` is the home side its goals are
/// the home goals, otherwise the away goals. Matches not involving `team` at
/// all are ignored. Exactly one of wins/draws/losses increments per counted
/// match, so the counters always sum to `played`.
pub fn aggregate_team_stats(team: &str, matches: &[MatchRecord]) -> TeamStats {
    let mut out = TeamStats::default();

    for m in matches {
        let (team_goals, opponent_goals) = if m.home_team == team {
            (m.home_goals, m.away_goals)
        } else if m.away_team == team {
            (m.away_goals, m.home_goals)
        } else {
            continue;
        };

        out.played += 1;
        out.goals_scored += team_goals;
        out.goals_conceded += opponent_goals;
        if team_goals > opponent_goals {
            out.wins += 1;
        } else if team_goals == opponent_goals {
            out.draws += 1;
        } else {
            out.losses += 1;
        }
    }

    if out.played > 0 {
        let played = out.played as f64;
        out.win_rate = out.wins as f64 / played * 100.0;
        out.draw_rate = out.draws as f64 / played * 100.0;
        out.loss_rate = out.losses as f64 / played * 100.0;
        out.avg_goals_scored = out.goals_scored as f64 / played;
        out.avg_goals_conceded = out.goals_conceded as f64 / played;
    }

    out
}
