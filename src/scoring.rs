use crate::stats::TeamStats;

/// Tie-break between equal hypothesis scores. The original assistant compared
/// with strict `>`, so a dead heat falls to the away side; flip this to make
/// ties favor home instead.
pub const TIES_FAVOR_HOME: bool = false;

const STRONG_RATE: f64 = 60.0;
const MEDIUM_RATE: f64 = 50.0;

/// Comparative score for one fixture plus the generated recommendation.
#[derive(Debug, Clone)]
pub struct FixtureScore {
    /// Max of the two hypothesis scores, in `[0, 200]`.
    pub score: f64,
    pub home_score: f64,
    pub away_score: f64,
    pub is_home_advantage: bool,
    pub recommendation: String,
}

/// Score a fixture from both teams' aggregated form.
///
/// Two opposing hypotheses are computed: home advantage
/// (`home.win_rate + away.loss_rate`) and away advantage
/// (`away.win_rate + home.loss_rate`). The larger one wins and drives the
/// recommendation text. Pure and total; any pair of valid stats scores.
pub fn score_fixture(home: &TeamStats, away: &TeamStats) -> FixtureScore {
    let home_score = home.win_rate + away.loss_rate;
    let away_score = away.win_rate + home.loss_rate;
    let is_home_advantage = if TIES_FAVOR_HOME {
        home_score >= away_score
    } else {
        home_score > away_score
    };

    let (win_rate, loss_rate, pick) = if is_home_advantage {
        (home.win_rate, away.loss_rate, 1)
    } else {
        (away.win_rate, home.loss_rate, 2)
    };

    FixtureScore {
        score: home_score.max(away_score),
        home_score,
        away_score,
        is_home_advantage,
        recommendation: recommendation_text(pick, win_rate, loss_rate),
    }
}

/// Confidence-tiered text for the winning side. `pick` is `1` for home and
/// `2` for away; both percentages are rounded to the nearest integer.
fn recommendation_text(pick: u8, win_rate: f64, loss_rate: f64) -> String {
    let w = win_rate.round();
    let l = loss_rate.round();
    if win_rate >= STRONG_RATE && loss_rate >= STRONG_RATE {
        format!("Strong pick {pick}: favourite wins {w:.0}% of recent matches, opponent loses {l:.0}%")
    } else if win_rate >= MEDIUM_RATE && loss_rate >= MEDIUM_RATE {
        format!("Medium pick {pick}: favourite wins {w:.0}% of recent matches, opponent loses {l:.0}%")
    } else {
        format!(
            "Weak edge, bet pick {pick} with caution: favourite wins {w:.0}% of recent matches, opponent loses {l:.0}%"
        )
    }
}
