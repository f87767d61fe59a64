use std::collections::HashMap;

use anyhow::Result;
use thiserror::Error;

use crate::ranking::{self, FixtureSource, RankedResult, SearchParams};

/// Identifier of the one shipped strategy.
pub const WINNER_VS_LOSER: &str = "winner-vs-loser";

/// Identifiers recognized as valid strategy names that are not shipped yet.
/// Dispatching to one of these fails with [`StrategyError::NotImplemented`]
/// rather than [`StrategyError::Unknown`], so callers can show "coming soon"
/// instead of treating the input as garbage.
pub const PLANNED_ALGORITHMS: &[&str] = &["most-goals", "over-2.5-goals", "both-teams-to-score"];

/// Dispatch failures, the only request-level errors of [`AlgorithmRegistry::rank`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StrategyError {
    #[error("unknown algorithm `{0}`")]
    Unknown(String),
    #[error("algorithm `{0}` is not implemented yet")]
    NotImplemented(String),
}

/// A named ranking method selectable by callers.
pub trait RankingStrategy {
    /// Unique identifier used for dispatch.
    fn id(&self) -> &'static str;

    fn rank(&self, source: &dyn FixtureSource, params: &SearchParams) -> Result<Vec<RankedResult>>;
}

/// The comparative-form strategy described in [`ranking::rank_winner_vs_loser`].
pub struct WinnerVsLoser;

impl RankingStrategy for WinnerVsLoser {
    fn id(&self) -> &'static str {
        WINNER_VS_LOSER
    }

    fn rank(&self, source: &dyn FixtureSource, params: &SearchParams) -> Result<Vec<RankedResult>> {
        ranking::rank_winner_vs_loser(source, params)
    }
}

/// Maps strategy identifiers to implementations. New strategies plug in via
/// [`AlgorithmRegistry::register`] without touching dispatch.
pub struct AlgorithmRegistry {
    strategies: HashMap<&'static str, Box<dyn RankingStrategy>>,
}

impl Default for AlgorithmRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl AlgorithmRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            strategies: HashMap::new(),
        };
        registry.register(Box::new(WinnerVsLoser));
        registry
    }

    pub fn register(&mut self, strategy: Box<dyn RankingStrategy>) {
        self.strategies.insert(strategy.id(), strategy);
    }

    /// Implemented strategy identifiers, sorted.
    pub fn implemented_ids(&self) -> Vec<&'static str> {
        let mut ids: Vec<&'static str> = self.strategies.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Run the named strategy. Fails with [`StrategyError::Unknown`] or
    /// [`StrategyError::NotImplemented`] (downcastable through the anyhow
    /// chain); any per-candidate trouble inside a strategy is handled there.
    pub fn rank(
        &self,
        algorithm: &str,
        source: &dyn FixtureSource,
        params: &SearchParams,
    ) -> Result<Vec<RankedResult>> {
        if let Some(strategy) = self.strategies.get(algorithm) {
            return strategy.rank(source, params);
        }
        if PLANNED_ALGORITHMS.contains(&algorithm) {
            return Err(StrategyError::NotImplemented(algorithm.to_string()).into());
        }
        Err(StrategyError::Unknown(algorithm.to_string()).into())
    }
}
