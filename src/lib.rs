//! Football betting assistant: ingest match data from a sports API into
//! SQLite, then rank upcoming fixtures by each team's recent form.
//!
//! The core lives in [`stats`], [`scoring`], [`ranking`] and [`registry`];
//! [`match_store`], [`api_fetch`], [`rate_limit`], [`ingest`] and [`presets`]
//! are the surrounding plumbing the binaries wire together.

pub mod api_fetch;
pub mod ingest;
pub mod match_store;
pub mod presets;
pub mod ranking;
pub mod rate_limit;
pub mod registry;
pub mod scoring;
pub mod stats;
