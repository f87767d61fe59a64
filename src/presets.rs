use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// A league the assistant tracks, with its import priority.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaguePreset {
    pub league_id: u32,
    pub name: String,
    pub country: String,
    #[serde(default)]
    pub priority: u32,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

/// Where presets live between runs; callers never touch file I/O directly.
pub trait PresetStore {
    fn load(&self) -> Result<Vec<LeaguePreset>>;
    fn save(&self, presets: &[LeaguePreset]) -> Result<()>;
}

/// Enabled league ids, highest priority first.
pub fn enabled_league_ids(presets: &[LeaguePreset]) -> Vec<u32> {
    let mut enabled: Vec<&LeaguePreset> = presets.iter().filter(|p| p.enabled).collect();
    enabled.sort_by(|a, b| b.priority.cmp(&a.priority).then(a.league_id.cmp(&b.league_id)));
    enabled.iter().map(|p| p.league_id).collect()
}

/// JSON-file store used by the binaries.
#[derive(Debug, Clone)]
pub struct JsonPresetStore {
    path: PathBuf,
}

impl JsonPresetStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl PresetStore for JsonPresetStore {
    fn load(&self) -> Result<Vec<LeaguePreset>> {
        let Ok(raw) = fs::read_to_string(&self.path) else {
            return Ok(Vec::new());
        };
        serde_json::from_str(&raw)
            .with_context(|| format!("invalid preset file {}", self.path.display()))
    }

    fn save(&self, presets: &[LeaguePreset]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            let _ = fs::create_dir_all(parent);
        }
        let json = serde_json::to_string_pretty(presets).context("serialize presets")?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).context("write presets")?;
        fs::rename(&tmp, &self.path).context("swap presets")?;
        Ok(())
    }
}

/// Shared in-memory store for tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPresetStore {
    inner: Arc<Mutex<Vec<LeaguePreset>>>,
}

impl InMemoryPresetStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PresetStore for InMemoryPresetStore {
    fn load(&self) -> Result<Vec<LeaguePreset>> {
        Ok(self.inner.lock().expect("preset store lock poisoned").clone())
    }

    fn save(&self, presets: &[LeaguePreset]) -> Result<()> {
        *self.inner.lock().expect("preset store lock poisoned") = presets.to_vec();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn preset(id: u32, priority: u32, enabled: bool) -> LeaguePreset {
        LeaguePreset {
            league_id: id,
            name: format!("League {id}"),
            country: "England".to_string(),
            priority,
            enabled,
        }
    }

    #[test]
    fn enabled_ids_ordered_by_priority() {
        let presets = vec![preset(39, 1, true), preset(140, 5, true), preset(61, 3, false)];
        assert_eq!(enabled_league_ids(&presets), vec![140, 39]);
    }

    #[test]
    fn in_memory_round_trip() {
        let store = InMemoryPresetStore::new();
        let presets = vec![preset(39, 1, true)];
        store.save(&presets).unwrap();
        assert_eq!(store.load().unwrap(), presets);
    }

    #[test]
    fn missing_preset_field_defaults_to_enabled() {
        let raw = r#"[{"league_id": 39, "name": "Premier League", "country": "England"}]"#;
        let presets: Vec<LeaguePreset> = serde_json::from_str(raw).unwrap();
        assert!(presets[0].enabled);
        assert_eq!(presets[0].priority, 0);
    }
}
