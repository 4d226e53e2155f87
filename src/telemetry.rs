// src/telemetry.rs
//
// JSONL telemetry sink for episode and step records.
//
// Disabled by default; enabled either explicitly with a path or via
// environment variables:
// - OLIGOSIM_TELEMETRY_MODE: "off" (default) or "jsonl"
// - OLIGOSIM_TELEMETRY_PATH: path to the JSONL file
//
// Records are line-delimited JSON: an episode start marker, one tick record
// per step, and an episode end marker. Write failures disable the sink
// rather than failing the simulation.

use std::env;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::env::StepResult;
use crate::types::{Regime, TimeStep, N_FIRMS};

/// One step's telemetry record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickRecord {
    pub record: String,
    pub episode_id: u64,
    pub time: TimeStep,
    pub regime: Regime,
    pub supplier_shock: f64,
    pub substitute_pressure: f64,
    pub effective_demand: f64,
    pub marginal_cost: f64,
    pub prices: [f64; N_FIRMS],
    pub market_shares: [f64; N_FIRMS],
    pub rewards: [f64; N_FIRMS],
    pub cumulative_profits: [f64; N_FIRMS],
    pub price_clamped: [bool; N_FIRMS],
}

impl TickRecord {
    pub fn from_step(episode_id: u64, result: &StepResult) -> Self {
        let obs = &result.observation;
        Self {
            record: "tick".to_string(),
            episode_id,
            time: obs.time,
            regime: obs.regime,
            supplier_shock: obs.supplier_shock,
            substitute_pressure: obs.substitute_pressure,
            effective_demand: obs.effective_demand,
            marginal_cost: obs.marginal_cost,
            prices: obs.prices,
            market_shares: obs.market_shares,
            rewards: result.rewards,
            cumulative_profits: result.info.cumulative_profits,
            price_clamped: result.info.price_clamped,
        }
    }
}

/// Episode boundary marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeMarker {
    pub record: String,
    pub episode_id: u64,
    pub seed: u64,
    /// Steps run (end markers only).
    pub steps: Option<TimeStep>,
    /// Final cumulative profits (end markers only).
    pub cumulative_profits: Option<[f64; N_FIRMS]>,
}

/// JSONL telemetry sink.
pub struct MarketTelemetry {
    enabled: bool,
    path: Option<PathBuf>,
    writer: Option<BufWriter<File>>,
    episode_id: u64,
}

impl Default for MarketTelemetry {
    fn default() -> Self {
        Self::new()
    }
}

impl MarketTelemetry {
    /// Create a disabled sink.
    pub fn new() -> Self {
        Self {
            enabled: false,
            path: None,
            writer: None,
            episode_id: 0,
        }
    }

    /// Create from environment variables (disabled unless configured).
    pub fn from_env() -> Self {
        let enabled = env::var("OLIGOSIM_TELEMETRY_MODE")
            .map(|s| s.to_lowercase() == "jsonl")
            .unwrap_or(false);
        let path = env::var("OLIGOSIM_TELEMETRY_PATH").ok().map(PathBuf::from);

        Self {
            enabled: enabled && path.is_some(),
            path,
            writer: None,
            episode_id: 0,
        }
    }

    /// Enable with an explicit path.
    pub fn enable(path: PathBuf) -> Self {
        Self {
            enabled: true,
            path: Some(path),
            writer: None,
            episode_id: 0,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Log an episode start marker and remember the episode id for ticks.
    pub fn log_episode_start(&mut self, episode_id: u64, seed: u64) {
        self.episode_id = episode_id;
        let marker = EpisodeMarker {
            record: "episode_start".to_string(),
            episode_id,
            seed,
            steps: None,
            cumulative_profits: None,
        };
        self.write_line(&marker);
    }

    /// Log one step record.
    pub fn log_step(&mut self, result: &StepResult) {
        let record = TickRecord::from_step(self.episode_id, result);
        self.write_line(&record);
    }

    /// Log an episode end marker.
    pub fn log_episode_end(
        &mut self,
        seed: u64,
        steps: TimeStep,
        cumulative_profits: [f64; N_FIRMS],
    ) {
        let marker = EpisodeMarker {
            record: "episode_end".to_string(),
            episode_id: self.episode_id,
            seed,
            steps: Some(steps),
            cumulative_profits: Some(cumulative_profits),
        };
        self.write_line(&marker);
    }

    /// Flush buffered records to disk.
    pub fn flush(&mut self) {
        if let Some(writer) = self.writer.as_mut() {
            let _ = writer.flush();
        }
    }

    fn ensure_writer(&mut self) -> Option<&mut BufWriter<File>> {
        if !self.enabled {
            return None;
        }
        if self.writer.is_none() {
            let path = self.path.as_ref()?;
            if let Some(parent) = path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            let file = OpenOptions::new().create(true).append(true).open(path).ok()?;
            self.writer = Some(BufWriter::new(file));
        }
        self.writer.as_mut()
    }

    fn write_line<T: Serialize>(&mut self, record: &T) {
        let line = match serde_json::to_string(record) {
            Ok(s) => s,
            Err(_) => return,
        };
        let Some(writer) = self.ensure_writer() else {
            return;
        };
        if writeln!(writer, "{line}").is_err() {
            self.enabled = false;
            self.writer = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::env::{MarketEnv, OligopolyEnv};
    use crate::types::FirmAction;

    fn run_episode(telemetry: &mut MarketTelemetry, seed: u64, steps: u32) {
        let mut config = Config::default();
        config.episode.max_steps = steps;
        let mut env = MarketEnv::new(config);
        env.reset(Some(seed));

        telemetry.log_episode_start(1, seed);
        let mut last = None;
        for _ in 0..steps {
            let result = env.step(&[FirmAction::new(160.0, 2.0); N_FIRMS]).unwrap();
            telemetry.log_step(&result);
            last = Some(result);
        }
        let last = last.unwrap();
        telemetry.log_episode_end(seed, last.info.time, last.info.cumulative_profits);
        telemetry.flush();
    }

    #[test]
    fn test_disabled_sink_writes_nothing() {
        let mut telemetry = MarketTelemetry::new();
        assert!(!telemetry.is_enabled());
        // Must not panic or create files.
        run_episode(&mut telemetry, 1, 3);
    }

    #[test]
    fn test_jsonl_records_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("telemetry.jsonl");

        let mut telemetry = MarketTelemetry::enable(path.clone());
        run_episode(&mut telemetry, 42, 5);

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        // start + 5 ticks + end
        assert_eq!(lines.len(), 7);

        let start: EpisodeMarker = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(start.record, "episode_start");
        assert_eq!(start.seed, 42);

        for line in &lines[1..6] {
            let tick: TickRecord = serde_json::from_str(line).unwrap();
            assert_eq!(tick.record, "tick");
            let share_sum: f64 = tick.market_shares.iter().sum();
            assert!((share_sum - 1.0).abs() < 1e-9);
        }

        let end: EpisodeMarker = serde_json::from_str(lines[6]).unwrap();
        assert_eq!(end.record, "episode_end");
        assert_eq!(end.steps, Some(5));
    }

    #[test]
    fn test_telemetry_byte_stable_for_fixed_seed() {
        let dir = tempfile::tempdir().unwrap();
        let path1 = dir.path().join("a.jsonl");
        let path2 = dir.path().join("b.jsonl");

        let mut t1 = MarketTelemetry::enable(path1.clone());
        run_episode(&mut t1, 7, 4);
        let mut t2 = MarketTelemetry::enable(path2.clone());
        run_episode(&mut t2, 7, 4);

        let a = std::fs::read(&path1).unwrap();
        let b = std::fs::read(&path2).unwrap();
        assert_eq!(a, b);
    }
}
