// src/observation.rs
//
// Versioned observation schema for the market environment.
//
// Design requirements:
// - Versioned (obs_version field) for schema evolution
// - Serializable (serde) for logging and replay
// - Deterministic field ordering (fixed arrays, no maps)
// - A stable flat-vector encoding for policy input
//
// All firms receive the same observation: the market is fully observable
// and there is no information asymmetry between firms.

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::state::MarketState;
use crate::types::{Regime, TimeStep, N_FIRMS};

/// Current observation schema version.
/// Increment when adding/removing/changing fields.
pub const OBS_VERSION: u32 = 1;

/// Length of the flat observation vector.
pub const OBS_DIM: usize = 17;

/// Structured market observation.
///
/// `to_vector` produces the canonical flat encoding; the struct itself is
/// the serializable form used by telemetry and replay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Schema version for forwards/backwards compatibility.
    pub obs_version: u32,
    /// Step index this observation was taken at.
    pub time: TimeStep,
    /// time / max_steps, in [0, 1].
    pub time_normalized: f64,

    // ----- Per-firm state -----
    /// Posted prices (USD).
    pub prices: [f64; N_FIRMS],
    /// Accumulated innovation stocks.
    pub innovation_stocks: [f64; N_FIRMS],
    /// Market shares from the latest allocation.
    pub market_shares: [f64; N_FIRMS],

    // ----- Shared market state -----
    /// Shared marginal cost C_m (USD per unit).
    pub marginal_cost: f64,
    /// Effective market demand D (units).
    pub effective_demand: f64,
    /// Current cycle regime.
    pub regime: Regime,
    /// Multiplicative supplier cost factor.
    pub supplier_shock: f64,
    /// Substitute-goods pressure.
    pub substitute_pressure: f64,
}

impl Observation {
    /// Build an observation from the current market state.
    pub fn from_state(state: &MarketState, cfg: &Config) -> Self {
        Self {
            obs_version: OBS_VERSION,
            time: state.time,
            time_normalized: state.time as f64 / cfg.episode.max_steps as f64,
            prices: state.prices,
            innovation_stocks: state.innovation_stocks,
            market_shares: state.market_shares,
            marginal_cost: state.marginal_cost,
            effective_demand: state.effective_demand,
            regime: state.regime,
            supplier_shock: state.supplier_shock,
            substitute_pressure: state.substitute_pressure,
        }
    }

    /// Flat vector encoding, stable across an episode and across runs.
    ///
    /// Layout (17 entries):
    /// ```text
    ///  0..3   prices[0..3]
    ///  3..6   innovation_stocks[0..3]
    ///  6..9   market_shares[0..3]
    ///  9      marginal_cost
    /// 10      effective_demand
    /// 11      regime (Boom = 1, Recession = 0)
    /// 12      supplier_shock
    /// 13      substitute_pressure
    /// 14      time_normalized
    /// 15..17  reserved (always 0)
    /// ```
    pub fn to_vector(&self) -> [f64; OBS_DIM] {
        let mut v = [0.0f64; OBS_DIM];
        v[0..3].copy_from_slice(&self.prices);
        v[3..6].copy_from_slice(&self.innovation_stocks);
        v[6..9].copy_from_slice(&self.market_shares);
        v[9] = self.marginal_cost;
        v[10] = self.effective_demand;
        v[11] = self.regime.as_scalar();
        v[12] = self.supplier_shock;
        v[13] = self.substitute_pressure;
        v[14] = self.time_normalized;
        // v[15], v[16] reserved.
        v
    }

    /// Serialize to JSON bytes for deterministic comparison.
    ///
    /// Struct field order is fixed, so equal observations produce
    /// byte-identical JSON.
    pub fn to_canonical_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (Config, MarketState) {
        let cfg = Config::default();
        let mut state = MarketState::new(&cfg);
        state.time = 50;
        state.prices = [100.0, 150.0, 200.0];
        state.innovation_stocks = [1.0, 2.0, 3.0];
        state.market_shares = [0.5, 0.3, 0.2];
        state.marginal_cost = 84.0;
        state.effective_demand = 123.0;
        state.regime = Regime::Recession;
        state.supplier_shock = 1.05;
        state.substitute_pressure = 0.2;
        (cfg, state)
    }

    #[test]
    fn test_vector_layout() {
        let (cfg, state) = setup();
        let obs = Observation::from_state(&state, &cfg);
        let v = obs.to_vector();

        assert_eq!(v.len(), OBS_DIM);
        assert_eq!(&v[0..3], &[100.0, 150.0, 200.0]);
        assert_eq!(&v[3..6], &[1.0, 2.0, 3.0]);
        assert_eq!(&v[6..9], &[0.5, 0.3, 0.2]);
        assert_eq!(v[9], 84.0);
        assert_eq!(v[10], 123.0);
        assert_eq!(v[11], 0.0); // Recession
        assert_eq!(v[12], 1.05);
        assert_eq!(v[13], 0.2);
        assert_eq!(v[14], 50.0 / 200.0);
        assert_eq!(v[15], 0.0);
        assert_eq!(v[16], 0.0);
    }

    #[test]
    fn test_canonical_json_deterministic() {
        let (cfg, state) = setup();
        let obs1 = Observation::from_state(&state, &cfg);
        let obs2 = Observation::from_state(&state, &cfg);

        assert_eq!(
            obs1.to_canonical_json().unwrap(),
            obs2.to_canonical_json().unwrap()
        );
    }

    #[test]
    fn test_observation_roundtrip() {
        let (cfg, state) = setup();
        let obs = Observation::from_state(&state, &cfg);

        let json = serde_json::to_string(&obs).unwrap();
        let parsed: Observation = serde_json::from_str(&json).unwrap();
        assert_eq!(obs, parsed);
    }

    #[test]
    fn test_initial_observation_values() {
        let cfg = Config::default();
        let state = MarketState::new(&cfg);
        let obs = Observation::from_state(&state, &cfg);

        assert_eq!(obs.obs_version, OBS_VERSION);
        assert_eq!(obs.time, 0);
        assert_eq!(obs.time_normalized, 0.0);
        assert_eq!(obs.regime, Regime::Boom);
        let v = obs.to_vector();
        assert!(v.iter().all(|x| x.is_finite()));
    }
}
