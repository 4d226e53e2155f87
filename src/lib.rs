//! Oligosim core library.
//!
//! A repeated-oligopoly market simulator: three firms choose price and R&D
//! investment each period; the engine computes demand, market shares, costs,
//! and profits under exogenous shocks and exposes the outcome through a
//! gym-style `reset`/`step` interface. The binary (`src/main.rs`) is just a
//! thin research harness around these components.
//!
//! # Architecture
//!
//! The codebase separates the economic model from episode orchestration:
//!
//! - **Config** (`config`): the full market parameterization; cloning a
//!   config pins a market's behavior.
//!
//! - **Shock processes** (`shocks`): the exogenous drivers (cycle regime,
//!   supplier cost shock, substitute pressure), advanced one step at a time
//!   from an explicit episode-owned RNG.
//!
//! - **Economics** (`economics`): pure functions from state snapshots and
//!   enforced actions to market outcomes. No internal state, no RNG.
//!
//! - **Constraints** (`constraints`): regulatory action validation; prices
//!   are clamped and flagged, contract violations fail the call.
//!
//! - **Environment** (`env`): the episode controller owning `MarketState`
//!   and the RNG, with deterministic execution given seeds.
//!
//! - **Observation** (`observation`): versioned, serializable state
//!   snapshot plus the stable 17-entry flat encoding for policy input.
//!
//! - **Telemetry** (`telemetry`): opt-in JSONL episode/step records.
//!
//! Determinism contract: for a fixed seed and a fixed action sequence the
//! entire trajectory (shocks, shares, profits, observations) is
//! bit-reproducible. Each environment instance owns its RNG and state, so
//! independent instances can be driven in parallel without locking.

pub mod config;
pub mod constraints;
pub mod economics;
pub mod env;
pub mod observation;
pub mod shocks;
pub mod state;
pub mod telemetry;
pub mod types;

// --- Re-exports for ergonomic external use ---------------------------------

pub use config::{
    CompetitionConfig, Config, CostConfig, DemandConfig, EpisodeConfig, RegulationConfig,
    ShockConfig,
};

pub use constraints::{enforce, EnforcedActions};

pub use economics::{
    compute_market_outcome, effective_demand, innovation_effectiveness, marginal_cost,
    market_shares, MarketOutcome, ProfitComponents,
};

pub use env::{
    ActionSpace, MarketEnv, ObservationSpace, OligopolyEnv, StepInfo, StepResult,
};

pub use observation::{Observation, OBS_DIM, OBS_VERSION};

pub use shocks::{advance_shocks, ShockDraw};

pub use state::MarketState;

pub use telemetry::{EpisodeMarker, MarketTelemetry, TickRecord};

pub use types::{EnvError, FirmAction, Regime, TimeStep, N_FIRMS};
