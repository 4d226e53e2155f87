// src/env.rs
//
// Gym-style episode controller for the oligopoly market.
//
// Provides:
// - MarketEnv: reset(seed) -> observation, step(actions) -> StepResult
// - OligopolyEnv: the trait surface external orchestrators consume
// - Deterministic execution given seeds
//
// Step pipeline: constraint enforcement -> shock advancement -> economic
// calculation -> state mutation -> termination check -> observation/reward
// assembly. One step call fully completes before returning; each instance
// owns its RNG and state, so independent instances never share anything.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::constraints::enforce;
use crate::economics::{compute_market_outcome, ProfitComponents};
use crate::observation::{Observation, OBS_DIM};
use crate::shocks::advance_shocks;
use crate::state::MarketState;
use crate::types::{EnvError, FirmAction, Regime, TimeStep, N_FIRMS};

/// Result of a single environment step.
///
/// The market is fully observable and all firms terminate together, so one
/// observation and shared flags cover all three firms; rewards are per-firm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    /// The observation after the transition.
    pub observation: Observation,
    /// Per-firm profit for this period (the reward signal).
    pub rewards: [f64; N_FIRMS],
    /// True exactly when the episode reached its horizon this step.
    pub terminated: bool,
    /// Early-truncation signal; never set by the core itself.
    pub truncated: bool,
    /// Side-channel diagnostics.
    pub info: StepInfo,
}

/// Additional information returned from a step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepInfo {
    /// Termination reason if the episode ended this step.
    pub termination_reason: Option<String>,
    /// Step index after the transition.
    pub time: TimeStep,
    /// Cycle regime after the transition.
    pub regime: Regime,
    /// Supplier shock applied this period.
    pub supplier_shock: f64,
    /// Substitute pressure after the walk update.
    pub substitute_pressure: f64,
    /// Price floor the submitted prices were clamped against.
    pub price_floor: f64,
    /// Per-firm flag: true if the submitted price was clamped.
    pub price_clamped: [bool; N_FIRMS],
    /// Per-firm profit breakdowns.
    pub profit_components: [ProfitComponents; N_FIRMS],
    /// Per-firm running profit totals.
    pub cumulative_profits: [f64; N_FIRMS],
}

/// Per-firm action bounds advertised to samplers and policies.
///
/// The price floor quoted here uses the base marginal cost; the enforced
/// floor each step tracks the shocked marginal cost and may sit higher.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActionSpace {
    pub price_min: f64,
    pub price_max: f64,
    pub rd_min: f64,
    pub rd_max: f64,
}

/// Per-firm observation bounds (loose box over the flat encoding).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObservationSpace {
    pub low: [f64; OBS_DIM],
    pub high: [f64; OBS_DIM],
}

/// Trait surface consumed by external training / evaluation orchestrators.
///
/// Exactly three firms, identified by index 0..N_FIRMS; the roster never
/// changes mid-episode.
pub trait OligopolyEnv {
    /// (Re)start an episode; returns the initial observation.
    fn reset(&mut self, seed: Option<u64>) -> Observation;
    /// Advance the market by one period.
    fn step(&mut self, actions: &[FirmAction; N_FIRMS]) -> Result<StepResult, EnvError>;
    /// Action bounds for one firm.
    fn action_space_for(&self, firm: usize) -> ActionSpace;
    /// Observation bounds for one firm.
    fn observation_space_for(&self, firm: usize) -> ObservationSpace;
}

/// Episode lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Constructed but never reset.
    Created,
    /// Mid-episode; step calls are legal.
    Running,
    /// Horizon reached; reset required before stepping again.
    Terminated,
}

/// Gym-style oligopoly market environment.
///
/// All state transitions are deterministic given the seed: the RNG is owned
/// by the instance, reseeded at reset, and consumed only by the shock
/// processes in a fixed draw order.
pub struct MarketEnv {
    config: Config,
    state: MarketState,
    rng: ChaCha8Rng,
    phase: Phase,
    seed: u64,
}

impl MarketEnv {
    /// Create a new environment. `reset` must be called before `step`.
    pub fn new(config: Config) -> Self {
        let state = MarketState::new(&config);
        Self {
            config,
            state,
            rng: ChaCha8Rng::seed_from_u64(0),
            phase: Phase::Created,
            seed: 0,
        }
    }

    /// Current market state (for tests and telemetry).
    pub fn state(&self) -> &MarketState {
        &self.state
    }

    /// Effective configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Seed of the current episode.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Step index of the current episode.
    pub fn time(&self) -> TimeStep {
        self.state.time
    }

    /// Whether the current episode has reached its horizon.
    pub fn is_terminated(&self) -> bool {
        self.phase == Phase::Terminated
    }

    fn do_reset(&mut self, seed: Option<u64>) -> Observation {
        let seed = seed.unwrap_or_else(|| self.rng.gen());
        self.seed = seed;
        self.rng = ChaCha8Rng::seed_from_u64(seed);
        self.state = MarketState::new(&self.config);
        self.phase = Phase::Running;

        Observation::from_state(&self.state, &self.config)
    }

    fn do_step(&mut self, actions: &[FirmAction; N_FIRMS]) -> Result<StepResult, EnvError> {
        match self.phase {
            Phase::Created => return Err(EnvError::ResetRequired),
            Phase::Terminated => return Err(EnvError::StepAfterTermination),
            Phase::Running => {}
        }

        // 1) Enforce regulatory constraints against the marginal cost of
        //    the state being stepped from. Errors leave state untouched.
        let price_floor = self.config.price_floor(self.state.marginal_cost);
        let enforced = enforce(&self.config.regulation, self.state.marginal_cost, actions)?;

        // 2) Advance the exogenous shock processes.
        let shocks = advance_shocks(
            &self.config.shocks,
            self.state.regime,
            self.state.substitute_pressure,
            &mut self.rng,
        );

        // 3) Accumulate R&D into innovation stocks; this period's spend
        //    already competes this period.
        let time = self.state.time + 1;
        let mut prices = [0.0f64; N_FIRMS];
        let mut stocks = self.state.innovation_stocks;
        let mut rd = [0.0f64; N_FIRMS];
        for i in 0..N_FIRMS {
            prices[i] = enforced.applied[i].price;
            rd[i] = enforced.applied[i].rd_investment;
            stocks[i] += rd[i];
        }

        // 4) Compute the market outcome and abort before mutating state if
        //    anything came out non-finite.
        let outcome = compute_market_outcome(&self.config, time, &prices, &stocks, &rd, &shocks);
        outcome.validate_finite()?;

        // 5) Commit the transition.
        self.state.time = time;
        self.state.regime = shocks.regime;
        self.state.supplier_shock = shocks.supplier_shock;
        self.state.substitute_pressure = shocks.substitute_pressure;
        self.state.prices = prices;
        self.state.innovation_stocks = stocks;
        self.state.market_shares = outcome.market_shares;
        self.state.marginal_cost = outcome.marginal_cost;
        self.state.effective_demand = outcome.effective_demand;
        for i in 0..N_FIRMS {
            self.state.cumulative_profits[i] += outcome.profits[i];
        }
        self.state.validate_finite()?;

        // 6) Termination: exactly at the horizon, never earlier or later.
        let terminated = self.state.time >= self.config.episode.max_steps;
        if terminated {
            self.phase = Phase::Terminated;
        }

        let observation = Observation::from_state(&self.state, &self.config);
        let info = StepInfo {
            termination_reason: terminated.then(|| "Horizon".to_string()),
            time: self.state.time,
            regime: self.state.regime,
            supplier_shock: self.state.supplier_shock,
            substitute_pressure: self.state.substitute_pressure,
            price_floor,
            price_clamped: enforced.price_clamped,
            profit_components: outcome.components,
            cumulative_profits: self.state.cumulative_profits,
        };

        Ok(StepResult {
            observation,
            rewards: outcome.profits,
            terminated,
            truncated: false,
            info,
        })
    }
}

impl OligopolyEnv for MarketEnv {
    fn reset(&mut self, seed: Option<u64>) -> Observation {
        self.do_reset(seed)
    }

    fn step(&mut self, actions: &[FirmAction; N_FIRMS]) -> Result<StepResult, EnvError> {
        self.do_step(actions)
    }

    fn action_space_for(&self, firm: usize) -> ActionSpace {
        debug_assert!(firm < N_FIRMS);
        ActionSpace {
            price_min: self.config.price_floor(self.config.cost.base_marginal_cost),
            price_max: self.config.regulation.price_cap,
            rd_min: 0.0,
            rd_max: self.config.regulation.rd_cap,
        }
    }

    fn observation_space_for(&self, firm: usize) -> ObservationSpace {
        debug_assert!(firm < N_FIRMS);
        // Loose upper bound: prices, stocks, demand and cost are all
        // non-negative and practically far below this.
        ObservationSpace {
            low: [0.0; OBS_DIM],
            high: [1e6; OBS_DIM],
        }
    }
}
