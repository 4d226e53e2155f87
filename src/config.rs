// src/config.rs
//
// Central configuration for the oligosim market engine.
// This is the single source of truth for the economic parameterization
// (demand curve, cost structure, softmax competition, regulatory bounds,
// exogenous shock processes, episode horizon).
//
// Constants are fixed at construction: the engine never re-reads them
// mid-episode, so a Config clone fully pins a market's behavior.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Human-readable config / release version.
    pub version: String,
    /// Demand curve parameters.
    pub demand: DemandConfig,
    /// Per-firm cost structure.
    pub cost: CostConfig,
    /// Softmax competition / innovation effectiveness parameters.
    pub competition: CompetitionConfig,
    /// Regulatory action bounds.
    pub regulation: RegulationConfig,
    /// Exogenous shock process parameters.
    pub shocks: ShockConfig,
    /// Episode lifecycle parameters.
    pub episode: EpisodeConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemandConfig {
    /// Base market size D0 (units per period).
    pub base_demand: f64,
    /// Price elasticity ε: demand scales by exp(-ε · avg_price).
    pub price_elasticity: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostConfig {
    /// Base marginal cost C_base (USD per unit) before shocks.
    pub base_marginal_cost: f64,
    /// Flat capital cost per firm per period (USD).
    pub capital_cost: f64,
    /// Fixed compliance cost per firm per period (USD).
    pub compliance_fixed: f64,
    /// Variable compliance cost τ (USD per unit sold).
    pub compliance_per_unit: f64,
    /// R&D cost coefficient k: rd spend of x costs k·x² this period.
    pub rd_cost_coeff: f64,
    /// Multiplicative hook on marginal cost for regulatory cost regimes.
    /// No rule in the core ever moves this off 1.0.
    pub regulation_factor: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompetitionConfig {
    /// Price sensitivity α in the softmax competitive score.
    pub price_sensitivity: f64,
    /// Base innovation power β0.
    pub innovation_power_base: f64,
    /// Tech progress rate: β grows by this fraction of β0 per step.
    pub tech_progress_rate: f64,
    /// Diminishing-returns coefficient on aggregate innovation stock.
    pub diminishing_returns_coeff: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegulationConfig {
    /// Price ceiling P_max (USD).
    pub price_cap: f64,
    /// Minimum margin above marginal cost: the price floor is C_m + this.
    pub min_margin: f64,
    /// Advisory R&D cap advertised by the action space. The transition
    /// itself accepts any finite non-negative investment.
    pub rd_cap: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShockConfig {
    /// P(Boom → Recession) per step.
    pub boom_to_recession_prob: f64,
    /// P(Recession → Boom) per step.
    pub recession_to_boom_prob: f64,
    /// Demand multiplier in Boom.
    pub boom_multiplier: f64,
    /// Demand multiplier in Recession.
    pub recession_multiplier: f64,
    /// Std of the multiplicative Normal(1, σ) noise on the cycle multiplier.
    pub cycle_noise_std: f64,
    /// Scale σ of the LogNormal(0, σ) supplier cost shock.
    pub supplier_shock_sigma: f64,
    /// Lower clamp of the substitute-pressure random walk.
    pub substitute_pressure_min: f64,
    /// Upper clamp of the substitute-pressure random walk.
    pub substitute_pressure_max: f64,
    /// Std of the Normal(0, σ) increment of the substitute-pressure walk.
    pub substitute_pressure_drift: f64,
    /// Substitute pressure at reset.
    pub initial_substitute_pressure: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpisodeConfig {
    /// Episode horizon T: the episode terminates when time reaches this.
    pub max_steps: u32,
    /// Feasible default price all firms start at after reset (USD).
    pub initial_price: f64,
    /// Discount factor γ for external training consumers. The transition
    /// itself never reads it.
    pub discount: f64,
}

impl Default for Config {
    fn default() -> Self {
        // Canonical market parameterization. τ is defined as 2% of the base
        // marginal cost (0.02 × 80 = 1.6 USD per unit).
        const C_BASE: f64 = 80.0;
        const COMPLIANCE_PER_UNIT: f64 = 0.02 * C_BASE;

        Self {
            version: "oligosim-0.1".to_string(),
            demand: DemandConfig {
                base_demand: 1_000.0,
                price_elasticity: 0.015,
            },
            cost: CostConfig {
                base_marginal_cost: C_BASE,
                capital_cost: 150.0,
                compliance_fixed: 50.0,
                compliance_per_unit: COMPLIANCE_PER_UNIT,
                rd_cost_coeff: 0.05,
                regulation_factor: 1.0,
            },
            competition: CompetitionConfig {
                price_sensitivity: 0.03,
                innovation_power_base: 1.5,
                tech_progress_rate: 0.002,
                diminishing_returns_coeff: 0.01,
            },
            regulation: RegulationConfig {
                price_cap: 250.0,
                min_margin: 1.0,
                rd_cap: 100.0,
            },
            shocks: ShockConfig {
                // Boom is sticky: expected dwell time 20 periods vs 10 for
                // recession.
                boom_to_recession_prob: 0.05,
                recession_to_boom_prob: 0.10,
                boom_multiplier: 1.2,
                recession_multiplier: 0.8,
                cycle_noise_std: 0.02,
                supplier_shock_sigma: 0.05,
                substitute_pressure_min: 0.05,
                substitute_pressure_max: 0.30,
                substitute_pressure_drift: 0.005,
                initial_substitute_pressure: 0.15,
            },
            episode: EpisodeConfig {
                max_steps: 200,
                initial_price: 150.0,
                discount: 0.99,
            },
        }
    }
}

impl Config {
    /// Price floor given a marginal cost: the lowest legal posted price.
    pub fn price_floor(&self, marginal_cost: f64) -> f64 {
        marginal_cost + self.regulation.min_margin
    }
}
