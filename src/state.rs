// src/state.rs
//
// Market state for the oligosim engine.
//
// Field groups:
//  - Exogenous: cycle regime, supplier cost shock, substitute pressure.
//  - Per-firm: posted prices, accumulated innovation stocks, cumulative
//    profit bookkeeping.
//  - Derived (recomputed each step, kept for observability): market shares,
//    shared marginal cost, effective demand.
//
// The state is owned exclusively by `MarketEnv` and mutated exactly once
// per step; every field must be finite after every update.

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::types::{EnvError, Regime, TimeStep, N_FIRMS};

/// Full market state for one episode instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketState {
    /// Step index, 0 ..= max_steps.
    pub time: TimeStep,

    // ----- Exogenous shocks -----
    /// Current macroeconomic cycle state.
    pub regime: Regime,
    /// Multiplicative supplier cost factor (LogNormal, ~1).
    pub supplier_shock: f64,
    /// Substitute-goods pressure, clamped to its configured range.
    pub substitute_pressure: f64,

    // ----- Per-firm decision state -----
    /// Posted prices after constraint enforcement (USD).
    pub prices: [f64; N_FIRMS],
    /// Accumulated R&D stocks; monotone non-decreasing across the episode.
    pub innovation_stocks: [f64; N_FIRMS],
    /// Running profit totals (bookkeeping, not part of the transition).
    pub cumulative_profits: [f64; N_FIRMS],

    // ----- Derived market outcome (last step) -----
    /// Softmax market shares; sum to 1 within floating tolerance.
    pub market_shares: [f64; N_FIRMS],
    /// Shared marginal cost C_m (USD per unit); shocks are symmetric across
    /// firms so a single scalar covers all three.
    pub marginal_cost: f64,
    /// Effective market demand D (units).
    pub effective_demand: f64,
}

impl MarketState {
    /// Starting distribution: Boom regime, neutral shocks, all firms at the
    /// feasible default price with zero innovation and equal shares.
    pub fn new(cfg: &Config) -> Self {
        Self {
            time: 0,
            regime: Regime::Boom,
            supplier_shock: 1.0,
            substitute_pressure: cfg.shocks.initial_substitute_pressure,
            prices: [cfg.episode.initial_price; N_FIRMS],
            innovation_stocks: [0.0; N_FIRMS],
            cumulative_profits: [0.0; N_FIRMS],
            market_shares: [1.0 / N_FIRMS as f64; N_FIRMS],
            marginal_cost: cfg.cost.base_marginal_cost,
            effective_demand: cfg.demand.base_demand,
        }
    }

    /// Simple mean of the three posted prices.
    pub fn average_price(&self) -> f64 {
        self.prices.iter().sum::<f64>() / N_FIRMS as f64
    }

    /// Sum of all firms' innovation stocks.
    pub fn total_innovation(&self) -> f64 {
        self.innovation_stocks.iter().sum()
    }

    /// Check that every scalar field is finite.
    ///
    /// Returns the first offending field; callers abort the step on error so
    /// a NaN never propagates into subsequent periods.
    pub fn validate_finite(&self) -> Result<(), EnvError> {
        let scalars: [(&'static str, f64); 3] = [
            ("supplier_shock", self.supplier_shock),
            ("substitute_pressure", self.substitute_pressure),
            ("marginal_cost", self.marginal_cost),
        ];
        for (field, value) in scalars {
            if !value.is_finite() {
                return Err(EnvError::OutOfRangeState { field, value });
            }
        }
        if !self.effective_demand.is_finite() {
            return Err(EnvError::OutOfRangeState {
                field: "effective_demand",
                value: self.effective_demand,
            });
        }
        for i in 0..N_FIRMS {
            let per_firm: [(&'static str, f64); 4] = [
                ("price", self.prices[i]),
                ("innovation_stock", self.innovation_stocks[i]),
                ("market_share", self.market_shares[i]),
                ("cumulative_profit", self.cumulative_profits[i]),
            ];
            for (field, value) in per_firm {
                if !value.is_finite() {
                    return Err(EnvError::OutOfRangeState { field, value });
                }
            }
        }
        Ok(())
    }
}
