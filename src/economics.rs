// src/economics.rs
//
// Economic calculator: pure mapping from (state snapshot, enforced actions,
// shock draw) to market outcomes. No internal state and no RNG access, so
// every result is re-derivable from its inputs alone.
//
// Model, per period:
//   C_m  = C_base · supplier_shock · regulation_factor
//   D    = D0 · cycle_mult · exp(-ε · P_avg) · (1 − substitute_pressure)
//   β(t) = β0 · (1 + progress · t) / (1 + diminishing · I_total)
//   S_i  = softmax_i(-α · P_i + β(t) · I_i)          (max-subtracted)
//   Q_i  = S_i · D
//   π_i  = P_i·Q_i − C_m·Q_i − k·rd_i² − C_capital − (C_fixed + τ·Q_i)

use serde::{Deserialize, Serialize};

use crate::config::{CompetitionConfig, Config, CostConfig, DemandConfig};
use crate::shocks::ShockDraw;
use crate::types::{TimeStep, N_FIRMS};

/// Per-firm profit breakdown for one period.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProfitComponents {
    /// P_i · Q_i.
    pub revenue: f64,
    /// C_m · Q_i.
    pub production_cost: f64,
    /// k · rd_i².
    pub rd_cost: f64,
    /// Flat capital cost.
    pub capital_cost: f64,
    /// Fixed + per-unit compliance cost.
    pub compliance_cost: f64,
}

impl ProfitComponents {
    /// Net profit implied by the breakdown.
    pub fn profit(&self) -> f64 {
        self.revenue
            - self.production_cost
            - self.rd_cost
            - self.capital_cost
            - self.compliance_cost
    }
}

/// Full market outcome for one period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketOutcome {
    /// Shared marginal cost C_m under the period's supplier shock.
    pub marginal_cost: f64,
    /// Effective market demand D (units).
    pub effective_demand: f64,
    /// Innovation effectiveness β(t) used for the share allocation.
    pub innovation_effectiveness: f64,
    /// Softmax market shares (sum to 1).
    pub market_shares: [f64; N_FIRMS],
    /// Quantities sold Q_i = S_i · D.
    pub quantities: [f64; N_FIRMS],
    /// Per-firm profits (the per-step rewards).
    pub profits: [f64; N_FIRMS],
    /// Per-firm profit breakdowns.
    pub components: [ProfitComponents; N_FIRMS],
}

/// Marginal cost under the current supplier shock.
pub fn marginal_cost(cost: &CostConfig, supplier_shock: f64) -> f64 {
    cost.base_marginal_cost * supplier_shock * cost.regulation_factor
}

/// Effective demand after the cycle multiplier, buyer-power elasticity on
/// the average posted price, and substitute-goods pressure.
pub fn effective_demand(
    demand: &DemandConfig,
    cycle_multiplier: f64,
    avg_price: f64,
    substitute_pressure: f64,
) -> f64 {
    demand.base_demand
        * cycle_multiplier
        * (-demand.price_elasticity * avg_price).exp()
        * (1.0 - substitute_pressure)
}

/// Time-varying innovation effectiveness β(t).
///
/// Grows with elapsed time (tech progress) and shrinks as the aggregate
/// innovation stock accumulates (saturation). With zero aggregate stock the
/// diminishing-returns factor is exactly 1.
pub fn innovation_effectiveness(
    comp: &CompetitionConfig,
    time: TimeStep,
    total_innovation: f64,
) -> f64 {
    comp.innovation_power_base * (1.0 + comp.tech_progress_rate * time as f64)
        / (1.0 + comp.diminishing_returns_coeff * total_innovation)
}

/// Softmax market shares over the competitive score -α·P_i + β·I_i.
///
/// The maximum score is subtracted before exponentiating. Softmax is
/// shift-invariant, so the result is unchanged, but without the shift large
/// β·I terms overflow exp() once innovation stocks have grown over a long
/// horizon.
pub fn market_shares(
    comp: &CompetitionConfig,
    prices: &[f64; N_FIRMS],
    innovation_stocks: &[f64; N_FIRMS],
    beta: f64,
) -> [f64; N_FIRMS] {
    let mut scores = [0.0f64; N_FIRMS];
    for i in 0..N_FIRMS {
        scores[i] = -comp.price_sensitivity * prices[i] + beta * innovation_stocks[i];
    }

    let max_score = scores.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b));

    let mut shares = [0.0f64; N_FIRMS];
    let mut sum = 0.0;
    for i in 0..N_FIRMS {
        shares[i] = (scores[i] - max_score).exp();
        sum += shares[i];
    }
    for s in &mut shares {
        *s /= sum;
    }
    shares
}

/// Compute the full market outcome for one period.
///
/// `time` is the index of the period being computed (post-increment),
/// `prices` are the enforced prices, `innovation_stocks` already include
/// this period's R&D.
pub fn compute_market_outcome(
    cfg: &Config,
    time: TimeStep,
    prices: &[f64; N_FIRMS],
    innovation_stocks: &[f64; N_FIRMS],
    rd_investments: &[f64; N_FIRMS],
    shocks: &ShockDraw,
) -> MarketOutcome {
    let c_m = marginal_cost(&cfg.cost, shocks.supplier_shock);

    let avg_price = prices.iter().sum::<f64>() / N_FIRMS as f64;
    let demand = effective_demand(
        &cfg.demand,
        shocks.cycle_multiplier,
        avg_price,
        shocks.substitute_pressure,
    );

    let total_innovation: f64 = innovation_stocks.iter().sum();
    let beta = innovation_effectiveness(&cfg.competition, time, total_innovation);

    let shares = market_shares(&cfg.competition, prices, innovation_stocks, beta);

    let mut quantities = [0.0f64; N_FIRMS];
    let mut profits = [0.0f64; N_FIRMS];
    let mut components = [ProfitComponents {
        revenue: 0.0,
        production_cost: 0.0,
        rd_cost: 0.0,
        capital_cost: 0.0,
        compliance_cost: 0.0,
    }; N_FIRMS];

    for i in 0..N_FIRMS {
        let q = shares[i] * demand;
        quantities[i] = q;

        let c = ProfitComponents {
            revenue: prices[i] * q,
            production_cost: c_m * q,
            rd_cost: cfg.cost.rd_cost_coeff * rd_investments[i] * rd_investments[i],
            capital_cost: cfg.cost.capital_cost,
            compliance_cost: cfg.cost.compliance_fixed + cfg.cost.compliance_per_unit * q,
        };
        profits[i] = c.profit();
        components[i] = c;
    }

    MarketOutcome {
        marginal_cost: c_m,
        effective_demand: demand,
        innovation_effectiveness: beta,
        market_shares: shares,
        quantities,
        profits,
        components,
    }
}

impl MarketOutcome {
    /// Check that every computed value is finite; returns the first
    /// offending field so the step can abort before mutating state.
    pub fn validate_finite(&self) -> Result<(), crate::types::EnvError> {
        use crate::types::EnvError;

        let scalars: [(&'static str, f64); 3] = [
            ("marginal_cost", self.marginal_cost),
            ("effective_demand", self.effective_demand),
            ("innovation_effectiveness", self.innovation_effectiveness),
        ];
        for (field, value) in scalars {
            if !value.is_finite() {
                return Err(EnvError::OutOfRangeState { field, value });
            }
        }
        for i in 0..N_FIRMS {
            let per_firm: [(&'static str, f64); 3] = [
                ("market_share", self.market_shares[i]),
                ("quantity", self.quantities[i]),
                ("profit", self.profits[i]),
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
