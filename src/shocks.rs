// src/shocks.rs
//
// Exogenous shock process generator.
//
// Advances the three non-stationary drivers of the market by exactly one
// step from an explicit, episode-owned RNG:
//  - economic cycle regime (two-state Markov chain + multiplicative noise),
//  - supplier cost shock (LogNormal, redrawn each step),
//  - substitute-goods pressure (bounded Normal random walk).
//
// The four draws happen in a fixed order (regime uniform, cycle noise,
// supplier shock, substitute increment) so a fixed seed reproduces the
// entire shock trajectory bit-for-bit. Normal variates are taken from
// StandardNormal and scaled in place; the scale parameters come from config
// and are applied affinely, which keeps construction infallible.

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};

use crate::config::ShockConfig;
use crate::types::Regime;

/// Exogenous shock values for one market period.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShockDraw {
    /// Cycle regime after the Markov transition.
    pub regime: Regime,
    /// Demand multiplier: regime multiplier times Normal(1, σ) noise.
    pub cycle_multiplier: f64,
    /// Multiplicative supplier cost factor, LogNormal(0, σ).
    pub supplier_shock: f64,
    /// Substitute pressure after the clamped random-walk update.
    pub substitute_pressure: f64,
}

/// Advance all three shock processes by one step.
///
/// `regime` and `substitute_pressure` are the values carried in the current
/// state; the supplier shock is memoryless and redrawn from scratch.
pub fn advance_shocks(
    cfg: &ShockConfig,
    regime: Regime,
    substitute_pressure: f64,
    rng: &mut ChaCha8Rng,
) -> ShockDraw {
    // 1) Regime Markov transition.
    let u: f64 = rng.gen();
    let next_regime = match regime {
        Regime::Boom => {
            if u < cfg.boom_to_recession_prob {
                Regime::Recession
            } else {
                Regime::Boom
            }
        }
        Regime::Recession => {
            if u < cfg.recession_to_boom_prob {
                Regime::Boom
            } else {
                Regime::Recession
            }
        }
    };

    // 2) Cycle multiplier with multiplicative Normal(1, σ) noise.
    let base_mult = match next_regime {
        Regime::Boom => cfg.boom_multiplier,
        Regime::Recession => cfg.recession_multiplier,
    };
    let noise: f64 = rng.sample::<f64, _>(StandardNormal);
    let cycle_multiplier = base_mult * (1.0 + cfg.cycle_noise_std * noise);

    // 3) Supplier shock: LogNormal(0, σ) = exp(σ · z).
    let z: f64 = rng.sample::<f64, _>(StandardNormal);
    let supplier_shock = (cfg.supplier_shock_sigma * z).exp();

    // 4) Substitute pressure: bounded random walk.
    let incr: f64 = rng.sample::<f64, _>(StandardNormal);
    let substitute_pressure = (substitute_pressure + cfg.substitute_pressure_drift * incr)
        .clamp(cfg.substitute_pressure_min, cfg.substitute_pressure_max);

    ShockDraw {
        regime: next_regime,
        cycle_multiplier,
        supplier_shock,
        substitute_pressure,
    }
}
