// src/constraints.rs
//
// Regulatory constraint enforcement for submitted actions.
//
// Prices must lie in [C_m + min_margin, price_cap], where C_m is the
// marginal cost of the state being stepped from (the bound firms could
// observe when choosing). Out-of-range prices are clamped to the nearest
// bound and flagged per firm, so an exploring policy never aborts the
// episode. Non-finite fields and negative R&D are contract violations and
// fail the call outright.

use serde::{Deserialize, Serialize};

use crate::config::RegulationConfig;
use crate::types::{EnvError, FirmAction, N_FIRMS};

/// Result of constraint enforcement over one joint action.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnforcedActions {
    /// Actions after clamping; these are what the market actually sees.
    pub applied: [FirmAction; N_FIRMS],
    /// Per-firm flag: true if the submitted price was clamped.
    pub price_clamped: [bool; N_FIRMS],
}

/// Validate and clamp one joint action against the current legal bounds.
pub fn enforce(
    regulation: &RegulationConfig,
    marginal_cost: f64,
    actions: &[FirmAction; N_FIRMS],
) -> Result<EnforcedActions, EnvError> {
    let floor = marginal_cost + regulation.min_margin;
    let cap = regulation.price_cap;

    let mut applied = *actions;
    let mut price_clamped = [false; N_FIRMS];

    for (firm, action) in actions.iter().enumerate() {
        if !action.price.is_finite() {
            return Err(EnvError::InvalidActionShape {
                firm,
                field: "price",
                value: action.price,
            });
        }
        if !action.rd_investment.is_finite() {
            return Err(EnvError::InvalidActionShape {
                firm,
                field: "rd_investment",
                value: action.rd_investment,
            });
        }
        if action.rd_investment < 0.0 {
            return Err(EnvError::NegativeInvestment {
                firm,
                value: action.rd_investment,
            });
        }

        let clamped = action.price.clamp(floor, cap);
        if clamped != action.price {
            price_clamped[firm] = true;
        }
        applied[firm].price = clamped;
    }

    Ok(EnforcedActions {
        applied,
        price_clamped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn regulation() -> RegulationConfig {
        Config::default().regulation
    }

    #[test]
    fn test_in_range_actions_pass_through() {
        let reg = regulation();
        let actions = [
            FirmAction::new(150.0, 10.0),
            FirmAction::new(200.0, 0.0),
            FirmAction::new(81.0, 5.0),
        ];

        let enforced = enforce(&reg, 80.0, &actions).unwrap();
        assert_eq!(enforced.applied, actions);
        assert_eq!(enforced.price_clamped, [false; N_FIRMS]);
    }

    #[test]
    fn test_price_above_cap_clamps_to_cap() {
        let reg = regulation();
        let actions = [
            FirmAction::new(250.0 + 1e-6, 0.0),
            FirmAction::new(500.0, 0.0),
            FirmAction::new(250.0, 0.0),
        ];

        let enforced = enforce(&reg, 80.0, &actions).unwrap();
        assert_eq!(enforced.applied[0].price, 250.0);
        assert_eq!(enforced.applied[1].price, 250.0);
        assert_eq!(enforced.applied[2].price, 250.0);
        assert_eq!(enforced.price_clamped, [true, true, false]);
    }

    #[test]
    fn test_price_below_floor_clamps_to_floor() {
        let reg = regulation();
        let actions = [
            FirmAction::new(10.0, 0.0),
            FirmAction::new(81.0, 0.0),
            FirmAction::new(80.999, 0.0),
        ];

        let enforced = enforce(&reg, 80.0, &actions).unwrap();
        assert_eq!(enforced.applied[0].price, 81.0);
        assert_eq!(enforced.applied[1].price, 81.0);
        assert_eq!(enforced.applied[2].price, 81.0);
        assert_eq!(enforced.price_clamped, [true, false, true]);
    }

    #[test]
    fn test_floor_tracks_marginal_cost() {
        let reg = regulation();
        let actions = [FirmAction::new(85.0, 0.0); N_FIRMS];

        // With a supplier shock pushing C_m to 90, 85 is below the floor.
        let enforced = enforce(&reg, 90.0, &actions).unwrap();
        assert_eq!(enforced.applied[0].price, 91.0);
        assert!(enforced.price_clamped[0]);
    }

    #[test]
    fn test_negative_rd_is_fatal() {
        let reg = regulation();
        let actions = [
            FirmAction::new(150.0, 0.0),
            FirmAction::new(150.0, -0.5),
            FirmAction::new(150.0, 0.0),
        ];

        let err = enforce(&reg, 80.0, &actions).unwrap_err();
        assert_eq!(
            err,
            EnvError::NegativeInvestment {
                firm: 1,
                value: -0.5
            }
        );
    }

    #[test]
    fn test_non_finite_fields_are_fatal() {
        let reg = regulation();

        let mut actions = [FirmAction::new(150.0, 0.0); N_FIRMS];
        actions[2].price = f64::NAN;
        let err = enforce(&reg, 80.0, &actions).unwrap_err();
        assert!(matches!(
            err,
            EnvError::InvalidActionShape {
                firm: 2,
                field: "price",
                ..
            }
        ));

        let mut actions = [FirmAction::new(150.0, 0.0); N_FIRMS];
        actions[0].rd_investment = f64::INFINITY;
        let err = enforce(&reg, 80.0, &actions).unwrap_err();
        assert!(matches!(
            err,
            EnvError::InvalidActionShape {
                firm: 0,
                field: "rd_investment",
                ..
            }
        ));
    }
}
