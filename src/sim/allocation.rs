//! Greedy first-fit allocation of EV discharge capacity.

use serde::{Deserialize, Serialize};

use crate::devices::{Fleet, V2G_DISCHARGE_W, V2G_MIN_BATTERY};
use crate::error::EngineError;

/// Capacity one EV can offer toward a power target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvCapacity {
    pub id: u32,
    pub available: f64,
}

/// Contribution assigned to one EV.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
    pub id: u32,
    pub give: f64,
}

/// Splits `required` across `evs` greedily in input order.
///
/// Each EV gives `min(available, remaining)` until nothing remains; EVs
/// after that point are left out of the plan. Input order is the only
/// tie-break. When total capacity falls short the plan covers what it can,
/// and the caller detects the gap with [`plan_total`]. Negative capacities
/// are passed through unfiltered. `required <= 0` yields an empty plan.
///
/// # Errors
///
/// Returns [`EngineError::NonFiniteRequirement`] for NaN or infinite
/// `required`.
///
/// # Examples
///
/// ```
/// use gridpulse::sim::allocation::{Allocation, EvCapacity, allocate};
///
/// let evs = [
///     EvCapacity { id: 1, available: 10.0 },
///     EvCapacity { id: 2, available: 5.0 },
/// ];
/// let plan = allocate(&evs, 12.0).unwrap();
/// assert_eq!(
///     plan,
///     vec![Allocation { id: 1, give: 10.0 }, Allocation { id: 2, give: 2.0 }]
/// );
/// ```
pub fn allocate(evs: &[EvCapacity], required: f64) -> Result<Vec<Allocation>, EngineError> {
    if !required.is_finite() {
        return Err(EngineError::NonFiniteRequirement(required));
    }

    let mut remaining = required;
    let mut plan = Vec::new();
    for ev in evs {
        if remaining <= 0.0 {
            break;
        }
        let give = ev.available.min(remaining);
        plan.push(Allocation { id: ev.id, give });
        remaining -= give;
    }
    Ok(plan)
}

/// Sum of contributions in `plan`.
pub fn plan_total(plan: &[Allocation]) -> f64 {
    plan.iter().map(|a| a.give).sum()
}

/// Discharge capacity the fleet can offer this interval, in fleet order.
///
/// Every EV above the V2G reserve offers its full discharge rate (W).
pub fn v2g_capacities(fleet: &Fleet) -> Vec<EvCapacity> {
    fleet
        .houses()
        .iter()
        .filter(|h| h.has_ev() && h.battery() > V2G_MIN_BATTERY)
        .map(|h| EvCapacity {
            id: h.id(),
            available: V2G_DISCHARGE_W,
        })
        .collect()
}

/// An allocation toward a specific power target with its shortfall.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DispatchPlan {
    /// Power the plan was asked to cover (W).
    pub required_w: f64,
    pub allocations: Vec<Allocation>,
    /// Uncovered part of `required_w` (W, >= 0).
    pub shortfall_w: f64,
}

impl DispatchPlan {
    /// Allocates `required_w` over `evs` and records the shortfall.
    ///
    /// # Errors
    ///
    /// Propagates [`EngineError::NonFiniteRequirement`].
    pub fn build(evs: &[EvCapacity], required_w: f64) -> Result<Self, EngineError> {
        let allocations = allocate(evs, required_w)?;
        let shortfall_w = (required_w - plan_total(&allocations)).max(0.0);
        Ok(Self {
            required_w,
            allocations,
            shortfall_w,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::{ApplianceSet, House};

    fn evs() -> Vec<EvCapacity> {
        vec![
            EvCapacity {
                id: 1,
                available: 10.0,
            },
            EvCapacity {
                id: 2,
                available: 5.0,
            },
        ]
    }

    #[test]
    fn partial_fill_stops_early() {
        let plan = allocate(&evs(), 12.0).expect("finite requirement");
        assert_eq!(
            plan,
            vec![
                Allocation { id: 1, give: 10.0 },
                Allocation { id: 2, give: 2.0 }
            ]
        );
    }

    #[test]
    fn shortfall_is_left_to_caller() {
        let plan = allocate(&evs(), 20.0).expect("finite requirement");
        assert_eq!(
            plan,
            vec![
                Allocation { id: 1, give: 10.0 },
                Allocation { id: 2, give: 5.0 }
            ]
        );
        assert_eq!(plan_total(&plan), 15.0);
    }

    #[test]
    fn zero_or_negative_requirement_is_empty() {
        assert!(allocate(&evs(), 0.0).expect("finite").is_empty());
        assert!(allocate(&evs(), -5.0).expect("finite").is_empty());
    }

    #[test]
    fn untouched_evs_are_omitted() {
        let plan = allocate(&evs(), 4.0).expect("finite requirement");
        assert_eq!(plan, vec![Allocation { id: 1, give: 4.0 }]);
    }

    #[test]
    fn input_order_is_the_tie_break() {
        let mut reversed = evs();
        reversed.reverse();
        let plan = allocate(&reversed, 12.0).expect("finite requirement");
        assert_eq!(plan[0], Allocation { id: 2, give: 5.0 });
        assert_eq!(plan[1], Allocation { id: 1, give: 7.0 });
    }

    #[test]
    fn negative_capacity_is_not_filtered() {
        let evs = [
            EvCapacity {
                id: 1,
                available: -2.0,
            },
            EvCapacity {
                id: 2,
                available: 10.0,
            },
        ];
        let plan = allocate(&evs, 5.0).expect("finite requirement");
        assert_eq!(plan[0].give, -2.0);
        assert_eq!(plan[1].give, 7.0);
    }

    #[test]
    fn non_finite_requirement_is_rejected() {
        assert!(matches!(
            allocate(&evs(), f64::NAN),
            Err(EngineError::NonFiniteRequirement(_))
        ));
        assert!(allocate(&evs(), f64::INFINITY).is_err());
    }

    #[test]
    fn dispatch_plan_reports_shortfall() {
        let plan = DispatchPlan::build(&evs(), 20.0).expect("finite requirement");
        assert_eq!(plan.shortfall_w, 5.0);
        let plan = DispatchPlan::build(&evs(), 12.0).expect("finite requirement");
        assert_eq!(plan.shortfall_w, 0.0);
    }

    #[test]
    fn fleet_capacities_respect_reserve() {
        let fleet = Fleet::from_houses(vec![
            House::new(1, true, 80.0, ApplianceSet::default()),
            House::new(2, true, 40.0, ApplianceSet::default()),
            House::new(3, false, 0.0, ApplianceSet::default()),
            House::new(4, true, 41.0, ApplianceSet::default()),
        ])
        .expect("non-empty fleet");
        let ids: Vec<u32> = v2g_capacities(&fleet).iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![1, 4]);
    }
}
