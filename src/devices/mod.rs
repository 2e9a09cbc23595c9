//! Entity model: appliances, houses and the fleet on one transformer.

/// Appliance kinds, ratings and cycle state.
pub mod appliance;
pub mod fleet;
/// Household model with optional EV.
pub mod house;

pub use appliance::{
    APPLIANCE_SPECS, ApplianceCategory, ApplianceKind, ApplianceSet, ApplianceSpec, CYCLE_KINDS,
    CycleAppliance, CycleKind,
};
pub use fleet::{Fleet, HouseFilter, REFERENCE_FLEET_SIZE};
pub use house::{EV_CHARGE_W, EvState, House, V2G_DISCHARGE_W, V2G_MIN_BATTERY};
