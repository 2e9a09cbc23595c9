//! Appliance kinds, their static specs, and per-house appliance state.

use serde::Serialize;

/// Appliance category used for load accounting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplianceCategory {
    /// Continuously-on climate load.
    Hvac,
    /// Bounded-duration task tracked by progress.
    Cycle,
}

/// Every appliance kind a house can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplianceKind {
    Ac,
    Washer,
    Dryer,
    Dishwasher,
}

/// Cycle appliance kinds in fleet-generation and step order.
pub const CYCLE_KINDS: [CycleKind; 3] = [CycleKind::Washer, CycleKind::Dryer, CycleKind::Dishwasher];

/// The subset of [`ApplianceKind`] that runs progress-tracked cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CycleKind {
    Washer,
    Dryer,
    Dishwasher,
}

impl From<CycleKind> for ApplianceKind {
    fn from(kind: CycleKind) -> Self {
        match kind {
            CycleKind::Washer => ApplianceKind::Washer,
            CycleKind::Dryer => ApplianceKind::Dryer,
            CycleKind::Dishwasher => ApplianceKind::Dishwasher,
        }
    }
}

/// Static rating and category of one appliance kind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ApplianceSpec {
    pub kind: ApplianceKind,
    /// Nameplate draw while running (W).
    pub watts: f64,
    pub category: ApplianceCategory,
}

/// Read-only appliance table shared by every component.
pub const APPLIANCE_SPECS: [ApplianceSpec; 4] = [
    ApplianceSpec {
        kind: ApplianceKind::Ac,
        watts: 3500.0,
        category: ApplianceCategory::Hvac,
    },
    ApplianceSpec {
        kind: ApplianceKind::Washer,
        watts: 2100.0,
        category: ApplianceCategory::Cycle,
    },
    ApplianceSpec {
        kind: ApplianceKind::Dryer,
        watts: 5000.0,
        category: ApplianceCategory::Cycle,
    },
    ApplianceSpec {
        kind: ApplianceKind::Dishwasher,
        watts: 1800.0,
        category: ApplianceCategory::Cycle,
    },
];

impl ApplianceKind {
    /// Returns the static spec for this kind.
    pub fn spec(self) -> &'static ApplianceSpec {
        match self {
            ApplianceKind::Ac => &APPLIANCE_SPECS[0],
            ApplianceKind::Washer => &APPLIANCE_SPECS[1],
            ApplianceKind::Dryer => &APPLIANCE_SPECS[2],
            ApplianceKind::Dishwasher => &APPLIANCE_SPECS[3],
        }
    }

    /// Nameplate draw in watts.
    pub fn watts(self) -> f64 {
        self.spec().watts
    }
}

/// Run state of a cycle appliance.
///
/// `progress` is a percentage in `[0, 100)` and is always `0` while idle.
/// Fields are private so the only transitions are the ones below.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct CycleAppliance {
    active: bool,
    progress: f64,
}

impl CycleAppliance {
    /// An idle appliance.
    pub fn idle() -> Self {
        Self::default()
    }

    /// An appliance mid-cycle at `progress` percent.
    ///
    /// Progress at or beyond 100 yields an idle appliance, as a finished
    /// cycle would.
    pub fn running(progress: f64) -> Self {
        if progress >= 100.0 {
            return Self::idle();
        }
        Self {
            active: true,
            progress: progress.max(0.0),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }

    /// Begins a fresh cycle at zero progress.
    pub fn start(&mut self) {
        self.active = true;
        self.progress = 0.0;
    }

    /// Stops the cycle and clears progress.
    pub fn stop(&mut self) {
        self.active = false;
        self.progress = 0.0;
    }

    /// Advances an active cycle by `delta` percent, completing it at 100.
    ///
    /// Returns `true` when this call completed the cycle. Idle appliances
    /// are left untouched.
    pub fn advance(&mut self, delta: f64) -> bool {
        if !self.active {
            return false;
        }
        self.progress += delta;
        if self.progress >= 100.0 {
            self.stop();
            return true;
        }
        false
    }
}

/// Fixed per-house appliance record, one field per kind.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ApplianceSet {
    /// Whether the house has an AC unit. Its on/off state is derived from
    /// the house's suppression flag.
    pub ac: bool,
    pub washer: CycleAppliance,
    pub dryer: CycleAppliance,
    pub dishwasher: CycleAppliance,
}

impl ApplianceSet {
    pub fn cycle(&self, kind: CycleKind) -> &CycleAppliance {
        match kind {
            CycleKind::Washer => &self.washer,
            CycleKind::Dryer => &self.dryer,
            CycleKind::Dishwasher => &self.dishwasher,
        }
    }

    pub fn cycle_mut(&mut self, kind: CycleKind) -> &mut CycleAppliance {
        match kind {
            CycleKind::Washer => &mut self.washer,
            CycleKind::Dryer => &mut self.dryer,
            CycleKind::Dishwasher => &mut self.dishwasher,
        }
    }

    /// Iterates cycle appliances in washer, dryer, dishwasher order.
    pub fn cycles(&self) -> impl Iterator<Item = (CycleKind, &CycleAppliance)> {
        CYCLE_KINDS.into_iter().map(|k| (k, self.cycle(k)))
    }

    /// Number of cycle appliances currently running.
    pub fn active_cycles(&self) -> usize {
        self.cycles().filter(|(_, a)| a.is_active()).count()
    }

    /// Summed draw of running cycle appliances (W).
    pub fn cycle_load_w(&self) -> f64 {
        self.cycles()
            .filter(|(_, a)| a.is_active())
            .map(|(k, _)| ApplianceKind::from(k).watts())
            .sum()
    }
}
