/// Greedy EV discharge allocation.
pub mod allocation;
/// Simulation clock with the day/night cadence.
pub mod clock;
pub mod controller;
pub mod engine;
/// Stress-test windows for scripted runs.
pub mod event;
/// Transformer rating and stress computation.
pub mod feeder;
pub mod history;
pub mod kpi;
pub mod metrics;
pub mod power_balance;
/// Step-mode scheduling for scripted runs.
pub mod schedule;
pub mod step;
pub mod types;
