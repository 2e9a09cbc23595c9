/// CSV telemetry export.
pub mod export;
