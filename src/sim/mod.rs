/// Episode clock for step and instant bookkeeping.
pub mod clock;
pub mod kpi;
/// Action policies used by the rollout runner.
pub mod policy;
pub mod types;
