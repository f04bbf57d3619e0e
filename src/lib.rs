//! Grid-connected energy-storage environment for reinforcement learning.
//!
//! A battery trades against historical market price and carbon-intensity
//! series; each step maps a scalar action to charge or discharge power,
//! clamps it to what the state of charge allows, and returns an observation
//! and a reward.

pub mod config;
/// Exogenous time series, providers, and completeness checks.
pub mod data;
pub mod devices;
/// Environment trait, spaces, and the storage episode controller.
pub mod env;
pub mod forecast;
pub mod io;
pub mod runner;
/// Episode clock, policies, summaries, and shared record types.
pub mod sim;
