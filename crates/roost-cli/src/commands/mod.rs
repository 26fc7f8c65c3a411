//! Command handlers

pub mod capture;
pub mod config;
pub mod dashboard;
pub mod flock;
pub mod snapshot;
pub mod status;
pub mod sync;
