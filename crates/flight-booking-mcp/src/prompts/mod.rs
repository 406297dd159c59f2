//! Host prompt templates.

pub mod find_best_flight;
pub mod handle_disruption;
