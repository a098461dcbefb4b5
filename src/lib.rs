//! Common functionality for MOCA, the Mobile Operator Cost Assessment model.
#![warn(missing_docs)]
pub mod assess;
pub mod assets;
pub mod capacity;
pub mod commands;
pub mod costs;
pub mod energy;
pub mod id;
pub mod input;
pub mod log;
pub mod market;
pub mod model;
pub mod output;
pub mod parameters;
pub mod region;
pub mod settings;
pub mod strategy;
pub mod supply;

#[cfg(test)]
mod fixture;
