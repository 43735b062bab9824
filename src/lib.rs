//! Idol board planner: placement, packing, modifier summaries and idol generation
//! for a 7×6 board with fixed blocked cells.

pub mod aggregator;
pub mod api;
pub mod catalog;
pub mod config;
pub mod generator;
pub mod geometry;
pub mod grid;
pub mod inventory;
pub mod model;
pub mod optimizer;
pub mod types;
