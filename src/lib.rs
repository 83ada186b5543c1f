//! Volleyball rosters, per-date attendance and skill-balanced team generation.

pub mod allocate;
pub mod config;
pub mod display;
pub mod error;
pub mod roster;
pub mod store;
pub mod web;

pub use error::{Result, TeamError};
