//! Domain models for Showdesk.
//!
//! These are the core types shared across all crates.

pub mod capability;
pub mod checkin;
pub mod city_cost;
pub mod commission;
pub mod show;
pub mod tenant;
pub mod transaction;
