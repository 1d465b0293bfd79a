//! Time tracking and project profitability engine.
//!
//! The [`models::store::Store`] owns every project, time entry and the
//! running timer session. Operations in [`services`] mutate it
//! synchronously; [`services::reporting`] derives read-only summaries.

pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod storage;
