//! Appoint scheduling core
//!
//! Service catalog and timetable management for the Appoint platform:
//! hierarchy rules for bookable services, and validated weekday opening
//! intervals inside a timetable's validity window.

pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use services::Services;
