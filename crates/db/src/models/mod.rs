//! Row models and DTOs for the service's tables.

pub mod notification;
pub mod reward;
pub mod setting;
