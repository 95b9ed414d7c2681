//! HTTP request handlers, grouped by resource.

pub mod notification;
pub mod rewards;
pub mod settings;
