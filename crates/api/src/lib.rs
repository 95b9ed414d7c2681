//! HTTP and WebSocket surface of the Today Delivery notification and
//! reward service.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod routes;
pub mod state;
pub mod ws;
