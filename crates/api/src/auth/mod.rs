//! JWT validation for the HTTP and WebSocket surfaces.
//!
//! Token issuance lives in the surrounding platform; this service only
//! validates bearer tokens it is handed.

pub mod jwt;
