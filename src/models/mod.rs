//! Request and Response models for the gateway API
//!
//! DTOs used for deserializing query strings and serializing response bodies.

pub mod requests;
pub mod responses;

pub use requests::InvalidateRequest;
pub use responses::{HealthResponse, InvalidateResponse, StatsResponse};
