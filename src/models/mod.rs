//! Request and Response models for the caching proxy API
//!
//! JSON bodies exchanged with HTTP clients.

pub mod requests;
pub mod responses;

pub use requests::{validate_key, WriteRequest};
pub use responses::{
    ClearResponse, ErrorResponse, HealthResponse, InvalidateResponse, ResourceResponse,
    WriteResponse,
};
