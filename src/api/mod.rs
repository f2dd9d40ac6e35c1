//! API Module
//!
//! HTTP handlers and routing for the caching download proxy.
//!
//! # Endpoints
//! - `GET /resource/:key` - Read a resource through the cache
//! - `PUT /resource/:key` - Write a resource to the origin
//! - `DELETE /cache/:key` - Invalidate one cached resource
//! - `DELETE /cache` - Invalidate all cached resources
//! - `GET /stats` / `DELETE /stats` - Access statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
