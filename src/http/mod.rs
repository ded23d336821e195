//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (request ID, trace span)
//!     → waitlist.rs (decode body, call WaitlistService)
//!     → response.rs (outcome → status + ActionResult JSON)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;
pub mod waitlist;

pub use request::X_REQUEST_ID;
pub use server::{AppState, HttpServer};
