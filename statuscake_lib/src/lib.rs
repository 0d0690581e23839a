//! StatusCake API client library.
//!
//! Provides an authenticated client for the StatusCake REST API and a typed
//! client for its `Tests` resource.

pub mod client;
pub mod credentials;
pub mod error;
pub mod transport;
pub mod uptime;
pub mod values;

pub use client::{ApiClient, Client, ClientConfig, Credentials, API_BASE};
pub use error::{ApiError, Error, HttpError, Result, TransportError, ValidationError};
pub use transport::{ApiRequest, ApiResponse, HttpTransport, Transport};
pub use uptime::{Test, TestType, Tests};
pub use values::Values;

/// Library version for User-Agent and diagnostics.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
