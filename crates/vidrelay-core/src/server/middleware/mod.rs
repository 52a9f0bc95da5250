//! Ambient layers composed around the download handler.

mod rate_limit;
mod security_headers;

pub use rate_limit::{rate_limit, RateDecision, RateLimiter};
pub use security_headers::with_security_headers;
