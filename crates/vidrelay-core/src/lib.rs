pub mod config;
pub mod error;
pub mod logging;

pub mod probe;
pub mod relay;
pub mod server;
pub mod url_model;

pub use error::{ErrorKind, RelayError};
pub use relay::{Relay, RelayPolicy};
