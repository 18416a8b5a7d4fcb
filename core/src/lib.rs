//! Shared types for the Etsy MCP server: credentials, the error taxonomy and
//! the typed request shape of every marketplace operation.

pub mod credentials;
pub mod error;
pub mod listings;
pub mod shops;

pub use credentials::{CredentialConfig, Credentials};
pub use error::{ConfigError, DispatchError};
