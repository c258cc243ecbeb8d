//! Credentials, bearer tokens, and the coalescing token provider.

pub mod credentials;
pub mod provider;
pub mod token;

pub use credentials::*;
pub use provider::*;
pub use token::*;
