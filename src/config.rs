//! API descriptor (validated endpoint metadata) and environment-backed client configuration.
//!
//! `builder` exposes [`ApiDescriptorBuilder`], which enforces HTTPS-only endpoints unless the
//! caller opts into plain HTTP, and normalizes the base path so relative targets such as
//! `v1/clients` resolve beneath it. `env` loads URL and credentials from the process
//! environment for binaries and live tests.

/// Builder API for assembling API descriptors.
pub mod builder;
/// Environment-backed client configuration.
pub mod env;

pub use builder::*;
pub use env::*;

// self
use crate::_prelude::*;

/// Immutable API descriptor consumed by the client.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiDescriptor {
	/// Base URL every relative request target is resolved against; always ends with `/`.
	pub base_url: Url,
	/// Credential endpoint, relative to `base_url`.
	pub token_path: String,
	/// Per-request timeout applied by the default transport.
	#[serde(default, with = "timeout_secs")]
	pub timeout: Option<std::time::Duration>,
	/// Whether plain `http://` base URLs are accepted.
	#[serde(default)]
	pub allow_insecure_http: bool,
}
impl ApiDescriptor {
	/// Default credential endpoint path.
	pub const DEFAULT_TOKEN_PATH: &'static str = "token";

	/// Creates a new builder for the provided base URL.
	pub fn builder(base_url: Url) -> ApiDescriptorBuilder {
		ApiDescriptorBuilder::new(base_url)
	}

	/// Absolute URL of the credential endpoint.
	pub fn token_url(&self) -> Result<Url, DescriptorError> {
		self.base_url.join(&self.token_path).map_err(|source| DescriptorError::InvalidTokenPath {
			path: self.token_path.clone(),
			source,
		})
	}
}

mod timeout_secs {
	// crates.io
	use serde::{Deserialize, Deserializer, Serializer};

	pub fn serialize<S>(value: &Option<std::time::Duration>, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		match value {
			Some(timeout) => serializer.serialize_some(&timeout.as_secs_f64()),
			None => serializer.serialize_none(),
		}
	}

	pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<std::time::Duration>, D::Error>
	where
		D: Deserializer<'de>,
	{
		let secs = Option::<f64>::deserialize(deserializer)?;

		secs.map(|secs| {
			std::time::Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
		})
		.transpose()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn descriptor_deserializes_with_defaults() {
		let descriptor: ApiDescriptor = serde_json::from_str(
			r#"{"base_url":"https://api.dizzydata.com/","token_path":"token","timeout":2.5}"#,
		)
		.expect("Descriptor payload should deserialize.");

		assert_eq!(descriptor.timeout, Some(std::time::Duration::from_millis(2500)));
		assert!(!descriptor.allow_insecure_http);
		assert_eq!(
			descriptor.token_url().expect("Token URL should resolve.").as_str(),
			"https://api.dizzydata.com/token"
		);
	}
}
