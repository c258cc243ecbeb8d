// self
use crate::{_prelude::*, config::ApiDescriptor};

/// Errors raised while constructing or validating descriptors.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum DescriptorError {
	/// Base URL must use HTTPS unless insecure HTTP is allowed.
	#[error("The base URL must use HTTPS: {url}.")]
	InsecureEndpoint {
		/// URL that failed validation.
		url: String,
	},
	/// Base URL scheme is neither HTTP nor HTTPS.
	#[error("The base URL scheme `{scheme}` is not supported.")]
	UnsupportedScheme {
		/// Rejected scheme.
		scheme: String,
	},
	/// Base URL must not carry a query string or fragment.
	#[error("The base URL must not carry a query or fragment: {url}.")]
	BaseUrlHasQuery {
		/// URL that failed validation.
		url: String,
	},
	/// Token path must not be empty.
	#[error("Token path cannot be empty.")]
	EmptyTokenPath,
	/// Token path cannot be resolved against the base URL.
	#[error("Token path `{path}` cannot be resolved against the base URL.")]
	InvalidTokenPath {
		/// Offending path.
		path: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Timeout must be non-zero.
	#[error("Request timeout must be greater than zero.")]
	ZeroTimeout,
}

/// Builder for [`ApiDescriptor`] values.
#[derive(Debug)]
pub struct ApiDescriptorBuilder {
	/// Base URL of the API.
	pub base_url: Url,
	/// Credential endpoint path relative to the base URL.
	pub token_path: String,
	/// Optional per-request timeout.
	pub timeout: Option<std::time::Duration>,
	/// Accept plain `http://` base URLs.
	pub allow_insecure_http: bool,
}
impl ApiDescriptorBuilder {
	/// Creates a new builder seeded with the provided base URL.
	pub fn new(base_url: Url) -> Self {
		Self {
			base_url,
			token_path: ApiDescriptor::DEFAULT_TOKEN_PATH.into(),
			timeout: None,
			allow_insecure_http: false,
		}
	}

	/// Overrides the credential endpoint path (defaults to `token`).
	pub fn token_path(mut self, path: impl Into<String>) -> Self {
		self.token_path = path.into();

		self
	}

	/// Sets the per-request timeout applied by the default transport.
	pub fn timeout(mut self, timeout: std::time::Duration) -> Self {
		self.timeout = Some(timeout);

		self
	}

	/// Accepts plain `http://` base URLs (local mocks, test rigs).
	pub fn allow_insecure_http(mut self, allow: bool) -> Self {
		self.allow_insecure_http = allow;

		self
	}

	/// Consumes the builder and validates the resulting descriptor.
	pub fn build(self) -> Result<ApiDescriptor, DescriptorError> {
		let mut base_url = self.base_url;

		if !base_url.path().ends_with('/') {
			let path = format!("{}/", base_url.path());

			base_url.set_path(&path);
		}

		let descriptor = ApiDescriptor {
			base_url,
			token_path: self.token_path.trim().to_owned(),
			timeout: self.timeout,
			allow_insecure_http: self.allow_insecure_http,
		};

		descriptor.validate()?;

		Ok(descriptor)
	}
}

impl ApiDescriptor {
	/// Validates invariants for the descriptor.
	pub fn validate(&self) -> Result<(), DescriptorError> {
		match self.base_url.scheme() {
			"https" => {},
			"http" if self.allow_insecure_http => {},
			"http" =>
				return Err(DescriptorError::InsecureEndpoint { url: self.base_url.to_string() }),
			other => return Err(DescriptorError::UnsupportedScheme { scheme: other.to_owned() }),
		}

		if self.base_url.query().is_some() || self.base_url.fragment().is_some() {
			return Err(DescriptorError::BaseUrlHasQuery { url: self.base_url.to_string() });
		}
		if self.token_path.is_empty() {
			return Err(DescriptorError::EmptyTokenPath);
		}
		if self.timeout.is_some_and(|timeout| timeout.is_zero()) {
			return Err(DescriptorError::ZeroTimeout);
		}

		self.token_url()?;

		Ok(())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn url(value: &str) -> Url {
		Url::parse(value).expect("Failed to parse descriptor fixture URL.")
	}

	#[test]
	fn build_normalizes_base_path() {
		let descriptor = ApiDescriptor::builder(url("https://api.dizzydata.com/api"))
			.build()
			.expect("Descriptor should build for an HTTPS base URL.");

		assert_eq!(descriptor.base_url.as_str(), "https://api.dizzydata.com/api/");
		assert_eq!(
			descriptor.token_url().expect("Token URL should resolve.").as_str(),
			"https://api.dizzydata.com/api/token"
		);
	}

	#[test]
	fn build_rejects_insecure_and_unsupported_schemes() {
		let err = ApiDescriptor::builder(url("http://localhost:8080/"))
			.build()
			.expect_err("Plain HTTP should be rejected by default.");

		assert!(matches!(err, DescriptorError::InsecureEndpoint { .. }));

		ApiDescriptor::builder(url("http://localhost:8080/"))
			.allow_insecure_http(true)
			.build()
			.expect("Plain HTTP should be accepted when explicitly allowed.");

		let err = ApiDescriptor::builder(url("ftp://example.com/"))
			.allow_insecure_http(true)
			.build()
			.expect_err("Non-HTTP schemes should be rejected.");

		assert!(matches!(err, DescriptorError::UnsupportedScheme { .. }));
	}

	#[test]
	fn build_rejects_bad_paths_queries_and_timeouts() {
		let err = ApiDescriptor::builder(url("https://api.dizzydata.com/?tenant=1"))
			.build()
			.expect_err("Base URLs with a query should be rejected.");

		assert!(matches!(err, DescriptorError::BaseUrlHasQuery { .. }));

		let err = ApiDescriptor::builder(url("https://api.dizzydata.com/"))
			.token_path("  ")
			.build()
			.expect_err("Blank token paths should be rejected.");

		assert_eq!(err, DescriptorError::EmptyTokenPath);

		let err = ApiDescriptor::builder(url("https://api.dizzydata.com/"))
			.timeout(std::time::Duration::ZERO)
			.build()
			.expect_err("Zero timeouts should be rejected.");

		assert_eq!(err, DescriptorError::ZeroTimeout);
	}
}
