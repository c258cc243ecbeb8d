//! Client-level error types shared by the token provider, the executor, and domain calls.
//!
//! Every variant is [`Clone`] so a single failed token acquisition can be delivered to all
//! callers that were awaiting it.

// self
use crate::{_prelude::*, config::DescriptorError, obs::Stage};

/// Client-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Shareable source error used where the underlying error type is not [`Clone`].
pub type SharedSource = Arc<dyn std::error::Error + Send + Sync>;

/// Canonical client error exposed by public APIs.
#[derive(Clone, Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Credentials or tokens were rejected; re-entering credentials may help.
	#[error(transparent)]
	Authentication(#[from] AuthenticationError),
	/// The call failed for a reason unrelated to authorization.
	#[error(transparent)]
	Request(#[from] RequestError),
}
impl Error {
	/// Returns `true` when the failure means the credentials (or freshly issued tokens) are not
	/// accepted.
	pub fn is_authentication(&self) -> bool {
		matches!(self, Self::Authentication(_))
	}

	/// HTTP status code attached to the failure, when the server responded.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Authentication(err) => Some(err.status()),
			Self::Request(RequestError::Status { status, .. }) => Some(*status),
			Self::Request(RequestError::Decode { status, .. }) => Some(*status),
			Self::Request(RequestError::MalformedToken { status }) => Some(*status),
			_ => None,
		}
	}

	/// Response body returned alongside the failure, when the server responded.
	pub fn body(&self) -> Option<&FailureBody> {
		match self {
			Self::Authentication(err) => Some(err.body()),
			Self::Request(RequestError::Status { body, .. }) => Some(body),
			_ => None,
		}
	}
}
impl From<DescriptorError> for Error {
	fn from(e: DescriptorError) -> Self {
		ConfigError::from(e).into()
	}
}

/// Configuration and request-construction failures.
#[derive(Clone, Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: SharedSource,
	},
	/// HTTP request construction failed.
	#[error("HTTP request could not be constructed.")]
	HttpRequest {
		/// Underlying `http` builder failure.
		#[source]
		source: SharedSource,
	},
	/// API descriptor failed validation.
	#[error(transparent)]
	Descriptor(#[from] DescriptorError),
	/// Request target cannot be resolved against the base URL.
	#[error("Request target `{target}` is not a valid URL.")]
	InvalidTarget {
		/// Target supplied by the caller.
		target: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Request target resolves outside the origin of the base URL.
	#[error("Request target `{url}` leaves the API origin `{origin}`.")]
	ForeignTarget {
		/// Resolved target URL.
		url: String,
		/// Origin of the base URL.
		origin: String,
	},
	/// Header name or value is not valid HTTP.
	#[error("Header `{name}` is invalid.")]
	InvalidHeader {
		/// Header name supplied by the caller.
		name: String,
	},
	/// Reporting period ends before it starts.
	#[error("Reporting period is inverted: {start} is after {end}.")]
	InvertedPeriod {
		/// Requested start date.
		start: Date,
		/// Requested end date.
		end: Date,
	},
	/// Date string is not in `YYYYMMDD` form.
	#[error("Date `{value}` is not in YYYYMMDD form.")]
	InvalidDate {
		/// Offending input.
		value: String,
	},
	/// Date cannot be rendered as `YYYYMMDD` because its year is outside `0..=9999`.
	#[error("Date {date} is outside the years 0000 through 9999.")]
	DateOutOfRange {
		/// Offending date.
		date: Date,
	},
	/// Required environment variable is not set.
	#[error("Environment variable `{key}` is not set.")]
	MissingEnv {
		/// Variable name.
		key: &'static str,
	},
	/// Environment variable holds an unusable value.
	#[error("Environment variable `{key}` is invalid.")]
	InvalidEnv {
		/// Variable name.
		key: &'static str,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Arc::new(src) }
	}
}
impl From<::http::Error> for ConfigError {
	fn from(e: ::http::Error) -> Self {
		Self::HttpRequest { source: Arc::new(e) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Authorization failures that are terminal for the current call.
#[derive(Clone, Debug, ThisError)]
pub enum AuthenticationError {
	/// The credential endpoint rejected the username/password pair.
	#[error("Credential endpoint rejected the supplied credentials (HTTP {status}).")]
	CredentialsRejected {
		/// HTTP status returned by the credential endpoint.
		status: u16,
		/// Body returned by the credential endpoint.
		body: FailureBody,
	},
	/// The API rejected a freshly issued token after the single re-authentication.
	#[error("API rejected a freshly issued token (HTTP {status}).")]
	TokenRejected {
		/// HTTP status returned by the API.
		status: u16,
		/// Body returned by the API.
		body: FailureBody,
	},
}
impl AuthenticationError {
	/// HTTP status returned by the rejecting endpoint.
	pub fn status(&self) -> u16 {
		match self {
			Self::CredentialsRejected { status, .. } | Self::TokenRejected { status, .. } => *status,
		}
	}

	/// Body returned by the rejecting endpoint.
	pub fn body(&self) -> &FailureBody {
		match self {
			Self::CredentialsRejected { body, .. } | Self::TokenRejected { body, .. } => body,
		}
	}
}

/// Non-authorization failures surfaced without retry.
#[derive(Clone, Debug, ThisError)]
pub enum RequestError {
	/// The server answered with a non-success status other than an authorization failure.
	#[error("{stage} returned HTTP {status}: {body}.")]
	Status {
		/// Call stage that failed.
		stage: Stage,
		/// HTTP status code.
		status: u16,
		/// Response body.
		body: FailureBody,
		/// Retry-After hint from upstream, if supplied.
		retry_after: Option<Duration>,
	},
	/// The HTTP collaborator timed out.
	#[error("{stage} timed out.")]
	Timeout {
		/// Call stage that timed out.
		stage: Stage,
	},
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred during the {stage}.")]
	Network {
		/// Call stage that failed.
		stage: Stage,
		/// Transport-specific network error.
		#[source]
		source: SharedSource,
	},
	/// A success response carried JSON that does not match the expected shape.
	#[error("{stage} returned malformed JSON.")]
	Decode {
		/// Call stage that produced the body.
		stage: Stage,
		/// HTTP status code of the response.
		status: u16,
		/// Structured parsing failure with the offending path.
		#[source]
		source: Arc<serde_path_to_error::Error<serde_json::Error>>,
	},
	/// The credential endpoint succeeded but issued an empty token.
	#[error("Credential endpoint issued an empty access token.")]
	MalformedToken {
		/// HTTP status code of the response.
		status: u16,
	},
}
impl RequestError {
	/// Wraps a transport-specific network error.
	pub fn network(stage: Stage, src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { stage, source: Arc::new(src) }
	}

	pub(crate) fn decode(
		stage: Stage,
		status: u16,
		source: serde_path_to_error::Error<serde_json::Error>,
	) -> Self {
		Self::Decode { stage, status, source: Arc::new(source) }
	}
}

/// Raw response body captured from a failed call.
///
/// DizzyData failure bodies are JSON objects such as `{"StatusCode":401,"Message":"…"}`; the
/// accessors read those fields when present and fall back to `None` for anything else.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct FailureBody(String);
impl FailureBody {
	const PREVIEW_LIMIT: usize = 256;

	/// Wraps a raw body.
	pub fn new(raw: impl Into<String>) -> Self {
		Self(raw.into())
	}

	/// Builds a body from response bytes, replacing invalid UTF-8.
	pub fn from_bytes(bytes: &[u8]) -> Self {
		Self(String::from_utf8_lossy(bytes).into_owned())
	}

	/// Returns the raw body.
	pub fn as_str(&self) -> &str {
		&self.0
	}

	/// Reads the `StatusCode` field of a JSON body.
	pub fn status_code(&self) -> Option<u16> {
		let value = self.field(&["StatusCode", "statusCode"])?;

		value
			.as_u64()
			.or_else(|| value.as_str().and_then(|raw| raw.parse().ok()))
			.and_then(|code| u16::try_from(code).ok())
	}

	/// Reads the `Message` field of a JSON body.
	pub fn message(&self) -> Option<String> {
		self.field(&["Message", "message", "error_description", "error"])
			.and_then(|value| value.as_str().map(str::to_owned))
	}

	fn field(&self, names: &[&str]) -> Option<serde_json::Value> {
		let serde_json::Value::Object(mut map) = serde_json::from_str(&self.0).ok()? else {
			return None;
		};

		names.iter().find_map(|name| map.remove(*name))
	}

	fn preview(&self) -> String {
		if self.0.chars().count() <= Self::PREVIEW_LIMIT {
			return self.0.clone();
		}

		let mut buf = self.0.chars().take(Self::PREVIEW_LIMIT).collect::<String>();

		buf.push('…');

		buf
	}
}
impl Debug for FailureBody {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("FailureBody").field(&self.preview()).finish()
	}
}
impl Display for FailureBody {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		if self.0.is_empty() { f.write_str("<empty body>") } else { f.write_str(&self.preview()) }
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn failure_body_reads_dizzydata_fields() {
		let body = FailureBody::new(r#"{"StatusCode":401,"Message":"Authorization has been denied."}"#);

		assert_eq!(body.status_code(), Some(401));
		assert_eq!(body.message().as_deref(), Some("Authorization has been denied."));

		let plain = FailureBody::new("Service Unavailable");

		assert_eq!(plain.status_code(), None);
		assert_eq!(plain.message(), None);
	}

	#[test]
	fn failure_body_preview_truncates_long_payloads() {
		let body = FailureBody::new("x".repeat(300));
		let rendered = body.to_string();

		assert_eq!(rendered.chars().count(), FailureBody::PREVIEW_LIMIT + 1);
		assert!(rendered.ends_with('…'));
		assert_eq!(FailureBody::default().to_string(), "<empty body>");
	}

	#[test]
	fn error_accessors_expose_status_and_body() {
		let err: Error = AuthenticationError::CredentialsRejected {
			status: 401,
			body: FailureBody::new(r#"{"StatusCode":401}"#),
		}
		.into();

		assert!(err.is_authentication());
		assert_eq!(err.status(), Some(401));
		assert_eq!(err.body().and_then(FailureBody::status_code), Some(401));

		let err: Error = RequestError::Timeout { stage: Stage::ApiRequest }.into();

		assert!(!err.is_authentication());
		assert_eq!(err.status(), None);
		assert!(err.body().is_none());
	}

	#[test]
	fn network_errors_keep_their_source() {
		let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "connection reset");
		let err: Error = RequestError::network(Stage::CredentialExchange, io).into();
		let source = StdError::source(&err)
			.expect("Network error should expose the transport error as its source.");

		assert_eq!(source.to_string(), "connection reset");
	}
}
