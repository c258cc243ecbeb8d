//! Request descriptors consumed by the authorized-request executor.
//!
//! An [`ApiRequest`] is built per call and only borrowed by the executor, so the same descriptor
//! can be rendered twice when a rejected token forces a retry.

// crates.io
use ::http::{
	HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri,
	header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
};
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	auth::AccessToken,
	error::{ConfigError, RequestError},
	http::HttpRequest,
	obs::Stage,
};

/// Method, target, headers, query, and body of a single API call.
///
/// `target` is resolved against the client's base URL, so both relative paths (`v1/clients`) and
/// absolute URLs are accepted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiRequest {
	method: Method,
	target: String,
	query: Vec<(String, String)>,
	headers: Vec<(String, String)>,
	body: Option<RequestBody>,
}
impl ApiRequest {
	/// Creates a descriptor for `method` against `target`.
	pub fn new(method: Method, target: impl Into<String>) -> Self {
		Self { method, target: target.into(), query: Vec::new(), headers: Vec::new(), body: None }
	}

	/// Shorthand for a `GET` descriptor.
	pub fn get(target: impl Into<String>) -> Self {
		Self::new(Method::GET, target)
	}

	/// Shorthand for a `PUT` descriptor.
	pub fn put(target: impl Into<String>) -> Self {
		Self::new(Method::PUT, target)
	}

	/// Shorthand for a `POST` descriptor.
	pub fn post(target: impl Into<String>) -> Self {
		Self::new(Method::POST, target)
	}

	/// Appends a query parameter.
	pub fn query(mut self, key: impl Into<String>, value: impl Display) -> Self {
		self.query.push((key.into(), value.to_string()));

		self
	}

	/// Appends a query parameter when `value` is present.
	pub fn query_opt(self, key: impl Into<String>, value: Option<impl Display>) -> Self {
		match value {
			Some(value) => self.query(key, value),
			None => self,
		}
	}

	/// Adds a request header.
	pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.push((name.into(), value.into()));

		self
	}

	/// Sets the request body and its content type.
	pub fn body(mut self, content_type: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
		self.body = Some(RequestBody { content_type: content_type.into(), bytes: bytes.into() });

		self
	}

	/// HTTP method of the call.
	pub fn method(&self) -> &Method {
		&self.method
	}

	/// Unresolved target of the call.
	pub fn target(&self) -> &str {
		&self.target
	}

	/// Query parameters in insertion order.
	pub fn query_pairs(&self) -> &[(String, String)] {
		&self.query
	}

	/// Short `METHOD target` label used for spans.
	pub fn label(&self) -> String {
		format!("{} {}", self.method, self.target)
	}

	/// Resolves the target and query against `base`.
	///
	/// The resolved URL must keep the origin of `base`; the bearer token never leaves it.
	pub fn resolve(&self, base: &Url) -> Result<Url> {
		let mut url = base.join(&self.target).map_err(|source| ConfigError::InvalidTarget {
			target: self.target.clone(),
			source,
		})?;

		if url.origin() != base.origin() {
			return Err(ConfigError::ForeignTarget {
				url: url.to_string(),
				origin: base.origin().ascii_serialization(),
			}
			.into());
		}

		if !self.query.is_empty() {
			url.query_pairs_mut().extend_pairs(self.query.iter());
		}

		Ok(url)
	}

	/// Renders the descriptor with `token` attached as a bearer `Authorization` header.
	pub fn to_http(&self, base: &Url, token: &AccessToken) -> Result<HttpRequest> {
		let uri = self
			.resolve(base)?
			.as_str()
			.parse::<Uri>()
			.map_err(|err| ConfigError::from(::http::Error::from(err)))?;
		let mut request = HttpRequest::new(Vec::new());

		*request.method_mut() = self.method.clone();
		*request.uri_mut() = uri;

		let headers = request.headers_mut();

		headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

		for (name, value) in &self.headers {
			let invalid = || ConfigError::InvalidHeader { name: name.clone() };
			let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| invalid())?;
			let header_value = HeaderValue::from_str(value).map_err(|_| invalid())?;

			headers.insert(header_name, header_value);
		}

		let bearer = HeaderValue::from_str(&token.bearer())
			.map_err(|_| ConfigError::InvalidHeader { name: AUTHORIZATION.to_string() })?;

		headers.insert(AUTHORIZATION, bearer);

		if let Some(RequestBody { content_type, bytes }) = &self.body {
			let value = HeaderValue::from_str(content_type)
				.map_err(|_| ConfigError::InvalidHeader { name: CONTENT_TYPE.to_string() })?;

			headers.insert(CONTENT_TYPE, value);
			*request.body_mut() = bytes.clone();
		}

		Ok(request)
	}
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct RequestBody {
	content_type: String,
	bytes: Vec<u8>,
}

/// Successful response returned by the executor.
#[derive(Clone, Debug)]
pub struct ApiResponse {
	status: StatusCode,
	headers: HeaderMap,
	body: Vec<u8>,
}
impl ApiResponse {
	pub(crate) fn new(status: StatusCode, headers: HeaderMap, body: Vec<u8>) -> Self {
		Self { status, headers, body }
	}

	/// HTTP status of the response.
	pub fn status(&self) -> StatusCode {
		self.status
	}

	/// Response headers.
	pub fn headers(&self) -> &HeaderMap {
		&self.headers
	}

	/// Raw response body.
	pub fn body(&self) -> &[u8] {
		&self.body
	}

	/// Consumes the response and returns the body.
	pub fn into_body(self) -> Vec<u8> {
		self.body
	}

	/// Decodes the body as JSON.
	pub fn json<T>(&self) -> Result<T>
	where
		T: DeserializeOwned,
	{
		decode_json(Stage::ApiRequest, self.status.as_u16(), &self.body)
	}
}

/// Decodes a JSON body, keeping the failing path for diagnostics.
pub(crate) fn decode_json<T>(stage: Stage, status: u16, body: &[u8]) -> Result<T>
where
	T: DeserializeOwned,
{
	let mut deserializer = serde_json::Deserializer::from_slice(body);

	serde_path_to_error::deserialize(&mut deserializer)
		.map_err(|source| RequestError::decode(stage, status, source).into())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn base() -> Url {
		Url::parse("https://api.dizzydata.com/").expect("Base URL fixture should parse.")
	}

	#[test]
	fn resolves_relative_and_absolute_targets() {
		let relative = ApiRequest::get("v1/clients")
			.resolve(&base())
			.expect("Relative target should resolve.");

		assert_eq!(relative.as_str(), "https://api.dizzydata.com/v1/clients");

		let absolute = ApiRequest::get("https://api.dizzydata.com/v1/clients")
			.resolve(&base())
			.expect("Absolute target should resolve.");

		assert_eq!(absolute, relative);
	}

	#[test]
	fn rejects_targets_outside_the_base_origin() {
		for target in [
			"https://attacker.example/collect",
			"http://api.dizzydata.com/v1/clients",
			"https://api.dizzydata.com:8443/v1/clients",
			"//attacker.example/collect",
		] {
			let err = ApiRequest::get(target)
				.to_http(&base(), &AccessToken::new("secret-token"))
				.expect_err("Foreign targets must not receive the bearer token.");

			assert!(
				matches!(err, Error::Config(ConfigError::ForeignTarget { .. })),
				"`{target}` should be rejected as a foreign target."
			);
		}

		ApiRequest::get("https://api.dizzydata.com:443/v1/clients")
			.resolve(&base())
			.expect("An explicit default port keeps the same origin.");
	}

	#[test]
	fn appends_query_pairs_in_order() {
		let url = ApiRequest::get("v1/invoices/count")
			.query_opt("clientId", Some(20))
			.query_opt("unused", None::<u8>)
			.query("startDate", "20110101")
			.resolve(&base())
			.expect("Target with query should resolve.");

		assert_eq!(
			url.as_str(),
			"https://api.dizzydata.com/v1/invoices/count?clientId=20&startDate=20110101"
		);
	}

	#[test]
	fn renders_bearer_header_and_body() {
		let request = ApiRequest::post("v1/clients")
			.header("x-correlation-id", "abc")
			.body("application/json", br#"{"id":1}"#.to_vec())
			.to_http(&base(), &AccessToken::new("t-1"))
			.expect("Descriptor should render.");

		assert_eq!(*request.method(), Method::POST);
		assert_eq!(request.headers()[AUTHORIZATION], "Bearer t-1");
		assert_eq!(request.headers()[CONTENT_TYPE], "application/json");
		assert_eq!(request.headers()["x-correlation-id"], "abc");
		assert_eq!(request.body().as_slice(), br#"{"id":1}"#);
	}

	#[test]
	fn rejects_invalid_headers() {
		let err = ApiRequest::get("v1/clients")
			.header("bad header", "value")
			.to_http(&base(), &AccessToken::new("t-1"))
			.expect_err("Header names with spaces must be rejected.");

		assert!(matches!(err, Error::Config(ConfigError::InvalidHeader { .. })));
	}

	#[test]
	fn decode_errors_report_the_failing_path() {
		#[derive(Debug, Deserialize)]
		struct Row {
			#[allow(dead_code)]
			id: u64,
		}

		let err = decode_json::<Vec<Row>>(Stage::ApiRequest, 200, br#"[{"id":1},{"id":"x"}]"#)
			.expect_err("Mismatched row should fail to decode.");

		match err {
			Error::Request(RequestError::Decode { source, status, .. }) => {
				assert_eq!(status, 200);
				assert_eq!(source.path().to_string(), "[1].id");
			},
			other => panic!("Unexpected error variant: {other:?}."),
		}
	}
}
