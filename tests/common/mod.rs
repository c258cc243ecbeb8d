//! Scripted in-process DizzyData server shared by the integration tests.

#![allow(dead_code)]

// std
use std::{
	collections::HashSet,
	error::Error as StdError,
	fmt::{Display, Formatter, Result as FmtResult},
	sync::{
		Arc,
		atomic::{AtomicUsize, Ordering},
	},
	time::Duration,
};
// crates.io
use http::{Method, StatusCode, header::AUTHORIZATION};
use parking_lot::Mutex;
use url::{Url, form_urlencoded};
// self
use dizzydata_api_client::{
	DizzydataClient,
	auth::Credentials,
	config::ApiDescriptor,
	error::{Error, RequestError},
	exchange::TransportErrorMapper,
	http::{ApiHttpClient, HttpFuture, HttpRequest, HttpResponse},
	obs::Stage,
};

pub const USERNAME: &str = "demo";
pub const PASSWORD: &str = "secret";
pub const BASE_URL: &str = "https://api.dizzydata.test/";

pub type FakeClient = DizzydataClient<FakeApi, FakeTransportErrorMapper>;

pub fn descriptor() -> ApiDescriptor {
	ApiDescriptor::builder(Url::parse(BASE_URL).expect("Base URL fixture should parse."))
		.build()
		.expect("Descriptor fixture should build.")
}

pub fn valid_credentials() -> Credentials {
	Credentials::new(USERNAME, PASSWORD)
}

pub fn invalid_credentials() -> Credentials {
	Credentials::new("I do not exist", "wrong")
}

/// Builds a client bound to `api`, returning the shared handle for assertions.
pub fn build_client(api: FakeApi, credentials: Credentials) -> (FakeClient, Arc<FakeApi>) {
	let api = Arc::new(api);
	let client = DizzydataClient::with_http_client(
		descriptor(),
		credentials,
		api.clone(),
		FakeTransportErrorMapper,
	)
	.expect("Fake client should build.");

	(client, api)
}

#[derive(Debug)]
pub struct FakeTransportError;
impl Display for FakeTransportError {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "Fake transport failure.")
	}
}
impl StdError for FakeTransportError {}

#[derive(Clone, Copy, Debug, Default)]
pub struct FakeTransportErrorMapper;
impl TransportErrorMapper<FakeTransportError> for FakeTransportErrorMapper {
	fn map_transport_error(&self, stage: Stage, error: FakeTransportError) -> Error {
		RequestError::network(stage, error).into()
	}
}

/// How the fake answers authorized API calls.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApiMode {
	/// Accepts tokens the fake issued and has not revoked.
	Normal,
	/// Rejects every bearer token with `401`.
	AlwaysUnauthorized,
	/// Answers every API call with the given status.
	Status(u16),
	/// Fails every API call at the transport level.
	Unreachable,
}

/// In-process DizzyData server: issues `token-1`, `token-2`, ... for the demo account and serves
/// the client and report endpoints to holders of a live token.
pub struct FakeApi {
	exchange_delay: Option<Duration>,
	mode: Mutex<ApiMode>,
	exchanges: AtomicUsize,
	api_calls: AtomicUsize,
	live_tokens: Mutex<HashSet<String>>,
	presented: Mutex<Vec<String>>,
	last_query: Mutex<Option<String>>,
}
impl FakeApi {
	pub fn new() -> Self {
		Self {
			exchange_delay: None,
			mode: Mutex::new(ApiMode::Normal),
			exchanges: AtomicUsize::new(0),
			api_calls: AtomicUsize::new(0),
			live_tokens: Mutex::new(HashSet::new()),
			presented: Mutex::new(Vec::new()),
			last_query: Mutex::new(None),
		}
	}

	pub fn with_exchange_delay(mut self, delay: Duration) -> Self {
		self.exchange_delay = Some(delay);

		self
	}

	pub fn with_mode(self, mode: ApiMode) -> Self {
		*self.mode.lock() = mode;

		self
	}

	pub fn set_mode(&self, mode: ApiMode) {
		*self.mode.lock() = mode;
	}

	/// Invalidates every token issued so far, as a server-side expiry would.
	pub fn revoke_all(&self) {
		self.live_tokens.lock().clear();
	}

	pub fn exchanges(&self) -> usize {
		self.exchanges.load(Ordering::SeqCst)
	}

	pub fn api_calls(&self) -> usize {
		self.api_calls.load(Ordering::SeqCst)
	}

	/// Bearer tokens presented to the API, in arrival order.
	pub fn presented_tokens(&self) -> Vec<String> {
		self.presented.lock().clone()
	}

	pub fn last_query(&self) -> Option<String> {
		self.last_query.lock().clone()
	}

	async fn handle(&self, request: HttpRequest) -> Result<HttpResponse, FakeTransportError> {
		if request.method() == Method::POST && request.uri().path() == "/token" {
			return Ok(self.exchange(request.body()).await);
		}

		self.api_calls.fetch_add(1, Ordering::SeqCst);
		*self.last_query.lock() = request.uri().query().map(str::to_owned);

		let bearer = request
			.headers()
			.get(AUTHORIZATION)
			.and_then(|value| value.to_str().ok())
			.and_then(|value| value.strip_prefix("Bearer "))
			.map(str::to_owned);

		if let Some(token) = &bearer {
			self.presented.lock().push(token.clone());
		}

		let mode = *self.mode.lock();

		match mode {
			ApiMode::Unreachable => Err(FakeTransportError),
			ApiMode::Status(code) => Ok(json(
				code,
				format!(r#"{{"StatusCode":{code},"Message":"Scripted failure."}}"#),
			)),
			ApiMode::AlwaysUnauthorized => Ok(unauthorized()),
			ApiMode::Normal => {
				let live = bearer.is_some_and(|token| self.live_tokens.lock().contains(&token));

				if !live {
					return Ok(unauthorized());
				}

				Ok(self.route(request.method(), request.uri().path()))
			},
		}
	}

	async fn exchange(&self, body: &[u8]) -> HttpResponse {
		let count = self.exchanges.fetch_add(1, Ordering::SeqCst) + 1;

		if let Some(delay) = self.exchange_delay {
			tokio::time::sleep(delay).await;
		}

		let form = form_urlencoded::parse(body).into_owned().collect::<Vec<_>>();
		let field = |name: &str| {
			form.iter().find(|(key, _)| key == name).map(|(_, value)| value.as_str())
		};

		if field("grant_type") != Some("password")
			|| field("username") != Some(USERNAME)
			|| field("password") != Some(PASSWORD)
		{
			return json(401, r#"{"StatusCode":401,"Message":"Invalid username or password."}"#);
		}

		let token = format!("token-{count}");

		self.live_tokens.lock().insert(token.clone());

		json(200, format!(r#"{{"access_token":"{token}","token_type":"bearer","expires_in":1199}}"#))
	}

	fn route(&self, method: &Method, path: &str) -> HttpResponse {
		match (method.as_str(), path) {
			("GET", "/v1/clients") => json(200, r#"[{"Id":20,"Name":"Acme"},{"Id":533,"Name":"Beta"}]"#),
			("PUT", "/v1/clients") => json(200, r#"{"StatusCode":200}"#),
			("GET", "/v1/invoices/count") => json(200, r#"[{"Month":"2014-06","Count":42}]"#),
			("GET", "/v1/administrations/count") => json(200, r#"[{"Month":"2014-06","Count":3}]"#),
			_ => json(404, r#"{"StatusCode":404,"Message":"Not found."}"#),
		}
	}
}
impl ApiHttpClient for FakeApi {
	type TransportError = FakeTransportError;

	fn send(&self, request: HttpRequest) -> HttpFuture<'_, Self::TransportError> {
		Box::pin(self.handle(request))
	}
}

fn unauthorized() -> HttpResponse {
	json(401, r#"{"StatusCode":401,"Message":"Authorization has been denied for this request."}"#)
}

fn json(status: u16, body: impl Into<String>) -> HttpResponse {
	let mut response = HttpResponse::new(body.into().into_bytes());

	*response.status_mut() = StatusCode::from_u16(status).expect("Fixture status should be valid.");

	response
}
