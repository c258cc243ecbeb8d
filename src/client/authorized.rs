//! Authorized-request executor with one-shot re-authentication.
//!
//! Each call runs through ordered stages: obtain a token (cached, joined, or freshly acquired),
//! attach it, dispatch, and inspect the status. A `401 Unauthorized` on the first attempt means
//! the cached token expired or was revoked server-side, so the executor invalidates that token,
//! acquires a new one with the same credentials, and retries exactly once. A second `401` is
//! terminal. No other status is retried.

// crates.io
use ::http::StatusCode;
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	auth::AccessToken,
	client::DizzydataClient,
	error::{AuthenticationError, FailureBody, RequestError},
	exchange::TransportErrorMapper,
	http::{self as transport, ApiHttpClient, HttpResponse},
	obs::{self, CallOutcome, CallSpan, Stage},
	request::{ApiRequest, ApiResponse},
};

const STAGE: Stage = Stage::ApiRequest;

impl<C, M> DizzydataClient<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Executes `request` with a bearer token, re-authenticating once if the token is rejected.
	pub async fn execute(&self, request: &ApiRequest) -> Result<ApiResponse> {
		let label = request.label();
		let span = CallSpan::new(STAGE, &label);

		obs::record_call_outcome(STAGE, CallOutcome::Attempt);

		let result = span.instrument(self.execute_with_retry(request, &label)).await;

		match &result {
			Ok(_) => obs::record_call_outcome(STAGE, CallOutcome::Success),
			Err(_) => {
				self.metrics.record_request_failure();
				obs::record_call_outcome(STAGE, CallOutcome::Failure);
			},
		}

		result
	}

	/// Executes `request` and decodes the JSON body of the successful response.
	pub async fn execute_json<T>(&self, request: &ApiRequest) -> Result<T>
	where
		T: DeserializeOwned,
	{
		self.execute(request).await?.json()
	}

	async fn execute_with_retry(&self, request: &ApiRequest, label: &str) -> Result<ApiResponse> {
		let token = self.tokens.token().await?;
		let response = self.dispatch(request, &token).await?;

		if response.status() != StatusCode::UNAUTHORIZED {
			return finish(response);
		}

		obs::trace_reauthentication(label, response.status().as_u16());
		obs::record_call_outcome(STAGE, CallOutcome::Retry);
		self.metrics.record_reauthentication();
		self.tokens.invalidate(&token);

		let fresh = self.tokens.token().await?;
		let response = self.dispatch(request, &fresh).await?;

		if response.status() == StatusCode::UNAUTHORIZED {
			return Err(AuthenticationError::TokenRejected {
				status: response.status().as_u16(),
				body: FailureBody::from_bytes(response.body()),
			}
			.into());
		}

		finish(response)
	}

	async fn dispatch(&self, request: &ApiRequest, token: &AccessToken) -> Result<HttpResponse> {
		let http_request = request.to_http(&self.descriptor.base_url, token)?;

		self.metrics.record_request();

		self.http_client
			.send(http_request)
			.await
			.map_err(|err| self.transport_mapper.map_transport_error(STAGE, err))
	}
}

fn finish(response: HttpResponse) -> Result<ApiResponse> {
	let (parts, body) = response.into_parts();

	if parts.status.is_success() {
		return Ok(ApiResponse::new(parts.status, parts.headers, body));
	}

	Err(RequestError::Status {
		stage: STAGE,
		status: parts.status.as_u16(),
		body: FailureBody::from_bytes(&body),
		retry_after: transport::parse_retry_after(&parts.headers),
	}
	.into())
}
