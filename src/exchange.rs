//! Credential exchange against the token endpoint and transport error mapping.
//!
//! [`CredentialExchange`] performs exactly one username/password exchange per call and never
//! retries; retry policy belongs to the authorized-request executor. Rejections (`401`/`403`, or a
//! `400` naming `invalid_grant`/`invalid_client`) surface as
//! [`AuthenticationError::CredentialsRejected`] with the endpoint's status and body, so callers can
//! tell bad credentials apart from transport failures.

// crates.io
use ::http::{
	Method, Request, StatusCode,
	header::{ACCEPT, CONTENT_TYPE},
};
// self
use crate::{
	_prelude::*,
	auth::{AccessToken, Credentials},
	error::{AuthenticationError, ConfigError, FailureBody, RequestError},
	http::{self as transport, ApiHttpClient},
	obs::Stage,
	request,
};

/// Maps HTTP transport failures into client [`Error`] values.
pub trait TransportErrorMapper<E>
where
	Self: 'static + Send + Sync,
	E: 'static + Send + Sync + StdError,
{
	/// Converts an error emitted by the transport during `stage` into a client error.
	fn map_transport_error(&self, stage: Stage, error: E) -> Error;
}

/// Default mapper for reqwest-backed transports.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransportErrorMapper;
#[cfg(feature = "reqwest")]
impl TransportErrorMapper<ReqwestError> for ReqwestTransportErrorMapper {
	fn map_transport_error(&self, stage: Stage, err: ReqwestError) -> Error {
		if err.is_builder() {
			return ConfigError::from(err).into();
		}
		if err.is_timeout() {
			return RequestError::Timeout { stage }.into();
		}

		RequestError::network(stage, err).into()
	}
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
	#[serde(alias = "AccessToken", alias = "token")]
	access_token: String,
}

/// Performs username/password exchanges against a single token endpoint.
pub struct CredentialExchange<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	http_client: Arc<C>,
	error_mapper: Arc<M>,
	token_url: Url,
}
impl<C, M> CredentialExchange<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates an exchange bound to `token_url`.
	pub fn new(http_client: Arc<C>, error_mapper: Arc<M>, token_url: Url) -> Self {
		Self { http_client, error_mapper, token_url }
	}

	/// Token endpoint used for every exchange.
	pub fn token_url(&self) -> &Url {
		&self.token_url
	}

	/// Exchanges `credentials` for a bearer token.
	pub async fn exchange(&self, credentials: &Credentials) -> Result<AccessToken> {
		const STAGE: Stage = Stage::CredentialExchange;

		let request = Request::builder()
			.method(Method::POST)
			.uri(self.token_url.as_str())
			.header(CONTENT_TYPE, "application/x-www-form-urlencoded")
			.header(ACCEPT, "application/json")
			.body(credentials.to_form().into_bytes())
			.map_err(ConfigError::from)?;
		let response = self
			.http_client
			.send(request)
			.await
			.map_err(|err| self.error_mapper.map_transport_error(STAGE, err))?;
		let status = response.status();

		if !status.is_success() {
			let body = FailureBody::from_bytes(response.body());

			if is_credential_rejection(status, &body) {
				return Err(AuthenticationError::CredentialsRejected {
					status: status.as_u16(),
					body,
				}
				.into());
			}

			return Err(RequestError::Status {
				stage: STAGE,
				status: status.as_u16(),
				body,
				retry_after: transport::parse_retry_after(response.headers()),
			}
			.into());
		}

		let payload: TokenResponse = request::decode_json(STAGE, status.as_u16(), response.body())?;

		if payload.access_token.trim().is_empty() {
			return Err(RequestError::MalformedToken { status: status.as_u16() }.into());
		}

		Ok(AccessToken::new(payload.access_token))
	}
}
impl<C, M> Clone for CredentialExchange<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn clone(&self) -> Self {
		Self {
			http_client: self.http_client.clone(),
			error_mapper: self.error_mapper.clone(),
			token_url: self.token_url.clone(),
		}
	}
}
impl<C, M> Debug for CredentialExchange<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CredentialExchange").field("token_url", &self.token_url.as_str()).finish()
	}
}

fn is_credential_rejection(status: StatusCode, body: &FailureBody) -> bool {
	match status {
		StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => true,
		StatusCode::BAD_REQUEST => {
			let lowered = body.as_str().to_ascii_lowercase();

			lowered.contains("invalid_grant") || lowered.contains("invalid_client")
		},
		_ => false,
	}
}
