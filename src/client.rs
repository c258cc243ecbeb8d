//! DizzyData client: descriptor, transport, token provider, and the domain call sites.
//!
//! [`DizzydataClient`] owns exactly one [`TokenProvider`], so tokens and credentials are never
//! shared between client instances. Share a client across tasks by reference or behind an `Arc`.

mod authorized;
mod clients;
mod metrics;
mod reports;

pub use metrics::ClientMetrics;

// self
use crate::{
	_prelude::*,
	auth::{Credentials, TokenProvider},
	config::ApiDescriptor,
	exchange::{CredentialExchange, TransportErrorMapper},
	http::ApiHttpClient,
};
#[cfg(feature = "reqwest")]
use crate::{config::ClientConfig, exchange::ReqwestTransportErrorMapper, http::ReqwestHttpClient};

#[cfg(feature = "reqwest")]
/// Client specialized for the crate's default reqwest transport stack.
pub type ReqwestDizzydataClient = DizzydataClient<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Authenticated client for a single DizzyData account.
pub struct DizzydataClient<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// HTTP client used for the credential exchange and every API call.
	pub http_client: Arc<C>,
	/// Mapper applied to transport-layer errors before surfacing them to callers.
	pub transport_mapper: Arc<M>,
	/// Validated API descriptor.
	pub descriptor: ApiDescriptor,
	tokens: TokenProvider<C, M>,
	metrics: Arc<ClientMetrics>,
}
impl<C, M> DizzydataClient<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a client that reuses the caller-provided transport + mapper pair.
	pub fn with_http_client(
		descriptor: ApiDescriptor,
		credentials: Credentials,
		http_client: impl Into<Arc<C>>,
		mapper: impl Into<Arc<M>>,
	) -> Result<Self> {
		descriptor.validate()?;

		let http_client = http_client.into();
		let transport_mapper = mapper.into();
		let metrics = Arc::new(ClientMetrics::default());
		let exchange = CredentialExchange::new(
			http_client.clone(),
			transport_mapper.clone(),
			descriptor.token_url()?,
		);
		let tokens = TokenProvider::new(exchange, credentials, metrics.clone());

		Ok(Self { http_client, transport_mapper, descriptor, tokens, metrics })
	}

	/// Token provider backing this client.
	pub fn tokens(&self) -> &TokenProvider<C, M> {
		&self.tokens
	}

	/// Exchange and request counters.
	pub fn metrics(&self) -> &ClientMetrics {
		&self.metrics
	}

	/// Base URL relative targets are resolved against.
	pub fn base_url(&self) -> &Url {
		&self.descriptor.base_url
	}

	/// Returns a copy of the current credentials.
	pub fn credentials(&self) -> Credentials {
		self.tokens.credentials()
	}

	/// Replaces the credentials; the next token acquisition uses them.
	pub fn set_credentials(&self, credentials: Credentials) {
		self.tokens.set_credentials(credentials);
	}
}
#[cfg(feature = "reqwest")]
impl DizzydataClient<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Creates a client backed by its own reqwest transport.
	///
	/// The transport never follows redirects and applies the descriptor's timeout, if any.
	pub fn new(descriptor: ApiDescriptor, credentials: Credentials) -> Result<Self> {
		let http_client = ReqwestHttpClient::new(descriptor.timeout)?;

		Self::with_http_client(descriptor, credentials, http_client, ReqwestTransportErrorMapper)
	}

	/// Creates a client from loaded configuration.
	pub fn from_config(config: ClientConfig) -> Result<Self> {
		let (descriptor, credentials) = config.into_parts()?;

		Self::new(descriptor, credentials)
	}

	/// Creates a client from the `DIZZYDATA_*` environment variables.
	pub fn from_env() -> Result<Self> {
		Self::from_config(ClientConfig::from_env()?)
	}
}
impl<C, M> Debug for DizzydataClient<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("DizzydataClient")
			.field("descriptor", &self.descriptor)
			.field("tokens", &self.tokens)
			.finish()
	}
}
