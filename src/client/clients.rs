//! Client listing and activation endpoints.

// self
use crate::{
	_prelude::*,
	client::DizzydataClient,
	exchange::TransportErrorMapper,
	http::ApiHttpClient,
	model::{Client, ClientUpdate, StatusResponse},
	request::ApiRequest,
};

const CLIENTS_PATH: &str = "v1/clients";

impl<C, M> DizzydataClient<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Lists every client visible to the account.
	pub async fn clients(&self) -> Result<Vec<Client>> {
		self.execute_json(&ApiRequest::get(CLIENTS_PATH)).await
	}

	/// Activates or deactivates a client.
	pub async fn update_client(&self, update: ClientUpdate) -> Result<StatusResponse> {
		self.execute_json(&update.apply(ApiRequest::put(CLIENTS_PATH))).await
	}
}
