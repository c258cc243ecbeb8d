//! Processing-volume reports.

// self
use crate::{
	_prelude::*,
	client::DizzydataClient,
	exchange::TransportErrorMapper,
	http::ApiHttpClient,
	model::CountQuery,
	request::ApiRequest,
};

const INVOICE_COUNT_PATH: &str = "v1/invoices/count";
const ADMINISTRATION_COUNT_PATH: &str = "v1/administrations/count";

impl<C, M> DizzydataClient<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Number of invoices processed in the query window, as reported by the API.
	pub async fn invoice_count(&self, query: CountQuery) -> Result<Vec<serde_json::Value>> {
		self.execute_json(&query.apply(ApiRequest::get(INVOICE_COUNT_PATH))).await
	}

	/// Number of administrations processed in the query window, as reported by the API.
	pub async fn administration_count(&self, query: CountQuery) -> Result<Vec<serde_json::Value>> {
		self.execute_json(&query.apply(ApiRequest::get(ADMINISTRATION_COUNT_PATH))).await
	}
}
