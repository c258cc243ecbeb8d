//! Lists clients and an invoice count through the default reqwest transport against a local mock
//! server, showing token reuse across calls.

// std
use std::time::Duration;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use url::Url;
// self
use dizzydata_api_client::{
	ReqwestDizzydataClient, auth::Credentials, config::ApiDescriptor, model::CountQuery,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"demo-access\",\"token_type\":\"bearer\",\"expires_in\":1199}",
			);
		})
		.await;

	server
		.mock_async(|when, then| {
			when.method(GET).path("/v1/clients").header("authorization", "Bearer demo-access");
			then.status(200)
				.header("content-type", "application/json")
				.body("[{\"Id\":20,\"Name\":\"Acme\"},{\"Id\":533,\"Name\":\"Beta\"}]");
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(GET).path("/v1/invoices/count").query_param("clientId", "20");
			then.status(200).header("content-type", "application/json").body("[{\"Count\":42}]");
		})
		.await;

	let descriptor = ApiDescriptor::builder(Url::parse(&server.base_url())?)
		.allow_insecure_http(true)
		.timeout(Duration::from_secs(10))
		.build()?;
	let client = ReqwestDizzydataClient::new(descriptor, Credentials::new("demo", "secret"))?;

	for entry in client.clients().await? {
		println!("Client {}: {}.", entry.id, entry.name);
	}

	let invoices =
		client.invoice_count(CountQuery::parse("20110101", "20140630")?.for_client(20)).await?;

	println!("Invoice count rows: {invoices:?}.");

	token_mock.assert_async().await;

	Ok(())
}
