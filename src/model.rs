//! Request and response shapes of the DizzyData domain endpoints.
//!
//! The API answers with PascalCase keys (`Id`, `Name`, `StatusCode`); every field also accepts
//! its camelCase and snake_case spelling.

// crates.io
use time::Month;
// self
use crate::{_prelude::*, error::ConfigError, request::ApiRequest};

/// Client account managed by DizzyData.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
	/// Numeric client identifier.
	#[serde(alias = "Id")]
	pub id: u64,
	/// Display name.
	#[serde(alias = "Name")]
	pub name: String,
}

/// Activation change for a single client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientUpdate {
	/// Client to update.
	pub id: u64,
	/// New activation flag.
	pub active: bool,
}
impl ClientUpdate {
	pub(crate) fn apply(&self, request: ApiRequest) -> ApiRequest {
		request.query("id", self.id).query("active", self.active)
	}
}

/// Status envelope returned by mutating endpoints.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
	/// Status code reported in the body.
	#[serde(alias = "StatusCode", alias = "statusCode")]
	pub status_code: u16,
	/// Optional human-readable message.
	#[serde(default, alias = "Message")]
	pub message: Option<String>,
}

/// Reporting window for invoice and administration counts, optionally narrowed to one client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountQuery {
	/// Restricts the count to a single client.
	pub client_id: Option<u64>,
	/// First day of the window (inclusive).
	pub start_date: Date,
	/// Last day of the window (inclusive).
	pub end_date: Date,
}
impl CountQuery {
	/// Creates a query covering `start_date..=end_date` for all clients.
	///
	/// Both dates must fall in the years `0000..=9999` so they render as `YYYYMMDD`.
	pub fn new(start_date: Date, end_date: Date) -> Result<Self> {
		for date in [start_date, end_date] {
			if !(0..=9999).contains(&date.year()) {
				return Err(ConfigError::DateOutOfRange { date }.into());
			}
		}
		if start_date > end_date {
			return Err(ConfigError::InvertedPeriod { start: start_date, end: end_date }.into());
		}

		Ok(Self { client_id: None, start_date, end_date })
	}

	/// Creates a query from `YYYYMMDD` strings, the format the API uses on the wire.
	pub fn parse(start_date: &str, end_date: &str) -> Result<Self> {
		Self::new(parse_compact_date(start_date)?, parse_compact_date(end_date)?)
	}

	/// Narrows the query to one client.
	pub fn for_client(mut self, client_id: u64) -> Self {
		self.client_id = Some(client_id);

		self
	}

	pub(crate) fn apply(&self, request: ApiRequest) -> ApiRequest {
		request
			.query_opt("clientId", self.client_id)
			.query("startDate", format_compact_date(self.start_date))
			.query("endDate", format_compact_date(self.end_date))
	}
}

/// Renders a date as `YYYYMMDD`.
pub fn format_compact_date(date: Date) -> String {
	format!("{:04}{:02}{:02}", date.year(), u8::from(date.month()), date.day())
}

/// Parses a `YYYYMMDD` date.
pub fn parse_compact_date(value: &str) -> Result<Date> {
	let invalid = || ConfigError::InvalidDate { value: value.to_owned() };

	if value.len() != 8 || !value.bytes().all(|byte| byte.is_ascii_digit()) {
		return Err(invalid().into());
	}

	let year = value[0..4].parse::<i32>().map_err(|_| invalid())?;
	let month = value[4..6].parse::<u8>().map_err(|_| invalid())?;
	let day = value[6..8].parse::<u8>().map_err(|_| invalid())?;
	let month = Month::try_from(month).map_err(|_| invalid())?;

	Ok(Date::from_calendar_date(year, month, day).map_err(|_| invalid())?)
}
