// self
use crate::{_prelude::*, auth::Credentials, config::ApiDescriptor, error::ConfigError};

/// Connection settings for a single DizzyData account.
#[derive(Clone, Deserialize)]
pub struct ClientConfig {
	/// Base URL of the API.
	pub url: Url,
	/// Account name.
	pub username: String,
	/// Account password.
	pub password: String,
}
impl ClientConfig {
	/// Environment variable holding the base URL.
	pub const URL_KEY: &'static str = "DIZZYDATA_URL";
	/// Environment variable holding the account name.
	pub const USERNAME_KEY: &'static str = "DIZZYDATA_USERNAME";
	/// Environment variable holding the account password.
	pub const PASSWORD_KEY: &'static str = "DIZZYDATA_PASSWORD";

	/// Reads the configuration from the process environment.
	pub fn from_env() -> Result<Self> {
		Self::from_lookup(|key| std::env::var(key).ok())
	}

	/// Reads the configuration through `lookup`, which maps a variable name to its value.
	pub fn from_lookup<F>(lookup: F) -> Result<Self>
	where
		F: Fn(&str) -> Option<String>,
	{
		let require = |key: &'static str| {
			lookup(key).filter(|value| !value.is_empty()).ok_or(ConfigError::MissingEnv { key })
		};
		let url = Url::parse(&require(Self::URL_KEY)?)
			.map_err(|source| ConfigError::InvalidEnv { key: Self::URL_KEY, source })?;

		Ok(Self { url, username: require(Self::USERNAME_KEY)?, password: require(Self::PASSWORD_KEY)? })
	}

	/// Splits the configuration into a validated descriptor and the credential pair.
	pub fn into_parts(self) -> Result<(ApiDescriptor, Credentials)> {
		let descriptor = ApiDescriptor::builder(self.url).build()?;

		Ok((descriptor, Credentials::new(self.username, self.password)))
	}
}
impl Debug for ClientConfig {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ClientConfig")
			.field("url", &self.url.as_str())
			.field("username", &self.username)
			.field("password", &"<redacted>")
			.finish()
	}
}
