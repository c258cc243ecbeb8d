//! Username/password pair exchanged for bearer tokens.

// self
use crate::_prelude::*;

/// Account credentials presented to the credential endpoint.
///
/// The password never appears in `Debug` output.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct Credentials {
	/// Account name.
	pub username: String,
	password: String,
}
impl Credentials {
	/// Creates a credential pair.
	pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
		Self { username: username.into(), password: password.into() }
	}

	/// Returns the password. Callers must avoid logging this string.
	pub fn expose_password(&self) -> &str {
		&self.password
	}

	/// Encodes the pair as the `application/x-www-form-urlencoded` body of a password grant.
	pub(crate) fn to_form(&self) -> String {
		url::form_urlencoded::Serializer::new(String::new())
			.append_pair("grant_type", "password")
			.append_pair("username", &self.username)
			.append_pair("password", &self.password)
			.finish()
	}
}
impl Debug for Credentials {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Credentials")
			.field("username", &self.username)
			.field("password", &"<redacted>")
			.finish()
	}
}
