//! Token provider with coalesced acquisition and compare-and-clear invalidation.
//!
//! The provider owns a single [`TokenState`]. When no token is cached, the first caller installs a
//! shared in-flight acquisition and every concurrent caller awaits that same acquisition, so
//! exactly one credential exchange happens per cycle. The state lock is synchronous and is never
//! held across an `.await`; observers therefore always see a whole state, never a torn one.
//!
//! ```text
//! absent --acquire--> pending --resolve--> resolved --invalidate--> absent
//!                     pending --fail-----> absent
//! ```

// std
use std::sync::atomic::{AtomicU64, Ordering};
// crates.io
use futures::future::{BoxFuture, FutureExt, Shared};
// self
use crate::{
	_prelude::*,
	auth::{AccessToken, Credentials},
	client::ClientMetrics,
	exchange::{CredentialExchange, TransportErrorMapper},
	http::ApiHttpClient,
	obs::{self, CallOutcome, CallSpan, Stage},
};

type SharedAcquisition = Shared<BoxFuture<'static, Result<AccessToken>>>;

/// Handle to an in-flight token acquisition.
///
/// Every clone refers to the same underlying credential exchange; awaiting any of them yields the
/// same token or the same error.
#[derive(Clone)]
pub struct PendingToken {
	id: u64,
	acquisition: SharedAcquisition,
}
impl PendingToken {
	/// Identifier of the underlying acquisition; equal ids mean the same exchange.
	pub fn id(&self) -> u64 {
		self.id
	}

	/// Waits for the acquisition to finish.
	pub async fn wait(self) -> Result<AccessToken> {
		self.acquisition.await
	}
}
impl Debug for PendingToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("PendingToken").field("id", &self.id).finish()
	}
}

/// Observable state of the cached token.
#[derive(Clone, Debug, Default)]
pub enum TokenState {
	/// No acquisition attempted yet, or the last token was invalidated.
	#[default]
	Absent,
	/// An acquisition is in flight.
	Pending(PendingToken),
	/// A token is cached.
	Resolved(AccessToken),
}
impl TokenState {
	/// Returns the cached token, if resolved.
	pub fn resolved(&self) -> Option<&AccessToken> {
		match self {
			Self::Resolved(token) => Some(token),
			_ => None,
		}
	}

	/// Returns the in-flight acquisition, if pending.
	pub fn pending(&self) -> Option<&PendingToken> {
		match self {
			Self::Pending(pending) => Some(pending),
			_ => None,
		}
	}
}

/// Acquires, caches, and invalidates bearer tokens for one set of credentials.
pub struct TokenProvider<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	exchange: CredentialExchange<C, M>,
	credentials: RwLock<Credentials>,
	state: Mutex<TokenState>,
	next_id: AtomicU64,
	metrics: Arc<ClientMetrics>,
}
impl<C, M> TokenProvider<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a provider in the [`TokenState::Absent`] state.
	pub fn new(
		exchange: CredentialExchange<C, M>,
		credentials: Credentials,
		metrics: Arc<ClientMetrics>,
	) -> Self {
		Self {
			exchange,
			credentials: RwLock::new(credentials),
			state: Mutex::new(TokenState::Absent),
			next_id: AtomicU64::new(1),
			metrics,
		}
	}

	/// Returns a copy of the credentials used for the next acquisition.
	pub fn credentials(&self) -> Credentials {
		self.credentials.read().clone()
	}

	/// Replaces the credentials; the change applies to the next acquisition, not to a cached or
	/// in-flight token.
	pub fn set_credentials(&self, credentials: Credentials) {
		*self.credentials.write() = credentials;
	}

	/// Snapshot of the current state. Calls made while an acquisition is pending all observe the
	/// same [`PendingToken`].
	pub fn state(&self) -> TokenState {
		self.state.lock().clone()
	}

	/// Returns the cached token, joins the in-flight acquisition, or starts a new one.
	pub async fn token(&self) -> Result<AccessToken> {
		let pending = {
			let mut state = self.state.lock();

			if let TokenState::Resolved(token) = &*state {
				return Ok(token.clone());
			}

			self.join_or_start(&mut state)
		};

		self.settle(pending).await
	}

	/// Replaces any cached token with a freshly acquired one, joining an acquisition that is
	/// already in flight instead of starting a second.
	pub async fn acquire_token(&self) -> Result<AccessToken> {
		let pending = {
			let mut state = self.state.lock();

			self.join_or_start(&mut state)
		};

		self.settle(pending).await
	}

	/// Performs a credential exchange without reading or updating the cached state.
	pub async fn request_token(&self) -> Result<AccessToken> {
		let credentials = self.credentials();

		run_exchange(&self.exchange, &credentials, &self.metrics).await
	}

	/// Drops the cached token if it is still `stale`.
	///
	/// Returns `false` when another caller already replaced it, in which case the newer token (or
	/// acquisition) is left untouched.
	pub fn invalidate(&self, stale: &AccessToken) -> bool {
		let mut state = self.state.lock();

		if state.resolved() == Some(stale) {
			*state = TokenState::Absent;

			return true;
		}

		false
	}

	/// Drops the cached token so the next call acquires a new one.
	///
	/// An in-flight acquisition is left in place, so at most one exchange is ever running; its
	/// result becomes the cached token as usual. Returns `true` when a resolved token was dropped.
	pub fn clear(&self) -> bool {
		let mut state = self.state.lock();

		if let TokenState::Resolved(_) = &*state {
			*state = TokenState::Absent;

			return true;
		}

		false
	}

	fn join_or_start(&self, state: &mut TokenState) -> PendingToken {
		if let TokenState::Pending(pending) = state {
			return pending.clone();
		}

		let id = self.next_id.fetch_add(1, Ordering::Relaxed);
		let exchange = self.exchange.clone();
		let credentials = self.credentials();
		let metrics = self.metrics.clone();
		let acquisition =
			async move { run_exchange(&exchange, &credentials, &metrics).await }.boxed().shared();
		let pending = PendingToken { id, acquisition };

		*state = TokenState::Pending(pending.clone());

		pending
	}

	async fn settle(&self, pending: PendingToken) -> Result<AccessToken> {
		let id = pending.id;
		let outcome = pending.wait().await;
		let mut state = self.state.lock();

		if state.pending().is_some_and(|current| current.id == id) {
			*state = match &outcome {
				Ok(token) => TokenState::Resolved(token.clone()),
				Err(_) => TokenState::Absent,
			};
		}

		outcome
	}
}
impl<C, M> Debug for TokenProvider<C, M>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenProvider")
			.field("exchange", &self.exchange)
			.field("state", &*self.state.lock())
			.finish()
	}
}

async fn run_exchange<C, M>(
	exchange: &CredentialExchange<C, M>,
	credentials: &Credentials,
	metrics: &ClientMetrics,
) -> Result<AccessToken>
where
	C: ?Sized + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	const STAGE: Stage = Stage::CredentialExchange;

	let span = CallSpan::new(STAGE, exchange.token_url().path());

	obs::record_call_outcome(STAGE, CallOutcome::Attempt);
	metrics.record_exchange();

	let result = span.instrument(exchange.exchange(credentials)).await;

	match &result {
		Ok(_) => obs::record_call_outcome(STAGE, CallOutcome::Success),
		Err(_) => {
			metrics.record_exchange_failure();
			obs::record_call_outcome(STAGE, CallOutcome::Failure);
		},
	}

	result
}
