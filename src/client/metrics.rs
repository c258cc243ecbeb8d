// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters for credential exchanges and authorized requests.
#[derive(Debug, Default)]
pub struct ClientMetrics {
	exchanges: AtomicU64,
	exchange_failures: AtomicU64,
	requests: AtomicU64,
	request_failures: AtomicU64,
	reauthentications: AtomicU64,
}
impl ClientMetrics {
	/// Returns the number of credential exchanges performed.
	pub fn exchanges(&self) -> u64 {
		self.exchanges.load(Ordering::Relaxed)
	}

	/// Returns the number of credential exchanges that failed.
	pub fn exchange_failures(&self) -> u64 {
		self.exchange_failures.load(Ordering::Relaxed)
	}

	/// Returns the number of authorized requests dispatched, retries included.
	pub fn requests(&self) -> u64 {
		self.requests.load(Ordering::Relaxed)
	}

	/// Returns the number of authorized calls that surfaced an error.
	pub fn request_failures(&self) -> u64 {
		self.request_failures.load(Ordering::Relaxed)
	}

	/// Returns the number of calls that re-authenticated after a `401`.
	pub fn reauthentications(&self) -> u64 {
		self.reauthentications.load(Ordering::Relaxed)
	}

	pub(crate) fn record_exchange(&self) {
		self.exchanges.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_exchange_failure(&self) {
		self.exchange_failures.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_request(&self) {
		self.requests.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_request_failure(&self) {
		self.request_failures.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_reauthentication(&self) {
		self.reauthentications.fetch_add(1, Ordering::Relaxed);
	}
}
