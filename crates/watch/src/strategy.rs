use std::fmt;

use serde::{Deserialize, Serialize};

/// Policy deciding whether a fetch reads cached data, network data, or both.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FetchStrategy {
	/// Deliver cached data when present, otherwise go to the network.
	CacheFirst,
	/// Deliver cached data when present, then always go to the network.
	#[default]
	CacheThenNetwork,
	/// Skip the cache and go to the network.
	NetworkOnly,
	/// Deliver cached data only; a miss is an error.
	CacheOnly,
}

impl FetchStrategy {
	/// Returns true if this strategy may deliver cached data.
	pub const fn reads_cache(self) -> bool {
		!matches!(self, Self::NetworkOnly)
	}

	/// Returns true if this strategy may issue a network request.
	pub const fn reads_network(self) -> bool {
		!matches!(self, Self::CacheOnly)
	}

	/// Stable label for log fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::CacheFirst => "cache-first",
			Self::CacheThenNetwork => "cache-then-network",
			Self::NetworkOnly => "network-only",
			Self::CacheOnly => "cache-only",
		}
	}
}

impl fmt::Display for FetchStrategy {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Where a delivered result came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultSource {
	/// Served from the local cache.
	Cache,
	/// Served by a network round trip.
	Network,
}

/// One raw delivery from a watch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fetched<D> {
	/// Raw query data.
	pub data: D,
	/// Origin of `data`.
	pub source: ResultSource,
}

impl<D> Fetched<D> {
	/// Data served from the cache.
	pub fn cache(data: D) -> Self {
		Self {
			data,
			source: ResultSource::Cache,
		}
	}

	/// Data served by the network.
	pub fn network(data: D) -> Self {
		Self {
			data,
			source: ResultSource::Network,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn strategy_source_matrix() {
		assert!(FetchStrategy::CacheFirst.reads_cache() && FetchStrategy::CacheFirst.reads_network());
		assert!(FetchStrategy::CacheThenNetwork.reads_cache() && FetchStrategy::CacheThenNetwork.reads_network());
		assert!(!FetchStrategy::NetworkOnly.reads_cache() && FetchStrategy::NetworkOnly.reads_network());
		assert!(FetchStrategy::CacheOnly.reads_cache() && !FetchStrategy::CacheOnly.reads_network());
	}

	#[test]
	fn display_matches_serde_names() {
		assert_eq!(FetchStrategy::CacheThenNetwork.to_string(), "cache-then-network");
		assert_eq!(FetchStrategy::default(), FetchStrategy::CacheThenNetwork);
	}
}
