//! On-disk result caching keyed by call identity.
//!
//! [`Cache`] wraps an [`Operation`](crate::Operation) and stores each result
//! in its own file:
//!
//! ```text
//! <operation>_<40 hex fingerprint>_<YYYY-MM-DD_HHMMSS>.<csv|bin>
//! ```
//!
//! The fingerprint is the SHA-1 of the canonical call string
//! `name(arg, ..., key=value, ...)`, built from each argument's [`ArgRepr`].
//! The timestamp is local time at write, to the second.
//!
//! # Freshness
//!
//! A stored result is served while it is at least as new as the
//! [`Reachback`] cutoff. The default cutoff is `0001-01-01`, so once a call
//! has been stored it is served forever. A relative reachback such as
//! `"6 hours"` is resolved against the clock on every call.
//!
//! # Retention
//!
//! In single-version mode (the default) each new result replaces the older
//! files for its fingerprint once it is safely on disk. In hoard mode every
//! file is kept.
//!
//! # Storage Formats
//!
//! [`Table`] results are written as CSV; everything else implementing
//! [`Cacheable`] as `bincode`. Wrap arbitrary serde types in [`Binary`].
//!
//! # Limits
//!
//! The inventory is private to one `Cache` value. Two processes sharing a
//! directory do not see each other's writes until [`Cache::rescan`], and in
//! single-version mode one may delete a file the other has just written.

mod cached;
mod codec;
mod config;
mod error;
mod fingerprint;
mod inventory;
mod reachback;
mod store;

pub use cached::Cache;
pub use codec::{Binary, Cacheable, StorageFormat, Table};
pub use config::{CacheConfig, Clock, SystemClock};
pub use error::{CacheError, CachedCallError, CodecError, ReachbackError};
pub use fingerprint::{fingerprint, ArgRepr, CallArgs, Fingerprint, ParseFingerprintError, ToCallArgs};
pub use inventory::{CacheEntry, CacheInventory};
pub use reachback::{parse_reachback, Reachback, Span};
pub use store::{file_name, TIMESTAMP_FORMAT};

#[cfg(test)]
mod tests;
