//! Command-range routing.
//!
//! A [`RoutingTable`] maps half-open command ranges to backends. It is built
//! once at startup, validated (no empty or overlapping ranges), and then only
//! read, so it is shared between adapters behind an `Arc` without locking.
//!
//! # Example
//!
//! ```rust
//! use gatekit_core::routing::RoutingTable;
//!
//! let table = RoutingTable::builder()
//!     .route(1000..2000, "http://127.0.0.1:50052", "gatekit.backend.EnvelopeBackend/HandleEnvelope")
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(table.resolve(1000).unwrap().backend_address, "http://127.0.0.1:50052");
//! assert!(table.resolve(2000).is_err());
//! ```

use std::fmt;
use std::ops::Range;

use crate::error::RoutingError;

/// A half-open command range `[low, high)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CommandRange {
    low: u32,
    high: u32,
}

impl CommandRange {
    /// Create a range, rejecting empty ones.
    pub const fn new(low: u32, high: u32) -> Result<Self, RoutingError> {
        if low >= high {
            return Err(RoutingError::EmptyRange { low, high });
        }
        Ok(Self { low, high })
    }

    /// Inclusive lower bound.
    #[must_use]
    pub const fn low(&self) -> u32 {
        self.low
    }

    /// Exclusive upper bound.
    #[must_use]
    pub const fn high(&self) -> u32 {
        self.high
    }

    /// Whether `command` falls in this range.
    #[must_use]
    pub const fn contains(&self, command: u32) -> bool {
        self.low <= command && command < self.high
    }
}

impl TryFrom<Range<u32>> for CommandRange {
    type Error = RoutingError;

    fn try_from(range: Range<u32>) -> Result<Self, Self::Error> {
        Self::new(range.start, range.end)
    }
}

impl fmt::Display for CommandRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.low, self.high)
    }
}

/// One routing rule: which backend serves a command range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteEntry {
    /// Commands owned by this backend.
    pub range: CommandRange,
    /// Backend URI, e.g. `http://127.0.0.1:50052`.
    pub backend_address: String,
    /// Fully-qualified method, e.g. `gatekit.backend.EnvelopeBackend/HandleEnvelope`.
    pub backend_interface: String,
}

impl RouteEntry {
    /// Create a route entry.
    pub fn new(
        range: CommandRange,
        backend_address: impl Into<String>,
        backend_interface: impl Into<String>,
    ) -> Self {
        Self {
            range,
            backend_address: backend_address.into(),
            backend_interface: backend_interface.into(),
        }
    }

    /// The HTTP/2 path of the backend method, always with a leading `/`.
    #[must_use]
    pub fn method_path(&self) -> String {
        if self.backend_interface.starts_with('/') {
            self.backend_interface.clone()
        } else {
            format!("/{}", self.backend_interface)
        }
    }
}

/// Immutable, sorted set of non-overlapping routes.
#[derive(Debug, Clone, Default)]
pub struct RoutingTable {
    entries: Vec<RouteEntry>,
}

impl RoutingTable {
    /// Build a table from entries in any order.
    ///
    /// Fails if two ranges overlap.
    pub fn new(mut entries: Vec<RouteEntry>) -> Result<Self, RoutingError> {
        entries.sort_by_key(|entry| entry.range.low);

        for pair in entries.windows(2) {
            if pair[1].range.low < pair[0].range.high {
                return Err(RoutingError::Overlapping {
                    first: pair[0].range,
                    second: pair[1].range,
                });
            }
        }

        Ok(Self { entries })
    }

    /// Start building a table.
    #[must_use]
    pub fn builder() -> RoutingTableBuilder {
        RoutingTableBuilder::default()
    }

    /// Find the route owning `command`.
    pub fn resolve(&self, command: u32) -> Result<&RouteEntry, RoutingError> {
        // First entry whose low is above the command; the candidate precedes it.
        let idx = self
            .entries
            .partition_point(|entry| entry.range.low <= command);

        idx.checked_sub(1)
            .map(|i| &self.entries[i])
            .filter(|entry| entry.range.contains(command))
            .ok_or(RoutingError::Unroutable { command })
    }

    /// Routes sorted by lower bound.
    #[must_use]
    pub fn entries(&self) -> &[RouteEntry] {
        &self.entries
    }

    /// Number of routes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no routes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Builder for [`RoutingTable`].
///
/// Range errors are collected and reported by [`build`](Self::build).
#[derive(Debug, Default)]
pub struct RoutingTableBuilder {
    entries: Vec<RouteEntry>,
    error: Option<RoutingError>,
}

impl RoutingTableBuilder {
    /// Add a route for `range`.
    pub fn route(
        mut self,
        range: Range<u32>,
        backend_address: impl Into<String>,
        backend_interface: impl Into<String>,
    ) -> Self {
        match CommandRange::try_from(range) {
            Ok(range) => self
                .entries
                .push(RouteEntry::new(range, backend_address, backend_interface)),
            Err(err) => {
                self.error.get_or_insert(err);
            }
        }
        self
    }

    /// Add a prebuilt entry.
    pub fn entry(mut self, entry: RouteEntry) -> Self {
        self.entries.push(entry);
        self
    }

    /// Validate and build the table.
    pub fn build(self) -> Result<RoutingTable, RoutingError> {
        if let Some(err) = self.error {
            return Err(err);
        }
        RoutingTable::new(self.entries)
    }
}
