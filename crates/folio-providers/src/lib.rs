//! # Folio Providers
//!
//! Data-access seam for the Folio rebalancing advisor.
//!
//! The analytics engine consumes read-only, already-materialized historical
//! series; all acquisition, caching, and refresh logic lives behind the
//! traits defined here. The engine never blocks on I/O - by the time a
//! provider is handed to it, every series is resolved in memory.
//!
//! ## Modules
//!
//! - [`series`] - [`DateSeries`], an ordered date-to-value series with
//!   forward-fill lookup
//! - [`traits`] - [`MarketDataProvider`] and [`IncomeDataProvider`]
//! - [`memory`] - [`InMemoryProvider`], a map-backed implementation used by
//!   tests and thin calling programs

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod error;
pub mod memory;
pub mod series;
pub mod traits;

pub use error::{ProviderError, ProviderResult};
pub use memory::InMemoryProvider;
pub use series::DateSeries;
pub use traits::{IncomeDataProvider, MarketDataProvider};
