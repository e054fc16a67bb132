//! Reference propagator bodies for propnet networks.
//!
//! - [`Identity`]: copies its first input (re-exported from
//!   `propnet-propagator`, where `unify` uses it).
//! - [`Add`]: numeric sum or text concatenation.
//! - [`Min`]: smallest input; the stock conflict-resolution strategy.
//! - [`Display`]: prints its inputs into a [`DisplaySink`] and through
//!   `tracing`. Never writes.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod arithmetic;
pub mod display;
pub mod select;

pub use arithmetic::Add;
pub use display::{Display, DisplaySink};
pub use propnet_propagator::Identity;
pub use select::Min;
