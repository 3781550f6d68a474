//! Discovery strategies - how handler types are found.
//!
//! Provides:
//! - [`RegisteredDiscovery`] - build-time registrations collected by `inventory`
//! - [`ManifestDiscovery`] - an explicit, ordered list
//! - [`ScanDiscovery`] - walk a resource set, keep units carrying a marker
//!
//! A strategy returns handler types in a deterministic order; the first
//! type whose URI patterns accept a request wins, so order is observable.
//!
//! Strategies run on the blocking pool and may do blocking I/O.

mod manifest;
mod scan;

pub use manifest::{ManifestDiscovery, RegisteredDiscovery};
pub use scan::{
    DirectoryResources, FactoryTable, LineMarker, MarkerInspector, ResourceSet, ScanDiscovery,
    UnitLoader, UnitVisitor,
};

use crate::error::Result;
use crate::handler::HandlerType;

/// A way of enumerating eligible handler types.
pub trait Discovery: Send + Sync + 'static {
    /// Run one full discovery pass.
    ///
    /// Returns [`Enumeration`](crate::DispatchError::Enumeration) when the
    /// resource set cannot be walked at all, and any other error when a single
    /// unit fails; either way the pass yields nothing.
    fn discover(&self) -> Result<Vec<HandlerType>>;
}
