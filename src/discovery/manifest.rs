//! Discovery from explicit lists and build-time registrations.

use super::Discovery;
use crate::error::{DispatchError, Result};
use crate::handler::{registrations, HandlerType};

/// Fixed list of handler types, returned in the given order.
#[derive(Debug, Clone, Default)]
pub struct ManifestDiscovery {
    types: Vec<HandlerType>,
}

impl ManifestDiscovery {
    pub fn new(types: Vec<HandlerType>) -> Self {
        Self { types }
    }

    /// Append a handler type.
    pub fn with(mut self, handler_type: HandlerType) -> Self {
        self.types.push(handler_type);
        self
    }
}

impl Discovery for ManifestDiscovery {
    fn discover(&self) -> Result<Vec<HandlerType>> {
        Ok(self.types.clone())
    }
}

/// Every `inventory`-registered [`WebActorDef`](crate::handler::WebActorDef),
/// sorted by name.
///
/// Link order is not stable across builds, so the name is the ordering key.
/// Duplicate names are rejected.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegisteredDiscovery;

impl Discovery for RegisteredDiscovery {
    fn discover(&self) -> Result<Vec<HandlerType>> {
        let mut defs: Vec<_> = registrations().collect();
        defs.sort_by_key(|d| d.name);

        if let Some(pair) = defs.windows(2).find(|w| w[0].name == w[1].name) {
            return Err(DispatchError::unit_load(
                pair[0].name,
                "registered more than once",
            ));
        }

        defs.into_iter()
            .map(|def| {
                HandlerType::from_def(def).map_err(|e| DispatchError::unit_load(def.name, e))
            })
            .collect()
    }
}
