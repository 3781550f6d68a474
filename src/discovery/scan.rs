//! Discovery by scanning a resource set for marked units.
//!
//! The scan has three collaborators:
//!
//! - [`ResourceSet`] hands every loadable unit to a visitor, with a readable
//!   metadata stream
//! - [`MarkerInspector`] reads that stream and answers whether the unit
//!   carries the marker, without loading it
//! - [`UnitLoader`] turns a marked unit into a [`HandlerType`]
//!
//! # Example
//!
//! ```ignore
//! use webactor_dispatch::discovery::{DirectoryResources, FactoryTable, LineMarker, ScanDiscovery};
//!
//! let discovery = ScanDiscovery::new(
//!     DirectoryResources::new("./actors", "actor"),
//!     LineMarker,
//!     FactoryTable::from_types(handler_types),
//!     "#[web_actor]",
//! );
//! ```

use std::collections::HashMap;
use std::fs;
use std::io::{self, BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

use super::{Discovery, RegisteredDiscovery};
use crate::error::{DispatchError, Result};
use crate::handler::HandlerType;

/// Callback receiving a unit id and its metadata stream.
pub type UnitVisitor<'a> = dyn FnMut(&str, &mut dyn Read) -> Result<()> + 'a;

/// Enumerates loadable units.
pub trait ResourceSet: Send + Sync + 'static {
    /// Visit every unit in a deterministic order.
    ///
    /// Fails with [`DispatchError::Enumeration`] if the set cannot be walked;
    /// a visitor error stops the walk and is returned unchanged.
    fn for_each_unit(&self, visitor: &mut UnitVisitor<'_>) -> Result<()>;
}

/// Reads unit metadata without activating the unit.
pub trait MarkerInspector: Send + Sync + 'static {
    fn has_marker(&self, marker: &str, metadata: &mut dyn Read) -> io::Result<bool>;
}

/// Loads a marked unit as a handler type.
pub trait UnitLoader: Send + Sync + 'static {
    fn load(&self, unit: &str) -> Result<HandlerType>;
}

/// Units are files under a directory with a given extension.
///
/// The unit id is the path relative to the root, without extension, with
/// segments joined by `.` (`chat/Room.actor` is `chat.Room`). Units are
/// visited in path order.
#[derive(Debug, Clone)]
pub struct DirectoryResources {
    root: PathBuf,
    extension: String,
}

impl DirectoryResources {
    pub fn new(root: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            extension: extension.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn unit_id(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .with_extension("")
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join(".")
    }
}

fn collect_units(dir: &Path, extension: &str, out: &mut Vec<PathBuf>) -> io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type()?.is_dir() {
            collect_units(&path, extension, out)?;
        } else if path.extension().is_some_and(|e| e == extension) {
            out.push(path);
        }
    }
    Ok(())
}

impl ResourceSet for DirectoryResources {
    fn for_each_unit(&self, visitor: &mut UnitVisitor<'_>) -> Result<()> {
        let mut files = Vec::new();
        collect_units(&self.root, &self.extension, &mut files).map_err(DispatchError::Enumeration)?;
        files.sort();

        for path in files {
            let unit = self.unit_id(&path);
            let mut file = fs::File::open(&path).map_err(|e| DispatchError::unit_load(&unit, e))?;
            visitor(&unit, &mut file)?;
        }
        Ok(())
    }
}

/// A unit is marked when one of its lines, trimmed, equals the marker.
#[derive(Debug, Clone, Copy, Default)]
pub struct LineMarker;

impl MarkerInspector for LineMarker {
    fn has_marker(&self, marker: &str, metadata: &mut dyn Read) -> io::Result<bool> {
        for line in BufReader::new(metadata).lines() {
            if line?.trim() == marker {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

/// Unit id to handler type lookup.
#[derive(Debug, Clone, Default)]
pub struct FactoryTable {
    entries: HashMap<String, HandlerType>,
}

impl FactoryTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table keyed by handler name, filled from build-time registrations.
    pub fn registered() -> Result<Self> {
        Ok(Self::from_types(RegisteredDiscovery.discover()?))
    }

    /// Table keyed by handler name.
    pub fn from_types(types: impl IntoIterator<Item = HandlerType>) -> Self {
        let entries = types
            .into_iter()
            .map(|t| (t.name().to_string(), t))
            .collect();
        Self { entries }
    }

    /// Map `unit` to `handler_type`, replacing any previous entry.
    pub fn insert(&mut self, unit: impl Into<String>, handler_type: HandlerType) {
        self.entries.insert(unit.into(), handler_type);
    }

    pub fn with(mut self, unit: impl Into<String>, handler_type: HandlerType) -> Self {
        self.insert(unit, handler_type);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl UnitLoader for FactoryTable {
    fn load(&self, unit: &str) -> Result<HandlerType> {
        self.entries
            .get(unit)
            .cloned()
            .ok_or_else(|| DispatchError::UnitNotFound(unit.to_string()))
    }
}

/// Where marked units are loaded from.
enum Loader {
    Fixed(Box<dyn UnitLoader>),
    /// A [`FactoryTable`] rebuilt from registrations on every pass.
    Registered,
}

/// Walk a resource set and load every unit carrying `marker`.
pub struct ScanDiscovery {
    resources: Box<dyn ResourceSet>,
    inspector: Box<dyn MarkerInspector>,
    loader: Loader,
    marker: String,
}

impl ScanDiscovery {
    pub fn new(
        resources: impl ResourceSet,
        inspector: impl MarkerInspector,
        loader: impl UnitLoader,
        marker: impl Into<String>,
    ) -> Self {
        Self {
            resources: Box::new(resources),
            inspector: Box::new(inspector),
            loader: Loader::Fixed(Box::new(loader)),
            marker: marker.into(),
        }
    }

    /// Load marked units by handler name from build-time registrations.
    ///
    /// Registrations are read during the pass, so a bad registration fails
    /// the pass rather than construction.
    pub fn registered(
        resources: impl ResourceSet,
        inspector: impl MarkerInspector,
        marker: impl Into<String>,
    ) -> Self {
        Self {
            resources: Box::new(resources),
            inspector: Box::new(inspector),
            loader: Loader::Registered,
            marker: marker.into(),
        }
    }
}

impl Discovery for ScanDiscovery {
    fn discover(&self) -> Result<Vec<HandlerType>> {
        let registered;
        let loader: &dyn UnitLoader = match &self.loader {
            Loader::Fixed(loader) => loader.as_ref(),
            Loader::Registered => {
                registered = FactoryTable::registered()?;
                &registered
            }
        };

        let mut found = Vec::new();

        self.resources.for_each_unit(&mut |unit, metadata| {
            let marked = self
                .inspector
                .has_marker(&self.marker, metadata)
                .map_err(|e| DispatchError::unit_load(unit, e))?;
            if marked {
                found.push(loader.load(unit)?);
            }
            Ok(())
        })?;

        Ok(found)
    }
}

impl std::fmt::Debug for ScanDiscovery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanDiscovery")
            .field("marker", &self.marker)
            .finish_non_exhaustive()
    }
}
