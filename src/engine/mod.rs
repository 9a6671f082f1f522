//! The geodesy engine seam.
//!
//! A [`GeodesyEngine`] parses coordinate system definitions into opaque
//! handles, answers questions about them and runs point transforms. The
//! engine hands out plain ids ([`RawSrs`], [`RawTransform`]); owning those ids
//! and releasing them is the job of [`crate::handle`]. Callers are expected to
//! hold [`crate::lock::engine_lock`] around every call.

pub mod builtin;

use lazy_static::lazy_static;
use std::fmt;
use std::sync::Arc;

pub use builtin::BuiltinEngine;

/// Opaque id of a coordinate system definition held by an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawSrs(pub u64);

/// Opaque id of a transformation object held by an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawTransform(pub u64);

impl fmt::Display for RawSrs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "srs#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    #[error("unknown handle {0}")]
    UnknownHandle(u64),
    #[error("handle {0} holds no coordinate system definition")]
    EmptyHandle(u64),
    #[error("corrupt PROJ definition: {0}")]
    CorruptProj(String),
    #[error("unsupported projection `{0}`")]
    UnsupportedProjection(String),
    #[error("unknown ellipsoid `{0}`")]
    UnknownEllipsoid(String),
    #[error("unknown datum `{0}`")]
    UnknownDatum(String),
    #[error("unknown init code `{0}`")]
    UnknownInit(String),
    #[error("corrupt WKT at offset {offset}: {message}")]
    CorruptWkt { offset: usize, message: String },
    #[error("point is outside the domain of the projection")]
    OutOfDomain,
}

/// Operations consumed from a geodesy engine.
///
/// Handles are created empty by [`new_handle`](GeodesyEngine::new_handle) and
/// filled by one of the import calls. Every handle must be given back through
/// [`destroy_handle`](GeodesyEngine::destroy_handle), every transform through
/// [`destroy_transform`](GeodesyEngine::destroy_transform).
pub trait GeodesyEngine: Send + Sync {
    fn new_handle(&self) -> RawSrs;

    fn import_from_proj4(&self, handle: RawSrs, text: &str) -> Result<(), EngineError>;

    /// Parse WKT from `text`. On success the cursor is advanced past the
    /// consumed definition.
    fn import_from_wkt(&self, handle: RawSrs, text: &mut &str) -> Result<(), EngineError>;

    fn destroy_handle(&self, handle: RawSrs);

    fn is_geographic(&self, handle: RawSrs) -> bool;

    fn semi_major(&self, handle: RawSrs) -> Result<f64, EngineError>;

    fn semi_minor(&self, handle: RawSrs) -> Result<f64, EngineError>;

    /// Value of child `child` of the first node named `node`, searched depth
    /// first through the definition's WKT tree.
    fn attribute_value(&self, handle: RawSrs, node: &str, child: usize) -> Option<String>;

    fn export_to_wkt(&self, handle: RawSrs) -> Result<String, EngineError>;

    /// Full semantic comparison of two definitions.
    fn is_same(&self, a: RawSrs, b: RawSrs) -> bool;

    fn new_transform(&self, from: RawSrs, to: RawSrs) -> Option<RawTransform>;

    fn apply_transform(
        &self,
        transform: RawTransform,
        x: &mut f64,
        y: &mut f64,
        z: &mut f64,
    ) -> Result<(), EngineError>;

    fn destroy_transform(&self, transform: RawTransform);
}

lazy_static! {
    static ref DEFAULT_ENGINE: Arc<dyn GeodesyEngine> = Arc::new(BuiltinEngine::new());
}

/// The process-wide engine used by the factories that do not take one.
pub fn default_engine() -> Arc<dyn GeodesyEngine> {
    Arc::clone(&DEFAULT_ENGINE)
}
