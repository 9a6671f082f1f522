//! Spatial reference systems backed by a pluggable geodesy engine.
//!
//! A [`SpatialReference`] is built from a PROJ string, WKT, or a shorthand
//! such as `EPSG:4326`, and answers questions about the coordinate system it
//! describes: whether it is geographic or projected, whether it is a Mercator
//! projection, its name, its ellipsoid and its canonical WKT. It can test
//! equivalence with another spatial reference and transform points into it.
//!
//! ```
//! use spatial_ref::SpatialReference;
//!
//! let wgs84 = SpatialReference::create("wgs84").unwrap();
//! let mercator = SpatialReference::create("epsg:900913").unwrap();
//! assert!(mercator.is_mercator());
//! assert!(!wgs84.is_equivalent_to(&mercator));
//!
//! let (x, y) = wgs84.transform(0.0, 0.0, &mercator).unwrap();
//! assert!(x.abs() < 1e-6 && y.abs() < 1e-6);
//! ```
//!
//! Every call into the engine is serialized by a process-wide reentrant lock
//! (see [`lock`]), so spatial references can be shared freely between
//! threads.

pub mod ellipsoid;
pub mod engine;
pub mod gpkg;
pub mod handle;
pub mod lock;
mod result;
pub mod srs;

pub use ellipsoid::Ellipsoid;
pub use engine::{default_engine, BuiltinEngine, EngineError, GeodesyEngine, RawSrs, RawTransform};
pub use result::{Error, Result};
pub use srs::{InitType, SpatialReference};
