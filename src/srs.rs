//! Spatial reference system handles.
//!
//! A [`SpatialReference`] wraps an engine handle built from a PROJ string or
//! WKT. Its semantic properties (classification, name, ellipsoid, canonical
//! WKT) are derived from the engine the first time any of them is asked for,
//! and never change afterwards.

use crate::ellipsoid::Ellipsoid;
use crate::engine::{default_engine, EngineError, GeodesyEngine, RawSrs, RawTransform};
use crate::handle::{SrsHandle, TransformHandle};
use crate::lock::engine_lock;
use crate::result::{Error, Result};
use geo_types::{Coord, Point};
use std::fmt;
use std::sync::{Arc, OnceLock};

/// Legacy and alias codes for spherical/web Mercator.
const WEB_MERCATOR_CODES: &[&str] = &[
    "epsg:900913",
    "epsg:3785",
    "epsg:41001",
    "epsg:54004",
    "epsg:9804",
    "epsg:9805",
];

const WEB_MERCATOR_PROJ4: &str =
    "+proj=merc +lon_0=0 +k=1 +x_0=0 +y_0=0 +ellps=WGS84 +datum=WGS84 +units=m +no_defs";

const WGS84_PROJ4: &str = "+proj=longlat +ellps=WGS84 +datum=WGS84 +no_defs";

/// Which factory produced a [`SpatialReference`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InitType {
    Proj4,
    Wkt,
}

impl fmt::Display for InitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InitType::Proj4 => f.write_str("PROJ4"),
            InitType::Wkt => f.write_str("WKT"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Route {
    WebMercator,
    Wgs84,
    Proj4,
    InitDirective,
    Wkt,
}

fn is_web_mercator_code(s: &str) -> bool {
    WEB_MERCATOR_CODES.contains(&s)
}

fn is_wgs84_code(s: &str) -> bool {
    s == "epsg:4326" || s == "wgs84"
}

fn is_proj4(s: &str) -> bool {
    s.starts_with('+')
}

fn is_init_code(s: &str) -> bool {
    s.starts_with("epsg:") || s.starts_with("osgeo:")
}

fn is_wkt(s: &str) -> bool {
    s.starts_with("projcs") || s.starts_with("geogcs")
}

/// Dispatch rules for [`SpatialReference::create`], first match wins. The
/// shortcut codes must come before the generic `epsg:` prefix.
const ROUTES: &[(fn(&str) -> bool, Route)] = &[
    (is_web_mercator_code, Route::WebMercator),
    (is_wgs84_code, Route::Wgs84),
    (is_proj4, Route::Proj4),
    (is_init_code, Route::InitDirective),
    (is_wkt, Route::Wkt),
];

fn route(normalized: &str) -> Option<Route> {
    ROUTES
        .iter()
        .find(|(matches, _)| matches(normalized))
        .map(|(_, route)| *route)
}

#[derive(Debug, Clone)]
struct Derived {
    is_geographic: bool,
    is_mercator: bool,
    name: String,
    wkt: String,
    ellipsoid: Ellipsoid,
}

/// An immutable description of a geographic or projected coordinate system.
///
/// Instances are created through [`SpatialReference::create`],
/// [`SpatialReference::create_from_proj4`] or
/// [`SpatialReference::create_from_wkt`] and are `Send + Sync`; wrap them in
/// an `Arc` to share them.
#[derive(Debug)]
pub struct SpatialReference {
    handle: SrsHandle,
    init_type: InitType,
    init_string: String,
    init_string_normalized: String,
    derived: OnceLock<Derived>,
}

impl SpatialReference {
    /// Create a spatial reference from a free-form initializer using the
    /// default engine.
    ///
    /// Accepted forms, checked in this order:
    /// * well-known Web Mercator codes (`EPSG:900913`, `EPSG:3785`, ...)
    /// * `EPSG:4326` and `WGS84`
    /// * PROJ strings starting with `+`
    /// * `EPSG:<code>` and `OSGEO:<code>`
    /// * WKT starting with `PROJCS` or `GEOGCS`
    ///
    /// # Examples
    /// ```
    /// use spatial_ref::SpatialReference;
    ///
    /// let wgs84 = SpatialReference::create("epsg:4326").unwrap();
    /// assert!(wgs84.is_geographic());
    /// assert!(SpatialReference::create("not-a-crs").is_err());
    /// ```
    pub fn create(init: &str) -> Result<SpatialReference> {
        Self::create_in(&default_engine(), init)
    }

    pub fn create_in(engine: &Arc<dyn GeodesyEngine>, init: &str) -> Result<SpatialReference> {
        let low = init.to_lowercase();
        let chosen = route(&low);
        tracing::trace!(init, route = ?chosen, "dispatching spatial reference initializer");
        match chosen {
            Some(Route::WebMercator) => Self::create_from_proj4_in(engine, WEB_MERCATOR_PROJ4, init),
            Some(Route::Wgs84) => Self::create_from_proj4_in(engine, WGS84_PROJ4, init),
            Some(Route::Proj4) => Self::create_from_proj4_in(engine, &low, init),
            Some(Route::InitDirective) => {
                Self::create_from_proj4_in(engine, &format!("+init={}", low), init)
            }
            Some(Route::Wkt) => Self::create_from_wkt_in(engine, init, init),
            None => {
                tracing::warn!(init, "Unrecognized spatial reference initializer");
                Err(Error::UnrecognizedInitializer(init.to_owned()))
            }
        }
    }

    /// Create a spatial reference from a PROJ string. `alias` becomes the
    /// [`init_string`](SpatialReference::init_string) of the result.
    pub fn create_from_proj4(text: &str, alias: &str) -> Result<SpatialReference> {
        Self::create_from_proj4_in(&default_engine(), text, alias)
    }

    pub fn create_from_proj4_in(
        engine: &Arc<dyn GeodesyEngine>,
        text: &str,
        alias: &str,
    ) -> Result<SpatialReference> {
        Self::import(engine, InitType::Proj4, text, alias, |engine, raw| {
            engine.import_from_proj4(raw, text)
        })
    }

    /// Create a spatial reference from WKT. `alias` becomes the
    /// [`init_string`](SpatialReference::init_string) of the result.
    pub fn create_from_wkt(text: &str, alias: &str) -> Result<SpatialReference> {
        Self::create_from_wkt_in(&default_engine(), text, alias)
    }

    pub fn create_from_wkt_in(
        engine: &Arc<dyn GeodesyEngine>,
        text: &str,
        alias: &str,
    ) -> Result<SpatialReference> {
        Self::import(engine, InitType::Wkt, text, alias, |engine, raw| {
            let mut cursor = text;
            engine.import_from_wkt(raw, &mut cursor)
        })
    }

    /// Wrap an engine handle whose lifetime is managed elsewhere. The handle
    /// is never destroyed by the returned instance.
    pub fn from_borrowed_handle(
        engine: Arc<dyn GeodesyEngine>,
        raw: RawSrs,
        init_type: InitType,
        init_string: &str,
    ) -> SpatialReference {
        Self::with_handle(SrsHandle::borrowed(engine, raw), init_type, init_string)
    }

    fn import<F>(
        engine: &Arc<dyn GeodesyEngine>,
        kind: InitType,
        text: &str,
        alias: &str,
        parse: F,
    ) -> Result<SpatialReference>
    where
        F: FnOnce(&dyn GeodesyEngine, RawSrs) -> std::result::Result<(), EngineError>,
    {
        let _lock = engine_lock();
        // dropping the guard on the error path releases the engine handle
        let handle = SrsHandle::new(Arc::clone(engine));
        match parse(engine.as_ref(), handle.raw()) {
            Ok(()) => Ok(Self::with_handle(handle, kind, alias)),
            Err(source) => {
                tracing::warn!(init = text, error = %source, "Unable to create spatial reference from {}", kind);
                Err(Error::InvalidInitializer {
                    kind,
                    text: text.to_owned(),
                    source,
                })
            }
        }
    }

    fn with_handle(handle: SrsHandle, init_type: InitType, init_string: &str) -> SpatialReference {
        SpatialReference {
            handle,
            init_type,
            init_string: init_string.to_owned(),
            init_string_normalized: init_string.to_lowercase(),
            derived: OnceLock::new(),
        }
    }

    fn derived(&self) -> &Derived {
        if let Some(derived) = self.derived.get() {
            return derived;
        }
        // take the engine lock before the cell so every thread agrees on the order
        let _lock = engine_lock();
        self.derived.get_or_init(|| self.derive())
    }

    fn derive(&self) -> Derived {
        let engine = self.handle.engine();
        let raw = self.handle.raw();

        let is_geographic = engine.is_geographic(raw);

        let axis = |result: std::result::Result<f64, EngineError>, which: &str| {
            result.unwrap_or_else(|error| {
                tracing::debug!(handle = %raw, axis = which, %error, "ellipsoid axis unavailable");
                0.0
            })
        };
        let semi_major = axis(engine.semi_major(raw), "semi-major");
        let semi_minor = axis(engine.semi_minor(raw), "semi-minor");

        let name_node = if is_geographic { "GEOGCS" } else { "PROJCS" };
        let name = engine.attribute_value(raw, name_node, 0).unwrap_or_default();

        let is_mercator = engine
            .attribute_value(raw, "PROJECTION", 0)
            .map_or(false, |p| p.to_lowercase().starts_with("mercator"));

        let wkt = engine.export_to_wkt(raw).unwrap_or_else(|error| {
            tracing::debug!(handle = %raw, %error, "WKT export failed");
            String::new()
        });

        Derived {
            is_geographic,
            is_mercator,
            name,
            wkt,
            ellipsoid: Ellipsoid::new(semi_major, semi_minor),
        }
    }

    pub fn is_geographic(&self) -> bool {
        self.derived().is_geographic
    }

    pub fn is_projected(&self) -> bool {
        !self.derived().is_geographic
    }

    /// True for Mercator projections, spherical or ellipsoidal.
    pub fn is_mercator(&self) -> bool {
        self.derived().is_mercator
    }

    /// Name of the `PROJCS`, or of the `GEOGCS` for geographic systems.
    pub fn name(&self) -> &str {
        &self.derived().name
    }

    pub fn ellipsoid(&self) -> &Ellipsoid {
        &self.derived().ellipsoid
    }

    /// Canonical WKT as exported by the engine, empty if the export failed.
    pub fn wkt(&self) -> &str {
        &self.derived().wkt
    }

    pub fn init_string(&self) -> &str {
        &self.init_string
    }

    pub fn init_type(&self) -> InitType {
        self.init_type
    }

    pub fn raw_handle(&self) -> RawSrs {
        self.handle.raw()
    }

    pub fn engine(&self) -> &Arc<dyn GeodesyEngine> {
        self.handle.engine()
    }

    fn shares_engine_with(&self, other: &SpatialReference) -> bool {
        Arc::as_ptr(self.engine()) as *const () == Arc::as_ptr(other.engine()) as *const ()
    }

    /// Whether both describe the same coordinate system for practical
    /// purposes. Cheap textual checks run first; the engine's full comparison
    /// is the last resort.
    pub fn is_equivalent_to(&self, other: &SpatialReference) -> bool {
        if std::ptr::eq(self, other) {
            return true;
        }
        let lhs = self.derived();
        let rhs = other.derived();

        if self.init_string_normalized == other.init_string_normalized {
            return true;
        }

        if lhs.wkt == rhs.wkt {
            return true;
        }

        if lhs.is_geographic
            && rhs.is_geographic
            && lhs.ellipsoid.semi_major() == rhs.ellipsoid.semi_major()
            && lhs.ellipsoid.semi_minor() == rhs.ellipsoid.semi_minor()
        {
            return true;
        }

        if !self.shares_engine_with(other) {
            return false;
        }
        let _lock = engine_lock();
        self.engine().is_same(self.raw_handle(), other.raw_handle())
    }

    /// Run `apply` against a transformation object from `self` to `target`.
    /// The object is released before returning, whatever the outcome.
    fn with_transform<T, F>(&self, target: &SpatialReference, apply: F) -> Result<T>
    where
        F: FnOnce(&dyn GeodesyEngine, RawTransform) -> std::result::Result<T, EngineError>,
    {
        let _lock = engine_lock();
        let engine = self.engine().as_ref();
        let xform = if self.shares_engine_with(target) {
            TransformHandle::new(engine, self.raw_handle(), target.raw_handle())
        } else {
            None
        };
        let Some(xform) = xform else {
            tracing::warn!(from = self.name(), to = target.name(), "SRS xform not possible");
            return Err(Error::TransformUnavailable {
                from: self.name().to_owned(),
                to: target.name().to_owned(),
            });
        };
        apply(engine, xform.raw()).map_err(|source| {
            tracing::warn!(from = self.name(), to = target.name(), error = %source, "Failed to xform a point");
            Error::TransformFailed {
                from: self.name().to_owned(),
                to: target.name().to_owned(),
                source,
            }
        })
    }

    /// Transform a single point from this system into `target`.
    ///
    /// No equivalence check is made first; transforming into an equivalent
    /// system returns the point unchanged.
    pub fn transform(&self, x: f64, y: f64, target: &SpatialReference) -> Result<(f64, f64)> {
        self.with_transform(target, |engine, xform| {
            let (mut tx, mut ty, mut tz) = (x, y, 0.0);
            engine.apply_transform(xform, &mut tx, &mut ty, &mut tz)?;
            Ok((tx, ty))
        })
    }

    pub fn transform_coord(&self, coord: Coord<f64>, target: &SpatialReference) -> Result<Coord<f64>> {
        let (x, y) = self.transform(coord.x, coord.y, target)?;
        Ok(Coord { x, y })
    }

    pub fn transform_point(&self, point: Point<f64>, target: &SpatialReference) -> Result<Point<f64>> {
        self.transform_coord(point.0, target).map(Point)
    }

    /// Transform `coords` in place with a single transformation object.
    ///
    /// Stops at the first point that fails; the points before it have already
    /// been transformed.
    pub fn transform_points(&self, coords: &mut [Coord<f64>], target: &SpatialReference) -> Result<()> {
        self.with_transform(target, |engine, xform| {
            for c in coords.iter_mut() {
                let (mut tx, mut ty, mut tz) = (c.x, c.y, 0.0);
                engine.apply_transform(xform, &mut tx, &mut ty, &mut tz)?;
                c.x = tx;
                c.y = ty;
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::thread;

    /// Engine stub with switchable failures that counts what it is asked.
    #[derive(Default)]
    struct FakeEngine {
        next: AtomicU64,
        live: AtomicUsize,
        geographic_queries: AtomicUsize,
        live_transforms: AtomicUsize,
        destroyed: Mutex<Vec<RawSrs>>,
        geographic: bool,
        same: bool,
        fail_export: bool,
        fail_axes: bool,
        fail_new_transform: bool,
        fail_apply: bool,
    }

    impl GeodesyEngine for FakeEngine {
        fn new_handle(&self) -> RawSrs {
            self.live.fetch_add(1, Ordering::SeqCst);
            RawSrs(self.next.fetch_add(1, Ordering::SeqCst))
        }

        fn import_from_proj4(&self, _: RawSrs, text: &str) -> std::result::Result<(), EngineError> {
            if text.contains("bad") {
                Err(EngineError::CorruptProj(text.to_owned()))
            } else {
                Ok(())
            }
        }

        fn import_from_wkt(&self, _: RawSrs, text: &mut &str) -> std::result::Result<(), EngineError> {
            if text.contains("bad") {
                return Err(EngineError::CorruptWkt {
                    offset: 0,
                    message: "bad".to_owned(),
                });
            }
            *text = "";
            Ok(())
        }

        fn destroy_handle(&self, handle: RawSrs) {
            self.live.fetch_sub(1, Ordering::SeqCst);
            self.destroyed.lock().unwrap().push(handle);
        }

        fn is_geographic(&self, _: RawSrs) -> bool {
            self.geographic_queries.fetch_add(1, Ordering::SeqCst);
            self.geographic
        }

        fn semi_major(&self, h: RawSrs) -> std::result::Result<f64, EngineError> {
            if self.fail_axes {
                Err(EngineError::EmptyHandle(h.0))
            } else {
                Ok(6378137.0)
            }
        }

        fn semi_minor(&self, h: RawSrs) -> std::result::Result<f64, EngineError> {
            if self.fail_axes {
                Err(EngineError::EmptyHandle(h.0))
            } else {
                Ok(6356752.314245179)
            }
        }

        fn attribute_value(&self, handle: RawSrs, node: &str, _: usize) -> Option<String> {
            match node {
                "GEOGCS" | "PROJCS" => Some(format!("fake {}", handle.0)),
                "PROJECTION" => Some("Mercator_2SP".to_owned()),
                _ => None,
            }
        }

        fn export_to_wkt(&self, handle: RawSrs) -> std::result::Result<String, EngineError> {
            if self.fail_export {
                Err(EngineError::EmptyHandle(handle.0))
            } else {
                Ok(format!("FAKE[{}]", handle.0))
            }
        }

        fn is_same(&self, _: RawSrs, _: RawSrs) -> bool {
            self.same
        }

        fn new_transform(&self, _: RawSrs, _: RawSrs) -> Option<RawTransform> {
            if self.fail_new_transform {
                return None;
            }
            self.live_transforms.fetch_add(1, Ordering::SeqCst);
            Some(RawTransform(1))
        }

        fn apply_transform(
            &self,
            _: RawTransform,
            x: &mut f64,
            y: &mut f64,
            z: &mut f64,
        ) -> std::result::Result<(), EngineError> {
            if self.fail_apply {
                return Err(EngineError::OutOfDomain);
            }
            assert_eq!(*z, 0.0);
            *x += 1.0;
            *y -= 1.0;
            Ok(())
        }

        fn destroy_transform(&self, _: RawTransform) {
            self.live_transforms.fetch_sub(1, Ordering::SeqCst);
        }
    }

    fn scripted(configure: impl FnOnce(&mut FakeEngine)) -> (Arc<FakeEngine>, Arc<dyn GeodesyEngine>) {
        let mut engine = FakeEngine::default();
        configure(&mut engine);
        let engine = Arc::new(engine);
        let dynamic: Arc<dyn GeodesyEngine> = engine.clone();
        (engine, dynamic)
    }

    #[test]
    fn routes_follow_precedence() {
        assert_eq!(route("epsg:900913"), Some(Route::WebMercator));
        assert_eq!(route("epsg:3785"), Some(Route::WebMercator));
        assert_eq!(route("epsg:9805"), Some(Route::WebMercator));
        assert_eq!(route("epsg:4326"), Some(Route::Wgs84));
        assert_eq!(route("wgs84"), Some(Route::Wgs84));
        assert_eq!(route("epsg:3857"), Some(Route::InitDirective));
        assert_eq!(route("osgeo:41001"), Some(Route::InitDirective));
        assert_eq!(route("+proj=longlat"), Some(Route::Proj4));
        assert_eq!(route("geogcs[\"x\"]"), Some(Route::Wkt));
        assert_eq!(route("projcs[\"x\"]"), Some(Route::Wkt));
        assert_eq!(route("not-a-crs"), None);
        assert_eq!(route("epsg:4326x"), Some(Route::InitDirective));
    }

    #[test]
    fn shortcut_codes_keep_caller_alias() {
        let (_, engine) = scripted(|_| {});
        let srs = SpatialReference::create_in(&engine, "EPSG:900913").unwrap();
        assert_eq!(srs.init_type(), InitType::Proj4);
        assert_eq!(srs.init_string(), "EPSG:900913");
        let srs = SpatialReference::create_in(&engine, "GEOGCS[\"X\"]").unwrap();
        assert_eq!(srs.init_type(), InitType::Wkt);
        assert_eq!(srs.init_string(), "GEOGCS[\"X\"]");
    }

    #[test]
    fn failed_construction_releases_handle() {
        let (fake, engine) = scripted(|_| {});
        let err = SpatialReference::create_from_proj4_in(&engine, "+proj=bad", "alias").unwrap_err();
        assert!(matches!(err, Error::InvalidInitializer { kind: InitType::Proj4, .. }));
        let err = SpatialReference::create_from_wkt_in(&engine, "GEOGCS[bad", "alias").unwrap_err();
        assert!(matches!(err, Error::InvalidInitializer { kind: InitType::Wkt, .. }));
        assert_eq!(fake.live.load(Ordering::SeqCst), 0);
        assert_eq!(fake.destroyed.lock().unwrap().len(), 2);
    }

    #[test]
    fn owned_handle_released_exactly_once() {
        let (fake, engine) = scripted(|_| {});
        let srs = SpatialReference::create_in(&engine, "+proj=longlat").unwrap();
        let raw = srs.raw_handle();
        drop(srs);
        assert_eq!(*fake.destroyed.lock().unwrap(), vec![raw]);
        assert_eq!(fake.live.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn borrowed_handle_is_never_released() {
        let (fake, engine) = scripted(|_| {});
        let raw = engine.new_handle();
        let srs = SpatialReference::from_borrowed_handle(engine, raw, InitType::Wkt, "borrowed");
        assert_eq!(srs.init_string(), "borrowed");
        drop(srs);
        assert!(fake.destroyed.lock().unwrap().is_empty());
        assert_eq!(fake.live.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn derivation_runs_once() {
        let (fake, engine) = scripted(|e| e.geographic = true);
        let srs = SpatialReference::create_in(&engine, "+proj=longlat").unwrap();
        assert_eq!(fake.geographic_queries.load(Ordering::SeqCst), 0);
        let first = srs.wkt().to_owned();
        for _ in 0..3 {
            assert!(srs.is_geographic());
            assert_eq!(srs.wkt(), first);
            assert_eq!(srs.name(), format!("fake {}", srs.raw_handle().0));
        }
        assert_eq!(fake.geographic_queries.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn racing_threads_derive_once() {
        let (fake, engine) = scripted(|_| {});
        let srs = Arc::new(SpatialReference::create_in(&engine, "+proj=merc").unwrap());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let srs = Arc::clone(&srs);
                thread::spawn(move || (srs.is_projected(), srs.is_mercator(), srs.wkt().to_owned()))
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(results.windows(2).all(|w| w[0] == w[1]));
        assert!(results[0].0);
        assert!(results[0].1);
        assert_eq!(fake.geographic_queries.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn attribute_failures_degrade() {
        let (_, engine) = scripted(|e| {
            e.fail_export = true;
            e.fail_axes = true;
        });
        let srs = SpatialReference::create_in(&engine, "+proj=merc").unwrap();
        assert_eq!(srs.wkt(), "");
        assert_eq!(srs.ellipsoid().semi_major(), 0.0);
        // both exports failed, so the WKT comparison sees two empty strings
        let other = SpatialReference::create_in(&engine, "+proj=merc +lon_0=1").unwrap();
        assert!(srs.is_equivalent_to(&other));
        assert!(other.is_equivalent_to(&srs));
    }

    #[test]
    fn equivalence_checks_in_order() {
        let (_, engine) = scripted(|_| {});
        let a = SpatialReference::create_in(&engine, "+proj=merc").unwrap();
        let b = SpatialReference::create_from_proj4_in(&engine, "+proj=merc", "+PROJ=MERC").unwrap();
        // normalized initializer strings match
        assert!(a.is_equivalent_to(&b));
        assert!(b.is_equivalent_to(&a));
        // projected, different WKT, engine says no
        let c = SpatialReference::create_in(&engine, "+proj=merc +lon_0=3").unwrap();
        assert!(!a.is_equivalent_to(&c));

        let (_, engine) = scripted(|e| e.same = true);
        let a = SpatialReference::create_in(&engine, "+proj=merc").unwrap();
        let c = SpatialReference::create_in(&engine, "+proj=merc +lon_0=3").unwrap();
        assert!(a.is_equivalent_to(&c));
        assert!(c.is_equivalent_to(&a));
    }

    #[test]
    fn geographic_systems_with_equal_axes_are_equivalent() {
        let (_, engine) = scripted(|e| e.geographic = true);
        let a = SpatialReference::create_in(&engine, "+proj=longlat").unwrap();
        let b = SpatialReference::create_in(&engine, "+proj=latlong").unwrap();
        assert_ne!(a.wkt(), b.wkt());
        assert!(a.is_equivalent_to(&b));
        assert!(b.is_equivalent_to(&a));
    }

    #[test]
    fn different_engines_are_never_the_same() {
        let (_, one) = scripted(|e| e.same = true);
        let (_, two) = scripted(|e| {
            e.same = true;
            e.next = AtomicU64::new(100);
        });
        let a = SpatialReference::create_in(&one, "+proj=merc").unwrap();
        let b = SpatialReference::create_in(&two, "+proj=merc +lon_0=3").unwrap();
        assert!(!a.is_equivalent_to(&b));
        assert!(matches!(a.transform(0.0, 0.0, &b), Err(Error::TransformUnavailable { .. })));
    }

    #[test]
    fn transform_releases_object_on_every_path() {
        let (fake, engine) = scripted(|_| {});
        let a = SpatialReference::create_in(&engine, "+proj=merc").unwrap();
        let b = SpatialReference::create_in(&engine, "+proj=longlat").unwrap();
        assert_eq!(a.transform(10.0, 20.0, &b).unwrap(), (11.0, 19.0));
        assert_eq!(fake.live_transforms.load(Ordering::SeqCst), 0);

        let (fake, engine) = scripted(|e| e.fail_apply = true);
        let a = SpatialReference::create_in(&engine, "+proj=merc").unwrap();
        let b = SpatialReference::create_in(&engine, "+proj=longlat").unwrap();
        let err = a.transform(10.0, 20.0, &b).unwrap_err();
        match err {
            Error::TransformFailed { from, to, .. } => {
                assert_eq!(from, a.name());
                assert_eq!(to, b.name());
            }
            other => panic!("unexpected error {:?}", other),
        }
        assert_eq!(fake.live_transforms.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn transform_unavailable() {
        let (_, engine) = scripted(|e| e.fail_new_transform = true);
        let a = SpatialReference::create_in(&engine, "+proj=merc").unwrap();
        let b = SpatialReference::create_in(&engine, "+proj=longlat").unwrap();
        assert!(matches!(a.transform(1.0, 2.0, &b), Err(Error::TransformUnavailable { .. })));
    }

    #[test]
    fn batch_transform_uses_one_object() {
        let (fake, engine) = scripted(|_| {});
        let a = SpatialReference::create_in(&engine, "+proj=merc").unwrap();
        let b = SpatialReference::create_in(&engine, "+proj=longlat").unwrap();
        let mut coords = vec![Coord { x: 0.0, y: 0.0 }, Coord { x: 5.0, y: 5.0 }];
        a.transform_points(&mut coords, &b).unwrap();
        assert_eq!(coords, vec![Coord { x: 1.0, y: -1.0 }, Coord { x: 6.0, y: 4.0 }]);
        let p = a.transform_point(Point::new(1.0, 1.0), &b).unwrap();
        assert_eq!(p, Point::new(2.0, 0.0));
        assert_eq!(fake.live_transforms.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn init_type_display() {
        assert_eq!(InitType::Proj4.to_string(), "PROJ4");
        assert_eq!(InitType::Wkt.to_string(), "WKT");
    }
}
