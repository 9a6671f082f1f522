//! A pure Rust geodesy engine covering longitude/latitude, Mercator and
//! Transverse Mercator (UTM) definitions. Datums are never shifted.

mod definition;
mod projection;
mod proj_string;
mod registry;
mod wkt;

use self::definition::CrsDefinition;
use self::projection::{adjlon, check_latitude, Projector};
use super::{EngineError, GeodesyEngine, RawSrs, RawTransform};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

struct Pipeline {
    from: Arc<CrsDefinition>,
    to: Arc<CrsDefinition>,
    identity: bool,
}

#[derive(Default)]
struct Slots {
    next_id: u64,
    /// `None` until a definition is imported into the handle.
    handles: HashMap<u64, Option<Arc<CrsDefinition>>>,
    transforms: HashMap<u64, Arc<Pipeline>>,
}

impl Slots {
    fn next(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Default)]
pub struct BuiltinEngine {
    slots: Mutex<Slots>,
}

impl BuiltinEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of handles created and not yet destroyed.
    pub fn live_handles(&self) -> usize {
        self.slots.lock().handles.len()
    }

    /// Number of transformation objects created and not yet destroyed.
    pub fn live_transforms(&self) -> usize {
        self.slots.lock().transforms.len()
    }

    fn definition(&self, handle: RawSrs) -> Result<Arc<CrsDefinition>, EngineError> {
        match self.slots.lock().handles.get(&handle.0) {
            Some(Some(def)) => Ok(Arc::clone(def)),
            Some(None) => Err(EngineError::EmptyHandle(handle.0)),
            None => Err(EngineError::UnknownHandle(handle.0)),
        }
    }

    fn store(&self, handle: RawSrs, def: CrsDefinition) -> Result<(), EngineError> {
        let mut slots = self.slots.lock();
        let slot = slots
            .handles
            .get_mut(&handle.0)
            .ok_or(EngineError::UnknownHandle(handle.0))?;
        *slot = Some(Arc::new(def));
        Ok(())
    }
}

/// Geographic radians relative to Greenwich for a point of `def`.
fn to_geographic(def: &CrsDefinition, x: f64, y: f64) -> Result<(f64, f64), EngineError> {
    let g = &def.geogcs;
    if let Some(p) = &def.projcs {
        let unit = p.linear_unit.1;
        return Projector::new(p.method, &p.params, &g.spheroid).inverse(x * unit, y * unit);
    }
    let unit = g.radians_per_unit();
    let (lam, phi) = (x * unit, y * unit);
    check_latitude(phi)?;
    if !lam.is_finite() {
        return Err(EngineError::OutOfDomain);
    }
    Ok((lam + g.prime_meridian.1.to_radians(), phi))
}

fn from_geographic(def: &CrsDefinition, lam: f64, phi: f64) -> Result<(f64, f64), EngineError> {
    let g = &def.geogcs;
    match &def.projcs {
        None => {
            let unit = g.radians_per_unit();
            let lam = adjlon(lam - g.prime_meridian.1.to_radians());
            Ok((lam / unit, phi / unit))
        }
        Some(p) => {
            let unit = p.linear_unit.1;
            let (x, y) = Projector::new(p.method, &p.params, &g.spheroid).forward(lam, phi)?;
            Ok((x / unit, y / unit))
        }
    }
}

impl GeodesyEngine for BuiltinEngine {
    fn new_handle(&self) -> RawSrs {
        let mut slots = self.slots.lock();
        let id = slots.next();
        slots.handles.insert(id, None);
        RawSrs(id)
    }

    fn import_from_proj4(&self, handle: RawSrs, text: &str) -> Result<(), EngineError> {
        let def = proj_string::parse(text)?;
        self.store(handle, def)
    }

    fn import_from_wkt(&self, handle: RawSrs, text: &mut &str) -> Result<(), EngineError> {
        let mut cursor = *text;
        let node = wkt::parse(&mut cursor)?;
        let def = CrsDefinition::from_wkt(&node)?;
        self.store(handle, def)?;
        *text = cursor;
        Ok(())
    }

    fn destroy_handle(&self, handle: RawSrs) {
        if self.slots.lock().handles.remove(&handle.0).is_none() {
            tracing::debug!(handle = handle.0, "destroying unknown handle");
        }
    }

    fn is_geographic(&self, handle: RawSrs) -> bool {
        self.definition(handle).map_or(false, |d| d.is_geographic())
    }

    fn semi_major(&self, handle: RawSrs) -> Result<f64, EngineError> {
        Ok(self.definition(handle)?.geogcs.spheroid.semi_major)
    }

    fn semi_minor(&self, handle: RawSrs) -> Result<f64, EngineError> {
        Ok(self.definition(handle)?.geogcs.spheroid.semi_minor())
    }

    fn attribute_value(&self, handle: RawSrs, node: &str, child: usize) -> Option<String> {
        let def = self.definition(handle).ok()?;
        let tree = def.to_wkt();
        tree.find(node)?.value(child).map(|v| v.text().to_owned())
    }

    fn export_to_wkt(&self, handle: RawSrs) -> Result<String, EngineError> {
        Ok(self.definition(handle)?.to_wkt().to_string())
    }

    fn is_same(&self, a: RawSrs, b: RawSrs) -> bool {
        match (self.definition(a), self.definition(b)) {
            (Ok(a), Ok(b)) => a.is_same(&b),
            _ => false,
        }
    }

    fn new_transform(&self, from: RawSrs, to: RawSrs) -> Option<RawTransform> {
        let from = self.definition(from).ok()?;
        let to = self.definition(to).ok()?;
        let identity = from.is_same(&to);
        let mut slots = self.slots.lock();
        let id = slots.next();
        slots
            .transforms
            .insert(id, Arc::new(Pipeline { from, to, identity }));
        Some(RawTransform(id))
    }

    fn apply_transform(
        &self,
        transform: RawTransform,
        x: &mut f64,
        y: &mut f64,
        _z: &mut f64,
    ) -> Result<(), EngineError> {
        let pipeline = self
            .slots
            .lock()
            .transforms
            .get(&transform.0)
            .cloned()
            .ok_or(EngineError::UnknownHandle(transform.0))?;
        if !x.is_finite() || !y.is_finite() {
            return Err(EngineError::OutOfDomain);
        }
        if pipeline.identity {
            return Ok(());
        }
        let (lam, phi) = to_geographic(&pipeline.from, *x, *y)?;
        let (out_x, out_y) = from_geographic(&pipeline.to, lam, phi)?;
        *x = out_x;
        *y = out_y;
        Ok(())
    }

    fn destroy_transform(&self, transform: RawTransform) {
        if self.slots.lock().transforms.remove(&transform.0).is_none() {
            tracing::debug!(transform = transform.0, "destroying unknown transform");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn proj(engine: &BuiltinEngine, text: &str) -> RawSrs {
        let h = engine.new_handle();
        engine.import_from_proj4(h, text).unwrap();
        h
    }

    fn run(engine: &BuiltinEngine, from: RawSrs, to: RawSrs, x: f64, y: f64) -> Result<(f64, f64), EngineError> {
        let t = engine.new_transform(from, to).unwrap();
        let (mut x, mut y, mut z) = (x, y, 0.0);
        let result = engine.apply_transform(t, &mut x, &mut y, &mut z);
        engine.destroy_transform(t);
        result.map(|_| (x, y))
    }

    #[test]
    fn handles_are_counted() {
        let engine = BuiltinEngine::new();
        let a = engine.new_handle();
        let b = engine.new_handle();
        assert_ne!(a, b);
        assert_eq!(engine.live_handles(), 2);
        engine.destroy_handle(a);
        engine.destroy_handle(b);
        assert_eq!(engine.live_handles(), 0);
    }

    #[test]
    fn empty_handle_answers_nothing() {
        let engine = BuiltinEngine::new();
        let h = engine.new_handle();
        assert!(!engine.is_geographic(h));
        assert_eq!(engine.semi_major(h), Err(EngineError::EmptyHandle(h.0)));
        assert!(engine.export_to_wkt(h).is_err());
        assert!(engine.attribute_value(h, "GEOGCS", 0).is_none());
        assert!(engine.new_transform(h, h).is_none());
    }

    #[test]
    fn failed_import_leaves_handle_empty() {
        let engine = BuiltinEngine::new();
        let h = engine.new_handle();
        let mut text = "GEOGCS[";
        assert!(engine.import_from_wkt(h, &mut text).is_err());
        assert_eq!(text, "GEOGCS[");
        assert!(engine.export_to_wkt(h).is_err());
    }

    #[test]
    fn attribute_lookup() {
        let engine = BuiltinEngine::new();
        let h = proj(&engine, "+init=epsg:3395");
        assert_eq!(engine.attribute_value(h, "PROJCS", 0).as_deref(), Some("WGS 84 / World Mercator"));
        assert_eq!(engine.attribute_value(h, "projection", 0).as_deref(), Some("Mercator_1SP"));
        assert_eq!(engine.attribute_value(h, "GEOGCS", 0).as_deref(), Some("WGS 84"));
        assert_eq!(engine.attribute_value(h, "SPHEROID", 1).as_deref(), Some("6378137"));
        assert!(engine.attribute_value(h, "PROJECTION", 3).is_none());
    }

    #[test]
    fn wgs84_to_web_mercator_and_back() {
        let engine = BuiltinEngine::new();
        let geo = proj(&engine, "+proj=longlat +datum=WGS84");
        let web = proj(&engine, "+init=epsg:3857");
        let (x, y) = run(&engine, geo, web, 180.0, 0.0).unwrap();
        assert_abs_diff_eq!(x, 20037508.342789244, epsilon = 1e-6);
        assert_abs_diff_eq!(y, 0.0, epsilon = 1e-9);
        let (lon, lat) = run(&engine, web, geo, -8238310.24, 4970071.58).unwrap();
        assert_abs_diff_eq!(lon, -74.006, epsilon = 1e-6);
        assert_abs_diff_eq!(lat, 40.7128, epsilon = 1e-6);
        assert_eq!(engine.live_transforms(), 0);
    }

    #[test]
    fn antimeridian_keeps_its_sign() {
        let engine = BuiltinEngine::new();
        let wgs84 = proj(&engine, "+proj=longlat +datum=WGS84");
        let nad27 = proj(&engine, "+proj=longlat +datum=NAD27");
        assert_eq!(run(&engine, wgs84, nad27, 180.0, 10.0).unwrap(), (180.0, 10.0));
        assert_eq!(run(&engine, wgs84, nad27, -180.0, -10.0).unwrap(), (-180.0, -10.0));
        assert_eq!(run(&engine, nad27, wgs84, 190.0, 0.0).unwrap().0.round(), -170.0);
    }

    #[test]
    fn utm_to_mercator_goes_through_geographic() {
        let engine = BuiltinEngine::new();
        let utm = proj(&engine, "+init=epsg:32633");
        let merc = proj(&engine, "+init=epsg:3395");
        let geo = proj(&engine, "+init=epsg:4326");
        let (x, y) = run(&engine, utm, merc, 602065.207, 5340353.595).unwrap();
        let (lon, lat) = run(&engine, merc, geo, x, y).unwrap();
        assert_abs_diff_eq!(lon, 16.3738, epsilon = 1e-6);
        assert_abs_diff_eq!(lat, 48.2082, epsilon = 1e-6);
    }

    #[test]
    fn identical_definitions_are_an_exact_no_op() {
        let engine = BuiltinEngine::new();
        let a = proj(&engine, "+init=epsg:3857");
        let b = proj(&engine, "+proj=merc +a=6378137 +b=6378137 +units=m");
        let (x, y) = run(&engine, a, b, 1234.5678, -9876.54321).unwrap();
        assert_eq!((x, y), (1234.5678, -9876.54321));
    }

    #[test]
    fn out_of_domain_points_fail() {
        let engine = BuiltinEngine::new();
        let geo = proj(&engine, "+proj=longlat +datum=WGS84");
        let web = proj(&engine, "+init=epsg:3857");
        assert_eq!(run(&engine, geo, web, 0.0, 90.0), Err(EngineError::OutOfDomain));
        assert_eq!(run(&engine, geo, web, 0.0, 91.0), Err(EngineError::OutOfDomain));
        assert_eq!(run(&engine, geo, web, f64::NAN, 0.0), Err(EngineError::OutOfDomain));
    }

    #[test]
    fn prime_meridian_is_applied() {
        let engine = BuiltinEngine::new();
        let paris = proj(&engine, "+proj=longlat +ellps=clrk66 +pm=paris");
        let greenwich = proj(&engine, "+proj=longlat +ellps=clrk66");
        let (lon, lat) = run(&engine, paris, greenwich, 0.0, 48.0).unwrap();
        assert_abs_diff_eq!(lon, 2.33722917, epsilon = 1e-9);
        assert_abs_diff_eq!(lat, 48.0, epsilon = 1e-12);
    }
}
