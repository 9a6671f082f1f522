//! Lookup tables for the built-in engine: ellipsoids, datums, linear units and
//! the `+init=` definitions of well-known codes.

pub(crate) struct EllipsoidDef {
    pub name: &'static str,
    pub semi_major: f64,
    pub inverse_flattening: f64,
}

pub(crate) struct DatumDef {
    pub geogcs_name: &'static str,
    pub datum_name: &'static str,
    pub ellps: &'static str,
}

pub(crate) struct InitDef {
    pub name: String,
    pub proj: String,
}

/// Used when a definition names no ellipsoid at all.
pub(crate) const DEFAULT_ELLIPSOID: EllipsoidDef = EllipsoidDef {
    name: "WGS 84",
    semi_major: 6378137.0,
    inverse_flattening: 298.257223563,
};

pub(crate) fn ellipsoid(key: &str) -> Option<EllipsoidDef> {
    let (name, semi_major, inverse_flattening) = match key.to_ascii_lowercase().as_str() {
        "wgs84" => ("WGS 84", 6378137.0, 298.257223563),
        "grs80" => ("GRS 1980", 6378137.0, 298.257222101),
        "wgs72" => ("WGS 72", 6378135.0, 298.26),
        "clrk66" => ("Clarke 1866", 6378206.4, 294.978698213898),
        "intl" => ("International 1924", 6378388.0, 297.0),
        "bessel" => ("Bessel 1841", 6377397.155, 299.1528128),
        "airy" => ("Airy 1830", 6377563.396, 299.3249646),
        "sphere" => ("Normal Sphere (r=6370997)", 6370997.0, 0.0),
        _ => return None,
    };
    Some(EllipsoidDef {
        name,
        semi_major,
        inverse_flattening,
    })
}

pub(crate) fn datum(key: &str) -> Option<DatumDef> {
    let (geogcs_name, datum_name, ellps) = match key.to_ascii_lowercase().as_str() {
        "wgs84" => ("WGS 84", "WGS_1984", "wgs84"),
        "nad83" => ("NAD83", "North_American_Datum_1983", "grs80"),
        "nad27" => ("NAD27", "North_American_Datum_1927", "clrk66"),
        "etrs89" => ("ETRS89", "European_Terrestrial_Reference_System_1989", "grs80"),
        "ed50" => ("ED50", "European_Datum_1950", "intl"),
        "osgb36" => ("OSGB 1936", "OSGB_1936", "airy"),
        _ => return None,
    };
    Some(DatumDef {
        geogcs_name,
        datum_name,
        ellps,
    })
}

/// WKT name and meters per unit of a PROJ `+units=` value.
pub(crate) fn linear_unit(key: &str) -> Option<(&'static str, f64)> {
    match key.to_ascii_lowercase().as_str() {
        "m" => Some(("metre", 1.0)),
        "km" => Some(("kilometre", 1000.0)),
        "ft" => Some(("foot", 0.3048)),
        "us-ft" => Some(("US survey foot", 0.3048006096012192)),
        _ => None,
    }
}

/// Prime meridian offset from Greenwich, in degrees.
pub(crate) fn prime_meridian(key: &str) -> Option<(&'static str, f64)> {
    match key.to_ascii_lowercase().as_str() {
        "greenwich" => Some(("Greenwich", 0.0)),
        "paris" => Some(("Paris", 2.33722917)),
        "ferro" => Some(("Ferro", -17.6666666666667)),
        _ => None,
    }
}

const SPHERICAL_MERCATOR: &str =
    "+proj=merc +a=6378137 +b=6378137 +lat_ts=0 +lon_0=0 +x_0=0 +y_0=0 +k=1 +units=m +nadgrids=@null +wktext +no_defs";

/// Expand `+init=<authority>:<code>`.
pub(crate) fn init(authority: &str, code: &str) -> Option<InitDef> {
    let code_num: u32 = code.parse().ok()?;
    let (name, proj) = match (authority.to_ascii_lowercase().as_str(), code_num) {
        ("epsg", 4326) => ("WGS 84".to_owned(), "+proj=longlat +datum=WGS84 +no_defs".to_owned()),
        ("epsg", 4269) => ("NAD83".to_owned(), "+proj=longlat +datum=NAD83 +no_defs".to_owned()),
        ("epsg", 4267) => ("NAD27".to_owned(), "+proj=longlat +datum=NAD27 +no_defs".to_owned()),
        ("epsg", 4258) => ("ETRS89".to_owned(), "+proj=longlat +datum=ETRS89 +no_defs".to_owned()),
        ("epsg", 4230) => ("ED50".to_owned(), "+proj=longlat +datum=ED50 +no_defs".to_owned()),
        ("epsg", 4277) => ("OSGB 1936".to_owned(), "+proj=longlat +datum=OSGB36 +no_defs".to_owned()),
        ("epsg", 3857) => ("WGS 84 / Pseudo-Mercator".to_owned(), SPHERICAL_MERCATOR.to_owned()),
        ("epsg", 900913) => ("Google Maps Global Mercator".to_owned(), SPHERICAL_MERCATOR.to_owned()),
        ("epsg", 3785) => ("Popular Visualisation CRS / Mercator".to_owned(), SPHERICAL_MERCATOR.to_owned()),
        ("epsg", 3395) => (
            "WGS 84 / World Mercator".to_owned(),
            "+proj=merc +lon_0=0 +k=1 +x_0=0 +y_0=0 +datum=WGS84 +units=m +no_defs".to_owned(),
        ),
        ("epsg", 54004) => (
            "World_Mercator".to_owned(),
            "+proj=merc +lat_ts=0 +lon_0=0 +k=1 +x_0=0 +y_0=0 +datum=WGS84 +units=m +no_defs".to_owned(),
        ),
        ("epsg", 41001) | ("osgeo", 41001) => (
            "WGS84 / Simple Mercator".to_owned(),
            "+proj=merc +lon_0=0 +k=1 +x_0=0 +y_0=0 +datum=WGS84 +units=m +no_defs".to_owned(),
        ),
        ("epsg", c @ 32601..=32660) => (
            format!("WGS 84 / UTM zone {}N", c - 32600),
            format!("+proj=utm +zone={} +datum=WGS84 +units=m +no_defs", c - 32600),
        ),
        ("epsg", c @ 32701..=32760) => (
            format!("WGS 84 / UTM zone {}S", c - 32700),
            format!("+proj=utm +zone={} +south +datum=WGS84 +units=m +no_defs", c - 32700),
        ),
        ("epsg", c @ 26901..=26923) => (
            format!("NAD83 / UTM zone {}N", c - 26900),
            format!("+proj=utm +zone={} +datum=NAD83 +units=m +no_defs", c - 26900),
        ),
        ("epsg", c @ 25828..=25838) => (
            format!("ETRS89 / UTM zone {}N", c - 25800),
            format!("+proj=utm +zone={} +datum=ETRS89 +units=m +no_defs", c - 25800),
        ),
        _ => return None,
    };
    Some(InitDef { name, proj })
}
