use super::definition::{Authority, CrsDefinition, GeogCs, Method, Params, ProjCs, Spheroid, DEGREE};
use super::registry;
use crate::engine::EngineError;

/// Parameters accepted and ignored.
const IGNORED: &[&str] = &["no_defs", "wktext", "towgs84", "nadgrids", "type", "over", "no_uoff"];

struct Tokens {
    pairs: Vec<(String, Option<String>)>,
}

impl Tokens {
    fn parse(text: &str) -> Result<Tokens, EngineError> {
        let mut pairs = Vec::new();
        for token in text.split_whitespace() {
            let token = token.strip_prefix('+').unwrap_or(token);
            if token.is_empty() {
                continue;
            }
            let (key, value) = match token.split_once('=') {
                Some((k, v)) => (k, Some(v.to_owned())),
                None => (token, None),
            };
            if key.is_empty() {
                return Err(EngineError::CorruptProj(format!("malformed token `{}`", token)));
            }
            pairs.push((key.to_ascii_lowercase(), value));
        }
        if pairs.is_empty() {
            return Err(EngineError::CorruptProj("empty definition".to_owned()));
        }
        Ok(Tokens { pairs })
    }

    fn has(&self, key: &str) -> bool {
        self.pairs.iter().any(|(k, _)| k == key)
    }

    /// First value wins, so user supplied values override `+init` defaults.
    fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .and_then(|(_, v)| v.as_deref())
    }

    fn number(&self, key: &str) -> Result<Option<f64>, EngineError> {
        match self.get(key) {
            None => Ok(None),
            Some(v) => v
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .map(Some)
                .ok_or_else(|| EngineError::CorruptProj(format!("invalid value for +{}: `{}`", key, v))),
        }
    }

    fn number_or(&self, key: &str, default: f64) -> Result<f64, EngineError> {
        Ok(self.number(key)?.unwrap_or(default))
    }
}

/// Parse a PROJ definition such as `+proj=utm +zone=33 +datum=WGS84`.
pub(crate) fn parse(text: &str) -> Result<CrsDefinition, EngineError> {
    let mut tokens = Tokens::parse(text)?;

    let mut init_name = None;
    let mut authority = None;
    if let Some(init) = tokens.get("init").map(str::to_owned) {
        let (auth, code) = init
            .split_once(':')
            .ok_or_else(|| EngineError::UnknownInit(init.clone()))?;
        let def = registry::init(auth, code).ok_or_else(|| EngineError::UnknownInit(init.clone()))?;
        let expanded = Tokens::parse(&def.proj)?;
        if expanded.has("init") {
            return Err(EngineError::UnknownInit(init.clone()));
        }
        tokens.pairs.retain(|(k, _)| k != "init");
        tokens.pairs.extend(expanded.pairs);
        init_name = Some(def.name);
        authority = Some(Authority {
            name: auth.to_ascii_uppercase(),
            code: code.to_owned(),
        });
    }

    for (key, _) in &tokens.pairs {
        if !is_known(key) {
            tracing::trace!(key = key.as_str(), "ignoring unknown PROJ parameter");
        }
    }

    let proj = tokens
        .get("proj")
        .ok_or_else(|| EngineError::CorruptProj("missing +proj".to_owned()))?
        .to_ascii_lowercase();
    let geographic = matches!(proj.as_str(), "longlat" | "latlong" | "lonlat" | "latlon");
    let geogcs = parse_geogcs(&tokens, if geographic { init_name.clone() } else { None })?;

    if geographic {
        return Ok(CrsDefinition {
            geogcs: GeogCs { authority, ..geogcs },
            projcs: None,
        });
    }

    let linear_unit = match (tokens.get("units"), tokens.number("to_meter")?) {
        (_, Some(factor)) if factor > 0.0 => ("unknown".to_owned(), factor),
        (_, Some(_)) => return Err(EngineError::CorruptProj("+to_meter must be positive".to_owned())),
        (Some(units), None) => {
            let (name, factor) = registry::linear_unit(units)
                .ok_or_else(|| EngineError::CorruptProj(format!("unknown unit `{}`", units)))?;
            (name.to_owned(), factor)
        }
        (None, None) => ("metre".to_owned(), 1.0),
    };

    let mut params = Params {
        latitude_of_origin: tokens.number_or("lat_0", 0.0)?,
        central_meridian: tokens.number_or("lon_0", 0.0)?,
        scale_factor: match tokens.number("k")? {
            Some(k) => k,
            None => tokens.number_or("k_0", 1.0)?,
        },
        standard_parallel_1: 0.0,
        false_easting: tokens.number_or("x_0", 0.0)?,
        false_northing: tokens.number_or("y_0", 0.0)?,
    };

    let (method, default_name) = match proj.as_str() {
        "merc" => {
            // lat_0 has no meaning for Mercator
            params.latitude_of_origin = 0.0;
            let lat_ts = tokens.number_or("lat_ts", 0.0)?;
            if lat_ts != 0.0 {
                params.standard_parallel_1 = lat_ts;
                params.scale_factor = 1.0;
                (Method::Mercator2Sp, "unnamed".to_owned())
            } else {
                (Method::Mercator1Sp, "unnamed".to_owned())
            }
        }
        "tmerc" => (Method::TransverseMercator, "unnamed".to_owned()),
        "utm" => {
            let zone = tokens
                .get("zone")
                .and_then(|z| z.parse::<u32>().ok())
                .filter(|z| (1..=60).contains(z))
                .ok_or_else(|| EngineError::CorruptProj("+proj=utm needs +zone between 1 and 60".to_owned()))?;
            let south = tokens.has("south");
            params = Params {
                latitude_of_origin: 0.0,
                central_meridian: -183.0 + 6.0 * zone as f64,
                scale_factor: 0.9996,
                standard_parallel_1: 0.0,
                false_easting: 500000.0,
                false_northing: if south { 10000000.0 } else { 0.0 },
            };
            let hemisphere = if south { "Southern" } else { "Northern" };
            (
                Method::TransverseMercator,
                format!("UTM Zone {}, {} Hemisphere", zone, hemisphere),
            )
        }
        other => return Err(EngineError::UnsupportedProjection(other.to_owned())),
    };

    Ok(CrsDefinition {
        geogcs,
        projcs: Some(ProjCs {
            name: init_name.unwrap_or(default_name),
            method,
            params,
            linear_unit,
            authority,
        }),
    })
}

fn is_known(key: &str) -> bool {
    IGNORED.contains(&key)
        || matches!(
            key,
            "proj" | "init" | "ellps" | "datum" | "a" | "b" | "rf" | "f" | "r" | "lon_0" | "lat_0"
                | "lat_ts" | "k" | "k_0" | "x_0" | "y_0" | "zone" | "south" | "units" | "to_meter"
                | "pm"
        )
}

fn parse_geogcs(tokens: &Tokens, name: Option<String>) -> Result<GeogCs, EngineError> {
    let datum = match tokens.get("datum") {
        Some(key) => Some(registry::datum(key).ok_or_else(|| EngineError::UnknownDatum(key.to_owned()))?),
        None => None,
    };
    let ellps_key = tokens.get("ellps").or(datum.as_ref().map(|d| d.ellps));
    let named = match ellps_key {
        Some(key) => Some(registry::ellipsoid(key).ok_or_else(|| EngineError::UnknownEllipsoid(key.to_owned()))?),
        None => None,
    };

    let spheroid = if let Some(r) = tokens.number("r")? {
        Spheroid {
            name: "unnamed".to_owned(),
            semi_major: r,
            inverse_flattening: 0.0,
        }
    } else if let Some(a) = tokens.number("a")? {
        let inverse_flattening = if let Some(b) = tokens.number("b")? {
            if a == b {
                0.0
            } else {
                a / (a - b)
            }
        } else if let Some(rf) = tokens.number("rf")? {
            rf
        } else if let Some(f) = tokens.number("f")? {
            if f == 0.0 {
                0.0
            } else {
                1.0 / f
            }
        } else {
            named.as_ref().map_or(0.0, |e| e.inverse_flattening)
        };
        Spheroid {
            name: "unnamed".to_owned(),
            semi_major: a,
            inverse_flattening,
        }
    } else {
        let e = named.unwrap_or(registry::DEFAULT_ELLIPSOID);
        Spheroid {
            name: e.name.to_owned(),
            semi_major: e.semi_major,
            inverse_flattening: e.inverse_flattening,
        }
    };
    if spheroid.semi_major <= 0.0 || spheroid.inverse_flattening < 0.0 {
        return Err(EngineError::CorruptProj("invalid ellipsoid parameters".to_owned()));
    }

    let prime_meridian = match tokens.get("pm") {
        None => ("Greenwich".to_owned(), 0.0),
        Some(pm) => match registry::prime_meridian(pm) {
            Some((name, lon)) => (name.to_owned(), lon),
            None => {
                let lon = pm
                    .parse::<f64>()
                    .ok()
                    .filter(|n| n.is_finite())
                    .ok_or_else(|| EngineError::CorruptProj(format!("unknown prime meridian `{}`", pm)))?;
                ("unnamed".to_owned(), lon)
            }
        },
    };

    let (geogcs_name, datum_name) = match &datum {
        Some(d) => (d.geogcs_name.to_owned(), d.datum_name.to_owned()),
        None => ("unknown".to_owned(), "unknown".to_owned()),
    };
    Ok(GeogCs {
        name: name.unwrap_or(geogcs_name),
        datum: datum_name,
        spheroid,
        prime_meridian,
        angular_unit: ("degree".to_owned(), DEGREE),
        authority: None,
    })
}
