use super::wkt::{WktNode, WktValue};
use crate::engine::EngineError;

/// Radians per degree as written in WKT `UNIT` nodes. Arithmetic uses
/// [`GeogCs::radians_per_unit`], which maps this to the exact `PI / 180`.
pub(crate) const DEGREE: f64 = 0.0174532925199433;

const TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Authority {
    pub name: String,
    pub code: String,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Spheroid {
    pub name: String,
    pub semi_major: f64,
    /// Zero for a sphere.
    pub inverse_flattening: f64,
}

impl Spheroid {
    pub fn semi_minor(&self) -> f64 {
        if self.inverse_flattening == 0.0 {
            self.semi_major
        } else {
            self.semi_major * (1.0 - 1.0 / self.inverse_flattening)
        }
    }

    pub fn eccentricity_squared(&self) -> f64 {
        if self.inverse_flattening == 0.0 {
            return 0.0;
        }
        let f = 1.0 / self.inverse_flattening;
        2.0 * f - f * f
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct GeogCs {
    pub name: String,
    pub datum: String,
    pub spheroid: Spheroid,
    pub prime_meridian: (String, f64),
    /// Radians per angular unit.
    pub angular_unit: (String, f64),
    pub authority: Option<Authority>,
}

impl GeogCs {
    /// Conversion factor for coordinates in this system. The truncated WKT
    /// degree would put 180° just past PI.
    pub fn radians_per_unit(&self) -> f64 {
        if close(self.angular_unit.1, DEGREE) {
            std::f64::consts::PI / 180.0
        } else {
            self.angular_unit.1
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Method {
    Mercator1Sp,
    Mercator2Sp,
    TransverseMercator,
}

impl Method {
    pub fn wkt_name(self) -> &'static str {
        match self {
            Method::Mercator1Sp => "Mercator_1SP",
            Method::Mercator2Sp => "Mercator_2SP",
            Method::TransverseMercator => "Transverse_Mercator",
        }
    }

    fn from_wkt_name(name: &str) -> Option<Method> {
        match name.to_ascii_lowercase().as_str() {
            "mercator_1sp" | "mercator" => Some(Method::Mercator1Sp),
            "mercator_2sp" => Some(Method::Mercator2Sp),
            "transverse_mercator" => Some(Method::TransverseMercator),
            _ => None,
        }
    }
}

/// Projection parameters. Angles in degrees, false easting and northing in
/// meters regardless of the linear unit.
#[derive(Debug, Clone, PartialEq, Default)]
pub(crate) struct Params {
    pub latitude_of_origin: f64,
    pub central_meridian: f64,
    pub scale_factor: f64,
    pub standard_parallel_1: f64,
    pub false_easting: f64,
    pub false_northing: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ProjCs {
    pub name: String,
    pub method: Method,
    pub params: Params,
    /// Meters per linear unit.
    pub linear_unit: (String, f64),
    pub authority: Option<Authority>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CrsDefinition {
    pub geogcs: GeogCs,
    pub projcs: Option<ProjCs>,
}

fn close(a: f64, b: f64) -> bool {
    a == b || (a - b).abs() <= TOLERANCE * a.abs().max(b.abs())
}

fn named(name: &str) -> bool {
    !name.is_empty() && !name.eq_ignore_ascii_case("unknown") && !name.eq_ignore_ascii_case("unnamed")
}

impl CrsDefinition {
    pub fn is_geographic(&self) -> bool {
        self.projcs.is_none()
    }

    /// Semantic comparison. Names are ignored except datum names, which are
    /// only compared when both sides carry one.
    pub fn is_same(&self, other: &CrsDefinition) -> bool {
        let (a, b) = (&self.geogcs, &other.geogcs);
        if named(&a.datum) && named(&b.datum) && !a.datum.eq_ignore_ascii_case(&b.datum) {
            return false;
        }
        let geog_same = close(a.spheroid.semi_major, b.spheroid.semi_major)
            && close(a.spheroid.semi_minor(), b.spheroid.semi_minor())
            && close(a.prime_meridian.1, b.prime_meridian.1)
            && close(a.angular_unit.1, b.angular_unit.1);
        if !geog_same {
            return false;
        }
        match (&self.projcs, &other.projcs) {
            (None, None) => true,
            (Some(p), Some(q)) => {
                p.method == q.method
                    && close(p.linear_unit.1, q.linear_unit.1)
                    && close(p.params.latitude_of_origin, q.params.latitude_of_origin)
                    && close(p.params.central_meridian, q.params.central_meridian)
                    && close(p.params.scale_factor, q.params.scale_factor)
                    && close(p.params.standard_parallel_1, q.params.standard_parallel_1)
                    && close(p.params.false_easting, q.params.false_easting)
                    && close(p.params.false_northing, q.params.false_northing)
            }
            _ => false,
        }
    }

    pub fn to_wkt(&self) -> WktNode {
        let geogcs = geogcs_node(&self.geogcs);
        let Some(p) = &self.projcs else {
            return geogcs;
        };
        let unit = p.linear_unit.1;
        let mut node = WktNode::new("PROJCS")
            .quoted(p.name.as_str())
            .node(geogcs)
            .node(WktNode::new("PROJECTION").quoted(p.method.wkt_name()));
        let param = |name: &str, value: f64| WktNode::new("PARAMETER").quoted(name).number(value);
        let params = &p.params;
        let list: Vec<(&str, f64)> = match p.method {
            Method::Mercator1Sp | Method::TransverseMercator => vec![
                ("latitude_of_origin", params.latitude_of_origin),
                ("central_meridian", params.central_meridian),
                ("scale_factor", params.scale_factor),
            ],
            Method::Mercator2Sp => vec![
                ("standard_parallel_1", params.standard_parallel_1),
                ("latitude_of_origin", params.latitude_of_origin),
                ("central_meridian", params.central_meridian),
            ],
        };
        for (name, value) in list {
            node = node.node(param(name, value));
        }
        node = node
            .node(param("false_easting", params.false_easting / unit))
            .node(param("false_northing", params.false_northing / unit))
            .node(WktNode::new("UNIT").quoted(p.linear_unit.0.as_str()).number(unit));
        if let Some(a) = &p.authority {
            node = node.node(authority_node(a));
        }
        node
    }

    pub fn from_wkt(node: &WktNode) -> Result<CrsDefinition, EngineError> {
        if node.is("GEOGCS") {
            return Ok(CrsDefinition {
                geogcs: parse_geogcs(node)?,
                projcs: None,
            });
        }
        if !node.is("PROJCS") {
            return Err(wkt_error(format!("unsupported coordinate system `{}`", node.name)));
        }
        let name = node_name(node)?;
        let geogcs = parse_geogcs(
            node.child("GEOGCS")
                .ok_or_else(|| wkt_error("PROJCS without GEOGCS"))?,
        )?;
        let projection = node
            .child("PROJECTION")
            .ok_or_else(|| wkt_error("PROJCS without PROJECTION"))?;
        let projection_name = node_name(projection)?;
        let method = Method::from_wkt_name(&projection_name)
            .ok_or(EngineError::UnsupportedProjection(projection_name))?;
        let linear_unit = match node.child("UNIT") {
            Some(unit) => unit_of(unit)?,
            None => ("metre".to_owned(), 1.0),
        };

        let mut params = Params {
            scale_factor: 1.0,
            ..Params::default()
        };
        for p in node.nodes().filter(|n| n.is("PARAMETER")) {
            let pname = node_name(p)?;
            let value = number_at(p, 1)?;
            match pname.to_ascii_lowercase().as_str() {
                "latitude_of_origin" => params.latitude_of_origin = value,
                "central_meridian" => params.central_meridian = value,
                "scale_factor" => params.scale_factor = value,
                "standard_parallel_1" => params.standard_parallel_1 = value,
                "false_easting" => params.false_easting = value * linear_unit.1,
                "false_northing" => params.false_northing = value * linear_unit.1,
                _ => {}
            }
        }

        Ok(CrsDefinition {
            geogcs,
            projcs: Some(ProjCs {
                name,
                method,
                params,
                linear_unit,
                authority: authority_of(node)?,
            }),
        })
    }
}

fn authority_node(a: &Authority) -> WktNode {
    WktNode::new("AUTHORITY")
        .quoted(a.name.as_str())
        .quoted(a.code.as_str())
}

fn geogcs_node(g: &GeogCs) -> WktNode {
    let spheroid = WktNode::new("SPHEROID")
        .quoted(g.spheroid.name.as_str())
        .number(g.spheroid.semi_major)
        .number(g.spheroid.inverse_flattening);
    let mut node = WktNode::new("GEOGCS")
        .quoted(g.name.as_str())
        .node(WktNode::new("DATUM").quoted(g.datum.as_str()).node(spheroid))
        .node(
            WktNode::new("PRIMEM")
                .quoted(g.prime_meridian.0.as_str())
                .number(g.prime_meridian.1),
        )
        .node(
            WktNode::new("UNIT")
                .quoted(g.angular_unit.0.as_str())
                .number(g.angular_unit.1),
        );
    if let Some(a) = &g.authority {
        node = node.node(authority_node(a));
    }
    node
}

fn wkt_error<S: Into<String>>(message: S) -> EngineError {
    EngineError::CorruptWkt {
        offset: 0,
        message: message.into(),
    }
}

fn node_name(node: &WktNode) -> Result<String, EngineError> {
    match node.value(0) {
        Some(WktValue::Quoted(s)) | Some(WktValue::Bare(s)) => Ok(s.clone()),
        _ => Err(wkt_error(format!("{} without a name", node.name))),
    }
}

fn number_at(node: &WktNode, index: usize) -> Result<f64, EngineError> {
    node.value(index)
        .and_then(WktValue::number)
        .filter(|n| n.is_finite())
        .ok_or_else(|| wkt_error(format!("{} is missing a numeric value", node.name)))
}

fn unit_of(node: &WktNode) -> Result<(String, f64), EngineError> {
    let factor = number_at(node, 1)?;
    if factor <= 0.0 {
        return Err(wkt_error("UNIT factor must be positive"));
    }
    Ok((node_name(node)?, factor))
}

fn authority_of(node: &WktNode) -> Result<Option<Authority>, EngineError> {
    let Some(a) = node.child("AUTHORITY") else {
        return Ok(None);
    };
    let code = a
        .value(1)
        .map(|v| v.text().to_owned())
        .ok_or_else(|| wkt_error("AUTHORITY without a code"))?;
    Ok(Some(Authority {
        name: node_name(a)?,
        code,
    }))
}

fn parse_geogcs(node: &WktNode) -> Result<GeogCs, EngineError> {
    let name = node_name(node)?;
    let datum = node
        .child("DATUM")
        .ok_or_else(|| wkt_error("GEOGCS without DATUM"))?;
    let spheroid = datum
        .child("SPHEROID")
        .ok_or_else(|| wkt_error("DATUM without SPHEROID"))?;
    let semi_major = number_at(spheroid, 1)?;
    let inverse_flattening = number_at(spheroid, 2)?;
    if semi_major <= 0.0 || inverse_flattening < 0.0 {
        return Err(wkt_error("invalid SPHEROID parameters"));
    }
    let prime_meridian = match node.child("PRIMEM") {
        Some(pm) => (node_name(pm)?, number_at(pm, 1)?),
        None => ("Greenwich".to_owned(), 0.0),
    };
    let angular_unit = match node.child("UNIT") {
        Some(unit) => unit_of(unit)?,
        None => ("degree".to_owned(), DEGREE),
    };
    Ok(GeogCs {
        name,
        datum: node_name(datum)?,
        spheroid: Spheroid {
            name: node_name(spheroid)?,
            semi_major,
            inverse_flattening,
        },
        prime_meridian,
        angular_unit,
        authority: authority_of(node)?,
    })
}
