/// A reference ellipsoid described by its semi-major (equatorial) and
/// semi-minor (polar) axis lengths, in meters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ellipsoid {
    semi_major: f64,
    semi_minor: f64,
}

impl Ellipsoid {
    pub const WGS84: Ellipsoid = Ellipsoid::new(6378137.0, 6356752.314245179);

    pub const fn new(semi_major: f64, semi_minor: f64) -> Self {
        Ellipsoid {
            semi_major,
            semi_minor,
        }
    }

    /// Build an ellipsoid from its semi-major axis and inverse flattening.
    /// An inverse flattening of zero describes a sphere.
    pub fn from_inverse_flattening(semi_major: f64, inverse_flattening: f64) -> Self {
        let semi_minor = if inverse_flattening == 0.0 {
            semi_major
        } else {
            semi_major * (1.0 - 1.0 / inverse_flattening)
        };
        Ellipsoid {
            semi_major,
            semi_minor,
        }
    }

    pub fn semi_major(&self) -> f64 {
        self.semi_major
    }

    pub fn semi_minor(&self) -> f64 {
        self.semi_minor
    }

    /// Equatorial radius, same as [`Ellipsoid::semi_major`].
    pub fn radius_equator(&self) -> f64 {
        self.semi_major
    }

    /// Polar radius, same as [`Ellipsoid::semi_minor`].
    pub fn radius_polar(&self) -> f64 {
        self.semi_minor
    }

    pub fn flattening(&self) -> f64 {
        if self.semi_major == 0.0 {
            return 0.0;
        }
        (self.semi_major - self.semi_minor) / self.semi_major
    }

    /// Inverse flattening, or zero for a sphere (the WKT convention).
    pub fn inverse_flattening(&self) -> f64 {
        let f = self.flattening();
        if f == 0.0 {
            0.0
        } else {
            1.0 / f
        }
    }

    /// First eccentricity squared.
    pub fn eccentricity_squared(&self) -> f64 {
        let f = self.flattening();
        2.0 * f - f * f
    }

    pub fn is_sphere(&self) -> bool {
        self.semi_major == self.semi_minor
    }
}
