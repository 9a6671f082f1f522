//! Forward and inverse projection math for the supported methods.
//!
//! All angles are radians relative to Greenwich, all distances meters with
//! false easting/northing already applied.

use super::definition::{Method, Params, Spheroid};
use crate::engine::EngineError;
use std::f64::consts::{FRAC_PI_2, PI};

const EPS: f64 = 1e-10;
const MAX_ITER: usize = 15;
/// Longitudes this far past +-PI are rounding noise and are not wrapped.
const LON_SLOP: f64 = 1e-12;

pub(crate) struct Projector<'a> {
    method: Method,
    params: &'a Params,
    a: f64,
    es: f64,
    e: f64,
}

impl<'a> Projector<'a> {
    pub fn new(method: Method, params: &'a Params, spheroid: &Spheroid) -> Self {
        let es = spheroid.eccentricity_squared();
        Projector {
            method,
            params,
            a: spheroid.semi_major,
            es,
            e: es.sqrt(),
        }
    }

    pub fn forward(&self, lam: f64, phi: f64) -> Result<(f64, f64), EngineError> {
        check_latitude(phi)?;
        let lam0 = self.params.central_meridian.to_radians();
        let (x, y) = match self.method {
            Method::Mercator1Sp | Method::Mercator2Sp => {
                if (phi.abs() - FRAC_PI_2).abs() <= EPS {
                    return Err(EngineError::OutOfDomain);
                }
                let k0 = self.mercator_scale();
                let x = self.a * k0 * adjlon(lam - lam0);
                let y = -self.a * k0 * tsfn(phi, phi.sin(), self.e).ln();
                (x, y)
            }
            Method::TransverseMercator => self.tmerc_forward(adjlon(lam - lam0), phi)?,
        };
        let out = (x + self.params.false_easting, y + self.params.false_northing);
        finite(out)
    }

    pub fn inverse(&self, x: f64, y: f64) -> Result<(f64, f64), EngineError> {
        let x = x - self.params.false_easting;
        let y = y - self.params.false_northing;
        let lam0 = self.params.central_meridian.to_radians();
        let (lam, phi) = match self.method {
            Method::Mercator1Sp | Method::Mercator2Sp => {
                let k0 = self.mercator_scale();
                let phi = phi2(self.e, (-y / (self.a * k0)).exp())?;
                (x / (self.a * k0) + lam0, phi)
            }
            Method::TransverseMercator => {
                let (dlam, phi) = self.tmerc_inverse(x, y)?;
                (dlam + lam0, phi)
            }
        };
        finite((adjlon(lam), phi))
    }

    fn mercator_scale(&self) -> f64 {
        match self.method {
            Method::Mercator2Sp => {
                let phi1 = self.params.standard_parallel_1.to_radians();
                let s = phi1.sin();
                phi1.cos() / (1.0 - self.es * s * s).sqrt()
            }
            _ => self.params.scale_factor,
        }
    }

    /// Meridian arc length from the equator.
    fn meridian_arc(&self, phi: f64) -> f64 {
        let es = self.es;
        let e4 = es * es;
        let e6 = e4 * es;
        self.a
            * ((1.0 - es / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0) * phi
                - (3.0 * es / 8.0 + 3.0 * e4 / 32.0 + 45.0 * e6 / 1024.0) * (2.0 * phi).sin()
                + (15.0 * e4 / 256.0 + 45.0 * e6 / 1024.0) * (4.0 * phi).sin()
                - (35.0 * e6 / 3072.0) * (6.0 * phi).sin())
    }

    fn tmerc_forward(&self, dlam: f64, phi: f64) -> Result<(f64, f64), EngineError> {
        if dlam.abs() > FRAC_PI_2 {
            return Err(EngineError::OutOfDomain);
        }
        let k0 = self.params.scale_factor;
        let phi0 = self.params.latitude_of_origin.to_radians();
        let esp = self.es / (1.0 - self.es);
        let (sin_phi, cos_phi) = phi.sin_cos();
        let n = self.a / (1.0 - self.es * sin_phi * sin_phi).sqrt();
        let t = (sin_phi / cos_phi).powi(2);
        let c = esp * cos_phi * cos_phi;
        let a = dlam * cos_phi;
        let m = self.meridian_arc(phi);
        let m0 = self.meridian_arc(phi0);

        let x = k0
            * n
            * (a + (1.0 - t + c) * a.powi(3) / 6.0
                + (5.0 - 18.0 * t + t * t + 72.0 * c - 58.0 * esp) * a.powi(5) / 120.0);
        let y = k0
            * (m - m0
                + n * (sin_phi / cos_phi)
                    * (a * a / 2.0
                        + (5.0 - t + 9.0 * c + 4.0 * c * c) * a.powi(4) / 24.0
                        + (61.0 - 58.0 * t + t * t + 600.0 * c - 330.0 * esp) * a.powi(6)
                            / 720.0));
        Ok((x, y))
    }

    fn tmerc_inverse(&self, x: f64, y: f64) -> Result<(f64, f64), EngineError> {
        let k0 = self.params.scale_factor;
        let es = self.es;
        let esp = es / (1.0 - es);
        let m = self.meridian_arc(self.params.latitude_of_origin.to_radians()) + y / k0;
        let mu = m / (self.a * (1.0 - es / 4.0 - 3.0 * es * es / 64.0 - 5.0 * es.powi(3) / 256.0));
        let e1 = (1.0 - (1.0 - es).sqrt()) / (1.0 + (1.0 - es).sqrt());
        let phi1 = mu
            + (3.0 * e1 / 2.0 - 27.0 * e1.powi(3) / 32.0) * (2.0 * mu).sin()
            + (21.0 * e1 * e1 / 16.0 - 55.0 * e1.powi(4) / 32.0) * (4.0 * mu).sin()
            + (151.0 * e1.powi(3) / 96.0) * (6.0 * mu).sin()
            + (1097.0 * e1.powi(4) / 512.0) * (8.0 * mu).sin();
        if (phi1.abs() - FRAC_PI_2).abs() <= EPS {
            return Ok((0.0, phi1.signum() * FRAC_PI_2));
        }
        let (sin1, cos1) = phi1.sin_cos();
        let c1 = esp * cos1 * cos1;
        let t1 = (sin1 / cos1).powi(2);
        let w = 1.0 - es * sin1 * sin1;
        let n1 = self.a / w.sqrt();
        let r1 = self.a * (1.0 - es) / w.powf(1.5);
        let d = x / (n1 * k0);

        let phi = phi1
            - (n1 * sin1 / cos1 / r1)
                * (d * d / 2.0
                    - (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1 * c1 - 9.0 * esp) * d.powi(4) / 24.0
                    + (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1 * t1 - 252.0 * esp - 3.0 * c1 * c1)
                        * d.powi(6)
                        / 720.0);
        let dlam = (d - (1.0 + 2.0 * t1 + c1) * d.powi(3) / 6.0
            + (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1 * c1 + 8.0 * esp + 24.0 * t1 * t1) * d.powi(5)
                / 120.0)
            / cos1;
        check_latitude(phi)?;
        Ok((dlam, phi))
    }
}

pub(crate) fn check_latitude(phi: f64) -> Result<(), EngineError> {
    if !phi.is_finite() || phi.abs() > FRAC_PI_2 + EPS {
        return Err(EngineError::OutOfDomain);
    }
    Ok(())
}

/// Wrap a longitude into [-pi, pi].
pub(crate) fn adjlon(lam: f64) -> f64 {
    if lam.abs() <= PI + LON_SLOP {
        return lam;
    }
    let wrapped = (lam + PI).rem_euclid(2.0 * PI) - PI;
    if wrapped == -PI && lam > 0.0 {
        PI
    } else {
        wrapped
    }
}

fn finite(p: (f64, f64)) -> Result<(f64, f64), EngineError> {
    if p.0.is_finite() && p.1.is_finite() {
        Ok(p)
    } else {
        Err(EngineError::OutOfDomain)
    }
}

fn tsfn(phi: f64, sin_phi: f64, e: f64) -> f64 {
    let es = e * sin_phi;
    (0.5 * (FRAC_PI_2 - phi)).tan() / ((1.0 - es) / (1.0 + es)).powf(0.5 * e)
}

/// Latitude from the isometric `ts` value.
fn phi2(e: f64, ts: f64) -> Result<f64, EngineError> {
    let half_e = 0.5 * e;
    let mut phi = FRAC_PI_2 - 2.0 * ts.atan();
    for _ in 0..MAX_ITER {
        let con = e * phi.sin();
        let next = FRAC_PI_2 - 2.0 * (ts * ((1.0 - con) / (1.0 + con)).powf(half_e)).atan();
        let done = (next - phi).abs() <= EPS;
        phi = next;
        if done {
            return Ok(phi);
        }
    }
    if phi.is_finite() {
        Ok(phi)
    } else {
        Err(EngineError::OutOfDomain)
    }
}
