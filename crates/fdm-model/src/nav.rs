//! Navigation frames and WGS-84 geodesy.
//!
//! The position and attitude held in the state vector are interpreted by a
//! [`Navigation`] frame:
//!
//! - `Flat`: position is north/east/down from a local origin at mean sea
//!   level under the initial latitude/longitude, attitude is body to NED and
//!   the frame does not rotate.
//! - `Wgs84`: position is ECEF, attitude is body to ECEF and the frame turns
//!   with the earth.

use fdm_config::NavigationFrame;
use nalgebra::{Matrix3, Rotation3, UnitQuaternion, Vector3};

pub mod wgs84 {
    /// Semi-major axis (m).
    pub const A: f64 = 6_378_137.0;
    /// Flattening.
    pub const F: f64 = 1.0 / 298.257_223_563;
    /// Semi-minor axis (m).
    pub const B: f64 = A * (1.0 - F);
    /// First eccentricity squared.
    pub const E2: f64 = F * (2.0 - F);
    /// Earth rotation rate (rad/s).
    pub const OMEGA: f64 = 7.292_115e-5;
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Geodetic {
    /// rad
    pub latitude: f64,
    /// rad
    pub longitude: f64,
    /// Height above the ellipsoid (m).
    pub altitude: f64,
}

/// Radius of curvature in the meridian.
pub fn meridian_radius(lat: f64) -> f64 {
    let s2 = lat.sin().powi(2);
    wgs84::A * (1.0 - wgs84::E2) / (1.0 - wgs84::E2 * s2).powf(1.5)
}

/// Radius of curvature in the prime vertical.
pub fn prime_vertical_radius(lat: f64) -> f64 {
    wgs84::A / (1.0 - wgs84::E2 * lat.sin().powi(2)).sqrt()
}

pub fn geodetic_to_ecef(geo: Geodetic) -> Vector3<f64> {
    let (sin_lat, cos_lat) = geo.latitude.sin_cos();
    let (sin_lon, cos_lon) = geo.longitude.sin_cos();
    let n = prime_vertical_radius(geo.latitude);
    Vector3::new(
        (n + geo.altitude) * cos_lat * cos_lon,
        (n + geo.altitude) * cos_lat * sin_lon,
        (n * (1.0 - wgs84::E2) + geo.altitude) * sin_lat,
    )
}

/// Iterative ECEF to geodetic conversion, converged to well below a
/// millimetre for any point outside the earth's core.
pub fn ecef_to_geodetic(r: &Vector3<f64>) -> Geodetic {
    let p = r.x.hypot(r.y);
    let longitude = r.y.atan2(r.x);
    let mut latitude = r.z.atan2(p * (1.0 - wgs84::E2));
    for _ in 0..10 {
        let n = prime_vertical_radius(latitude);
        let h = p * latitude.cos() + r.z * latitude.sin() - wgs84::A * wgs84::A / n;
        let next = r.z.atan2(p * (1.0 - wgs84::E2 * n / (n + h)));
        let done = (next - latitude).abs() < 1e-13;
        latitude = next;
        if done {
            break;
        }
    }
    let n = prime_vertical_radius(latitude);
    let altitude = p * latitude.cos() + r.z * latitude.sin() - wgs84::A * wgs84::A / n;
    Geodetic {
        latitude,
        longitude,
        altitude,
    }
}

/// Rotation taking NED vectors at `(lat, lon)` into ECEF.
pub fn ned_to_ecef(lat: f64, lon: f64) -> UnitQuaternion<f64> {
    let (sin_lat, cos_lat) = lat.sin_cos();
    let (sin_lon, cos_lon) = lon.sin_cos();
    let north = Vector3::new(-sin_lat * cos_lon, -sin_lat * sin_lon, cos_lat);
    let east = Vector3::new(-sin_lon, cos_lon, 0.0);
    let down = Vector3::new(-cos_lat * cos_lon, -cos_lat * sin_lon, -sin_lat);
    let m = Matrix3::from_columns(&[north, east, down]);
    UnitQuaternion::from_rotation_matrix(&Rotation3::from_matrix_unchecked(m))
}

/// Interprets the position/attitude part of the state vector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Navigation {
    frame: NavigationFrame,
    origin_latitude: f64,
    origin_longitude: f64,
}

impl Navigation {
    pub fn new(frame: NavigationFrame, origin_latitude: f64, origin_longitude: f64) -> Self {
        Self {
            frame,
            origin_latitude,
            origin_longitude,
        }
    }

    pub fn frame(&self) -> NavigationFrame {
        self.frame
    }

    /// State position and attitude for a geodetic position and a body to
    /// NED attitude.
    pub fn initial_state(
        &self,
        geo: Geodetic,
        q_bn: UnitQuaternion<f64>,
    ) -> (Vector3<f64>, UnitQuaternion<f64>) {
        match self.frame {
            NavigationFrame::Flat => {
                let lat0 = self.origin_latitude;
                let north = (geo.latitude - lat0) * (meridian_radius(lat0) + geo.altitude);
                let east = (geo.longitude - self.origin_longitude)
                    * (prime_vertical_radius(lat0) + geo.altitude)
                    * lat0.cos();
                (Vector3::new(north, east, -geo.altitude), q_bn)
            }
            NavigationFrame::Wgs84 => {
                let q_en = ned_to_ecef(geo.latitude, geo.longitude);
                (geodetic_to_ecef(geo), q_en * q_bn)
            }
        }
    }

    pub fn geodetic(&self, position: &Vector3<f64>) -> Geodetic {
        match self.frame {
            NavigationFrame::Flat => {
                let lat0 = self.origin_latitude;
                let altitude = -position.z;
                let latitude = lat0 + position.x / (meridian_radius(lat0) + altitude);
                let cos_lat0 = lat0.cos().max(1e-9);
                let longitude = self.origin_longitude
                    + position.y / ((prime_vertical_radius(lat0) + altitude) * cos_lat0);
                Geodetic {
                    latitude,
                    longitude,
                    altitude,
                }
            }
            NavigationFrame::Wgs84 => ecef_to_geodetic(position),
        }
    }

    /// Body to NED attitude at `geo` for the state attitude `q`.
    pub fn attitude_ned(&self, geo: &Geodetic, q: &UnitQuaternion<f64>) -> UnitQuaternion<f64> {
        match self.frame {
            NavigationFrame::Flat => *q,
            NavigationFrame::Wgs84 => ned_to_ecef(geo.latitude, geo.longitude).inverse() * q,
        }
    }

    /// Earth rotation rate resolved in body axes.
    pub fn earth_rate_body(&self, q: &UnitQuaternion<f64>) -> Vector3<f64> {
        match self.frame {
            NavigationFrame::Flat => Vector3::zeros(),
            NavigationFrame::Wgs84 => q.inverse_transform_vector(&Vector3::new(0.0, 0.0, wgs84::OMEGA)),
        }
    }
}
