//! Ordnance Survey National Grid references.
//!
//! A reference such as `SX 9250 9250`, or a plain easting/northing pair such
//! as `292500,92500`, is parsed into OSGB36 easting/northing
//! (EPSG:27700), projected back to OSGB36 geodetic coordinates with the
//! inverse transverse Mercator series, then shifted to WGS84 with the
//! published 7-parameter Helmert transformation. The datum shift is accurate
//! to a few metres, far below the 250 m SoilGrids cell size.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

// Airy 1830 ellipsoid
const AIRY_A: f64 = 6_377_563.396;
const AIRY_B: f64 = 6_356_256.909;

// WGS84 ellipsoid
const WGS84_A: f64 = 6_378_137.0;
const WGS84_B: f64 = 6_356_752.314_245;

// National Grid projection
const F0: f64 = 0.999_601_271_7;
const LAT0_DEG: f64 = 49.0;
const LON0_DEG: f64 = -2.0;
const E0: f64 = 400_000.0;
const N0: f64 = -100_000.0;

// extent of the grid in metres
const GRID_WIDTH_M: f64 = 700_000.0;
const GRID_HEIGHT_M: f64 = 1_300_000.0;

// OSGB36 -> WGS84 Helmert parameters
const TX: f64 = 446.448;
const TY: f64 = -125.157;
const TZ: f64 = 542.060;
const SCALE_PPM: f64 = -20.4894;
const RX_SEC: f64 = 0.1502;
const RY_SEC: f64 = 0.2470;
const RZ_SEC: f64 = 0.8421;

/// A validated Ordnance Survey grid reference.
#[derive(Debug, Clone, PartialEq)]
pub struct OsGridRef {
    code: String,
    easting: f64,
    northing: f64,
}

impl OsGridRef {
    /// Parses a lettered reference (`SX 925 925`) or a numeric
    /// `<easting>,<northing>` / `<easting> <northing>` pair in metres.
    pub fn parse(code: &str) -> Result<Self> {
        if code.trim_start().starts_with(|c: char| c.is_ascii_digit()) {
            return parse_numeric(code);
        }

        let compact: String = code
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_ascii_uppercase();

        if compact.len() < 2 || !compact.is_char_boundary(2) {
            return Err(Error::invalid(
                "OS_code",
                format!("'{code}' is not a grid reference (expected e.g. 'SX 925 925')"),
            ));
        }
        let (letters, digits) = compact.split_at(2);

        let mut chars = letters.chars();
        let (Some(l1), Some(l2)) = (chars.next(), chars.next()) else {
            return Err(Error::invalid("OS_code", "missing 100 km square letters"));
        };
        let (e100km, n100km) = square_offset(l1, l2).ok_or_else(|| {
            Error::invalid(
                "OS_code",
                format!("'{letters}' is not a National Grid 100 km square"),
            )
        })?;

        if !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(Error::invalid(
                "OS_code",
                format!("'{digits}' must contain only digits"),
            ));
        }
        if digits.len() % 2 != 0 || digits.len() > 10 {
            return Err(Error::invalid(
                "OS_code",
                format!(
                    "'{digits}' must have an even number of digits (0-10), got {}",
                    digits.len()
                ),
            ));
        }

        let half = digits.len() / 2;
        // resolution of the referenced square in metres
        let precision = 10f64.powi(5 - half as i32);
        let (e_digits, n_digits) = digits.split_at(half);
        let e_within = parse_digits(e_digits) * precision;
        let n_within = parse_digits(n_digits) * precision;

        // use the centre of the referenced square
        let easting = f64::from(e100km) * 100_000.0 + e_within + precision / 2.0;
        let northing = f64::from(n100km) * 100_000.0 + n_within + precision / 2.0;

        Ok(Self {
            code: format!("{letters}{digits}"),
            easting,
            northing,
        })
    }

    /// A point given directly in National Grid metres.
    pub fn from_easting_northing(easting: f64, northing: f64) -> Result<Self> {
        if !easting.is_finite() || !(0.0..GRID_WIDTH_M).contains(&easting) {
            return Err(Error::invalid(
                "OS_code",
                format!("easting {easting} is outside the National Grid (0-{GRID_WIDTH_M} m)"),
            ));
        }
        if !northing.is_finite() || !(0.0..GRID_HEIGHT_M).contains(&northing) {
            return Err(Error::invalid(
                "OS_code",
                format!("northing {northing} is outside the National Grid (0-{GRID_HEIGHT_M} m)"),
            ));
        }
        Ok(Self {
            code: format!("{easting},{northing}"),
            easting,
            northing,
        })
    }

    /// Normalised reference (upper case, no spaces).
    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn easting(&self) -> f64 {
        self.easting
    }

    pub fn northing(&self) -> f64 {
        self.northing
    }

    /// WGS84 `(lon, lat)` of the referenced square's centre.
    pub fn to_wgs84(&self) -> (f64, f64) {
        let (lat, lon) = grid_to_osgb36(self.easting, self.northing);
        osgb36_to_wgs84(lat, lon)
    }
}

impl FromStr for OsGridRef {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for OsGridRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.code)
    }
}

fn parse_numeric(code: &str) -> Result<OsGridRef> {
    let parts: Vec<&str> = code
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|p| !p.is_empty())
        .collect();
    let &[e, n] = parts.as_slice() else {
        return Err(Error::invalid(
            "OS_code",
            format!("'{code}' is not an easting/northing pair (expected e.g. '292500,92500')"),
        ));
    };
    let metres = |s: &str| -> Result<f64> {
        if !s.chars().all(|c| c.is_ascii_digit() || c == '.') {
            return Err(Error::invalid(
                "OS_code",
                format!("'{s}' is not a distance in metres"),
            ));
        }
        s.parse()
            .map_err(|_| Error::invalid("OS_code", format!("'{s}' is not a distance in metres")))
    };
    OsGridRef::from_easting_northing(metres(e)?, metres(n)?)
}

fn parse_digits(s: &str) -> f64 {
    s.chars()
        .filter_map(|c| c.to_digit(10))
        .fold(0.0, |acc, d| acc * 10.0 + f64::from(d))
}

/// Offset of a two-letter 100 km square from the false origin, in units of
/// 100 km. Letters skip `I`; the first letter picks a 500 km square.
fn square_offset(l1: char, l2: char) -> Option<(u32, u32)> {
    if !matches!(l1, 'H' | 'J' | 'N' | 'O' | 'S' | 'T') || !l2.is_ascii_uppercase() || l2 == 'I'
    {
        return None;
    }
    let index = |c: char| {
        let i = c as u32 - 'A' as u32;
        if i > 7 { i - 1 } else { i }
    };
    let (i1, i2) = (index(l1), index(l2));

    let e = ((i1 + 3) % 5) * 5 + i2 % 5;
    let n = (19 - (i1 / 5) * 5) - i2 / 5;

    // extent of the grid: 700 km x 1300 km
    if e > 6 || n > 12 {
        return None;
    }
    Some((e, n))
}

fn meridional_arc(b_f0: f64, n: f64, lat: f64, lat0: f64) -> f64 {
    let (n2, n3) = (n * n, n * n * n);
    let dl = lat - lat0;
    let sl = lat + lat0;
    b_f0 * ((1.0 + n + 1.25 * n2 + 1.25 * n3) * dl
        - (3.0 * n + 3.0 * n2 + 21.0 / 8.0 * n3) * dl.sin() * sl.cos()
        + (15.0 / 8.0 * n2 + 15.0 / 8.0 * n3) * (2.0 * dl).sin() * (2.0 * sl).cos()
        - 35.0 / 24.0 * n3 * (3.0 * dl).sin() * (3.0 * sl).cos())
}

/// Inverse National Grid projection: easting/northing to OSGB36
/// `(lat, lon)` in degrees.
fn grid_to_osgb36(easting: f64, northing: f64) -> (f64, f64) {
    let a = AIRY_A;
    let b = AIRY_B;
    let e2 = 1.0 - (b * b) / (a * a);
    let n = (a - b) / (a + b);
    let lat0 = LAT0_DEG.to_radians();
    let lon0 = LON0_DEG.to_radians();

    let mut lat = lat0;
    let mut m = 0.0;
    for _ in 0..64 {
        lat += (northing - N0 - m) / (a * F0);
        m = meridional_arc(b * F0, n, lat, lat0);
        if (northing - N0 - m).abs() < 1e-5 {
            break;
        }
    }

    let (sin_lat, cos_lat) = lat.sin_cos();
    let nu = a * F0 / (1.0 - e2 * sin_lat * sin_lat).sqrt();
    let rho = a * F0 * (1.0 - e2) / (1.0 - e2 * sin_lat * sin_lat).powf(1.5);
    let eta2 = nu / rho - 1.0;

    let tan_lat = lat.tan();
    let (t2, t4, t6) = (tan_lat.powi(2), tan_lat.powi(4), tan_lat.powi(6));
    let sec_lat = 1.0 / cos_lat;
    let (nu3, nu5, nu7) = (nu.powi(3), nu.powi(5), nu.powi(7));

    let vii = tan_lat / (2.0 * rho * nu);
    let viii = tan_lat / (24.0 * rho * nu3) * (5.0 + 3.0 * t2 + eta2 - 9.0 * t2 * eta2);
    let ix = tan_lat / (720.0 * rho * nu5) * (61.0 + 90.0 * t2 + 45.0 * t4);
    let x = sec_lat / nu;
    let xi = sec_lat / (6.0 * nu3) * (nu / rho + 2.0 * t2);
    let xii = sec_lat / (120.0 * nu5) * (5.0 + 28.0 * t2 + 24.0 * t4);
    let xiia = sec_lat / (5040.0 * nu7) * (61.0 + 662.0 * t2 + 1320.0 * t4 + 720.0 * t6);

    let de = easting - E0;
    let lat = lat - vii * de.powi(2) + viii * de.powi(4) - ix * de.powi(6);
    let lon = lon0 + x * de - xi * de.powi(3) + xii * de.powi(5) - xiia * de.powi(7);

    (lat.to_degrees(), lon.to_degrees())
}

/// Helmert shift from OSGB36 `(lat, lon)` to WGS84 `(lon, lat)`, degrees.
fn osgb36_to_wgs84(lat: f64, lon: f64) -> (f64, f64) {
    let (x, y, z) = to_cartesian(lat, lon, AIRY_A, AIRY_B);

    let s = SCALE_PPM * 1e-6;
    let rx = (RX_SEC / 3600.0).to_radians();
    let ry = (RY_SEC / 3600.0).to_radians();
    let rz = (RZ_SEC / 3600.0).to_radians();

    let x2 = TX + (1.0 + s) * x - rz * y + ry * z;
    let y2 = TY + rz * x + (1.0 + s) * y - rx * z;
    let z2 = TZ - ry * x + rx * y + (1.0 + s) * z;

    let (lat, lon) = from_cartesian(x2, y2, z2, WGS84_A, WGS84_B);
    (lon, lat)
}

fn to_cartesian(lat: f64, lon: f64, a: f64, b: f64) -> (f64, f64, f64) {
    let e2 = 1.0 - (b * b) / (a * a);
    let (sin_lat, cos_lat) = lat.to_radians().sin_cos();
    let (sin_lon, cos_lon) = lon.to_radians().sin_cos();
    let nu = a / (1.0 - e2 * sin_lat * sin_lat).sqrt();
    (
        nu * cos_lat * cos_lon,
        nu * cos_lat * sin_lon,
        (1.0 - e2) * nu * sin_lat,
    )
}

fn from_cartesian(x: f64, y: f64, z: f64, a: f64, b: f64) -> (f64, f64) {
    let e2 = 1.0 - (b * b) / (a * a);
    let p = (x * x + y * y).sqrt();
    let mut lat = z.atan2(p * (1.0 - e2));
    for _ in 0..10 {
        let sin_lat = lat.sin();
        let nu = a / (1.0 - e2 * sin_lat * sin_lat).sqrt();
        let next = (z + e2 * nu * sin_lat).atan2(p);
        if (next - lat).abs() < 1e-12 {
            lat = next;
            break;
        }
        lat = next;
    }
    (lat.to_degrees(), y.atan2(x).to_degrees())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn parses_square_letters() {
        let r = OsGridRef::parse("TG 51409 13177").unwrap();
        assert_eq!(r.code(), "TG5140913177");
        assert_abs_diff_eq!(r.easting(), 651_409.5, epsilon = 1e-9);
        assert_abs_diff_eq!(r.northing(), 313_177.5, epsilon = 1e-9);

        let r = OsGridRef::parse("sv0000").unwrap();
        assert_abs_diff_eq!(r.easting(), 500.0, epsilon = 1e-9);
        assert_abs_diff_eq!(r.northing(), 500.0, epsilon = 1e-9);

        let r = OsGridRef::parse("HP").unwrap();
        assert_abs_diff_eq!(r.easting(), 450_000.0, epsilon = 1e-9);
        assert_abs_diff_eq!(r.northing(), 1_250_000.0, epsilon = 1e-9);
    }

    #[test]
    fn rejects_malformed_references() {
        for bad in ["", "S", "SX123", "SX12a4", "AA1234", "SI1234", "SX 123456789012"] {
            let err = OsGridRef::parse(bad).unwrap_err();
            assert!(
                matches!(err, Error::InvalidArgument { field: "OS_code", .. }),
                "{bad}: {err:?}"
            );
        }
    }

    #[test]
    fn parses_easting_northing_pairs() {
        let r = OsGridRef::parse("292500 92500").unwrap();
        assert_abs_diff_eq!(r.easting(), 292_500.0, epsilon = 1e-9);
        assert_abs_diff_eq!(r.northing(), 92_500.0, epsilon = 1e-9);
        assert_eq!(r.code(), "292500,92500");
        assert_eq!(OsGridRef::parse(" 292500, 92500 ").unwrap(), r);

        // same spot as the 100 m square SX 925 925, minus the half-cell offset
        let (lon, lat) = r.to_wgs84();
        let (lon2, lat2) = OsGridRef::parse("SX 925 925").unwrap().to_wgs84();
        assert_abs_diff_eq!(lon, lon2, epsilon = 2e-3);
        assert_abs_diff_eq!(lat, lat2, epsilon = 2e-3);
    }

    #[test]
    fn rejects_pairs_off_the_grid() {
        for bad in ["800000 100", "100 1300000", "1 2 3", "292500", "292500 -5", "2925x0 92500"] {
            let err = OsGridRef::parse(bad).unwrap_err();
            assert!(
                matches!(err, Error::InvalidArgument { field: "OS_code", .. }),
                "{bad}: {err:?}"
            );
        }
        assert!(OsGridRef::from_easting_northing(f64::NAN, 0.0).is_err());
        assert!(OsGridRef::from_easting_northing(699_999.0, 1_299_999.0).is_ok());
    }

    #[test]
    fn inverse_projection_matches_os_worked_example() {
        // Worked example from "A guide to coordinate systems in Great Britain"
        let (lat, lon) = grid_to_osgb36(651_409.903, 313_177.270);
        assert_abs_diff_eq!(lat, 52.0 + 39.0 / 60.0 + 27.2531 / 3600.0, epsilon = 1e-7);
        assert_abs_diff_eq!(lon, 1.0 + 43.0 / 60.0 + 4.5177 / 3600.0, epsilon = 1e-7);
    }

    #[test]
    fn grid_reference_resolves_to_wgs84() {
        let (lon, lat) = OsGridRef::parse("TQ 30080 80000").unwrap().to_wgs84();
        // central London
        assert!((51.50..51.52).contains(&lat), "lat {lat}");
        assert!((-0.14..-0.11).contains(&lon), "lon {lon}");
    }

    #[test]
    fn cartesian_round_trip() {
        let (x, y, z) = to_cartesian(50.7, -3.5, WGS84_A, WGS84_B);
        let (lat, lon) = from_cartesian(x, y, z, WGS84_A, WGS84_B);
        assert_abs_diff_eq!(lat, 50.7, epsilon = 1e-9);
        assert_abs_diff_eq!(lon, -3.5, epsilon = 1e-9);
    }
}
