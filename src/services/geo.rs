const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance in kilometres between two points given in decimal
/// degrees (haversine). NaN inputs yield NaN.
pub fn distance_km(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lng = (lng2 - lng1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

#[cfg(test)]
mod tests {
    use super::*;

    const RIYADH: (f64, f64) = (24.7136, 46.6753);

    #[test]
    fn same_point_is_zero() {
        assert_eq!(distance_km(RIYADH.0, RIYADH.1, RIYADH.0, RIYADH.1), 0.0);
        assert_eq!(distance_km(-33.9, 151.2, -33.9, 151.2), 0.0);
    }

    #[test]
    fn symmetric() {
        let jeddah = (21.4858, 39.1925);
        let ab = distance_km(RIYADH.0, RIYADH.1, jeddah.0, jeddah.1);
        let ba = distance_km(jeddah.0, jeddah.1, RIYADH.0, RIYADH.1);
        assert!((ab - ba).abs() < 1e-9);
        // Riyadh to Jeddah is roughly 850 km as the crow flies.
        assert!((ab - 850.0).abs() < 20.0, "got {}", ab);
    }

    #[test]
    fn small_latitude_step_is_about_one_km() {
        let d = distance_km(RIYADH.0, RIYADH.1, RIYADH.0 + 0.009, RIYADH.1);
        assert!((d - 1.0).abs() <= 0.05, "got {}", d);
    }

    #[test]
    fn nan_propagates() {
        assert!(distance_km(f64::NAN, 0.0, 0.0, 0.0).is_nan());
    }
}
