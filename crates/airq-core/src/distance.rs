//! Great-circle distance between coordinates.

use airq_types::Coordinate;

/// Mean Earth radius in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine distance between two coordinates in kilometres.
///
/// The result is unrounded; callers round for display.
///
/// # Example
///
/// ```
/// use airq_core::distance::distance_km;
/// use airq_types::Coordinate;
///
/// let warsaw = Coordinate::new(52.2297, 21.0122);
/// let krakow = Coordinate::new(50.0647, 19.9450);
/// let d = distance_km(warsaw, krakow);
/// assert!((d - 252.0).abs() < 2.0);
/// ```
pub fn distance_km(a: Coordinate, b: Coordinate) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let dlat = (b.latitude - a.latitude).to_radians();
    let dlon = (b.longitude - a.longitude).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);

    // Rounding can push h marginally above 1 for antipodal points
    2.0 * EARTH_RADIUS_KM * h.sqrt().min(1.0).asin()
}
