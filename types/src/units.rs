//! Transport-engine internal units.
//!
//! Step data arrives with lengths in millimetres, times in nanoseconds and energies in MeV.
//! Divide by one of these constants to express a quantity in that unit.

pub const MILLIMETER: f64 = 1.0;
pub const CENTIMETER: f64 = 10.0 * MILLIMETER;
pub const METER: f64 = 1000.0 * MILLIMETER;

pub const NANOSECOND: f64 = 1.0;

pub const MEV: f64 = 1.0;
pub const KEV: f64 = 1.0e-3 * MEV;
pub const GEV: f64 = 1.0e3 * MEV;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversions() {
        assert_eq!(25.0 / CENTIMETER, 2.5);
        assert_eq!(2.0 * METER / CENTIMETER, 200.0);
        assert_eq!(1500.0 / GEV, 1.5);
        assert_eq!(1.0 / KEV, 1000.0);
    }
}
