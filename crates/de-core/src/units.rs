// de-core/src/units.rs

use uom::si::f64::Pressure as UomPressure;

// Public canonical unit type (SI, f64)
pub type Pressure = UomPressure;

#[inline]
pub fn pa(v: f64) -> Pressure {
    use uom::si::pressure::pascal;
    Pressure::new::<pascal>(v)
}

#[inline]
pub fn hpa(v: f64) -> Pressure {
    use uom::si::pressure::hectopascal;
    Pressure::new::<hectopascal>(v)
}

/// Pressure value in pascals, the unit model pressure fields are stored in.
#[inline]
pub fn to_pa(p: Pressure) -> f64 {
    use uom::si::pressure::pascal;
    p.get::<pascal>()
}

pub mod constants {
    /// Gas constant of dry air, J / (kg K).
    pub const R_DRY: f64 = 287.0;
    /// Specific heat of dry air at constant pressure, J / (kg K).
    pub const CP_DRY: f64 = 1004.0;
    /// Temperature weighting used by difference total energy.
    pub const KAPPA: f64 = R_DRY / CP_DRY;
}
