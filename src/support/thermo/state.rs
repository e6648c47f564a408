use uom::si::f64::{MassDensity, ThermodynamicTemperature};

/// A fluid state fixed by temperature and density.
///
/// Property models compute everything else (pressure, enthalpy, entropy,
/// sound speed) from this pair. `Fluid` is usually a marker type such as
/// [`CarbonDioxide`](super::fluid::CarbonDioxide).
///
/// ```
/// use sco2_cycle::support::thermo::{State, fluid::CarbonDioxide};
/// use uom::si::{
///     f64::{MassDensity, ThermodynamicTemperature},
///     mass_density::kilogram_per_cubic_meter,
///     thermodynamic_temperature::kelvin,
/// };
///
/// // Compressor inlet just above the critical temperature.
/// let inlet = State::new(
///     ThermodynamicTemperature::new::<kelvin>(305.0),
///     MassDensity::new::<kilogram_per_cubic_meter>(620.0),
///     CarbonDioxide,
/// );
/// assert_eq!(inlet.fluid, CarbonDioxide);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct State<Fluid> {
    pub temperature: ThermodynamicTemperature,
    pub density: MassDensity,
    pub fluid: Fluid,
}

impl<Fluid> State<Fluid> {
    #[must_use]
    pub fn new(temperature: ThermodynamicTemperature, density: MassDensity, fluid: Fluid) -> Self {
        Self {
            temperature,
            density,
            fluid,
        }
    }
}
