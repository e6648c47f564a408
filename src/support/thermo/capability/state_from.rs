use crate::support::thermo::State;

use super::ThermoModel;

/// Constructs a [`State`] from a typed pair of independent properties.
///
/// Inputs are tuples led by the fluid value, such as
/// `(Fluid, ThermodynamicTemperature, Pressure)` or
/// `(Fluid, Pressure, SpecificEntropy)`. A model supports exactly the
/// pairs it implements this trait for, so an unsupported lookup fails to
/// compile instead of at run time.
///
/// The [`PropertyOracle`](crate::support::thermo::PropertyOracle) blanket
/// implementation requires the four pairs the cycle solver looks up.
pub trait StateFrom<Input>: ThermoModel {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Creates a thermodynamic state from the provided input.
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if the state cannot be created from `input`.
    fn state_from(&self, input: Input) -> Result<State<Self::Fluid>, Self::Error>;
}

/// Pairs without the fluid value use `Fluid::default()`.
///
/// Carbon dioxide is a marker type, so `thermo.state_from((t, p))` reads the
/// same as the explicit form.
impl<M, A, B> StateFrom<(A, B)> for M
where
    M: ThermoModel + StateFrom<(<M as ThermoModel>::Fluid, A, B)>,
    <M as ThermoModel>::Fluid: Default,
{
    type Error = <M as StateFrom<(<M as ThermoModel>::Fluid, A, B)>>::Error;

    fn state_from(&self, (a, b): (A, B)) -> Result<State<Self::Fluid>, Self::Error> {
        self.state_from((<M as ThermoModel>::Fluid::default(), a, b))
    }
}
