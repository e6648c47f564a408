/// Base trait for thermodynamic property models.
///
/// Every capability trait builds on this one so that a model names the fluid
/// type its states carry exactly once.
pub trait ThermoModel {
    type Fluid;
}
