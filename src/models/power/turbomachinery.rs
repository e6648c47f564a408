//! Radial turbomachinery for supercritical CO2 cycles.
//!
//! Each machine has a design record produced by sizing it against a design
//! duty, and an off-design calculation that runs the sized machine at other
//! conditions:
//!
//! - [`CompressorDesign`]: single-stage radial compressor on the Sandia
//!   dimensionless map.
//! - [`RecompressorDesign`]: two map stages in series on a common shaft.
//! - [`TurbineDesign`]: radial inflow turbine with a nozzle-area flow limit.
//!
//! [`outlet_state`] and [`Efficiency`] cover the thermodynamic calculation
//! shared by all machines when only an efficiency is known.

mod compressor;
mod efficiency;
mod map;
mod outlet;
mod recompressor;
mod turbine;

pub use compressor::{CompressorDesign, CompressorError, CompressorOperation};
pub use efficiency::{Efficiency, Machine, isentropic_from_polytropic};
pub use map::{FLOW_COEFFICIENT_DESIGN, FLOW_COEFFICIENT_MAX, FLOW_COEFFICIENT_MIN};
pub use outlet::{OutletState, outlet_state};
pub use recompressor::{RecompressorDesign, RecompressorError, RecompressorOperation};
pub use turbine::{TurbineDesign, TurbineError, TurbineOperation};
