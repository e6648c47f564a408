//! Power cycle models.
//!
//! [`turbomachinery`] holds the radial compressor and turbine models sized
//! from a design duty and run against their performance maps off design.
//! [`recompression`] assembles them with the recuperators into the
//! supercritical CO2 recompression Brayton cycle.

pub mod recompression;
pub mod turbomachinery;
