//! Cycle and component models.
//!
//! [`power`] holds the recompression cycle and its turbomachinery,
//! [`thermal`] the heat exchanger shared by the recuperators, the primary
//! heat exchanger, and the precooler.
//!
//! Each model keeps its computation in an internal `core` module. The public
//! types are thin adapters over it, and the cycle also implements
//! [`twine_core::Model`] so it composes with other Twine models.

pub mod power;
pub mod thermal;
