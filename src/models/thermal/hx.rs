//! Heat exchanger models.
//!
//! A [`HeatExchangerDesign`] records an exchanger's design point and scales
//! pressure drop and conductance to other flows. [`achieved_ua`] runs the
//! sub-segmented counter-flow balance that the cycle solver uses to match a
//! recuperator's conductance.

mod design;
mod error;
mod segmented;
mod streams;

pub use design::HeatExchangerDesign;
pub use error::HxError;
pub use segmented::{AchievedUa, Duty, achieved_ua};
pub use streams::StreamPair;
