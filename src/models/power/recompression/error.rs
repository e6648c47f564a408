use thiserror::Error;
use twine_solvers::optimization::golden_section;

use crate::{
    models::{
        power::turbomachinery::{CompressorError, RecompressorError, TurbineError},
        thermal::hx::HxError,
    },
    support::{
        solve::simplex::SimplexError,
        thermo::PropertyError,
    },
};

/// The iteration loops of the cycle solver and its drivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Loop {
    /// LT recuperator hot outlet temperature (state 9).
    LowTemperature,

    /// HT recuperator hot outlet temperature (state 8).
    HighTemperature,

    /// HT recuperator bypass fraction.
    HeatShield,

    /// Off-design turbine mass flow.
    MassFlow,

    /// Off-design compressor inlet pressure for a target.
    TargetPressure,
}

impl Loop {
    fn code(self) -> i32 {
        match self {
            Self::LowTemperature => 31,
            Self::HighTemperature => 35,
            Self::HeatShield => 37,
            Self::MassFlow => 42,
            Self::TargetPressure => 82,
        }
    }
}

/// Errors from solving or optimizing the recompression cycle.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CycleError {
    #[error(transparent)]
    Property(#[from] PropertyError),

    #[error("heat exchanger")]
    HeatExchanger(#[from] HxError),

    #[error("main compressor")]
    Compressor(#[from] CompressorError),

    #[error("recompressor")]
    Recompressor(#[from] RecompressorError),

    #[error("turbine")]
    Turbine(#[from] TurbineError),

    /// The machines absorb at least as much work as the turbine produces.
    #[error("positive net power is impossible (net specific work {specific_work} J/kg)")]
    NoNetPower { specific_work: f64 },

    #[error("target {target} is not bracketed by the pressure scan")]
    TargetNotBracketed { target: f64 },

    /// The target exceeds the largest output the sized cycle can reach.
    #[error("target {target} exceeds the maximum output {maximum}")]
    TargetUnreachable { target: f64, maximum: f64 },

    #[error("no operating point meets the target")]
    NoFeasibleTarget,

    #[error("turbine mass flow is negative ({m_dot} kg/s)")]
    NegativeTurbineFlow { m_dot: f64 },

    #[error("{which:?} loop did not converge in {iters} iterations")]
    NotConverged { which: Loop, iters: usize },

    #[error("optimizer found no feasible design")]
    NoFeasibleDesign,

    #[error("no feasible off-design operating point")]
    NoFeasibleOperation,

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("design optimizer")]
    Simplex(#[from] SimplexError),

    #[error("pressure search")]
    PressureSearch(#[from] golden_section::ConfigError),
}

impl CycleError {
    /// Integer code for this failure.
    #[must_use]
    pub fn code(&self) -> i32 {
        match self {
            Self::Property(_) => 3,
            Self::HeatExchanger(error) => error.code(),
            Self::Compressor(error) => error.code(),
            Self::Recompressor(error) => error.code(),
            Self::Turbine(error) => error.code(),
            Self::NoNetPower { .. } => 25,
            Self::TargetNotBracketed { .. } => 26,
            Self::NegativeTurbineFlow { .. } => 29,
            Self::NotConverged { which, .. } => which.code(),
            Self::NoFeasibleTarget => 98,
            Self::NoFeasibleDesign | Self::Simplex(_) | Self::PressureSearch(_) => 99,
            Self::NoFeasibleOperation => 111,
            Self::TargetUnreachable { .. } => 123,
            Self::InvalidInput(_) => -1,
        }
    }

    /// Whether this is the recoverable second-law signal from a recuperator.
    #[must_use]
    pub fn is_second_law(&self) -> bool {
        matches!(self, Self::HeatExchanger(error) if error.is_second_law())
    }

    pub(crate) fn not_converged(which: Loop, iters: usize) -> Self {
        Self::NotConverged { which, iters }
    }
}

/// Integer status of a cycle operation, zero on success.
pub trait ErrorCode {
    fn error_code(&self) -> i32;
}

impl<T> ErrorCode for Result<T, CycleError> {
    fn error_code(&self) -> i32 {
        match self {
            Ok(_) => 0,
            Err(error) => error.code(),
        }
    }
}
