use thiserror::Error;
use uom::si::f64::{Power, Pressure, TemperatureInterval, ThermodynamicTemperature};

use crate::support::thermo::PropertyError;

/// Errors from the sub-segmented UA balance.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HxError {
    #[error("heat duty must be non-negative, got {q_dot:?}")]
    NegativeDuty { q_dot: Power },

    #[error("hot inlet {hot:?} is colder than cold inlet {cold:?}")]
    InletTemperatures {
        cold: ThermodynamicTemperature,
        hot: ThermodynamicTemperature,
    },

    #[error("hot stream pressure rises from {inlet:?} to {outlet:?}")]
    HotPressureRise { inlet: Pressure, outlet: Pressure },

    #[error("cold stream pressure rises from {inlet:?} to {outlet:?}")]
    ColdPressureRise { inlet: Pressure, outlet: Pressure },

    #[error("cold inlet state")]
    ColdInlet(#[source] PropertyError),

    #[error("hot inlet state")]
    HotInlet(#[source] PropertyError),

    #[error("hot stream state at node {node}")]
    HotNode {
        node: usize,
        #[source]
        source: PropertyError,
    },

    #[error("cold stream state at node {node}")]
    ColdNode {
        node: usize,
        #[source]
        source: PropertyError,
    },

    /// The cold stream is at least as hot as the hot stream somewhere.
    ///
    /// Inside the cycle loops this is an expected signal that the trial
    /// temperature is on the wrong side of the solution.
    #[error("second law violation at node {node}: min_delta_t={min_delta_t:?}")]
    SecondLaw {
        node: usize,
        min_delta_t: TemperatureInterval,
    },

    #[error("segment {segment} has no valid effectiveness-NTU solution")]
    Conductance { segment: usize },
}

impl HxError {
    /// Integer code for this failure.
    #[must_use]
    pub fn code(&self) -> i32 {
        match self {
            Self::NegativeDuty { .. } => 4,
            Self::InletTemperatures { .. } => 5,
            Self::HotPressureRise { .. } => 6,
            Self::ColdPressureRise { .. } => 7,
            Self::ColdInlet(_) => 3,
            Self::HotInlet(_) => 9,
            Self::SecondLaw { .. } => 11,
            Self::HotNode { .. } => 12,
            Self::ColdNode { .. } => 13,
            Self::Conductance { .. } => 14,
        }
    }

    /// Whether this is the recoverable second-law signal.
    #[must_use]
    pub fn is_second_law(&self) -> bool {
        matches!(self, Self::SecondLaw { .. })
    }
}
