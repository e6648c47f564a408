use thiserror::Error;

/// Failure of a property lookup.
///
/// The cycle reports all of these as one error kind; the variant and context
/// say what the property model rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PropertyError {
    /// The property is undefined at the given state.
    ///
    /// For example, a single-phase property requested inside the CO2 vapor dome.
    #[error("undefined property: {context}")]
    Undefined { context: String },

    /// The input state is outside the model's valid domain, such as a
    /// temperature below the triple point.
    #[error("out of domain: {context}")]
    OutOfDomain { context: String },

    /// The provided state is invalid or inconsistent.
    #[error("invalid state: {context}")]
    InvalidState { context: String },

    /// The calculation failed due to a numerical or internal error.
    ///
    /// For example, a flash that fails to converge near the critical point.
    #[error("calculation error: {context}")]
    Calculation { context: String },
}

impl From<std::convert::Infallible> for PropertyError {
    fn from(never: std::convert::Infallible) -> Self {
        match never {}
    }
}
