use std::sync::PoisonError;

use thiserror::Error;

use crate::support::thermo::PropertyError;

/// Errors returned by the [`CoolProp`](super::CoolProp) model.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CoolPropError {
    #[error(transparent)]
    Rfluids(#[from] rfluids::native::CoolPropError),
    #[error("CoolProp abstract state mutex poisoned")]
    Poisoned,
}

impl<T> From<PoisonError<T>> for CoolPropError {
    fn from(_: PoisonError<T>) -> Self {
        CoolPropError::Poisoned
    }
}

impl From<CoolPropError> for PropertyError {
    fn from(error: CoolPropError) -> Self {
        match error {
            CoolPropError::Rfluids(error) => classify(error.to_string()),
            CoolPropError::Poisoned => PropertyError::Calculation {
                context: "CoolProp abstract state mutex poisoned".to_string(),
            },
        }
    }
}

#[derive(Clone, Copy)]
enum Class {
    Undefined,
    OutOfDomain,
    InvalidState,
}

/// Message fragments and the property error each one indicates.
///
/// CoolProp reports failures as free text. Near the CO2 critical point most
/// of them are range checks from the flash routines.
const CLASSES: &[(&str, Class)] = &[
    ("not defined", Class::Undefined),
    ("out of range", Class::OutOfDomain),
    ("not in range", Class::OutOfDomain),
    ("must be in range", Class::OutOfDomain),
    ("must be between", Class::OutOfDomain),
    ("range of validity", Class::OutOfDomain),
    ("quality must be", Class::OutOfDomain),
    ("not a valid number", Class::InvalidState),
    ("invalid number", Class::InvalidState),
    ("invalid state", Class::InvalidState),
];

/// Classifies a CoolProp message, falling back to a calculation error.
fn classify(message: String) -> PropertyError {
    let lowered = message.to_lowercase();
    let class = CLASSES
        .iter()
        .find(|(fragment, _)| lowered.contains(fragment))
        .map(|&(_, class)| class);

    let context = message;
    match class {
        Some(Class::Undefined) => PropertyError::Undefined { context },
        Some(Class::OutOfDomain) => PropertyError::OutOfDomain { context },
        Some(Class::InvalidState) => PropertyError::InvalidState { context },
        None => PropertyError::Calculation { context },
    }
}
