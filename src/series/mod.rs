//! Column validation and canonical series preparation.

pub mod preparation;
pub mod validation;

pub use preparation::{prepare, SeriesWarning};
pub use validation::{validate, ValidatedTable};
