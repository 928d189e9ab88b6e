//! CLI command implementations.

pub(crate) mod check;
pub(crate) mod doctor;
pub(crate) mod run;
