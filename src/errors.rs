// Copyright 2025 Cornell University
// released under MIT License

use thiserror::Error;

/// Errors reported to callers of the generator API.
/// Violations of the front-end's well-formedness guarantees are not
/// represented here: they abort generation with a panic.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    #[error("no interaction named `{0}`")]
    UnknownInteraction(String),
    #[error("no group named `{0}`")]
    UnknownGroup(String),
}

pub type Result<T> = std::result::Result<T, GenerationError>;
