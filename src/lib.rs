// Copyright 2025 Cornell University
// released under MIT License

pub mod context;
pub mod csp;
pub mod diagnostic;
pub mod errors;
pub mod generator;
pub mod headers;
pub mod ir;
pub mod library;
pub mod lifeline;
pub mod memory;
pub mod property;
pub mod serialize;
pub mod ticktock;
pub mod until;

pub use generator::{generate, GeneratedFile, GeneratorConfig};
