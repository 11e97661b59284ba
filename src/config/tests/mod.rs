//! Unit tests for configuration loading and precedence.
//!
//! Tests are organised into modules by functional area:
//! - `helpers`: Shared test utilities
//! - `precedence`: Layer precedence tests
//! - `operation_mode`: Command selection and validation tests
//! - `field_resolution`: Token, repository list, and data type resolution

mod field_resolution;
mod helpers;
mod precedence;
