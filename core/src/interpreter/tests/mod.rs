//! Tests for expression evaluation
//!
//! Organized by feature area

mod operator_tests;
mod secret_tests;
