//! Tessera configuration language runtime
//!
//! The pieces, bottom up:
//!
//! - [`value`]: the dynamic value model and classification of host types
//! - [`schema`]: field annotations on host records and their resolved form
//! - [`parser`] and [`ast`]: source text to syntax tree
//! - [`interpreter`]: binary operators and constant expression evaluation
//! - [`typecheck`]: syntax trees checked against host schemas
//! - [`diag`]: the diagnostics the checker reports

pub mod ast;
pub mod cli;
pub mod config;
pub mod diag;
pub mod interpreter;
pub mod parser;
pub mod schema;
pub mod secrets;
pub mod typecheck;
pub mod value;

// Re-export main types
pub use diag::{Diagnostic, Diagnostics, Severity};
pub use interpreter::{evaluate, EvalError};
pub use schema::{tag_info, Record};
pub use secrets::{OptionalSecret, Secret};
pub use typecheck::{check, check_block, check_file};
pub use value::{classify, Host, Type, TypeDesc, Value};
