//! Checking syntax trees against host schemas
//!
//! A block is checked against the host type it would be decoded into. Record
//! targets are validated field by field through their resolved schema; map
//! and `any` targets accept arbitrary attributes. Problems never stop the
//! walk: every finding is collected into the returned [`Diagnostics`].
//!
//! ```ignore
//! let block = parse_block(source)?;
//! let diags = check::<ServerConfig>(&block);
//! if diags.has_errors() {
//!     eprintln!("{}", diags);
//! }
//! ```


use std::collections::{HashMap, HashSet};

use tracing::trace;

use crate::ast::{AttributeStmt, BlockStmt, Expr, File, Span, Stmt};
use crate::diag::{Diagnostic, Diagnostics};
use crate::interpreter::{eval_expr, is_constant, Scope};
use crate::schema::{tag_info_for, Field, TagInfo};
use crate::value::{classify, Host, Number, Type, TypeDesc, TypeKind, Value};

/* ===================== Entry Points ===================== */

/// Check a block against the host type `T`.
pub fn check<T: Host>(block: &BlockStmt) -> Diagnostics {
    check_block(block, &T::describe())
}

/// Check a block against a host type description.
///
/// Panics if the target is neither a record, a map nor `any`.
pub fn check_block(block: &BlockStmt, target: &TypeDesc) -> Diagnostics {
    let mut checker = Checker::default();
    checker.check_block(block, target);
    checker.diags
}

/// Check the top-level body of a file against the host type `T`.
pub fn check_file<T: Host>(file: &File) -> Diagnostics {
    check_body(&file.body, file.span, &T::describe())
}

/// Check a body of statements that has no enclosing block header.
///
/// `span` locates diagnostics about the body as a whole, such as missing
/// required fields.
pub fn check_body(body: &[Stmt], span: Span, target: &TypeDesc) -> Diagnostics {
    let mut checker = Checker::default();
    let target = target.deref();
    match target.kind() {
        TypeKind::Map(..) | TypeKind::Any => checker.check_map_body(body),
        TypeKind::Record(record) => {
            let info = tag_info_for(record);
            checker.check_record_body(body, span, &info);
        }
        _ => unsupported_target("<body>", target),
    }
    checker.diags
}

/// Evaluate every attribute expression in the file that references no
/// identifiers, reporting evaluation errors.
pub fn check_expressions(file: &File) -> Diagnostics {
    let mut checker = Checker::default();
    checker.check_expressions(&file.body);
    checker.diags
}

fn unsupported_target(name: &str, target: &TypeDesc) -> ! {
    panic!(
        "cannot check block {:?} against {}: target must be a record, a map or any",
        name,
        target.name()
    )
}

/* ===================== Checker ===================== */

#[derive(Default)]
struct Checker {
    diags: Diagnostics,
}

impl Checker {
    fn error(&mut self, span: Span, message: impl Into<String>) {
        self.diags.add(Diagnostic::error(span, message));
    }

    fn check_block(&mut self, block: &BlockStmt, target: &TypeDesc) {
        let name = block.full_name();
        let target = target.deref();
        trace!(block = %name, target = target.name(), "checking block");

        let labeled = block.label.as_deref().is_some_and(|label| !label.is_empty());

        match target.kind() {
            TypeKind::Map(..) | TypeKind::Any => {
                if labeled {
                    self.error(block.span, format!("block {:?} requires empty label", name));
                }
                self.check_map_body(&block.body);
            }
            TypeKind::Record(record) => {
                let info = tag_info_for(record);
                match (info.label().is_some(), labeled) {
                    (true, false) => self.error(
                        block.span,
                        format!("block {:?} requires non-empty label", name),
                    ),
                    (false, true) => self.error(
                        block.span,
                        format!("block {:?} does not support specifying labels", name),
                    ),
                    _ => {}
                }
                self.check_record_body(&block.body, block.span, &info);
            }
            _ => unsupported_target(&name, target),
        }
    }

    /// Maps take any attribute but cannot hold blocks.
    fn check_map_body(&mut self, body: &[Stmt]) {
        for stmt in body {
            match stmt {
                Stmt::Block(block) => self.error(block.span, "nested blocks not supported here"),
                Stmt::Attribute(attr) => {
                    self.check_constant(&attr.value);
                }
            }
        }
    }

    fn check_record_body(&mut self, body: &[Stmt], span: Span, info: &TagInfo) {
        let mut block_counts: HashMap<String, usize> = HashMap::new();
        for stmt in body {
            if let Stmt::Block(block) = stmt {
                *block_counts.entry(block.full_name()).or_default() += 1;
            }
        }

        let mut scope = BodyScope {
            info,
            block_counts: &block_counts,
            visited: HashMap::new(),
            seen_attrs: HashSet::new(),
        };

        for stmt in body {
            match stmt {
                Stmt::Block(block) => self.check_child_block(block, &mut scope),
                Stmt::Attribute(attr) => self.check_attribute(attr, &mut scope),
            }
        }

        for field in &info.tags {
            if field.is_optional() || field.is_label() || field.is_enum() {
                continue;
            }
            let name = field.full_name();
            if field.is_attr() && !scope.seen_attrs.contains(&name) {
                self.error(span, format!("missing required attribute {:?}", name));
            } else if field.is_block() && !block_counts.contains_key(&name) {
                self.error(span, format!("missing required block {:?}", name));
            }
        }
    }

    fn check_child_block(&mut self, block: &BlockStmt, scope: &mut BodyScope<'_>) {
        let name = block.full_name();
        let occurrence = {
            let visited = scope.visited.entry(name.clone()).or_default();
            *visited += 1;
            *visited - 1
        };

        let info = scope.info;
        if let Some(variant) = info.enum_lookup.get(&name) {
            if variant.variant_field.is_attr() {
                self.error(
                    block.span,
                    format!("{:?} must be an attribute, but is used as a block", name),
                );
                return;
            }
            let target = element_type(&variant.variant_field.ty);
            self.check_block(block, target);
            return;
        }

        let Some(field) = info.tag_lookup.get(&name) else {
            self.error(block.span, format!("unrecognized block name {:?}", name));
            return;
        };

        if field.is_attr() {
            self.error(
                block.span,
                format!("{:?} must be an attribute, but is used as a block", name),
            );
            return;
        }

        let ty = field.ty.deref();
        match ty.kind() {
            TypeKind::Slice(elem) => self.check_block(block, elem),
            TypeKind::Array(elem, len) => {
                let count = scope.block_counts.get(&name).copied().unwrap_or_default();
                if count != *len && occurrence == 0 {
                    self.error(
                        block.span,
                        format!(
                            "block {:?} must be specified exactly {} times, but was specified {} times",
                            name, len, count
                        ),
                    );
                }
                self.check_block(block, elem);
            }
            _ if occurrence == 0 => self.check_block(block, ty),
            _ => self.error(
                block.span,
                format!("block {:?} may only be specified once", name),
            ),
        }
    }

    fn check_attribute(&mut self, attr: &AttributeStmt, scope: &mut BodyScope<'_>) {
        let info = scope.info;
        let Some(field) = info.tag_lookup.get(&attr.name) else {
            self.error(
                attr.span,
                format!("unrecognized attribute name {:?}", attr.name),
            );
            return;
        };

        if field.is_block() {
            self.error(
                attr.span,
                format!("{:?} must be a block, but is used as an attribute", attr.name),
            );
            return;
        }

        if !scope.seen_attrs.insert(attr.name.clone()) {
            self.error(
                attr.span,
                format!("attribute {:?} may only be provided once", attr.name),
            );
            return;
        }

        self.check_attribute_value(&attr.value, field);
    }

    fn check_attribute_value(&mut self, expr: &Expr, field: &Field) {
        let Some(value) = self.check_constant(expr) else {
            return;
        };

        let expected = classify(&field.ty);
        if !converts_to(&value, expected) {
            let actual = value.ty();
            self.error(
                expr.span(),
                format!("expected {}, got {}", expected, actual),
            );
        }
    }

    /// Evaluate an identifier-free expression. Expressions with references
    /// are left to evaluation time.
    fn check_constant(&mut self, expr: &Expr) -> Option<Value> {
        if !is_constant(expr) {
            return None;
        }
        match eval_expr(expr, &Scope::new()) {
            Ok(value) => Some(value),
            Err(err) => {
                self.error(expr.span(), err.to_string());
                None
            }
        }
    }

    fn check_expressions(&mut self, body: &[Stmt]) {
        for stmt in body {
            match stmt {
                Stmt::Block(block) => self.check_expressions(&block.body),
                Stmt::Attribute(attr) => {
                    self.check_constant(&attr.value);
                }
            }
        }
    }
}

/// Per-body bookkeeping while walking a record's statements.
struct BodyScope<'a> {
    info: &'a TagInfo,
    /// Occurrences of each block name in the whole body.
    block_counts: &'a HashMap<String, usize>,
    /// Occurrences of each block name walked so far.
    visited: HashMap<String, usize>,
    seen_attrs: HashSet<String>,
}

/// Whether decoding can turn `value` into a field of type `expected`.
///
/// Numbers decode into strings, and strings holding a number literal decode
/// into numbers.
fn converts_to(value: &Value, expected: Type) -> bool {
    match (value, expected) {
        (_, Type::Capsule) | (Value::Null, _) => true,
        (Value::Number(_), Type::String) => true,
        (Value::String(text), Type::Number) => Number::parse(text).is_some(),
        _ => value.ty() == expected,
    }
}

/// The type a single block of this field decodes into.
fn element_type(ty: &TypeDesc) -> &TypeDesc {
    let ty = ty.deref();
    match ty.kind() {
        TypeKind::Slice(elem) | TypeKind::Array(elem, _) => elem.deref(),
        _ => ty,
    }
}
