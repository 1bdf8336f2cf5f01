//! Record schemas and field annotations
//!
//! A record type lists its fields through [`Record::fields`]. Each field may
//! carry an annotation of the form `name,role[,optional]`:
//!
//! - `attr`: the field is set by an attribute statement
//! - `block`: the field is set by one or more nested blocks
//! - `enum`: the field holds a list of mutually exclusive block variants
//! - `label`: the field receives the block label (no name allowed)
//! - `squash`: the field's own record is flattened into the parent (no name
//!   allowed)
//!
//! Annotations are resolved once per record type into a [`TagInfo`] and
//! memoized in the process-wide [`AnnotationCache`]. Malformed annotations
//! are bugs in the host program, so they panic at first use instead of
//! surfacing as diagnostics.
//!
//! ```rust,ignore
//! tessera_core::record! {
//!     pub struct Server {
//!         #[syntax(",label")]
//!         pub name: String,
//!         #[syntax("port,attr,optional")]
//!         pub port: u16,
//!         #[syntax("tls,block,optional")]
//!         pub tls: Option<Tls>,
//!     }
//! }
//! ```

mod cache;

#[cfg(test)]
mod tests;

pub use cache::{tag_info, tag_info_for, AnnotationCache};

use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::value::{classify, Host, RecordDesc, Type, TypeDesc, TypeKind};

/* ===================== Flags ===================== */

/// Role bits of an annotated field.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Flags(u8);

impl Flags {
    pub const ATTR: Flags = Flags(1 << 0);
    pub const BLOCK: Flags = Flags(1 << 1);
    pub const ENUM: Flags = Flags(1 << 2);
    pub const LABEL: Flags = Flags(1 << 3);
    pub const OPTIONAL: Flags = Flags(1 << 4);
    pub const SQUASH: Flags = Flags(1 << 5);

    pub const fn empty() -> Self {
        Flags(0)
    }

    pub const fn contains(self, other: Flags) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: Flags) {
        self.0 |= other.0;
    }

    pub fn is_attr(self) -> bool {
        self.contains(Flags::ATTR)
    }

    pub fn is_block(self) -> bool {
        self.contains(Flags::BLOCK)
    }

    pub fn is_enum(self) -> bool {
        self.contains(Flags::ENUM)
    }

    pub fn is_label(self) -> bool {
        self.contains(Flags::LABEL)
    }

    pub fn is_optional(self) -> bool {
        self.contains(Flags::OPTIONAL)
    }

    pub fn is_squash(self) -> bool {
        self.contains(Flags::SQUASH)
    }
}

impl std::ops::BitOr for Flags {
    type Output = Flags;

    fn bitor(self, rhs: Flags) -> Flags {
        Flags(self.0 | rhs.0)
    }
}

impl fmt::Debug for Flags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [(Flags, &str); 6] = [
            (Flags::ATTR, "attr"),
            (Flags::BLOCK, "block"),
            (Flags::ENUM, "enum"),
            (Flags::LABEL, "label"),
            (Flags::OPTIONAL, "optional"),
            (Flags::SQUASH, "squash"),
        ];
        let set: Vec<&str> = NAMES
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect();
        write!(f, "Flags({})", set.join("|"))
    }
}

/* ===================== Declarations ===================== */

/// One declared member of a record, as written in the host program.
#[derive(Clone, Copy)]
pub struct FieldDecl {
    /// The Rust field identifier.
    pub ident: &'static str,
    /// Whether the field is `pub`.
    pub exported: bool,
    /// The raw annotation, if any.
    pub tag: Option<&'static str>,
    pub ty: fn() -> TypeDesc,
}

impl FieldDecl {
    pub fn new<T: Host>(ident: &'static str, tag: Option<&'static str>) -> Self {
        Self {
            ident,
            exported: true,
            tag,
            ty: T::describe,
        }
    }
}

impl fmt::Debug for FieldDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDecl")
            .field("ident", &self.ident)
            .field("exported", &self.exported)
            .field("tag", &self.tag)
            .finish()
    }
}

/// A host struct whose fields can be targeted by blocks and attributes.
pub trait Record: Host {
    fn fields() -> Vec<FieldDecl>;
}

/// Declare a struct together with its [`Record`] and [`Host`] impls.
///
/// Fields annotated with `#[syntax("...")]` take part in checking; other
/// fields are carried along untouched.
#[macro_export]
macro_rules! record {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[syntax($tag:literal)])?
                $fvis:vis $field:ident : $fty:ty
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $( $fvis $field: $fty, )*
        }

        impl $crate::schema::Record for $name {
            fn fields() -> ::std::vec::Vec<$crate::schema::FieldDecl> {
                ::std::vec![
                    $(
                        $crate::schema::FieldDecl {
                            ident: stringify!($field),
                            exported: !stringify!($fvis).is_empty(),
                            tag: $crate::record!(@tag $($tag)?),
                            ty: <$fty as $crate::value::Host>::describe,
                        },
                    )*
                ]
            }
        }

        impl $crate::value::Host for $name {
            fn describe() -> $crate::value::TypeDesc {
                $crate::value::TypeDesc::record::<$name>()
            }
        }
    };
    (@tag $tag:literal) => { ::std::option::Option::Some($tag) };
    (@tag) => { ::std::option::Option::None };
}

/* ===================== Resolved Schema ===================== */

/// A resolved annotated field.
#[derive(Debug, Clone)]
pub struct Field {
    /// Dotted name split into segments.
    pub name: Vec<String>,
    /// Path of field positions from the record root, through squashed
    /// records.
    pub index: Vec<usize>,
    pub flags: Flags,
    pub ty: TypeDesc,
    pub ident: &'static str,
}

impl Field {
    pub fn full_name(&self) -> String {
        self.name.join(".")
    }

    pub fn is_attr(&self) -> bool {
        self.flags.is_attr()
    }

    pub fn is_block(&self) -> bool {
        self.flags.is_block()
    }

    pub fn is_enum(&self) -> bool {
        self.flags.is_enum()
    }

    pub fn is_label(&self) -> bool {
        self.flags.is_label()
    }

    pub fn is_optional(&self) -> bool {
        self.flags.is_optional()
    }
}

/// An enum field paired with one of its variants.
#[derive(Debug, Clone)]
pub struct EnumField {
    pub enum_field: Field,
    pub variant_field: Field,
}

/// The resolved schema of a record type.
#[derive(Debug, Clone, Default)]
pub struct TagInfo {
    /// Annotated fields in declaration order, squashed records inlined.
    pub tags: Vec<Field>,
    /// Attribute and block fields by dotted name.
    pub tag_lookup: HashMap<String, Field>,
    /// Enum variants by `enum.variant` name.
    pub enum_lookup: HashMap<String, EnumField>,
}

impl TagInfo {
    pub fn label(&self) -> Option<&Field> {
        self.tags.iter().find(|field| field.is_label())
    }
}

/* ===================== Schema Construction ===================== */

fn invalid(record: &RecordDesc, ident: &str, msg: impl fmt::Display) -> ! {
    panic!("invalid annotation on {}.{}: {}", record.name, ident, msg)
}

fn parse_tag(record: &RecordDesc, decl: &FieldDecl, tag: &str) -> (String, Flags) {
    let ident = decl.ident;
    let mut parts = tag.split(',').map(str::trim);
    let name = parts.next().unwrap_or_default().to_string();

    let mut flags = match parts.next() {
        Some("attr") => Flags::ATTR,
        Some("block") => Flags::BLOCK,
        Some("enum") => Flags::ENUM,
        Some("label") => Flags::LABEL,
        Some("squash") => Flags::SQUASH,
        Some("") | None => invalid(record, ident, format!("missing role in {:?}", tag)),
        Some(other) => invalid(record, ident, format!("unknown role {:?}", other)),
    };

    for option in parts {
        match option {
            "optional" if !flags.is_optional() => flags.insert(Flags::OPTIONAL),
            "optional" => invalid(record, ident, "optional given more than once"),
            other => invalid(record, ident, format!("unknown option {:?}", other)),
        }
    }

    let nameless = flags.is_label() || flags.is_squash();
    if nameless && !name.is_empty() {
        invalid(record, ident, "label and squash fields must not be named");
    }
    if nameless && flags.is_optional() {
        invalid(record, ident, "label and squash fields cannot be optional");
    }
    if !nameless && name.is_empty() {
        invalid(record, ident, "empty name");
    }

    (name, flags)
}

fn collect_fields(record: &RecordDesc, prefix: &[usize], out: &mut Vec<Field>) {
    for (position, decl) in (record.fields)().iter().enumerate() {
        let Some(tag) = decl.tag else { continue };
        if !decl.exported {
            invalid(record, decl.ident, "annotated field must be pub");
        }

        let (name, flags) = parse_tag(record, decl, tag);
        let mut index = prefix.to_vec();
        index.push(position);
        let ty = (decl.ty)();

        if flags.is_squash() {
            let Some(inner) = ty.as_record().copied() else {
                invalid(
                    record,
                    decl.ident,
                    format!("squash field must be a record, got {}", ty.name()),
                );
            };
            collect_fields(&inner, &index, out);
            continue;
        }

        out.push(Field {
            name: if name.is_empty() {
                Vec::new()
            } else {
                name.split('.').map(String::from).collect()
            },
            index,
            flags,
            ty,
            ident: decl.ident,
        });
    }
}

/// Resolve the variant record behind an enum field: a slice or array of
/// records, possibly behind indirection at either level.
fn enum_variant_record(record: &RecordDesc, field: &Field) -> RecordDesc {
    let element = match field.ty.deref().kind() {
        TypeKind::Slice(elem) | TypeKind::Array(elem, _) => elem.as_record().copied(),
        _ => None,
    };
    element.unwrap_or_else(|| {
        invalid(
            record,
            field.ident,
            format!("enum field must be a list of records, got {}", field.ty.name()),
        )
    })
}

pub(crate) fn build_tag_info(record: &RecordDesc) -> TagInfo {
    let mut tags = Vec::new();
    collect_fields(record, &[], &mut tags);

    let mut seen = HashSet::new();
    let mut label: Option<&Field> = None;
    for field in &tags {
        if field.is_label() {
            if let Some(first) = label {
                panic!(
                    "invalid schema for {}: multiple label fields ({} and {})",
                    record.name, first.ident, field.ident
                );
            }
            if classify(&field.ty) != Type::String {
                invalid(record, field.ident, "label field must be a string");
            }
            label = Some(field);
            continue;
        }
        let name = field.full_name();
        if !seen.insert(name.clone()) {
            panic!(
                "invalid schema for {}: duplicate field name {:?} on {}",
                record.name, name, field.ident
            );
        }
    }

    let mut tag_lookup = HashMap::new();
    let mut enum_lookup = HashMap::new();
    for field in &tags {
        if field.is_attr() || field.is_block() {
            tag_lookup.insert(field.full_name(), field.clone());
        } else if field.is_enum() {
            let variants = tag_info_for(&enum_variant_record(record, field));
            for (variant_name, variant) in &variants.tag_lookup {
                enum_lookup.insert(
                    format!("{}.{}", field.full_name(), variant_name),
                    EnumField {
                        enum_field: field.clone(),
                        variant_field: variant.clone(),
                    },
                );
            }
        }
    }

    TagInfo {
        tags,
        tag_lookup,
        enum_lookup,
    }
}
