use std::sync::Arc;
use std::thread;

use super::*;
use crate::value::{classify, Host, Type, Value};

crate::record! {
    #[derive(Debug, Default)]
    pub struct Basic {
        #[syntax(",label")]
        pub name: String,
        #[syntax("arg,attr")]
        pub arg: String,
        #[syntax("count,attr,optional")]
        pub count: i64,
        #[syntax("nested,block")]
        pub nested: Leaf,
        pub untagged: bool,
        #[syntax("cloud.region,attr,optional")]
        pub region: String,
    }
}

crate::record! {
    #[derive(Debug, Default)]
    pub struct Leaf {
        #[syntax("value,attr")]
        pub value: String,
    }
}

crate::record! {
    pub struct Deep {
        #[syntax("deep_attr,attr")]
        pub deep_attr: String,
    }
}

crate::record! {
    pub struct Middle {
        #[syntax("middle_attr,attr")]
        pub middle_attr: String,
        #[syntax(",squash")]
        pub deep: Deep,
    }
}

crate::record! {
    pub struct Outer {
        #[syntax("outer_attr,attr")]
        pub outer_attr: String,
        #[syntax(",squash")]
        pub middle: Box<Middle>,
    }
}

crate::record! {
    pub struct Exec {
        #[syntax("cmd,attr")]
        pub cmd: String,
    }
}

crate::record! {
    pub struct Http {
        #[syntax("url,attr")]
        pub url: String,
    }
}

crate::record! {
    pub struct Step {
        #[syntax("exec,block")]
        pub exec: Option<Exec>,
        #[syntax("http,block")]
        pub http: Option<Http>,
    }
}

crate::record! {
    pub struct Pipeline {
        #[syntax("step,enum")]
        pub steps: Vec<Step>,
    }
}

/* ===================== Resolution ===================== */

#[test]
fn test_fields_keep_declaration_order() {
    let info = tag_info::<Basic>();
    let names: Vec<String> = info.tags.iter().map(Field::full_name).collect();
    assert_eq!(names, vec!["", "arg", "count", "nested", "cloud.region"]);
}

#[test]
fn test_untagged_fields_are_skipped() {
    let info = tag_info::<Basic>();
    assert!(info.tags.iter().all(|field| field.ident != "untagged"));
}

#[test]
fn test_lookup_covers_attrs_and_blocks() {
    let info = tag_info::<Basic>();
    assert!(info.tag_lookup["arg"].is_attr());
    assert!(info.tag_lookup["nested"].is_block());
    assert!(info.tag_lookup["count"].is_optional());
    assert!(!info.tag_lookup.contains_key(""));
    assert_eq!(info.tag_lookup.len(), 4);
}

#[test]
fn test_dotted_name_is_split() {
    let info = tag_info::<Basic>();
    let region = &info.tag_lookup["cloud.region"];
    assert_eq!(region.name, vec!["cloud", "region"]);
    assert_eq!(region.index, vec![5]);
}

#[test]
fn test_label_field() {
    let info = tag_info::<Basic>();
    let label = info.label().expect("label field");
    assert_eq!(label.ident, "name");
    assert!(tag_info::<Leaf>().label().is_none());
}

#[test]
fn test_squash_flattens_at_any_depth() {
    let info = tag_info::<Outer>();
    let names: Vec<String> = info.tags.iter().map(Field::full_name).collect();
    assert_eq!(names, vec!["outer_attr", "middle_attr", "deep_attr"]);

    assert_eq!(info.tag_lookup["outer_attr"].index, vec![0]);
    assert_eq!(info.tag_lookup["middle_attr"].index, vec![1, 0]);
    assert_eq!(info.tag_lookup["deep_attr"].index, vec![1, 1, 0]);
}

#[test]
fn test_enum_lookup_combines_names() {
    let info = tag_info::<Pipeline>();
    assert!(info.tag_lookup.is_empty());
    assert_eq!(info.enum_lookup.len(), 2);

    let exec = &info.enum_lookup["step.exec"];
    assert_eq!(exec.enum_field.ident, "steps");
    assert_eq!(exec.variant_field.ident, "exec");

    let http = &info.enum_lookup["step.http"];
    assert_eq!(http.variant_field.full_name(), "http");
}

#[test]
fn test_flags_debug_lists_roles() {
    let flags = Flags::ATTR | Flags::OPTIONAL;
    assert_eq!(format!("{:?}", flags), "Flags(attr|optional)");
    assert!(flags.is_attr());
    assert!(!flags.is_block());
    assert_eq!(format!("{:?}", Flags::empty()), "Flags()");
}

/* ===================== Cache ===================== */

#[test]
fn test_cache_returns_same_schema() {
    let first = tag_info::<Leaf>();
    let second = tag_info::<Leaf>();
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn test_cache_is_shared_across_threads() {
    let handles: Vec<_> = (0..8)
        .map(|_| thread::spawn(tag_info::<Exec>))
        .collect();
    let infos: Vec<Arc<TagInfo>> = handles
        .into_iter()
        .map(|handle| handle.join().expect("thread panicked"))
        .collect();

    for info in &infos[1..] {
        assert!(Arc::ptr_eq(&infos[0], info));
    }
}

#[test]
fn test_local_cache_counts_entries() {
    let cache = AnnotationCache::new();
    assert!(cache.is_empty());

    let record = Leaf::describe();
    let record = record.as_record().expect("record");
    cache.get(record);
    cache.get(record);
    assert_eq!(cache.len(), 1);
}

/* ===================== Classification ===================== */

#[test]
fn test_labeled_block_collection_is_object() {
    assert_eq!(classify(&Vec::<Basic>::describe()), Type::Object);
    assert_eq!(classify(&<[Basic; 2]>::describe()), Type::Object);
    assert_eq!(classify(&Vec::<Leaf>::describe()), Type::Array);
}

#[test]
fn test_records_classify_as_object() {
    assert_eq!(classify(&Leaf::describe()), Type::Object);
    assert_eq!(classify(&Option::<Box<Leaf>>::describe()), Type::Object);
    assert_eq!(classify(&Value::describe()), Type::Capsule);
}

/* ===================== Schema Errors ===================== */

crate::record! {
    pub struct Private {
        #[syntax("hidden,attr")]
        hidden: String,
    }
}

crate::record! {
    pub struct MissingRole {
        #[syntax("arg")]
        pub arg: String,
    }
}

crate::record! {
    pub struct UnknownRole {
        #[syntax("arg,field")]
        pub arg: String,
    }
}

crate::record! {
    pub struct UnknownOption {
        #[syntax("arg,attr,required")]
        pub arg: String,
    }
}

crate::record! {
    pub struct EmptyName {
        #[syntax(",attr")]
        pub arg: String,
    }
}

crate::record! {
    pub struct DuplicateName {
        #[syntax("arg,attr")]
        pub first: String,
        #[syntax("arg,block")]
        pub second: Leaf,
    }
}

crate::record! {
    pub struct SquashCollision {
        #[syntax("deep_attr,attr")]
        pub deep_attr: String,
        #[syntax(",squash")]
        pub middle: Middle,
    }
}

crate::record! {
    pub struct TwoLabels {
        #[syntax(",label")]
        pub first: String,
        #[syntax(",label")]
        pub second: String,
    }
}

crate::record! {
    pub struct NamedLabel {
        #[syntax("name,label")]
        pub name: String,
    }
}

crate::record! {
    pub struct NumericLabel {
        #[syntax(",label")]
        pub id: i64,
    }
}

crate::record! {
    pub struct OptionalSquash {
        #[syntax(",squash,optional")]
        pub leaf: Leaf,
    }
}

crate::record! {
    pub struct SquashScalar {
        #[syntax(",squash")]
        pub value: String,
    }
}

crate::record! {
    pub struct ScalarEnum {
        #[syntax("step,enum")]
        pub steps: Vec<String>,
    }
}

#[test]
#[should_panic(expected = "annotated field must be pub")]
fn test_private_annotated_field_panics() {
    tag_info::<Private>();
}

#[test]
#[should_panic(expected = "missing role")]
fn test_missing_role_panics() {
    tag_info::<MissingRole>();
}

#[test]
#[should_panic(expected = "unknown role")]
fn test_unknown_role_panics() {
    tag_info::<UnknownRole>();
}

#[test]
#[should_panic(expected = "unknown option")]
fn test_unknown_option_panics() {
    tag_info::<UnknownOption>();
}

#[test]
#[should_panic(expected = "empty name")]
fn test_empty_name_panics() {
    tag_info::<EmptyName>();
}

#[test]
#[should_panic(expected = "duplicate field name \"arg\"")]
fn test_duplicate_name_panics() {
    tag_info::<DuplicateName>();
}

#[test]
#[should_panic(expected = "duplicate field name \"deep_attr\"")]
fn test_duplicate_name_through_squash_panics() {
    tag_info::<SquashCollision>();
}

#[test]
#[should_panic(expected = "multiple label fields")]
fn test_multiple_labels_panic() {
    tag_info::<TwoLabels>();
}

#[test]
#[should_panic(expected = "must not be named")]
fn test_named_label_panics() {
    tag_info::<NamedLabel>();
}

#[test]
#[should_panic(expected = "label field must be a string")]
fn test_numeric_label_panics() {
    tag_info::<NumericLabel>();
}

#[test]
#[should_panic(expected = "cannot be optional")]
fn test_optional_squash_panics() {
    tag_info::<OptionalSquash>();
}

#[test]
#[should_panic(expected = "squash field must be a record")]
fn test_squash_of_scalar_panics() {
    tag_info::<SquashScalar>();
}

#[test]
#[should_panic(expected = "enum field must be a list of records")]
fn test_enum_of_scalars_panics() {
    tag_info::<ScalarEnum>();
}
