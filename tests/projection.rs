mod common;

use std::io::{self, Write};

use common::{add, model};
use pathtemplate::TemplateError;
use pathtemplate::binder::{Binder, XmlBinder};
use pathtemplate::constraint::{ConstraintOp, PathConstraint};
use pathtemplate::projection::TemplateView;
use pathtemplate::query::PathQuery;
use pathtemplate::template::{SwitchOffAbility, Template};

fn simple() -> (Template, pathtemplate::constraint::ConstraintId) {
    let mut query = PathQuery::new(model());
    query.add_view("Gene.symbol").unwrap();
    let t = Template::new("t", "T", None, query);
    let a = add(&t, PathConstraint::equals("Gene.symbol", "zen"));
    t.set_editable(a, true).unwrap();
    (t, a)
}

#[test]
fn json_lists_the_editable_constraints() {
    let (t, _) = simple();
    assert_eq!(
        t.to_json().unwrap(),
        r#"{"name":"t","title":"T","view":["Gene.symbol"],"constraints":[{"path":"Gene.symbol","op":"=","value":"zen","code":"A"}]}"#
    );
}

#[test]
fn json_skips_constraints_that_are_not_editable() {
    let (t, _) = simple();
    add(&t, PathConstraint::equals("Gene.name", "hidden"));
    let json: serde_json::Value = serde_json::from_str(&t.to_json().unwrap()).unwrap();
    assert_eq!(json["constraints"].as_array().unwrap().len(), 1);
}

#[test]
fn json_escapes_values() {
    let (t, a) = simple();
    t.replace_constraint(a, PathConstraint::equals("Gene.symbol", r#"say "hi" \ bye"#))
        .unwrap();
    t.set_description(Some("a \"quoted\" \\ path".to_string())).unwrap();
    let json: serde_json::Value = serde_json::from_str(&t.to_json().unwrap()).unwrap();
    assert_eq!(json["constraints"][0]["value"], r#"say "hi" \ bye"#);
    assert_eq!(json["description"], "a \"quoted\" \\ path");
}

#[test]
fn json_carries_lists_and_extra_values() {
    let mut query = PathQuery::new(model());
    query.add_view("Gene.symbol").unwrap();
    let t = Template::new("t", "T", Some("note".to_string()), query);
    let many = add(
        &t,
        PathConstraint::multi_value(
            "Gene.symbol",
            ConstraintOp::OneOf,
            vec!["zen".to_string(), "eve".to_string()],
        )
        .unwrap(),
    );
    let lookup = add(
        &t,
        PathConstraint::lookup("Gene", "zen", Some("D. melanogaster".to_string())),
    );
    t.set_editable_constraints(vec![many, lookup]).unwrap();
    let json: serde_json::Value = serde_json::from_str(&t.to_json().unwrap()).unwrap();
    assert_eq!(json["comment"], "note");
    assert_eq!(json["constraints"][0]["op"], "ONE OF");
    assert_eq!(json["constraints"][0]["value"], serde_json::json!(["zen", "eve"]));
    assert_eq!(json["constraints"][1]["op"], "LOOKUP");
    assert_eq!(json["constraints"][1]["extraValue"], "D. melanogaster");
}

#[test]
fn xml_version_two_writes_switchable() {
    let (t, a) = simple();
    t.set_constraint_description(a, Some("Symbol")).unwrap();
    assert_eq!(
        t.to_xml_default().unwrap(),
        r#"<template name="t" title="T"><query name="t" model="genomic" view="Gene.symbol"><constraint path="Gene.symbol" editable="true" description="Symbol" switchable="locked" op="=" value="zen" code="A"/></query></template>"#
    );
}

#[test]
fn xml_version_one_leaves_out_newer_attributes() {
    let (t, a) = simple();
    t.set_comment(Some("kept for v2".to_string())).unwrap();
    t.set_switch_off_ability(a, SwitchOffAbility::On).unwrap();
    let xml = t.to_xml(1).unwrap();
    assert!(!xml.contains("switchable"));
    assert!(!xml.contains("comment"));
    let xml = t.to_xml(2).unwrap();
    assert!(xml.contains(r#"switchable="on""#));
    assert!(xml.contains(r#"comment="kept for v2""#));
}

#[test]
fn xml_escapes_markup() {
    let (t, a) = simple();
    t.set_title("A < B & \"C\"").unwrap();
    t.replace_constraint(a, PathConstraint::equals("Gene.symbol", "<zen>"))
        .unwrap();
    let xml = t.to_xml_default().unwrap();
    assert!(xml.contains(r#"title="A &lt; B &amp; &quot;C&quot;""#));
    assert!(xml.contains(r#"value="&lt;zen&gt;""#));
}

#[test]
fn xml_keeps_line_breaks_and_tabs_in_attributes() {
    let (t, a) = simple();
    t.set_constraint_description(a, Some("first\nsecond\r\tthird"))
        .unwrap();
    let xml = t.to_xml_default().unwrap();
    assert!(xml.contains(r#"description="first&#10;second&#13;&#9;third""#));
    assert_eq!(
        pathtemplate::binder::escape_xml("a\tb"),
        "a&#9;b"
    );
}

#[test]
fn xml_writes_multi_values_and_casts() {
    let mut query = PathQuery::new(model());
    query.add_view("Gene.symbol").unwrap();
    let t = Template::new("t", "T", None, query);
    add(&t, PathConstraint::subclass("Gene.transcripts", "MRNA"));
    add(
        &t,
        PathConstraint::multi_value(
            "Gene.transcripts.utrLength",
            ConstraintOp::NoneOf,
            vec!["1".to_string(), "2".to_string()],
        )
        .unwrap(),
    );
    t.add_order_by("Gene.symbol", pathtemplate::query::OrderDirection::Desc)
        .unwrap();
    let xml = t.to_xml_default().unwrap();
    assert!(xml.contains(r#"sortOrder="Gene.symbol desc""#));
    assert!(xml.contains(r#"<constraint path="Gene.transcripts" switchable="locked" type="MRNA"/>"#));
    assert!(xml.contains(r#"op="NONE OF" code="A"><value>1</value><value>2</value></constraint>"#));
}

#[test]
fn unsupported_xml_versions_are_rejected() {
    let (t, _) = simple();
    assert!(matches!(t.to_xml(0), Err(TemplateError::InvalidArgument(_))));
    assert!(matches!(t.to_xml(3), Err(TemplateError::InvalidArgument(_))));
}

struct Broken;
impl Write for Broken {
    fn write(&mut self, _: &[u8]) -> io::Result<usize> {
        Err(io::Error::other("disk full"))
    }
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

struct FailingBinder;
impl Binder for FailingBinder {
    fn marshal(
        &self,
        template: &TemplateView,
        _: &mut dyn Write,
        version: u32,
    ) -> pathtemplate::Result<()> {
        XmlBinder.marshal(template, &mut Broken, version)
    }
}

#[test]
fn binder_failures_surface_as_serialization_errors() {
    let (t, _) = simple();
    let err = t.to_xml_with(&FailingBinder, 2).unwrap_err();
    assert!(matches!(err, TemplateError::Serialization(_)));
}

#[test]
fn equality_follows_content() {
    let (first, _) = simple();
    let (second, _) = simple();
    assert!(first == second);
    let id = second.editable_constraints().unwrap()[0];
    second.set_switch_off_ability(id, SwitchOffAbility::Off).unwrap();
    assert!(first != second);
    second.set_switch_off_ability(id, SwitchOffAbility::Locked).unwrap();
    assert!(first == second);
    second.set_name("other").unwrap();
    assert!(first != second);
}

#[test]
fn editable_order_is_part_of_equality() {
    let (first, a) = simple();
    let b = add(&first, PathConstraint::equals("Gene.name", "zerknullt"));
    first.set_editable(b, true).unwrap();
    let second = first.try_clone().unwrap();
    assert!(first == second);
    let ids = second.editable_constraints().unwrap();
    second.set_editable_constraints(vec![ids[1], ids[0]]).unwrap();
    assert!(first != second);
    assert_eq!(first.editable_constraints().unwrap(), vec![a, b]);
}

#[test]
fn xml_writes_editable_constraints_in_editable_order() {
    let (t, a) = simple();
    let hidden = add(&t, PathConstraint::equals("Gene.length", "100"));
    let b = add(&t, PathConstraint::equals("Gene.name", "zerknullt"));
    t.set_editable_constraints(vec![b, a]).unwrap();
    let xml = t.to_xml_default().unwrap();
    let name = xml.find(r#"path="Gene.name""#).unwrap();
    let length = xml.find(r#"path="Gene.length""#).unwrap();
    let symbol = xml.find(r#"path="Gene.symbol""#).unwrap();
    assert!(name < length && length < symbol);
    assert!(!t.is_editable(hidden).unwrap());
}

#[test]
fn editing_flag_is_not_part_of_equality() {
    let (first, _) = simple();
    let (second, _) = simple();
    second.set_edited(true).unwrap();
    assert!(first == second);
}
