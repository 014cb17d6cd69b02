mod common;

use common::{add, template};
use pathtemplate::TemplateError;
use pathtemplate::constraint::PathConstraint;

#[test]
fn set_editable_is_idempotent() {
    let t = template();
    let a = add(&t, PathConstraint::equals("Gene.symbol", "zen"));
    let b = add(&t, PathConstraint::equals("Gene.name", "zerknullt"));
    t.set_editable(b, true).unwrap();
    t.set_editable(a, true).unwrap();
    let once = t.editable_constraints().unwrap();
    t.set_editable(a, true).unwrap();
    assert_eq!(t.editable_constraints().unwrap(), once);
    assert_eq!(once, vec![b, a], "editable order follows the order of marking");
}

#[test]
fn switching_editable_off_removes_and_repeats_harmlessly() {
    let t = template();
    let a = add(&t, PathConstraint::equals("Gene.symbol", "zen"));
    t.set_editable(a, true).unwrap();
    assert!(t.is_editable(a).unwrap());
    t.set_editable(a, false).unwrap();
    t.set_editable(a, false).unwrap();
    assert!(!t.is_editable(a).unwrap());
    assert!(t.editable_constraints().unwrap().is_empty());
}

#[test]
fn unknown_constraints_are_not_found() {
    let t = template();
    let other = template();
    let foreign = add(&other, PathConstraint::equals("Gene.symbol", "zen"));
    assert!(matches!(t.set_editable(foreign, true), Err(TemplateError::NotFound(_))));
    assert!(matches!(t.is_editable(foreign), Err(TemplateError::NotFound(_))));
    assert!(matches!(t.is_required(foreign), Err(TemplateError::NotFound(_))));
    assert!(matches!(
        t.set_constraint_description(foreign, Some("nope")),
        Err(TemplateError::NotFound(_))
    ));
    assert!(matches!(t.constraint_description(foreign), Err(TemplateError::NotFound(_))));
}

#[test]
fn bulk_replacement_puts_ancestors_first() {
    let t = template();
    let nested = add(&t, PathConstraint::equals("Gene.proteins.name", "Eve"));
    let containing = add(&t, PathConstraint::lookup("Gene.proteins", "P0001", None));
    t.set_editable_constraints(vec![nested, containing]).unwrap();
    assert_eq!(t.editable_constraints().unwrap(), vec![containing, nested]);
}

#[test]
fn bulk_replacement_keeps_unrelated_order() {
    let t = template();
    let nested = add(&t, PathConstraint::equals("Gene.proteins.name", "Eve"));
    let symbol = add(&t, PathConstraint::equals("Gene.symbol", "eve"));
    let containing = add(&t, PathConstraint::lookup("Gene.proteins", "P0001", None));
    t.set_editable_constraints(vec![nested, symbol, containing]).unwrap();
    assert_eq!(t.editable_constraints().unwrap(), vec![containing, nested, symbol]);
}

#[test]
fn bulk_replacement_is_atomic() {
    let t = template();
    let a = add(&t, PathConstraint::equals("Gene.symbol", "zen"));
    let b = add(&t, PathConstraint::equals("Gene.name", "zerknullt"));
    t.set_editable(a, true).unwrap();
    let removed = add(&t, PathConstraint::equals("Gene.length", "10"));
    t.remove_constraint(removed).unwrap();
    let err = t.set_editable_constraints(vec![b, removed]).unwrap_err();
    assert!(matches!(err, TemplateError::NotFound(_)));
    assert_eq!(t.editable_constraints().unwrap(), vec![a], "nothing replaced on failure");
}

#[test]
fn bulk_replacement_drops_repeats() {
    let t = template();
    let a = add(&t, PathConstraint::equals("Gene.symbol", "zen"));
    let b = add(&t, PathConstraint::equals("Gene.name", "zerknullt"));
    t.set_editable_constraints(vec![a, b, a]).unwrap();
    assert_eq!(t.editable_constraints().unwrap(), vec![a, b]);
}

#[test]
fn snapshots_do_not_alias_the_template() {
    let t = template();
    let a = add(&t, PathConstraint::equals("Gene.symbol", "zen"));
    let b = add(&t, PathConstraint::equals("Gene.name", "zerknullt"));
    t.set_editable_constraints(vec![a, b]).unwrap();
    let mut copy = t.modifiable_editable_constraints().unwrap();
    copy.reverse();
    copy.pop();
    assert_eq!(t.editable_constraints().unwrap(), vec![a, b]);
    t.set_editable_constraints(copy).unwrap();
    assert_eq!(t.editable_constraints().unwrap(), vec![b]);
}

#[test]
fn editable_constraints_filter_by_path() {
    let t = template();
    let a = add(&t, PathConstraint::equals("Gene.symbol", "zen"));
    let b = add(&t, PathConstraint::equals("Gene.name", "zerknullt"));
    let c = add(&t, PathConstraint::equals("Gene.symbol", "eve"));
    t.set_editable_constraints(vec![a, b, c]).unwrap();
    assert_eq!(t.editable_constraints_for_path("Gene.symbol").unwrap(), vec![a, c]);
    assert!(t.editable_constraints_for_path("Gene.length").unwrap().is_empty());
    assert_eq!(t.editable_paths().unwrap(), vec!["Gene.symbol", "Gene.name"]);
}

#[test]
fn descriptions_can_be_set_and_cleared() {
    let t = template();
    let a = add(&t, PathConstraint::equals("Gene.symbol", "zen"));
    assert_eq!(t.constraint_description(a).unwrap(), None);
    t.set_constraint_description(a, Some("Gene symbol")).unwrap();
    assert_eq!(t.constraint_description(a).unwrap().as_deref(), Some("Gene symbol"));
    assert_eq!(t.constraint_descriptions().unwrap().len(), 1);
    t.set_constraint_description(a, None).unwrap();
    assert_eq!(t.constraint_description(a).unwrap(), None);
    assert!(t.constraint_descriptions().unwrap().is_empty());
}

#[test]
fn editing_metadata_leaves_other_entries_alone() {
    let t = template();
    let a = add(&t, PathConstraint::equals("Gene.symbol", "zen"));
    t.set_constraint_description(a, Some("Gene symbol")).unwrap();
    t.set_editable(a, true).unwrap();
    t.set_editable(a, false).unwrap();
    assert_eq!(t.constraint_description(a).unwrap().as_deref(), Some("Gene symbol"));
}
