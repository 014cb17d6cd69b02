#![allow(dead_code)]

use std::sync::Arc;

use pathtemplate::constraint::PathConstraint;
use pathtemplate::model::{ClassDescriptor, Model};
use pathtemplate::query::PathQuery;
use pathtemplate::template::Template;

pub fn model() -> Arc<Model> {
    let mut model = Model::new("genomic");
    model
        .add_class(
            ClassDescriptor::new("SequenceFeature")
                .attribute("primaryIdentifier")
                .attribute("length")
                .reference("organism", "Organism"),
        )
        .unwrap();
    model
        .add_class(
            ClassDescriptor::new("Gene")
                .extends("SequenceFeature")
                .attribute("symbol")
                .attribute("name")
                .collection("proteins", "Protein")
                .collection("transcripts", "Transcript"),
        )
        .unwrap();
    model
        .add_class(ClassDescriptor::new("Transcript").extends("SequenceFeature"))
        .unwrap();
    model
        .add_class(ClassDescriptor::new("MRNA").extends("Transcript").attribute("utrLength"))
        .unwrap();
    model
        .add_class(
            ClassDescriptor::new("Protein")
                .attribute("name")
                .attribute("primaryAccession")
                .collection("genes", "Gene"),
        )
        .unwrap();
    model
        .add_class(ClassDescriptor::new("Organism").attribute("name").attribute("taxonId"))
        .unwrap();
    Arc::new(model)
}

pub fn query() -> PathQuery {
    let mut query = PathQuery::new(model());
    query
        .add_views(["Gene.symbol", "Gene.name", "Gene.organism.name"])
        .unwrap();
    query
}

pub fn template() -> Template {
    Template::new("gene_by_symbol", "Gene --> Symbol", Some("seeded".to_string()), query())
}

pub fn add(template: &Template, constraint: PathConstraint) -> pathtemplate::constraint::ConstraintId {
    template.add_constraint(constraint).unwrap()
}
