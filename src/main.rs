//! Prints the projections of a small sample template.
//!
//! Usage: `pathtemplate [settings-file]`. Settings default to
//! `pathtemplate.toml` (if present) and can be overridden with
//! `PATHTEMPLATE_XML_VERSION` and `PATHTEMPLATE_LOG_FILTER`.

use std::sync::Arc;

use pathtemplate::constraint::{ConstraintOp, PathConstraint};
use pathtemplate::model::{ClassDescriptor, Model};
use pathtemplate::query::{OrderDirection, PathQuery};
use pathtemplate::settings::Settings;
use pathtemplate::template::{SwitchOffAbility, Template};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn sample_model() -> pathtemplate::Result<Model> {
    let mut model = Model::new("genomic");
    model.add_class(
        ClassDescriptor::new("Gene")
            .attribute("symbol")
            .attribute("name")
            .attribute("length")
            .reference("organism", "Organism")
            .collection("proteins", "Protein"),
    )?;
    model.add_class(
        ClassDescriptor::new("Protein")
            .attribute("name")
            .attribute("primaryAccession"),
    )?;
    model.add_class(ClassDescriptor::new("Organism").attribute("name").attribute("taxonId"))?;
    Ok(model)
}

fn sample_template() -> pathtemplate::Result<Template> {
    let mut query = PathQuery::new(Arc::new(sample_model()?));
    query.add_views(["Gene.symbol", "Gene.name", "Gene.proteins.primaryAccession"])?;
    query.add_order_by("Gene.symbol", OrderDirection::Asc)?;
    query.set_description(Some(
        "Proteins encoded by a gene, optionally filtered by organism".to_string(),
    ));
    let template = Template::new("gene_proteins", "Gene --> Proteins", None, query);
    let gene = template.add_constraint(PathConstraint::lookup("Gene", "eve", None))?;
    let organism = template.add_constraint(PathConstraint::equals(
        "Gene.organism.name",
        "Drosophila melanogaster",
    ))?;
    let length = template.add_constraint(PathConstraint::attribute(
        "Gene.length",
        ConstraintOp::GreaterThan,
        "1000",
    )?)?;
    template.set_editable_constraints(vec![gene, organism, length])?;
    template.set_constraint_description(gene, Some("Gene identifier or symbol"))?;
    template.set_switch_off_ability(organism, SwitchOffAbility::On)?;
    template.set_switch_off_ability(length, SwitchOffAbility::Off)?;
    Ok(template)
}

fn main() -> pathtemplate::Result<()> {
    let file = std::env::args().nth(1).unwrap_or_else(|| "pathtemplate.toml".to_string());
    let settings = Settings::load(Some(&file))?;
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.log_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();
    info!(xml_version = settings.xml_version, "settings loaded");

    let template = sample_template()?;
    println!("{}", template);
    println!("{}", template.to_json()?);
    println!("{}", template.to_xml(settings.xml_version)?);

    let executable = template.materialize()?;
    info!(
        constraints = executable.query()?.constraints().len(),
        "materialized template"
    );
    println!("{}", executable.to_xml(settings.xml_version)?);
    println!("{}", template.prune_direct_attribute_view()?.to_xml(settings.xml_version)?);
    Ok(())
}
