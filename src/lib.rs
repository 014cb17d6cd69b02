//! Pathtemplate – reusable, parameterized path queries.
//!
//! A *template* wraps a fixed structural query and decides which of its
//! constraints end users get to see and change:
//! * A [`query::PathQuery`] holds constraints on dotted paths such as
//!   `Gene.proteins.name`, an output view and an ordering.
//! * Every constraint is tracked by an opaque [`constraint::ConstraintId`].
//! * A [`template::Template`] marks constraints as *editable*, attaches a
//!   description to them and gives each a [`template::SwitchOffAbility`]:
//!   `Locked` (required), `On` (optional, applied) or `Off` (optional, left out).
//!
//! ## Modules
//! * [`model`] – Classes, attributes, references and collections that paths resolve against.
//! * [`path`] – Parsing and resolution of dotted paths.
//! * [`constraint`] – Constraint kinds, operators and handles.
//! * [`query`] – The base query: constraints with codes, view and ordering.
//! * [`template`] – The template itself, its locking discipline and derived templates.
//! * [`projection`] – Snapshots the JSON and XML projections are rendered from.
//! * [`binder`] – XML marshalling.
//! * [`settings`] – Configuration for the bundled binary.
//!
//! ## Keeping the metadata consistent
//! Constraints are added, replaced and removed through the template, never
//! on a query taken out of it. Removing a constraint drops all of its
//! metadata, replacing one moves the metadata to the replacement, and
//! cloning a template renumbers every constraint and carries the metadata
//! across. A replacement that is a subclass cast or a loop is no longer
//! editable but keeps its description and switch-off-ability.
//!
//! ## Running a template
//! [`template::Template::materialize`] returns a copy without the editable
//! constraints that are switched off. The template it was called on is left
//! as it was.
//!
//! ## Quick Start
//! ```
//! use std::sync::Arc;
//! use pathtemplate::constraint::{ConstraintOp, PathConstraint};
//! use pathtemplate::model::{ClassDescriptor, Model};
//! use pathtemplate::query::PathQuery;
//! use pathtemplate::template::{SwitchOffAbility, Template};
//!
//! let mut model = Model::new("genomic");
//! model.add_class(ClassDescriptor::new("Gene").attribute("symbol").attribute("length")).unwrap();
//! let mut query = PathQuery::new(Arc::new(model));
//! query.add_view("Gene.symbol").unwrap();
//! let template = Template::new("gene_by_symbol", "Gene --> Symbol", None, query);
//! let symbol = template.add_constraint(PathConstraint::equals("Gene.symbol", "zen")).unwrap();
//! let length = template
//!     .add_constraint(
//!         PathConstraint::attribute("Gene.length", ConstraintOp::GreaterThan, "1000").unwrap(),
//!     )
//!     .unwrap();
//! template.set_editable(symbol, true).unwrap();
//! template.set_editable(length, true).unwrap();
//! template.set_switch_off_ability(length, SwitchOffAbility::Off).unwrap();
//! let executable = template.materialize().unwrap();
//! assert_eq!(executable.query().unwrap().constraints().len(), 1);
//! assert_eq!(template.query().unwrap().constraints().len(), 2);
//! ```

pub mod binder;
pub mod constraint;
pub mod error;
pub mod model;
pub mod overlay;
pub mod path;
pub mod projection;
pub mod query;
pub mod settings;
pub mod template;

pub use error::{Result, TemplateError};
