//! The public shape of a template.
//!
//! A [`TemplateView`] is a lock-free, by-value snapshot of everything a
//! template exposes: labels, view, ordering, and each constraint together
//! with its overlay metadata. JSON and XML are both rendered from it.

use serde::Serialize;

use crate::constraint::{ConstraintValue, PathConstraint};
use crate::error::Result;
use crate::overlay::SwitchOffAbility;
use crate::query::OrderElement;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintView {
    pub code: Option<String>,
    pub constraint: PathConstraint,
    pub editable: bool,
    pub description: Option<String>,
    pub switch_off_ability: SwitchOffAbility,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateView {
    pub name: String,
    pub title: String,
    pub comment: Option<String>,
    pub description: Option<String>,
    pub model: String,
    pub view: Vec<String>,
    pub order_by: Vec<OrderElement>,
    /// In query order.
    pub constraints: Vec<ConstraintView>,
    /// Indexes into `constraints`, in editable order.
    pub editable_order: Vec<usize>,
}

impl TemplateView {
    pub fn editable_constraints(&self) -> impl Iterator<Item = &ConstraintView> {
        self.editable_order
            .iter()
            .filter_map(|index| self.constraints.get(*index))
    }

    pub fn to_json(&self) -> Result<String> {
        let json = TemplateJson {
            name: &self.name,
            title: &self.title,
            description: self.description.as_deref(),
            comment: self.comment.as_deref(),
            view: &self.view,
            constraints: self
                .editable_constraints()
                .map(|view| ConstraintJson {
                    path: view.constraint.path(),
                    op: view.constraint.op().as_str(),
                    value: view.constraint.value(),
                    code: view.code.as_deref(),
                    extra_value: view.constraint.extra_value(),
                })
                .collect(),
        };
        Ok(serde_json::to_string(&json)?)
    }
}

#[derive(Serialize)]
struct TemplateJson<'a> {
    name: &'a str,
    title: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    comment: Option<&'a str>,
    view: &'a [String],
    constraints: Vec<ConstraintJson<'a>>,
}

#[derive(Serialize)]
struct ConstraintJson<'a> {
    path: &'a str,
    op: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<ConstraintValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<&'a str>,
    #[serde(rename = "extraValue", skip_serializing_if = "Option::is_none")]
    extra_value: Option<&'a str>,
}
