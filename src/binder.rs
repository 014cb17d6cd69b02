//! XML marshalling of templates.
//!
//! [`Binder`] is the seam a template serializes through; [`XmlBinder`] is
//! the bundled implementation. Version 1 is the legacy layout, version 2
//! adds the template comment and each constraint's switch-off-ability.

use std::io::Write;

use crate::constraint::PathConstraint;
use crate::error::{Result, TemplateError};
use crate::projection::{ConstraintView, TemplateView};

pub const DEFAULT_XML_VERSION: u32 = 2;
pub const SUPPORTED_XML_VERSIONS: [u32; 2] = [1, 2];

pub trait Binder {
    fn marshal(&self, template: &TemplateView, out: &mut dyn Write, version: u32) -> Result<()>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct XmlBinder;

impl Binder for XmlBinder {
    fn marshal(&self, template: &TemplateView, out: &mut dyn Write, version: u32) -> Result<()> {
        if !SUPPORTED_XML_VERSIONS.contains(&version) {
            return Err(TemplateError::InvalidArgument(format!(
                "XML format version {} is not supported",
                version
            )));
        }
        write!(out, "<template")?;
        attribute(out, "name", &template.name)?;
        attribute(out, "title", &template.title)?;
        if version >= 2 {
            if let Some(comment) = &template.comment {
                attribute(out, "comment", comment)?;
            }
        }
        write!(out, "><query")?;
        attribute(out, "name", &template.name)?;
        attribute(out, "model", &template.model)?;
        attribute(out, "view", &template.view.join(" "))?;
        if let Some(description) = &template.description {
            attribute(out, "longDescription", description)?;
        }
        if !template.order_by.is_empty() {
            let sort_order: Vec<String> =
                template.order_by.iter().map(ToString::to_string).collect();
            attribute(out, "sortOrder", &sort_order.join(" "))?;
        }
        write!(out, ">")?;
        // editable constraints fill their slots in editable order
        let mut editable = template.editable_constraints();
        for constraint in &template.constraints {
            let written = if constraint.editable {
                editable.next().unwrap_or(constraint)
            } else {
                constraint
            };
            write_constraint(out, written, version)?;
        }
        write!(out, "</query></template>")?;
        out.flush()?;
        Ok(())
    }
}

fn write_constraint(out: &mut dyn Write, view: &ConstraintView, version: u32) -> Result<()> {
    let constraint = &view.constraint;
    write!(out, "<constraint")?;
    attribute(out, "path", constraint.path())?;
    if view.editable {
        attribute(out, "editable", "true")?;
    }
    if let Some(description) = &view.description {
        attribute(out, "description", description)?;
    }
    if version >= 2 {
        attribute(out, "switchable", view.switch_off_ability.as_str())?;
    }
    match constraint {
        PathConstraint::Subclass { type_name, .. } => attribute(out, "type", type_name)?,
        PathConstraint::Loop { loop_path, .. } => {
            attribute(out, "op", constraint.op().as_str())?;
            attribute(out, "loopPath", loop_path)?;
        }
        PathConstraint::Attribute { value, .. } | PathConstraint::Bag { bag: value, .. } => {
            attribute(out, "op", constraint.op().as_str())?;
            attribute(out, "value", value)?;
        }
        PathConstraint::Lookup { value, extra_value, .. } => {
            attribute(out, "op", constraint.op().as_str())?;
            attribute(out, "value", value)?;
            if let Some(extra_value) = extra_value {
                attribute(out, "extraValue", extra_value)?;
            }
        }
        PathConstraint::Null { .. } | PathConstraint::MultiValue { .. } => {
            attribute(out, "op", constraint.op().as_str())?;
        }
    }
    if let Some(code) = &view.code {
        attribute(out, "code", code)?;
    }
    match constraint {
        PathConstraint::MultiValue { values, .. } => {
            write!(out, ">")?;
            for value in values {
                write!(out, "<value>{}</value>", escape_xml(value))?;
            }
            write!(out, "</constraint>")?;
        }
        _ => write!(out, "/>")?,
    }
    Ok(())
}

fn attribute(out: &mut dyn Write, key: &str, value: &str) -> Result<()> {
    write!(out, " {}=\"{}\"", key, escape_xml(value))?;
    Ok(())
}

/// Escapes XML special characters in text and attribute values. Line
/// breaks and tabs become character references so attribute values survive
/// whitespace normalization.
pub fn escape_xml(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            '\n' => escaped.push_str("&#10;"),
            '\r' => escaped.push_str("&#13;"),
            '\t' => escaped.push_str("&#9;"),
            c => escaped.push(c),
        }
    }
    escaped
}
