//! Dotted path strings resolved against a [`Model`].
//!
//! `Gene.proteins.name` starts at the root class `Gene`, follows the
//! `proteins` collection to `Protein` and ends on the `name` attribute.
//! Subclass casts (`Gene.proteins` ISA `Enzyme`) are supplied by the query
//! and change the class a node resolves to.

use std::collections::HashMap;
use std::fmt;

use crate::error::{Result, TemplateError};
use crate::model::{Field, IDENTIFIER, Model};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Path {
    path: String,
    segments: Vec<String>,
    // class of every class node, root first
    classes: Vec<String>,
    ends_with_attribute: bool,
}

impl Path {
    pub fn resolve(
        model: &Model,
        path: &str,
        subclasses: &HashMap<String, String>,
    ) -> Result<Self> {
        let segments: Vec<String> = path.split('.').map(str::to_string).collect();
        if let Some(bad) = segments.iter().find(|s| !IDENTIFIER.is_match(s)) {
            return Err(TemplateError::path(
                path,
                format!("'{}' is not a valid path segment", bad),
            ));
        }
        let root = &segments[0];
        if model.class(root).is_none() {
            return Err(TemplateError::path(
                path,
                format!("class {} is not in model {}", root, model.name()),
            ));
        }
        let mut current = cast(model, path, root, root, subclasses)?;
        let mut classes = vec![current.clone()];
        let mut ends_with_attribute = false;
        for (i, segment) in segments.iter().enumerate().skip(1) {
            if ends_with_attribute {
                return Err(TemplateError::path(
                    path,
                    format!("attribute {} cannot have fields", segments[i - 1]),
                ));
            }
            match model.field(&current, segment) {
                None => {
                    return Err(TemplateError::path(
                        path,
                        format!("class {} has no field {}", current, segment),
                    ));
                }
                Some(Field::Attribute) => ends_with_attribute = true,
                Some(field) => {
                    let declared = field.referenced_class().unwrap_or_default();
                    let prefix = segments[..=i].join(".");
                    current = cast(model, path, &prefix, declared, subclasses)?;
                    classes.push(current.clone());
                }
            }
        }
        Ok(Self {
            path: path.to_string(),
            segments,
            classes,
            ends_with_attribute,
        })
    }
    pub fn as_str(&self) -> &str {
        &self.path
    }
    pub fn segments(&self) -> &[String] {
        &self.segments
    }
    pub fn root_class(&self) -> &str {
        &self.classes[0]
    }
    pub fn element_classes(&self) -> &[String] {
        &self.classes
    }
    pub fn last_class(&self) -> &str {
        &self.classes[self.classes.len() - 1]
    }
    pub fn ends_with_attribute(&self) -> bool {
        self.ends_with_attribute
    }
    /// The path minus its last segment, `None` for a bare root class.
    pub fn prefix(&self) -> Option<String> {
        if self.segments.len() < 2 {
            None
        } else {
            Some(self.segments[..self.segments.len() - 1].join("."))
        }
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.path)
    }
}

/// `Gene.proteins` is an ancestor of `Gene.proteins.name` but not of `Gene.proteinsX`.
pub fn is_ancestor_path(ancestor: &str, path: &str) -> bool {
    path.len() > ancestor.len()
        && path.starts_with(ancestor)
        && path.as_bytes()[ancestor.len()] == b'.'
}

fn cast(
    model: &Model,
    path: &str,
    prefix: &str,
    declared: &str,
    subclasses: &HashMap<String, String>,
) -> Result<String> {
    match subclasses.get(prefix) {
        Some(sub) if model.is_subclass_of(sub, declared) => Ok(sub.clone()),
        Some(sub) => Err(TemplateError::path(
            path,
            format!("{} is not a subclass of {} at {}", sub, declared, prefix),
        )),
        None => Ok(declared.to_string()),
    }
}
