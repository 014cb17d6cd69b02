//! The structural query a template wraps.
//!
//! A [`PathQuery`] owns an ordered set of constraints, each tracked by a
//! [`ConstraintId`] and (except for subclass casts) labelled with a code
//! (`A`, `B`, ..., `Z`, `AA`, ...). It also owns the output view, the
//! ordering clause and a free-text description. Paths are resolved against
//! the shared [`Model`], honouring the subclass casts currently present.
//!
//! `Clone` takes a value snapshot that keeps constraint identities, while
//! [`PathQuery::duplicate`] renumbers every constraint and reports how the
//! handles were translated.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use bimap::BiMap;
use tracing::debug;

use crate::constraint::{ConstraintId, IdTranslation, PathConstraint};
use crate::error::{Result, TemplateError};
use crate::model::Model;
use crate::path::{Path, is_ancestor_path};

// ------------- OrderElement -------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderDirection {
    Asc,
    Desc,
}
impl fmt::Display for OrderDirection {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            OrderDirection::Asc => write!(f, "asc"),
            OrderDirection::Desc => write!(f, "desc"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OrderElement {
    path: String,
    direction: OrderDirection,
}
impl OrderElement {
    pub fn new(path: impl Into<String>, direction: OrderDirection) -> Self {
        Self {
            path: path.into(),
            direction,
        }
    }
    pub fn path(&self) -> &str {
        &self.path
    }
    pub fn direction(&self) -> OrderDirection {
        self.direction
    }
}
impl fmt::Display for OrderElement {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {}", self.path, self.direction)
    }
}

// ------------- PathQuery -------------
#[derive(Debug, Clone)]
pub struct PathQuery {
    model: Arc<Model>,
    view: Vec<String>,
    order_by: Vec<OrderElement>,
    constraints: Vec<(ConstraintId, PathConstraint)>,
    codes: BiMap<ConstraintId, String>,
    description: Option<String>,
}

impl PathQuery {
    pub fn new(model: Arc<Model>) -> Self {
        Self {
            model,
            view: Vec::new(),
            order_by: Vec::new(),
            constraints: Vec::new(),
            codes: BiMap::new(),
            description: None,
        }
    }
    pub fn model(&self) -> &Model {
        &self.model
    }

    // ------------- paths -------------
    fn subclasses(&self) -> HashMap<String, String> {
        self.constraints
            .iter()
            .filter_map(|(_, constraint)| match constraint {
                PathConstraint::Subclass { path, type_name } => {
                    Some((path.clone(), type_name.clone()))
                }
                _ => None,
            })
            .collect()
    }
    pub fn make_path(&self, path: &str) -> Result<Path> {
        Path::resolve(&self.model, path, &self.subclasses())
    }
    /// The class every path of this query starts from. Only the leading
    /// segment is resolved, so the rest of the path may be broken.
    pub fn root_class(&self) -> Result<String> {
        let first = self
            .view
            .first()
            .map(String::as_str)
            .or_else(|| self.constraints.first().map(|(_, c)| c.path()))
            .or_else(|| self.order_by.first().map(OrderElement::path))
            .ok_or_else(|| {
                TemplateError::path("", "query has no view, constraints or ordering")
            })?;
        let root = first.split('.').next().unwrap_or_default();
        Ok(self.make_path(root)?.root_class().to_string())
    }

    // ------------- constraints -------------
    fn check_constraint(&self, constraint: &PathConstraint) -> Result<()> {
        constraint.validate()?;
        match constraint {
            PathConstraint::Subclass { path, type_name } => {
                // resolve without any cast already sitting on this node
                let mut subclasses = self.subclasses();
                subclasses.remove(path);
                let resolved = Path::resolve(&self.model, path, &subclasses)?;
                if resolved.ends_with_attribute() {
                    return Err(TemplateError::InvalidArgument(format!(
                        "Cannot cast attribute path {} to {}",
                        path, type_name
                    )));
                }
                let declared = match resolved.prefix() {
                    Some(_) => {
                        let classes = resolved.element_classes();
                        let parent = &classes[classes.len() - 2];
                        let field = resolved
                            .segments()
                            .last()
                            .map(String::as_str)
                            .unwrap_or_default();
                        self.model
                            .field(parent, field)
                            .and_then(|f| f.referenced_class())
                            .unwrap_or(resolved.last_class())
                            .to_string()
                    }
                    None => resolved.root_class().to_string(),
                };
                if self.model.class(type_name).is_none()
                    || !self.model.is_subclass_of(type_name, &declared)
                {
                    return Err(TemplateError::InvalidArgument(format!(
                        "{} is not a subclass of {} at {}",
                        type_name, declared, path
                    )));
                }
            }
            PathConstraint::Loop { path, loop_path, .. } => {
                self.make_path(path)?;
                self.make_path(loop_path)?;
            }
            other => {
                self.make_path(other.path())?;
            }
        }
        Ok(())
    }
    fn next_code(&self) -> String {
        (0..)
            .map(code_for_index)
            .find(|code| !self.codes.contains_right(code))
            .unwrap_or_default()
    }
    pub fn add_constraint(&mut self, constraint: PathConstraint) -> Result<ConstraintId> {
        self.check_constraint(&constraint)?;
        let id = ConstraintId::allocate();
        if !matches!(constraint, PathConstraint::Subclass { .. }) {
            let code = self.next_code();
            self.codes.insert(id, code);
        }
        debug!(%id, %constraint, "constraint added");
        self.constraints.push((id, constraint));
        Ok(id)
    }
    pub fn constraint(&self, id: ConstraintId) -> Option<&PathConstraint> {
        self.constraints
            .iter()
            .find(|(kept, _)| *kept == id)
            .map(|(_, constraint)| constraint)
    }
    pub fn contains(&self, id: ConstraintId) -> bool {
        self.constraints.iter().any(|(kept, _)| *kept == id)
    }
    /// Every constraint in insertion order.
    pub fn constraints(&self) -> &[(ConstraintId, PathConstraint)] {
        &self.constraints
    }
    pub fn code_of(&self, id: ConstraintId) -> Option<&str> {
        self.codes.get_by_left(&id).map(String::as_str)
    }
    pub fn id_for_code(&self, code: &str) -> Option<ConstraintId> {
        self.codes.get_by_right(code).copied()
    }
    fn position(&self, id: ConstraintId) -> Result<usize> {
        self.constraints
            .iter()
            .position(|(kept, _)| *kept == id)
            .ok_or_else(|| {
                TemplateError::NotFound(format!("Constraint {} is not in the query", id))
            })
    }
    pub fn remove_constraint(&mut self, id: ConstraintId) -> Result<PathConstraint> {
        let position = self.position(id)?;
        let (_, removed) = self.constraints.remove(position);
        self.codes.remove_by_left(&id);
        debug!(%id, constraint = %removed, "constraint removed");
        Ok(removed)
    }
    /// Puts `replacement` where `old` was, keeping its code unless the
    /// replacement is a subclass cast.
    pub fn replace_constraint(
        &mut self,
        old: ConstraintId,
        replacement: PathConstraint,
    ) -> Result<ConstraintId> {
        let position = self.position(old)?;
        self.check_constraint(&replacement)?;
        let id = ConstraintId::allocate();
        let code = self.codes.remove_by_left(&old).map(|(_, code)| code);
        if !matches!(replacement, PathConstraint::Subclass { .. }) {
            let code = code.unwrap_or_else(|| self.next_code());
            self.codes.insert(id, code);
        }
        debug!(%old, new = %id, constraint = %replacement, "constraint replaced");
        self.constraints[position] = (id, replacement);
        Ok(id)
    }
    pub fn clear_constraints(&mut self) {
        self.constraints.clear();
        self.codes.clear();
    }

    /// Orders `ids` so that no constraint comes before a constraint on an
    /// ancestor of its path. Otherwise the caller's order is kept.
    pub fn sort_by_dependency(&self, ids: &[ConstraintId]) -> Vec<ConstraintId> {
        let mut sorted: Vec<ConstraintId> = Vec::with_capacity(ids.len());
        for id in ids {
            // ancestry is transitive, so everything `id` depends on already
            // sits before its first dependent
            match sorted.iter().position(|placed| self.depends_on(*placed, *id)) {
                Some(position) => sorted.insert(position, *id),
                None => sorted.push(*id),
            }
        }
        sorted
    }
    fn depends_on(&self, dependent: ConstraintId, dependency: ConstraintId) -> bool {
        match (self.constraint(dependent), self.constraint(dependency)) {
            (Some(dependent), Some(dependency)) => {
                is_ancestor_path(dependency.path(), dependent.path())
            }
            _ => false,
        }
    }

    // ------------- view and ordering -------------
    pub fn view(&self) -> &[String] {
        &self.view
    }
    pub fn add_view(&mut self, path: &str) -> Result<()> {
        let resolved = self.make_path(path)?;
        if !resolved.ends_with_attribute() {
            return Err(TemplateError::path(path, "view paths must end in an attribute"));
        }
        if !self.view.iter().any(|kept| kept == path) {
            self.view.push(path.to_string());
        }
        Ok(())
    }
    pub fn add_views<'a>(&mut self, paths: impl IntoIterator<Item = &'a str>) -> Result<()> {
        for path in paths {
            self.add_view(path)?;
        }
        Ok(())
    }
    pub fn remove_view(&mut self, path: &str) -> Result<()> {
        let position = self
            .view
            .iter()
            .position(|kept| kept == path)
            .ok_or_else(|| TemplateError::NotFound(format!("Path {} is not in the view", path)))?;
        self.view.remove(position);
        Ok(())
    }
    pub fn order_by(&self) -> &[OrderElement] {
        &self.order_by
    }
    pub fn add_order_by(&mut self, path: &str, direction: OrderDirection) -> Result<()> {
        self.make_path(path)?;
        match self.order_by.iter_mut().find(|kept| kept.path() == path) {
            Some(kept) => kept.direction = direction,
            None => self.order_by.push(OrderElement::new(path, direction)),
        }
        Ok(())
    }
    pub fn remove_order_by(&mut self, path: &str) -> Result<()> {
        let position = self
            .order_by
            .iter()
            .position(|kept| kept.path() == path)
            .ok_or_else(|| {
                TemplateError::NotFound(format!("Path {} is not in the order by list", path))
            })?;
        self.order_by.remove(position);
        Ok(())
    }

    // ------------- labels -------------
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
    pub fn set_description(&mut self, description: Option<String>) {
        self.description = description;
    }

    /// Structural copy in which every constraint gets a fresh handle.
    pub fn duplicate(&self) -> (PathQuery, IdTranslation) {
        let mut translation = IdTranslation::default();
        let mut codes = BiMap::new();
        let constraints = self
            .constraints
            .iter()
            .map(|(old, constraint)| {
                let new = ConstraintId::allocate();
                translation.insert(*old, new);
                if let Some(code) = self.codes.get_by_left(old) {
                    codes.insert(new, code.clone());
                }
                (new, constraint.clone())
            })
            .collect();
        let duplicate = PathQuery {
            model: Arc::clone(&self.model),
            view: self.view.clone(),
            order_by: self.order_by.clone(),
            constraints,
            codes,
            description: self.description.clone(),
        };
        (duplicate, translation)
    }
}

/// `0 -> A`, `25 -> Z`, `26 -> AA`, `27 -> AB`, ...
fn code_for_index(index: usize) -> String {
    let mut n = index + 1;
    let mut code = Vec::new();
    while n > 0 {
        n -= 1;
        code.push(b'A' + (n % 26) as u8);
        n /= 26;
    }
    code.reverse();
    String::from_utf8(code).unwrap_or_default()
}
