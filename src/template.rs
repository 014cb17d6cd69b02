//! Templates: a [`PathQuery`] plus the metadata that exposes some of its
//! constraints to end users.
//!
//! All state of a [`Template`] sits behind one mutex, and every public
//! method holds it for its whole duration, so the editable list, the
//! descriptions and the switch-off-abilities are always observed together.
//! Operations that produce a new template (cloning, materializing, pruning)
//! copy under the source lock and then work on the private copy.
//!
//! Constraints must be added, replaced and removed through the template.
//! A query taken out with [`Template::query`] is a snapshot; changing it has
//! no effect on the template.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard};

use tracing::{debug, error};

use crate::binder::{Binder, DEFAULT_XML_VERSION, XmlBinder};
use crate::constraint::{ConstraintHasher, ConstraintId, PathConstraint};
use crate::error::{Result, TemplateError};
use crate::overlay::Overlay;
pub use crate::overlay::SwitchOffAbility;
use crate::projection::{ConstraintView, TemplateView};
use crate::query::{OrderDirection, OrderElement, PathQuery};

// ------------- TemplateState -------------
#[derive(Debug)]
struct TemplateState {
    name: String,
    title: String,
    comment: Option<String>,
    edited: bool,
    query: PathQuery,
    overlay: Overlay,
}

impl TemplateState {
    fn check(&self, id: ConstraintId) -> Result<()> {
        if self.query.contains(id) {
            Ok(())
        } else {
            Err(TemplateError::NotFound(format!(
                "Constraint {} is not in the query",
                id
            )))
        }
    }
    fn duplicate(&self) -> TemplateState {
        let (query, translation) = self.query.duplicate();
        TemplateState {
            name: self.name.clone(),
            title: self.title.clone(),
            comment: self.comment.clone(),
            edited: self.edited,
            query,
            overlay: self.overlay.translate(&translation),
        }
    }
    fn remove_constraint(&mut self, id: ConstraintId) -> Result<PathConstraint> {
        let removed = self.query.remove_constraint(id)?;
        self.overlay.on_removed(id);
        Ok(removed)
    }
    fn editable_for_path(&self, path: &str) -> Vec<ConstraintId> {
        self.overlay
            .editable()
            .iter()
            .copied()
            .filter(|id| self.query.constraint(*id).is_some_and(|c| c.path() == path))
            .collect()
    }
    fn view(&self) -> TemplateView {
        let constraints: Vec<ConstraintView> = self
            .query
            .constraints()
            .iter()
            .map(|(id, constraint)| ConstraintView {
                code: self.query.code_of(*id).map(str::to_string),
                constraint: constraint.clone(),
                editable: self.overlay.is_editable(*id),
                description: self.overlay.description(*id).map(str::to_string),
                switch_off_ability: self.overlay.switch_off_ability(*id),
            })
            .collect();
        let editable_order = self
            .overlay
            .editable()
            .iter()
            .filter_map(|id| self.query.constraints().iter().position(|(kept, _)| kept == id))
            .collect();
        TemplateView {
            name: self.name.clone(),
            title: self.title.clone(),
            comment: self.comment.clone(),
            description: self.query.description().map(str::to_string),
            model: self.query.model().name().to_string(),
            view: self.query.view().to_vec(),
            order_by: self.query.order_by().to_vec(),
            constraints,
            editable_order,
        }
    }
}

// ------------- Template -------------
#[derive(Debug)]
pub struct Template {
    state: Mutex<TemplateState>,
}

impl Template {
    pub fn new(
        name: impl Into<String>,
        title: impl Into<String>,
        comment: Option<String>,
        query: PathQuery,
    ) -> Self {
        Self::from_state(TemplateState {
            name: name.into(),
            title: title.into(),
            comment,
            edited: false,
            query,
            overlay: Overlay::default(),
        })
    }
    fn from_state(state: TemplateState) -> Self {
        Self {
            state: Mutex::new(state),
        }
    }
    fn lock(&self) -> Result<MutexGuard<'_, TemplateState>> {
        self.state
            .lock()
            .map_err(|e| TemplateError::Lock(e.to_string()))
    }

    // ------------- labels -------------
    pub fn name(&self) -> Result<String> {
        Ok(self.lock()?.name.clone())
    }
    pub fn set_name(&self, name: impl Into<String>) -> Result<()> {
        self.lock()?.name = name.into();
        Ok(())
    }
    pub fn title(&self) -> Result<String> {
        Ok(self.lock()?.title.clone())
    }
    pub fn set_title(&self, title: impl Into<String>) -> Result<()> {
        self.lock()?.title = title.into();
        Ok(())
    }
    pub fn comment(&self) -> Result<Option<String>> {
        Ok(self.lock()?.comment.clone())
    }
    pub fn set_comment(&self, comment: Option<String>) -> Result<()> {
        self.lock()?.comment = comment;
        Ok(())
    }
    pub fn description(&self) -> Result<Option<String>> {
        Ok(self.lock()?.query.description().map(str::to_string))
    }
    pub fn set_description(&self, description: Option<String>) -> Result<()> {
        self.lock()?.query.set_description(description);
        Ok(())
    }
    /// Whether this is a user's edited copy rather than a canonical template.
    pub fn is_edited(&self) -> Result<bool> {
        Ok(self.lock()?.edited)
    }
    pub fn set_edited(&self, edited: bool) -> Result<()> {
        self.lock()?.edited = edited;
        Ok(())
    }
    /// A snapshot of the wrapped query.
    pub fn query(&self) -> Result<PathQuery> {
        Ok(self.lock()?.query.clone())
    }

    // ------------- base query mutations -------------
    pub fn add_constraint(&self, constraint: PathConstraint) -> Result<ConstraintId> {
        self.lock()?.query.add_constraint(constraint)
    }
    /// Removes the constraint from the query and from every overlay entry.
    pub fn remove_constraint(&self, id: ConstraintId) -> Result<PathConstraint> {
        self.lock()?.remove_constraint(id)
    }
    /// Replaces a constraint and moves its overlay entries to the
    /// replacement. A subclass or loop replacement stops being editable.
    pub fn replace_constraint(
        &self,
        old: ConstraintId,
        replacement: PathConstraint,
    ) -> Result<ConstraintId> {
        let mut state = self.lock()?;
        let structural = replacement.is_structural();
        let new = state.query.replace_constraint(old, replacement)?;
        state.overlay.on_replaced(old, new, structural);
        Ok(new)
    }
    pub fn clear_constraints(&self) -> Result<()> {
        let mut state = self.lock()?;
        state.query.clear_constraints();
        state.overlay.clear();
        Ok(())
    }
    pub fn view(&self) -> Result<Vec<String>> {
        Ok(self.lock()?.query.view().to_vec())
    }
    pub fn add_view(&self, path: &str) -> Result<()> {
        self.lock()?.query.add_view(path)
    }
    pub fn remove_view(&self, path: &str) -> Result<()> {
        self.lock()?.query.remove_view(path)
    }
    pub fn order_by(&self) -> Result<Vec<OrderElement>> {
        Ok(self.lock()?.query.order_by().to_vec())
    }
    pub fn add_order_by(&self, path: &str, direction: OrderDirection) -> Result<()> {
        self.lock()?.query.add_order_by(path, direction)
    }
    pub fn remove_order_by(&self, path: &str) -> Result<()> {
        self.lock()?.query.remove_order_by(path)
    }

    // ------------- editable constraints -------------
    /// Appends to the editable list when switching on, removes when switching off.
    pub fn set_editable(&self, id: ConstraintId, editable: bool) -> Result<()> {
        let mut state = self.lock()?;
        state.check(id)?;
        state.overlay.set_editable(id, editable);
        debug!(%id, editable, "editable flag set");
        Ok(())
    }
    pub fn is_editable(&self, id: ConstraintId) -> Result<bool> {
        let state = self.lock()?;
        state.check(id)?;
        Ok(state.overlay.is_editable(id))
    }
    pub fn is_required(&self, id: ConstraintId) -> Result<bool> {
        Ok(self.switch_off_ability(id)?.is_required())
    }
    pub fn is_optional(&self, id: ConstraintId) -> Result<bool> {
        Ok(!self.is_required(id)?)
    }
    /// Replaces the editable list. Fails without changing anything when one
    /// of the handles is not in the query. The stored order puts constraints
    /// on ancestor paths before constraints on their descendants.
    pub fn set_editable_constraints(&self, editable: Vec<ConstraintId>) -> Result<()> {
        let mut state = self.lock()?;
        for id in &editable {
            state.check(*id)?;
        }
        let sorted = state.query.sort_by_dependency(&editable);
        state.overlay.replace_editable(sorted);
        debug!(count = state.overlay.editable().len(), "editable constraints replaced");
        Ok(())
    }
    pub fn editable_constraints(&self) -> Result<Vec<ConstraintId>> {
        Ok(self.lock()?.overlay.editable().to_vec())
    }
    /// Editable constraints on exactly `path`, in editable order.
    pub fn editable_constraints_for_path(&self, path: &str) -> Result<Vec<ConstraintId>> {
        Ok(self.lock()?.editable_for_path(path))
    }
    /// A copy meant to be edited and handed back to
    /// [`Template::set_editable_constraints`].
    pub fn modifiable_editable_constraints(&self) -> Result<Vec<ConstraintId>> {
        self.editable_constraints()
    }
    /// Distinct paths of the editable constraints, in editable order.
    pub fn editable_paths(&self) -> Result<Vec<String>> {
        let state = self.lock()?;
        let mut paths: Vec<String> = Vec::new();
        for id in state.overlay.editable() {
            if let Some(constraint) = state.query.constraint(*id) {
                if !paths.iter().any(|p| p == constraint.path()) {
                    paths.push(constraint.path().to_string());
                }
            }
        }
        Ok(paths)
    }

    // ------------- descriptions -------------
    /// `None` removes the description.
    pub fn set_constraint_description(
        &self,
        id: ConstraintId,
        description: Option<&str>,
    ) -> Result<()> {
        let mut state = self.lock()?;
        state.check(id)?;
        state.overlay.set_description(id, description.map(str::to_string));
        Ok(())
    }
    pub fn constraint_description(&self, id: ConstraintId) -> Result<Option<String>> {
        let state = self.lock()?;
        state.check(id)?;
        Ok(state.overlay.description(id).map(str::to_string))
    }
    pub fn constraint_descriptions(
        &self,
    ) -> Result<HashMap<ConstraintId, String, ConstraintHasher>> {
        Ok(self.lock()?.overlay.descriptions().clone())
    }

    // ------------- switch-off-ability -------------
    pub fn set_switch_off_ability(
        &self,
        id: ConstraintId,
        ability: SwitchOffAbility,
    ) -> Result<()> {
        let mut state = self.lock()?;
        state.check(id)?;
        state.overlay.set_switch_off_ability(id, ability);
        debug!(%id, %ability, "switch-off-ability set");
        Ok(())
    }
    /// [`SwitchOffAbility::Locked`] unless configured otherwise.
    pub fn switch_off_ability(&self, id: ConstraintId) -> Result<SwitchOffAbility> {
        let state = self.lock()?;
        state.check(id)?;
        Ok(state.overlay.switch_off_ability(id))
    }
    pub fn constraint_switch_off_abilities(
        &self,
    ) -> Result<HashMap<ConstraintId, SwitchOffAbility, ConstraintHasher>> {
        Ok(self.lock()?.overlay.switch_off_abilities().clone())
    }

    // ------------- derived templates -------------
    /// Copies the query with fresh constraint handles and carries every
    /// overlay entry over to them.
    pub fn try_clone(&self) -> Result<Template> {
        let state = self.lock()?.duplicate();
        Ok(Self::from_state(state))
    }
    /// The template to run: a copy without the editable constraints that
    /// are switched off.
    pub fn materialize(&self) -> Result<Template> {
        let mut state = self.lock()?.duplicate();
        let switched_off: Vec<ConstraintId> = state
            .overlay
            .editable()
            .iter()
            .copied()
            .filter(|id| state.overlay.switch_off_ability(*id) == SwitchOffAbility::Off)
            .collect();
        for id in &switched_off {
            state.remove_constraint(*id)?;
        }
        debug!(name = %state.name, removed = switched_off.len(), "template materialized");
        Ok(Self::from_state(state))
    }
    /// A copy without any editable constraint, which returns everything
    /// the template could return.
    pub fn clone_without_editable_constraints(&self) -> Result<Template> {
        let mut state = self.lock()?.duplicate();
        for id in state.overlay.editable().to_vec() {
            state.remove_constraint(id)?;
        }
        Ok(Self::from_state(state))
    }
    /// A copy whose view no longer shows attributes of the root class that
    /// carry no editable constraint. Such paths also leave the ordering.
    /// View paths that fail to resolve are logged and kept.
    pub fn prune_direct_attribute_view(&self) -> Result<Template> {
        let mut state = self.lock()?.duplicate();
        let root = state.query.root_class();
        for view_path in state.query.view().to_vec() {
            let resolved = root
                .as_ref()
                .map_err(|e| TemplateError::path(&view_path, e.to_string()))
                .and_then(|root| Ok((root, state.query.make_path(&view_path)?)));
            let (root, path) = match resolved {
                Ok(resolved) => resolved,
                Err(e) => {
                    error!(
                        path = %view_path,
                        error = %e,
                        "Error updating the template's view"
                    );
                    continue;
                }
            };
            if path.element_classes().len() == 1
                && path.last_class() == root
                && state.editable_for_path(&view_path).is_empty()
            {
                state.query.remove_view(&view_path)?;
                if state.query.order_by().iter().any(|o| o.path() == view_path) {
                    state.query.remove_order_by(&view_path)?;
                }
            }
        }
        Ok(Self::from_state(state))
    }

    // ------------- projections -------------
    pub fn view_snapshot(&self) -> Result<TemplateView> {
        Ok(self.lock()?.view())
    }
    pub fn to_json(&self) -> Result<String> {
        self.view_snapshot()?.to_json()
    }
    pub fn to_xml(&self, version: u32) -> Result<String> {
        self.to_xml_with(&XmlBinder, version)
    }
    pub fn to_xml_default(&self) -> Result<String> {
        self.to_xml(DEFAULT_XML_VERSION)
    }
    /// Marshals through `binder`; nothing is returned unless it succeeds.
    pub fn to_xml_with(&self, binder: &dyn Binder, version: u32) -> Result<String> {
        let view = self.view_snapshot()?;
        let mut buffer = Vec::new();
        binder.marshal(&view, &mut buffer, version)?;
        Ok(String::from_utf8(buffer)?)
    }
}

// Equal when the default XML of both sides is identical. Each side is
// marshalled under its own lock, so at most one lock is held at a time.
impl PartialEq for Template {
    fn eq(&self, other: &Self) -> bool {
        if std::ptr::eq(self, other) {
            return true;
        }
        let Ok(mine) = self.to_xml_default() else {
            return false;
        };
        match other.to_xml_default() {
            Ok(theirs) => mine == theirs,
            Err(_) => false,
        }
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.lock() {
            Ok(state) => write!(
                f,
                "Template {{ name: {}, title: {}, comment: {}, description: {}, \
                 view: [{}], constraints: {} }}",
                state.name,
                state.title,
                state.comment.as_deref().unwrap_or("-"),
                state.query.description().unwrap_or("-"),
                state.query.view().join(", "),
                state.query.constraints().len()
            ),
            Err(_) => write!(f, "Template {{ <poisoned> }}"),
        }
    }
}
