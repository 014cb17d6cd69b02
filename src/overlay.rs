//! Metadata layered over a query's constraints.
//!
//! The overlay keeps three collections keyed by [`ConstraintId`]: the
//! ordered list of editable constraints, their descriptions, and their
//! switch-off-ability. It holds no lock of its own and never checks
//! membership in the query; [`crate::template::Template`] does both before
//! calling in.

use std::fmt;
use std::str::FromStr;

use crate::constraint::{ConstraintId, ConstraintMap, IdTranslation};
use crate::error::{Result, TemplateError};

// ------------- SwitchOffAbility -------------
/// Whether an optional constraint takes part in the executed query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SwitchOffAbility {
    /// Required, cannot be switched off.
    #[default]
    Locked,
    /// Optional and currently applied.
    On,
    /// Optional and currently left out.
    Off,
}

impl SwitchOffAbility {
    pub fn as_str(&self) -> &'static str {
        match self {
            SwitchOffAbility::Locked => "locked",
            SwitchOffAbility::On => "on",
            SwitchOffAbility::Off => "off",
        }
    }
    pub fn is_required(&self) -> bool {
        *self == SwitchOffAbility::Locked
    }
}
impl fmt::Display for SwitchOffAbility {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
impl FromStr for SwitchOffAbility {
    type Err = TemplateError;
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "locked" => Ok(SwitchOffAbility::Locked),
            "on" => Ok(SwitchOffAbility::On),
            "off" => Ok(SwitchOffAbility::Off),
            _ => Err(TemplateError::InvalidArgument(format!(
                "'{}' is not one of locked, on, off",
                s
            ))),
        }
    }
}

// ------------- Overlay -------------
#[derive(Debug, Clone, Default)]
pub(crate) struct Overlay {
    editable: Vec<ConstraintId>,
    descriptions: ConstraintMap<String>,
    switch_off: ConstraintMap<SwitchOffAbility>,
}

impl Overlay {
    pub(crate) fn editable(&self) -> &[ConstraintId] {
        &self.editable
    }
    pub(crate) fn is_editable(&self, id: ConstraintId) -> bool {
        self.editable.contains(&id)
    }
    pub(crate) fn set_editable(&mut self, id: ConstraintId, editable: bool) {
        if editable {
            if !self.editable.contains(&id) {
                self.editable.push(id);
            }
        } else {
            self.editable.retain(|kept| *kept != id);
        }
    }
    /// Replaces the editable list, dropping repeated handles.
    pub(crate) fn replace_editable(&mut self, editable: Vec<ConstraintId>) {
        let mut deduplicated = Vec::with_capacity(editable.len());
        for id in editable {
            if !deduplicated.contains(&id) {
                deduplicated.push(id);
            }
        }
        self.editable = deduplicated;
    }
    pub(crate) fn description(&self, id: ConstraintId) -> Option<&str> {
        self.descriptions.get(&id).map(String::as_str)
    }
    pub(crate) fn descriptions(&self) -> &ConstraintMap<String> {
        &self.descriptions
    }
    pub(crate) fn set_description(&mut self, id: ConstraintId, description: Option<String>) {
        match description {
            Some(description) => {
                self.descriptions.insert(id, description);
            }
            None => {
                self.descriptions.remove(&id);
            }
        }
    }
    /// Unconfigured constraints are locked.
    pub(crate) fn switch_off_ability(&self, id: ConstraintId) -> SwitchOffAbility {
        self.switch_off.get(&id).copied().unwrap_or_default()
    }
    pub(crate) fn switch_off_abilities(&self) -> &ConstraintMap<SwitchOffAbility> {
        &self.switch_off
    }
    pub(crate) fn set_switch_off_ability(&mut self, id: ConstraintId, ability: SwitchOffAbility) {
        self.switch_off.insert(id, ability);
    }

    pub(crate) fn on_removed(&mut self, id: ConstraintId) {
        self.editable.retain(|kept| *kept != id);
        self.descriptions.remove(&id);
        self.switch_off.remove(&id);
    }
    /// Moves every entry from `old` to `new`. A structural replacement
    /// loses its place in the editable list but keeps the rest.
    pub(crate) fn on_replaced(&mut self, old: ConstraintId, new: ConstraintId, structural: bool) {
        if let Some(position) = self.editable.iter().position(|kept| *kept == old) {
            if structural {
                self.editable.remove(position);
            } else {
                self.editable[position] = new;
            }
        }
        if let Some(description) = self.descriptions.remove(&old) {
            self.descriptions.insert(new, description);
        }
        if let Some(ability) = self.switch_off.remove(&old) {
            self.switch_off.insert(new, ability);
        }
    }
    pub(crate) fn clear(&mut self) {
        self.editable.clear();
        self.descriptions.clear();
        self.switch_off.clear();
    }

    /// Fresh containers over the handles of a duplicated query. Entries
    /// without a translation are dropped.
    pub(crate) fn translate(&self, translation: &IdTranslation) -> Overlay {
        Overlay {
            editable: self
                .editable
                .iter()
                .filter_map(|id| translation.get(id).copied())
                .collect(),
            descriptions: self
                .descriptions
                .iter()
                .filter_map(|(id, description)| {
                    translation.get(id).map(|new| (*new, description.clone()))
                })
                .collect(),
            switch_off: self
                .switch_off
                .iter()
                .filter_map(|(id, ability)| translation.get(id).map(|new| (*new, *ability)))
                .collect(),
        }
    }
}
