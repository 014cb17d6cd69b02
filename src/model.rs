//! Class model used to resolve path strings.
//!
//! A [`Model`] keeps [`ClassDescriptor`]s by name. Each descriptor declares
//! attributes, references (single valued) and collections (multi valued),
//! and may extend other classes, in which case field lookups walk the
//! superclass chain.

use std::collections::{HashMap, HashSet};
use std::hash::BuildHasherDefault;

use lazy_static::lazy_static;
use regex::Regex;
use seahash::SeaHasher;

use crate::error::{Result, TemplateError};

pub type ModelHasher = BuildHasherDefault<SeaHasher>;

lazy_static! {
    pub(crate) static ref IDENTIFIER: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap();
}

// ------------- Field -------------
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field {
    Attribute,
    Reference(String),
    Collection(String),
}
impl Field {
    // the class a reference or collection points at
    pub fn referenced_class(&self) -> Option<&str> {
        match self {
            Field::Attribute => None,
            Field::Reference(class) | Field::Collection(class) => Some(class),
        }
    }
}

// ------------- ClassDescriptor -------------
#[derive(Debug, Clone)]
pub struct ClassDescriptor {
    name: String,
    superclasses: Vec<String>,
    fields: HashMap<String, Field, ModelHasher>,
}

impl ClassDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            superclasses: Vec::new(),
            fields: HashMap::default(),
        }
    }
    pub fn attribute(mut self, name: impl Into<String>) -> Self {
        self.fields.insert(name.into(), Field::Attribute);
        self
    }
    pub fn reference(mut self, name: impl Into<String>, class: impl Into<String>) -> Self {
        self.fields.insert(name.into(), Field::Reference(class.into()));
        self
    }
    pub fn collection(mut self, name: impl Into<String>, class: impl Into<String>) -> Self {
        self.fields.insert(name.into(), Field::Collection(class.into()));
        self
    }
    pub fn extends(mut self, superclass: impl Into<String>) -> Self {
        self.superclasses.push(superclass.into());
        self
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    /// The name without any package qualification, e.g. `Gene` for `org.example.Gene`.
    pub fn unqualified_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }
    pub fn superclasses(&self) -> &[String] {
        &self.superclasses
    }
    pub fn own_field(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }
}

// ------------- Model -------------
#[derive(Debug, Clone)]
pub struct Model {
    name: String,
    classes: HashMap<String, ClassDescriptor, ModelHasher>,
}

impl Model {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            classes: HashMap::default(),
        }
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn add_class(&mut self, class: ClassDescriptor) -> Result<()> {
        if !class.name().split('.').all(|part| IDENTIFIER.is_match(part)) {
            return Err(TemplateError::InvalidArgument(format!(
                "'{}' is not a valid class name",
                class.name()
            )));
        }
        if self.classes.contains_key(class.unqualified_name()) {
            return Err(TemplateError::InvalidArgument(format!(
                "Class {} is already in model {}",
                class.name(),
                self.name
            )));
        }
        self.classes
            .insert(class.unqualified_name().to_string(), class);
        Ok(())
    }
    pub fn class(&self, name: &str) -> Option<&ClassDescriptor> {
        self.classes.get(name)
    }
    pub fn len(&self) -> usize {
        self.classes.len()
    }
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
    /// Looks up a field on a class or any of its ancestors.
    pub fn field(&self, class: &str, field: &str) -> Option<&Field> {
        let mut visited = HashSet::new();
        let mut pending = vec![class];
        while let Some(current) = pending.pop() {
            if !visited.insert(current) {
                continue;
            }
            let Some(descriptor) = self.classes.get(current) else {
                continue;
            };
            if let Some(found) = descriptor.own_field(field) {
                return Some(found);
            }
            pending.extend(descriptor.superclasses().iter().map(String::as_str));
        }
        None
    }
    /// Reflexive: every class is a subclass of itself.
    pub fn is_subclass_of(&self, sub: &str, sup: &str) -> bool {
        let mut visited = HashSet::new();
        let mut pending = vec![sub];
        while let Some(current) = pending.pop() {
            if current == sup {
                return true;
            }
            if !visited.insert(current) {
                continue;
            }
            if let Some(descriptor) = self.classes.get(current) {
                pending.extend(descriptor.superclasses().iter().map(String::as_str));
            }
        }
        false
    }
}
