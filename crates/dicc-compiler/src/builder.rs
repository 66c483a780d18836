//! In-memory store for one compilation.
//!
//! Holds service definitions and aliases in a single map keyed by id, so
//! an id is structurally either a definition or an alias, never both.
//! Parameters live in a separate map keyed by [`ParameterKey`].

use std::collections::BTreeMap;

use dicc_common::error::{DiccError, Result};
use dicc_common::types::{ParameterKey, ServiceId};

use crate::definition::ServiceDefinition;
use crate::value::Value;

/// What an id stands for.
#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    /// A buildable service.
    Definition(ServiceDefinition),
    /// A redirect to another id.
    Alias(ServiceId),
}

/// Accumulates definitions, aliases, and parameters.
///
/// Iteration follows sorted id order.
#[derive(Debug, Clone, Default)]
pub struct ContainerBuilder {
    entries: BTreeMap<ServiceId, Entry>,
    parameters: BTreeMap<ParameterKey, Value>,
}

impl ContainerBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a definition, replacing any entry (alias included) under `id`.
    pub fn set_service_definition(
        &mut self,
        id: impl Into<ServiceId>,
        definition: ServiceDefinition,
    ) -> &mut ServiceDefinition {
        let id = id.into();
        tracing::debug!(id = %id, "registering service definition");
        let slot = self
            .entries
            .entry(id)
            .or_insert_with(|| Entry::Definition(ServiceDefinition::new(Value::null())));
        store_definition(slot, definition)
    }

    /// Returns whether `id` holds a definition.
    #[must_use]
    pub fn has_service_definition(&self, id: &str) -> bool {
        matches!(self.entries.get(id), Some(Entry::Definition(_)))
    }

    /// Returns the definition stored under `id`.
    ///
    /// # Errors
    ///
    /// Returns [`DiccError::NotFound`] if `id` holds no definition.
    pub fn service_definition(&self, id: &str) -> Result<&ServiceDefinition> {
        match self.entries.get(id) {
            Some(Entry::Definition(definition)) => Ok(definition),
            _ => Err(not_found("service definition", id)),
        }
    }

    /// Returns the definition stored under `id` for modification.
    ///
    /// # Errors
    ///
    /// Returns [`DiccError::NotFound`] if `id` holds no definition.
    pub fn service_definition_mut(&mut self, id: &str) -> Result<&mut ServiceDefinition> {
        match self.entries.get_mut(id) {
            Some(Entry::Definition(definition)) => Ok(definition),
            _ => Err(not_found("service definition", id)),
        }
    }

    /// Stores an alias, replacing any entry (definition included) under `alias`.
    pub fn set_alias(&mut self, alias: impl Into<ServiceId>, target: impl Into<ServiceId>) {
        let alias = alias.into();
        let target = target.into();
        tracing::debug!(alias = %alias, target = %target, "registering alias");
        let _ = self.entries.insert(alias, Entry::Alias(target));
    }

    /// Returns whether `id` is an alias.
    #[must_use]
    pub fn has_alias(&self, id: &str) -> bool {
        matches!(self.entries.get(id), Some(Entry::Alias(_)))
    }

    /// Returns the direct target of alias `id`.
    ///
    /// # Errors
    ///
    /// Returns [`DiccError::NotFound`] if `id` is not an alias.
    pub fn alias(&self, id: &str) -> Result<&ServiceId> {
        match self.entries.get(id) {
            Some(Entry::Alias(target)) => Ok(target),
            _ => Err(not_found("alias", id)),
        }
    }

    /// Snapshot of every alias and its direct target.
    #[must_use]
    pub fn aliases(&self) -> BTreeMap<String, String> {
        self.entries
            .iter()
            .filter_map(|(id, entry)| match entry {
                Entry::Alias(target) => Some((id.to_string(), target.to_string())),
                Entry::Definition(_) => None,
            })
            .collect()
    }

    /// Aliases whose direct target is `id`.
    #[must_use]
    pub fn aliases_of_service(&self, id: &str) -> BTreeMap<String, String> {
        self.aliases()
            .into_iter()
            .filter(|(_, target)| target == id)
            .collect()
    }

    /// Follows alias chains starting at `id` to a non-alias id.
    ///
    /// Ids that are unknown, or that hold a definition, resolve to
    /// themselves.
    ///
    /// # Errors
    ///
    /// Returns [`DiccError::CyclicAlias`] if the chain revisits an id.
    pub fn resolve_alias<'a>(&'a self, id: &'a str) -> Result<&'a str> {
        let mut chain: Vec<&str> = vec![id];
        let mut current = id;
        while let Some(Entry::Alias(target)) = self.entries.get(current) {
            let next = target.as_str();
            let seen = chain.contains(&next);
            chain.push(next);
            if seen {
                return Err(DiccError::CyclicAlias {
                    chain: chain.into_iter().map(str::to_owned).collect(),
                });
            }
            current = next;
        }
        Ok(current)
    }

    /// Fails if any alias chain loops back on itself.
    ///
    /// # Errors
    ///
    /// Returns [`DiccError::CyclicAlias`] for the first looping alias in id
    /// order.
    pub fn check_aliases(&self) -> Result<()> {
        for (id, entry) in &self.entries {
            if let Entry::Alias(_) = entry {
                let _ = self.resolve_alias(id.as_str())?;
            }
        }
        Ok(())
    }

    /// Looks up a definition, following aliases.
    ///
    /// # Errors
    ///
    /// Returns [`DiccError::CyclicAlias`] for looping aliases and
    /// [`DiccError::NotFound`] if the chain ends without a definition.
    pub fn find_definition(&self, id: &str) -> Result<&ServiceDefinition> {
        let target = self.resolve_alias(id)?;
        self.service_definition(target)
    }

    /// Returns whether any entry exists under `id`.
    #[must_use]
    pub fn has(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Removes the entry under `id`.
    pub fn remove(&mut self, id: &str) -> Option<Entry> {
        self.entries.remove(id)
    }

    /// Iterates over every id and its entry.
    pub fn entries(&self) -> impl Iterator<Item = (&ServiceId, &Entry)> {
        self.entries.iter()
    }

    /// Iterates over definitions only.
    pub fn definitions(&self) -> impl Iterator<Item = (&ServiceId, &ServiceDefinition)> {
        self.entries.iter().filter_map(|(id, entry)| match entry {
            Entry::Definition(definition) => Some((id, definition)),
            Entry::Alias(_) => None,
        })
    }

    /// Every known id, definitions and aliases alike.
    #[must_use]
    pub fn service_ids(&self) -> Vec<&str> {
        self.entries.keys().map(ServiceId::as_str).collect()
    }

    /// Sets a parameter; the name is lower-cased.
    pub fn set_parameter(&mut self, name: &str, value: Value) {
        let key = ParameterKey::new(name);
        tracing::debug!(key = %key, "registering parameter");
        let _ = self.parameters.insert(key, value);
    }

    /// Sets several parameters at once.
    pub fn add_parameters<'a>(&mut self, parameters: impl IntoIterator<Item = (&'a str, Value)>) {
        for (name, value) in parameters {
            self.set_parameter(name, value);
        }
    }

    /// Returns whether a parameter exists, ignoring case.
    #[must_use]
    pub fn has_parameter(&self, name: &str) -> bool {
        self.parameters.contains_key(&ParameterKey::new(name))
    }

    /// Returns a parameter, ignoring case.
    ///
    /// # Errors
    ///
    /// Returns [`DiccError::NotFound`] if the parameter is not set.
    pub fn parameter(&self, name: &str) -> Result<&Value> {
        self.parameters
            .get(&ParameterKey::new(name))
            .ok_or_else(|| not_found("parameter", name))
    }

    /// Snapshot of every parameter.
    #[must_use]
    pub fn parameters(&self) -> &BTreeMap<ParameterKey, Value> {
        &self.parameters
    }

    /// Moves every entry and parameter of `other` into this builder.
    ///
    /// Ids and parameter keys already present are overwritten.
    pub fn merge(&mut self, other: Self) {
        tracing::debug!(
            entries = other.entries.len(),
            parameters = other.parameters.len(),
            "merging builder"
        );
        self.entries.extend(other.entries);
        self.parameters.extend(other.parameters);
    }
}

/// Turns `slot` into a definition entry holding `definition`.
fn store_definition(slot: &mut Entry, definition: ServiceDefinition) -> &mut ServiceDefinition {
    match slot {
        Entry::Definition(stored) => {
            *stored = definition;
            stored
        }
        Entry::Alias(_) => {
            *slot = Entry::Definition(ServiceDefinition::new(Value::null()));
            store_definition(slot, definition)
        }
    }
}

fn not_found(kind: &'static str, id: &str) -> DiccError {
    DiccError::NotFound {
        kind,
        id: id.to_owned(),
    }
}
