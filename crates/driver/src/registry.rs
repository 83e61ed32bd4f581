use std::collections::HashMap;

use cosim_core::{EngineVariable, HandleInfo, Unit};

use crate::Error;

/// Direction of data flow for a binding, seen from the driver's caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Causality {
    /// Read-only; the engine computes the value.
    Output,

    /// Writable; the caller supplies the value.
    Input,
}

/// Whether a binding has been tied to an engine handle yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Declared,
    Resolved(HandleInfo),
}

/// Associates an external variable name with engine data.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableBinding {
    name: String,
    variable: EngineVariable,
    causality: Causality,
    unit: Option<Unit>,
    resolution: Resolution,
}

impl VariableBinding {
    /// Creates an unresolved binding.
    ///
    /// A binding without a unit reports values in whatever unit the engine
    /// uses for the variable.
    #[must_use]
    pub fn new(
        name: String,
        variable: EngineVariable,
        causality: Causality,
        unit: Option<Unit>,
    ) -> Self {
        Self {
            name,
            variable,
            causality,
            unit,
            resolution: Resolution::Declared,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn variable(&self) -> &EngineVariable {
        &self.variable
    }

    #[must_use]
    pub fn causality(&self) -> Causality {
        self.causality
    }

    #[must_use]
    pub fn unit(&self) -> Option<Unit> {
        self.unit
    }

    #[must_use]
    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    /// Ties the binding to an engine handle.
    ///
    /// Resolution is one-way; a resolved binding keeps its handle for the
    /// rest of the run.
    pub(crate) fn resolve(&mut self, info: HandleInfo) {
        if self.resolution == Resolution::Declared {
            self.resolution = Resolution::Resolved(info);
        }
    }
}

/// The set of bindings exposed by one instance, keyed by external name.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    bindings: Vec<VariableBinding>,
    index: HashMap<String, usize>,
}

impl Registry {
    /// Builds a registry from bindings, preserving their order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateBinding`] if two bindings share a name.
    pub fn from_bindings(
        bindings: impl IntoIterator<Item = VariableBinding>,
    ) -> Result<Self, Error> {
        let mut registry = Self::default();
        for binding in bindings {
            registry.register(binding)?;
        }
        Ok(registry)
    }

    /// Adds a binding.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateBinding`] if the name is already registered.
    pub fn register(&mut self, binding: VariableBinding) -> Result<(), Error> {
        if self.index.contains_key(&binding.name) {
            return Err(Error::DuplicateBinding(binding.name));
        }
        self.index.insert(binding.name.clone(), self.bindings.len());
        self.bindings.push(binding);
        Ok(())
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&VariableBinding> {
        self.index.get(name).map(|&i| &self.bindings[i])
    }

    /// Returns the position of a binding in declaration order.
    #[must_use]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Returns the binding at a position in declaration order.
    #[must_use]
    pub fn get_index(&self, index: usize) -> Option<&VariableBinding> {
        self.bindings.get(index)
    }

    pub(crate) fn get_mut(&mut self, name: &str) -> Option<&mut VariableBinding> {
        self.index.get(name).map(|&i| &mut self.bindings[i])
    }

    /// Iterates over bindings in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &VariableBinding> {
        self.bindings.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use cosim_core::Handle;

    fn schedule(name: &str) -> VariableBinding {
        VariableBinding::new(
            name.into(),
            EngineVariable::Schedule {
                name: "Lighting".into(),
            },
            Causality::Input,
            Some(Unit::One),
        )
    }

    #[test]
    fn rejects_duplicate_names() {
        let err = Registry::from_bindings([schedule("A"), schedule("B"), schedule("A")]).unwrap_err();
        assert!(matches!(err, Error::DuplicateBinding(name) if name == "A"));
    }

    #[test]
    fn keeps_declaration_order() {
        let registry = Registry::from_bindings([schedule("B"), schedule("A")]).unwrap();
        let names: Vec<_> = registry.iter().map(VariableBinding::name).collect();
        assert_eq!(names, ["B", "A"]);
        assert_eq!(registry.len(), 2);
        assert!(registry.get("C").is_none());
    }

    #[test]
    fn indexes_follow_declaration_order() {
        let registry = Registry::from_bindings([schedule("B"), schedule("A")]).unwrap();
        assert_eq!(registry.index_of("A"), Some(1));
        assert_eq!(registry.get_index(0).map(VariableBinding::name), Some("B"));
        assert_eq!(registry.index_of("C"), None);
        assert!(registry.get_index(2).is_none());
    }

    #[test]
    fn resolution_is_one_way() {
        let mut registry = Registry::from_bindings([schedule("A")]).unwrap();
        let first = HandleInfo {
            handle: Handle(3),
            unit: Unit::One,
        };
        let second = HandleInfo {
            handle: Handle(7),
            unit: Unit::Percent,
        };

        let binding = registry.get_mut("A").unwrap();
        assert_eq!(binding.resolution(), Resolution::Declared);
        binding.resolve(first);
        binding.resolve(second);
        assert_eq!(registry.get("A").unwrap().resolution(), Resolution::Resolved(first));
    }
}
