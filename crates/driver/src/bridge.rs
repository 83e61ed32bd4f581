use cosim_core::{Engine, HandleInfo, Lookup, Unit};

use crate::{
    AccessError, Error,
    registry::{Causality, Registry, Resolution, VariableBinding},
};

/// Moves values between external variable names and engine handles.
///
/// Bindings resolve lazily on first access, so a variable the engine cannot
/// hand out yet simply fails that access and is retried on the next one.
/// Values cross the bridge in the binding's declared unit on the outside and
/// the engine's unit on the inside.
#[derive(Debug, Clone)]
pub(crate) struct Bridge {
    registry: Registry,
    inputs_dirty: bool,
}

impl Bridge {
    pub(crate) fn new(registry: Registry) -> Self {
        Self {
            registry,
            inputs_dirty: false,
        }
    }

    pub(crate) fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Tries to resolve every declared binding, returning how many remain
    /// unresolved.
    pub(crate) fn resolve_all<E: Engine>(&mut self, engine: &E) -> usize {
        let names: Vec<String> = self
            .registry
            .iter()
            .filter(|binding| binding.resolution() == Resolution::Declared)
            .map(|binding| binding.name().to_string())
            .collect();

        let mut unresolved = 0;
        for name in names {
            let Some(binding) = self.registry.get_mut(&name) else {
                continue;
            };
            match resolve(binding, engine) {
                Ok(_) => {}
                Err(AccessError::Missing(variable)) => {
                    tracing::warn!(%name, %variable, "engine has no such variable");
                    unresolved += 1;
                }
                Err(_) => unresolved += 1,
            }
        }
        unresolved
    }

    /// Reads a variable, converted into its declared unit.
    pub(crate) fn get_value<E: Engine>(&mut self, engine: &E, name: &str) -> Result<f64, Error> {
        let binding = self
            .registry
            .get_mut(name)
            .ok_or_else(|| Error::UnknownVariable(name.to_string()))?;

        read(binding, engine).map_err(|source| Error::EngineRead {
            name: name.to_string(),
            source,
        })
    }

    /// Writes an input variable, given in its declared unit.
    ///
    /// The write reaches the engine immediately but only takes effect at the
    /// engine's next discrete update.
    pub(crate) fn set_value<E: Engine>(
        &mut self,
        engine: &mut E,
        name: &str,
        value: f64,
    ) -> Result<(), Error> {
        let binding = self.writable(name)?;

        write(binding, engine, value).map_err(|source| Error::EngineWrite {
            name: name.to_string(),
            source,
        })?;
        self.inputs_dirty = true;
        Ok(())
    }

    /// Releases a previous write so the engine's model controls the value
    /// again.
    pub(crate) fn clear_value<E: Engine>(&mut self, engine: &mut E, name: &str) -> Result<(), Error> {
        let binding = self.writable(name)?;

        let cleared = resolve(binding, engine)
            .and_then(|info| engine.reset(info.handle).map_err(AccessError::engine));
        cleared.map_err(|source| Error::EngineWrite {
            name: name.to_string(),
            source,
        })?;
        self.inputs_dirty = true;
        Ok(())
    }

    /// Reports whether inputs were written since the last call, clearing the
    /// flag.
    pub(crate) fn take_pending_inputs(&mut self) -> bool {
        std::mem::take(&mut self.inputs_dirty)
    }

    fn writable(&mut self, name: &str) -> Result<&mut VariableBinding, Error> {
        let binding = self
            .registry
            .get_mut(name)
            .ok_or_else(|| Error::UnknownVariable(name.to_string()))?;
        match binding.causality() {
            Causality::Input => Ok(binding),
            Causality::Output => Err(Error::Causality(name.to_string())),
        }
    }
}

fn resolve<E: Engine>(binding: &mut VariableBinding, engine: &E) -> Result<HandleInfo, AccessError> {
    if let Resolution::Resolved(info) = binding.resolution() {
        return Ok(info);
    }
    match engine.lookup(binding.variable()) {
        Lookup::Found(info) => {
            tracing::debug!(
                name = binding.name(),
                handle = info.handle.0,
                unit = %info.unit,
                "resolved binding"
            );
            binding.resolve(info);
            Ok(info)
        }
        Lookup::Pending => Err(AccessError::NotReady),
        Lookup::Missing => Err(AccessError::Missing(binding.variable().clone())),
    }
}

fn read<E: Engine>(binding: &mut VariableBinding, engine: &E) -> Result<f64, AccessError> {
    let info = resolve(binding, engine)?;
    let raw = engine.read(info.handle).map_err(AccessError::engine)?;
    match binding.unit() {
        Some(declared) => Ok(Unit::convert(raw, info.unit, declared)?),
        None => Ok(raw),
    }
}

fn write<E: Engine>(
    binding: &mut VariableBinding,
    engine: &mut E,
    value: f64,
) -> Result<(), AccessError> {
    if !value.is_finite() {
        return Err(AccessError::NonFinite(value));
    }
    let info = resolve(binding, engine)?;
    let raw = match binding.unit() {
        Some(declared) => Unit::convert(value, declared, info.unit)?,
        None => value,
    };
    engine.write(info.handle, raw).map_err(AccessError::engine)
}
