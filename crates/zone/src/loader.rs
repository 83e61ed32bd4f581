use cosim_core::{EngineLoader, EngineSetup};

use crate::{ZoneEngine, ZoneError, model::Model, weather::Weather};

/// Creates [`ZoneEngine`]s from a model file and an environment file.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZoneLoader;

impl EngineLoader for ZoneLoader {
    type Engine = ZoneEngine;

    const RUNTIME: &'static str = "cosim-zone";

    fn init_runtime(&self) -> Result<(), ZoneError> {
        tracing::debug!(runtime = Self::RUNTIME, "zone runtime ready");
        Ok(())
    }

    fn load(&self, setup: &EngineSetup) -> Result<ZoneEngine, ZoneError> {
        let model = Model::from_file(&setup.model)?;
        let weather = Weather::from_file(&setup.environment)?;
        tracing::debug!(
            model = %setup.model.display(),
            environment = %setup.environment.display(),
            zones = model.zones.len(),
            "loaded zone model"
        );
        ZoneEngine::new(model, weather)
    }
}
