//! Builder del engine de construcción.

use super::config::ConstructConfig;
use super::core::ConstructEngine;
use super::environment::Environment;

/// Estado inicial del builder; se obtiene con `ConstructEngine::builder()`.
#[derive(Debug, Default)]
pub struct EngineBuilderInit {
    pub(crate) config: ConstructConfig,
    pub(crate) environment: Environment,
}

impl EngineBuilderInit {
    /// Reemplaza la configuración completa.
    pub fn config(mut self, config: ConstructConfig) -> Self {
        self.config = config;
        self
    }

    /// Entorno de globales contra el que se resuelven las capturas.
    pub fn environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    pub fn flatten_all_nested(mut self, on: bool) -> Self {
        self.config.flatten_all_nested = on;
        self
    }

    pub fn allow_positional_args(mut self, on: bool) -> Self {
        self.config.allow_positional_args = on;
        self
    }

    pub fn allow_plain_dict_fields(mut self, on: bool) -> Self {
        self.config.allow_plain_dict_fields = on;
        self
    }

    pub fn simplify_ids(mut self, on: bool) -> Self {
        self.config.simplify_ids = on;
        self
    }

    pub fn build(self) -> ConstructEngine {
        ConstructEngine::with_parts(self.config, self.environment)
    }
}
