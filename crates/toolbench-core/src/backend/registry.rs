use super::openai::{OpenAiSettings, DEFAULT_BASE_URL};
use super::{ChatBackend, EchoBackend, MockBackend, OpenAiBackend};
use crate::config::{ModelConfig, Provider};
use crate::error::{BenchError, Result};
use crate::paths::safe_name;

/// Stub models registered when no models are configured
pub const DEFAULT_LOCAL_MODELS: [&str; 3] = ["local-mini", "local-standard", "local-pro"];

/// Ordered set of models under test.
///
/// Registration order is the order models are run and reported in.
pub struct ModelRegistry {
    models: Vec<Box<dyn ChatBackend>>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self { models: Vec::new() }
    }

    /// Build a registry from configuration, falling back to local stubs
    pub fn from_config(models: &[ModelConfig]) -> Result<Self> {
        if models.is_empty() {
            return Ok(Self::with_defaults());
        }

        let mut registry = Self::new();
        for model in models {
            registry.register(build_backend(model))?;
        }
        Ok(registry)
    }

    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for name in DEFAULT_LOCAL_MODELS {
            registry.models.push(Box::new(EchoBackend::new(name)));
        }
        registry
    }

    /// Add a backend unless its output files would clash with a registered one
    pub fn register(&mut self, backend: Box<dyn ChatBackend>) -> Result<()> {
        let file_name = safe_name(backend.name());
        if let Some(existing) = self
            .models
            .iter()
            .find(|m| safe_name(m.name()) == file_name)
        {
            return Err(BenchError::invalid_value(
                "model name",
                format!(
                    "{} (writes the same files as {})",
                    backend.name(),
                    existing.name()
                ),
            ));
        }
        self.models.push(backend);
        Ok(())
    }

    /// Keep only the named models, in registry order
    pub fn select(self, names: &[String]) -> Result<Self> {
        if names.is_empty() {
            return Ok(self);
        }

        for name in names {
            if !self.models.iter().any(|m| m.name() == name) {
                return Err(BenchError::not_found("model", name));
            }
        }

        Ok(Self {
            models: self
                .models
                .into_iter()
                .filter(|m| names.iter().any(|n| n == m.name()))
                .collect(),
        })
    }

    pub fn names(&self) -> Vec<&str> {
        self.models.iter().map(|m| m.name()).collect()
    }

    pub fn models(&self) -> &[Box<dyn ChatBackend>] {
        &self.models
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn build_backend(config: &ModelConfig) -> Box<dyn ChatBackend> {
    match config.provider {
        Provider::Echo => Box::new(EchoBackend::new(&config.name)),
        Provider::Mock => Box::new(MockBackend::new(&config.name)),
        Provider::OpenAi => {
            let mut settings =
                OpenAiSettings::new(config.model.clone().unwrap_or_else(|| config.name.clone()));
            settings.base_url = config
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
            if let Some(env) = &config.api_key_env {
                settings.api_key_env = env.clone();
            }
            if let Some(timeout) = config.timeout_secs {
                settings.timeout_seconds = timeout;
            }
            if let Some(rounds) = config.max_tool_rounds {
                settings.max_tool_rounds = rounds;
            }
            settings.temperature = config.temperature;
            Box::new(OpenAiBackend::new(&config.name, settings))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_local_stubs() {
        let registry = ModelRegistry::from_config(&[]).unwrap();
        assert_eq!(
            registry.names(),
            vec!["local-mini", "local-standard", "local-pro"]
        );
    }

    #[test]
    fn test_from_config_preserves_order() {
        let registry = ModelRegistry::from_config(&[
            ModelConfig::local("b", Provider::Mock),
            ModelConfig::local("a", Provider::Echo),
            ModelConfig::local("remote", Provider::OpenAi),
        ])
        .unwrap();
        assert_eq!(registry.names(), vec!["b", "a", "remote"]);
    }

    #[test]
    fn test_register_rejects_colliding_file_names() {
        let mut registry = ModelRegistry::new();
        registry
            .register(Box::new(EchoBackend::new("org/a")))
            .unwrap();
        registry
            .register(Box::new(EchoBackend::new("org-a")))
            .unwrap();

        let err = registry
            .register(Box::new(MockBackend::new("org:a")))
            .unwrap_err();
        assert!(matches!(err, BenchError::InvalidValue { .. }));
        assert!(err.to_string().contains("org/a"));
        assert_eq!(registry.names(), vec!["org/a", "org-a"]);
    }

    #[test]
    fn test_from_config_rejects_exact_duplicates() {
        let result = ModelRegistry::from_config(&[
            ModelConfig::local("same", Provider::Echo),
            ModelConfig::local("same", Provider::Mock),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_select_filters_in_registry_order() {
        let registry = ModelRegistry::with_defaults()
            .select(&["local-pro".to_string(), "local-mini".to_string()])
            .unwrap();
        assert_eq!(registry.names(), vec!["local-mini", "local-pro"]);
    }

    #[test]
    fn test_select_unknown_model() {
        let err = ModelRegistry::with_defaults()
            .select(&["nope".to_string()])
            .err()
            .unwrap();
        assert!(matches!(err, BenchError::NotFound { .. }));
    }
}
