use crate::engine::{InitRequest, RuntimeError};
use lumen_render::RendererOptions;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// File form of a session init request. Every field is optional in YAML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub name: String,
    pub scene: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub antialias: bool,
    pub alpha: bool,
    pub use_default_rendering: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            name: "main".into(),
            scene: "MainScene".into(),
            width: None,
            height: None,
            antialias: true,
            alpha: false,
            use_default_rendering: true,
        }
    }
}

impl SessionConfig {
    pub fn from_yaml(text: &str) -> Result<Self, RuntimeError> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self, RuntimeError> {
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_yaml(&text)?;
        tracing::debug!(path = %path.display(), scene = %config.scene, "loaded session config");
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String, RuntimeError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Build the init request, binding it to `surface`.
    pub fn into_request<S>(self, surface: Option<S>) -> InitRequest<S> {
        InitRequest {
            name: self.name,
            options: RendererOptions {
                surface,
                antialias: self.antialias,
                alpha: self.alpha,
            },
            scene_name: self.scene,
            width: self.width,
            height: self.height,
            use_default_rendering: self.use_default_rendering,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_yaml_yields_defaults() {
        let config = SessionConfig::from_yaml("{}").unwrap();
        assert_eq!(config, SessionConfig::default());
        assert!(config.use_default_rendering);
    }

    #[test]
    fn partial_yaml_overrides_fields() {
        let config = SessionConfig::from_yaml(
            "scene: GalaxyScene\nwidth: 640\nuse_default_rendering: false\n",
        )
        .unwrap();
        assert_eq!(config.scene, "GalaxyScene");
        assert_eq!(config.width, Some(640));
        assert_eq!(config.height, None);
        assert!(!config.use_default_rendering);
        assert!(config.antialias);
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "name: demo\nalpha: true").unwrap();
        let config = SessionConfig::load(file.path()).unwrap();
        assert_eq!(config.name, "demo");
        assert!(config.alpha);
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = SessionConfig::load(&dir.path().join("absent.yaml"));
        assert!(matches!(result, Err(RuntimeError::Io(_))));
    }

    #[test]
    fn bad_yaml_is_an_error() {
        assert!(matches!(
            SessionConfig::from_yaml("width: [1, 2"),
            Err(RuntimeError::Config(_))
        ));
    }

    #[test]
    fn request_carries_every_field() {
        let config = SessionConfig {
            width: Some(320),
            height: Some(240),
            ..SessionConfig::default()
        };
        let request = config.clone().into_request(Some(7u8));
        assert_eq!(request.name, config.name);
        assert_eq!(request.scene_name, config.scene);
        assert_eq!(request.options.surface, Some(7));
        assert!(request.options.antialias);
        assert_eq!((request.width, request.height), (Some(320), Some(240)));

        let yaml = config.to_yaml().unwrap();
        assert_eq!(SessionConfig::from_yaml(&yaml).unwrap(), config);
    }
}
