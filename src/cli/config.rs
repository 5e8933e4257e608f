// Project-level configuration (bumpversion.toml / .bumpversion.toml)

use anyhow::Result;
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info, warn};

/// Dockerfile used when neither the command line nor the config names one
pub const DEFAULT_DOCKERFILE: &str = "Dockerfile";

/// Root structure for bumpversion.toml / .bumpversion.toml
#[derive(Debug, Deserialize, Default)]
pub struct ProjectConfig {
    /// Optional version (must be 1 if present)
    pub version: Option<u32>,

    /// Dockerfile settings (optional)
    #[serde(default)]
    pub dockerfile: Option<DockerfileConfig>,
}

#[derive(Debug, Deserialize, Default)]
pub struct DockerfileConfig {
    /// Path of the Dockerfile, relative to the working directory
    pub path: Option<String>,
}

impl ProjectConfig {
    /// Dockerfile path from the command line, the config, or the default
    pub fn dockerfile_path(&self, cli_path: Option<&str>) -> String {
        cli_path
            .or_else(|| self.dockerfile.as_ref().and_then(|d| d.path.as_deref()))
            .unwrap_or(DEFAULT_DOCKERFILE)
            .to_string()
    }
}

/// Load project configuration from bumpversion.toml or .bumpversion.toml
///
/// Searches for bumpversion.toml first, then .bumpversion.toml in `dir`.
/// Returns Ok(None) if no config file is found.
/// Returns Err if the file exists but cannot be read or parsed, or if its
/// version is unsupported.
pub fn load_project_config(dir: &Path) -> Result<Option<ProjectConfig>> {
    let plain = dir.join("bumpversion.toml");
    let dotted = dir.join(".bumpversion.toml");

    if plain.exists() && dotted.exists() {
        warn!("Both bumpversion.toml and .bumpversion.toml found. Using bumpversion.toml.");
    }

    let config_path = if plain.exists() {
        plain
    } else if dotted.exists() {
        dotted
    } else {
        return Ok(None);
    };

    info!("Loading project config from {}", config_path.display());
    let content = std::fs::read_to_string(&config_path)?;

    // Deserialize and collect any unused fields
    let mut unused_fields = Vec::new();
    let deserializer = toml::Deserializer::new(&content);
    let config: ProjectConfig = serde_ignored::deserialize(deserializer, |path| {
        unused_fields.push(path.to_string());
    })?;

    for field in &unused_fields {
        warn!(
            "Unknown configuration field in {}: {}",
            config_path.display(),
            field
        );
    }

    if let Some(version) = config.version {
        if version != 1 {
            anyhow::bail!(
                "Unsupported bumpversion.toml version: {}. This CLI supports version 1.",
                version
            );
        }
    } else {
        debug!("No version specified in bumpversion.toml, using latest");
    }

    Ok(Some(config))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_config_with_unused_fields() {
        let temp_dir = tempfile::tempdir().unwrap();
        std::fs::write(
            temp_dir.path().join("bumpversion.toml"),
            r#"
version = 1

[dockerfile]
path = "docker/Dockerfile.prod"

# Unknown fields that should trigger warnings
unknown_field = "test"

[unknown_section]
foo = "bar"
"#,
        )
        .unwrap();

        let config = load_project_config(temp_dir.path())
            .expect("Config should load despite unknown fields")
            .expect("Config should be present");

        assert_eq!(config.version, Some(1));
        assert_eq!(config.dockerfile_path(None), "docker/Dockerfile.prod");
    }

    #[test]
    fn test_load_dotted_config() {
        let temp_dir = tempfile::tempdir().unwrap();
        std::fs::write(
            temp_dir.path().join(".bumpversion.toml"),
            "[dockerfile]\npath = \"Containerfile\"\n",
        )
        .unwrap();

        let config = load_project_config(temp_dir.path()).unwrap().unwrap();
        assert_eq!(config.version, None);
        assert_eq!(config.dockerfile_path(None), "Containerfile");
    }

    #[test]
    fn test_plain_config_takes_precedence() {
        let temp_dir = tempfile::tempdir().unwrap();
        std::fs::write(
            temp_dir.path().join("bumpversion.toml"),
            "[dockerfile]\npath = \"plain\"\n",
        )
        .unwrap();
        std::fs::write(
            temp_dir.path().join(".bumpversion.toml"),
            "[dockerfile]\npath = \"dotted\"\n",
        )
        .unwrap();

        let config = load_project_config(temp_dir.path()).unwrap().unwrap();
        assert_eq!(config.dockerfile_path(None), "plain");
    }

    #[test]
    fn test_missing_config() {
        let temp_dir = tempfile::tempdir().unwrap();
        assert!(load_project_config(temp_dir.path()).unwrap().is_none());
    }

    #[test]
    fn test_unsupported_version() {
        let temp_dir = tempfile::tempdir().unwrap();
        std::fs::write(temp_dir.path().join("bumpversion.toml"), "version = 2\n").unwrap();

        let err = load_project_config(temp_dir.path()).unwrap_err();
        assert!(err.to_string().contains("Unsupported bumpversion.toml version: 2"));
    }

    #[test]
    fn test_dockerfile_path_precedence() {
        let config = ProjectConfig {
            version: Some(1),
            dockerfile: Some(DockerfileConfig {
                path: Some("from-config".to_string()),
            }),
        };
        assert_eq!(config.dockerfile_path(Some("from-cli")), "from-cli");
        assert_eq!(config.dockerfile_path(None), "from-config");
        assert_eq!(ProjectConfig::default().dockerfile_path(None), DEFAULT_DOCKERFILE);
    }
}
