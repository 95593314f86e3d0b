//! Configuration management for acton-resources
//!
//! Route generation settings and controller declarations can be loaded from
//! multiple sources with clear precedence:
//!
//! 1. Environment variables (highest priority, `ACTON_RESOURCES_` prefix, `__` for nesting)
//! 2. `./acton-resources.toml` (development)
//! 3. `~/.config/acton-resources/{service}/config.toml` (user config, XDG)
//! 4. `/etc/acton-resources/{service}/config.toml` (system config)
//! 5. Hardcoded defaults (fallback)
//!
//! Environment variable format: `ACTON_RESOURCES_SECTION__FIELD_NAME`
//! - Example: `ACTON_RESOURCES_ROUTING__EMIT_PUT=true`
//!
//! # Example Configuration
//!
//! ```toml
//! [routing]
//! param_style = "trailing"   # or "prefixed", "qualified"
//! id_param = "id"
//! emit_put = false
//!
//! [discovery]
//! controllers_dir = "./controllers"
//!
//! [[controllers]]
//! name = "Posts"
//! role = "collection"
//!
//! [[controllers.children]]
//! name = "Comments"
//! role = "nested"
//! ```
//!
//! # Usage
//!
//! ```rust
//! use acton_resources::config::ResourcesConfig;
//!
//! let config = ResourcesConfig::default();
//! assert_eq!(config.routing.id_param, "id");
//! assert!(!config.routing.emit_put);
//! ```

use crate::decl::ControllerDecl;
use crate::discovery;
use crate::tree::RoutingTree;
use anyhow::Context;
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable prefix
pub const ENV_PREFIX: &str = "ACTON_RESOURCES_";

/// How path parameters of ancestors are named
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamStyle {
    /// The last parameter of a path is `:id`, earlier ones `:{resource}_id`
    ///
    /// `/posts/:id/comments`, `/posts/:post_id/comments/:id`
    #[default]
    Trailing,
    /// Ancestor parameters are always `:{resource}_id`
    ///
    /// `/posts/:post_id/comments`, `/posts/:post_id/comments/:id`
    Prefixed,
    /// Every parameter is `:{resource}_id`, including the route's own
    ///
    /// `/posts/:post_id`, `/posts/:post_id/comments/:comment_id`. Each path
    /// position keeps one name, which positional routers such as axum's
    /// require.
    Qualified,
}

/// Route generation settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteSettings {
    /// Parameter naming scheme
    pub param_style: ParamStyle,

    /// Base name of the record identifier parameter
    pub id_param: String,

    /// Emit a `PUT` route next to every `PATCH` update route
    pub emit_put: bool,
}

impl Default for RouteSettings {
    fn default() -> Self {
        Self {
            param_style: ParamStyle::Trailing,
            id_param: "id".to_string(),
            emit_put: false,
        }
    }
}

impl RouteSettings {
    /// Use the given parameter style
    #[must_use]
    pub const fn with_param_style(mut self, style: ParamStyle) -> Self {
        self.param_style = style;
        self
    }

    /// Use a different identifier parameter name
    #[must_use]
    pub fn with_id_param(mut self, id_param: impl Into<String>) -> Self {
        self.id_param = id_param.into();
        self
    }

    /// Emit `PUT` alongside `PATCH` for updates
    #[must_use]
    pub const fn with_put(mut self) -> Self {
        self.emit_put = true;
        self
    }
}

/// Directory discovery settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoverySettings {
    /// Directory of controller manifests, if discovery is enabled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub controllers_dir: Option<PathBuf>,
}

/// Complete acton-resources configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourcesConfig {
    /// Route generation settings
    #[serde(default)]
    pub routing: RouteSettings,

    /// Directory discovery settings
    #[serde(default)]
    pub discovery: DiscoverySettings,

    /// Controllers declared inline
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub controllers: Vec<ControllerDecl>,
}

impl ResourcesConfig {
    /// Load configuration for a specific service
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Default configuration cannot be serialized to TOML
    /// - Any present configuration file contains invalid TOML
    /// - Configuration values fail type conversion
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use acton_resources::config::ResourcesConfig;
    ///
    /// # fn example() -> anyhow::Result<()> {
    /// let config = ResourcesConfig::load_for_service("my-app")?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn load_for_service(service_name: &str) -> anyhow::Result<Self> {
        let mut figment = Figment::new()
            // 5. Defaults (lowest priority)
            .merge(Toml::string(&toml::to_string(&Self::default())?));

        // 4. System config: /etc/acton-resources/{service_name}/config.toml
        let system_config = PathBuf::from("/etc/acton-resources")
            .join(service_name)
            .join("config.toml");
        if system_config.exists() {
            figment = figment.merge(Toml::file(&system_config));
        }

        // 3. User config: ~/.config/acton-resources/{service_name}/config.toml
        let user_config = Self::recommended_path(service_name);
        if user_config.exists() {
            figment = figment.merge(Toml::file(&user_config));
        }

        // 2. Local config: ./acton-resources.toml
        let local_config = PathBuf::from("./acton-resources.toml");
        if local_config.exists() {
            figment = figment.merge(Toml::file(&local_config));
        }

        // 1. Environment variables (highest priority, double underscore for nesting)
        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__").lowercase(true));

        let config = figment.extract().context("Failed to load configuration")?;
        Ok(config)
    }

    /// Load configuration from a specific file
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file does not exist
    /// - The file contains invalid TOML or unknown controller fields
    /// - Configuration values fail type conversion
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use acton_resources::config::ResourcesConfig;
    ///
    /// # fn example() -> anyhow::Result<()> {
    /// let config = ResourcesConfig::load_from("./config/routes.toml")?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn load_from(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            anyhow::bail!("Configuration file not found: {}", path.display());
        }

        let config = Figment::new()
            // Start with defaults
            .merge(Toml::string(&toml::to_string(&Self::default())?))
            // Load from specified file
            .merge(Toml::file(path))
            // Environment variables override everything
            .merge(Env::prefixed(ENV_PREFIX).split("__").lowercase(true))
            .extract()
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?;

        Ok(config)
    }

    /// Get the recommended XDG config path for a service
    ///
    /// # Example
    ///
    /// ```rust
    /// use acton_resources::config::ResourcesConfig;
    ///
    /// let path = ResourcesConfig::recommended_path("my-app");
    /// // Returns: ~/.config/acton-resources/my-app/config.toml
    /// assert!(path.ends_with("config.toml"));
    /// ```
    #[must_use]
    pub fn recommended_path(service_name: &str) -> PathBuf {
        dirs::config_dir().map_or_else(
            || PathBuf::from("./config.toml"),
            |config_dir| {
                config_dir
                    .join("acton-resources")
                    .join(service_name)
                    .join("config.toml")
            },
        )
    }

    /// All declarations: inline controllers followed by discovered ones
    ///
    /// # Errors
    ///
    /// Returns an error if the configured controllers directory cannot be
    /// discovered.
    pub fn declarations(&self) -> anyhow::Result<Vec<ControllerDecl>> {
        let mut decls = self.controllers.clone();
        if let Some(dir) = &self.discovery.controllers_dir {
            let discovered = discovery::discover(dir).with_context(|| {
                format!("Failed to discover controllers in {}", dir.display())
            })?;
            decls.extend(discovered);
        }
        Ok(decls)
    }

    /// Build the routing tree described by this configuration
    ///
    /// # Errors
    ///
    /// Returns an error if discovery fails or any declaration is malformed.
    pub fn routing_tree(&self) -> anyhow::Result<RoutingTree> {
        let tree = RoutingTree::build(self.declarations()?)?;
        Ok(tree)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::role::Role;
    use figment::Jail;

    #[test]
    fn test_default_config() {
        let config = ResourcesConfig::default();
        assert_eq!(config.routing.param_style, ParamStyle::Trailing);
        assert_eq!(config.routing.id_param, "id");
        assert!(!config.routing.emit_put);
        assert!(config.discovery.controllers_dir.is_none());
        assert!(config.controllers.is_empty());
    }

    #[test]
    fn test_settings_builder() {
        let settings = RouteSettings::default()
            .with_param_style(ParamStyle::Prefixed)
            .with_id_param("uuid")
            .with_put();
        assert_eq!(settings.param_style, ParamStyle::Prefixed);
        assert_eq!(settings.id_param, "uuid");
        assert!(settings.emit_put);
    }

    #[test]
    fn test_recommended_path() {
        let path = ResourcesConfig::recommended_path("test-service");
        assert!(path.ends_with("config.toml"));
        if dirs::config_dir().is_some() {
            assert!(path.to_string_lossy().contains("acton-resources"));
            assert!(path.to_string_lossy().contains("test-service"));
        }
    }

    #[test]
    fn test_load_from_nonexistent_file() {
        let result = ResourcesConfig::load_from("/nonexistent/acton-resources.toml");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_from_toml_file() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "routes.toml",
                r#"
                [routing]
                param_style = "prefixed"

                [[controllers]]
                name = "Posts"
                role = "collection"

                [[controllers.children]]
                name = "Comments"
                role = "nested"
                "#,
            )?;

            let config = ResourcesConfig::load_from("routes.toml")
                .map_err(|e| figment::Error::from(e.to_string()))?;

            assert_eq!(config.routing.param_style, ParamStyle::Prefixed);
            assert_eq!(config.routing.id_param, "id");
            assert_eq!(config.controllers.len(), 1);
            assert_eq!(config.controllers[0].children[0].role, Role::NestedResource);
            Ok(())
        });
    }

    #[test]
    fn test_env_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file("routes.toml", "[routing]\nemit_put = false\n")?;
            jail.set_env("ACTON_RESOURCES_ROUTING__EMIT_PUT", "true");
            jail.set_env("ACTON_RESOURCES_ROUTING__ID_PARAM", "uuid");

            let config = ResourcesConfig::load_from("routes.toml")
                .map_err(|e| figment::Error::from(e.to_string()))?;

            assert!(config.routing.emit_put);
            assert_eq!(config.routing.id_param, "uuid");
            Ok(())
        });
    }

    #[test]
    fn test_load_for_service_with_local_file() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "acton-resources.toml",
                r#"
                [[controllers]]
                name = "Posts"
                role = "collection"
                "#,
            )?;

            let config = ResourcesConfig::load_for_service("jail-test-service")
                .map_err(|e| figment::Error::from(e.to_string()))?;
            assert_eq!(config.controllers.len(), 1);

            let tree = config
                .routing_tree()
                .map_err(|e| figment::Error::from(e.to_string()))?;
            assert_eq!(tree.len(), 1);
            Ok(())
        });
    }

    #[test]
    fn test_invalid_controller_rejected() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "routes.toml",
                r#"
                [[controllers]]
                name = "Posts"
                role = "gallery"
                "#,
            )?;

            assert!(ResourcesConfig::load_from("routes.toml").is_err());
            Ok(())
        });
    }
}
