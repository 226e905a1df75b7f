//! Renders the dashboard's `config.js` and the nginx site that serves it.

use crate::template::{
    build_template_registry, render_template, CONFIG_JS_TEMPLATE, NGINX_TEMPLATE,
};
use crate::write::RenderedConfigFile;
use charm_error::CharmError;
use handlebars::Handlebars;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const DEFAULT_CONFIG_FILE_NAME: &str = "config.js";
pub const DEFAULT_DASHBOARD_ROOT: &str = "/srv";
pub const DEFAULT_PORT: u16 = 8080;
pub const NGINX_SITE_PATH: &str = "/etc/nginx/sites-available/default";
const BASE_APP_URL: &str = "/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardConfig {
    pub controller_url: String,
    pub identity_provider_url: Option<String>,
    pub is_juju: bool,
    pub analytics_enabled: bool,
    pub dashboard_root: PathBuf,
    pub port: u16,
    /// The dashboard talks to the controller directly instead of through
    /// the nginx `/api` proxy
    pub has_external_controller_url: bool,
    pub config_file_name: Option<String>,
    pub dns_name: Option<String>,
    /// Directory holding `config.js.hbs` and `nginx.conf.hbs`; the built-in
    /// templates are used when unset
    pub template_dir: Option<PathBuf>,
}

impl DashboardConfig {
    pub fn new(controller_url: &str) -> Self {
        Self {
            controller_url: controller_url.to_string(),
            identity_provider_url: None,
            is_juju: true,
            analytics_enabled: true,
            dashboard_root: PathBuf::from(DEFAULT_DASHBOARD_ROOT),
            port: DEFAULT_PORT,
            has_external_controller_url: false,
            config_file_name: None,
            dns_name: None,
            template_dir: None,
        }
    }

    pub fn controller_api_endpoint(&self) -> String {
        let base = if self.is_juju && !self.has_external_controller_url {
            ""
        } else {
            self.controller_url.as_str()
        };
        format!("{}/api", base)
    }

    /// Controller address as nginx `proxy_pass` wants it
    pub fn controller_ws_api(&self) -> String {
        let url = self.controller_url.replace("wss://", "https://");
        if url.starts_with("https://") {
            url
        } else {
            format!("https://{}", url)
        }
    }

    pub fn config_path(&self) -> PathBuf {
        self.dashboard_root.join(
            self.config_file_name
                .as_deref()
                .unwrap_or(DEFAULT_CONFIG_FILE_NAME),
        )
    }

    fn config_js_context(&self) -> ConfigJsContext<'_> {
        ConfigJsContext {
            controller_api_endpoint: self.controller_api_endpoint(),
            base_app_url: BASE_APP_URL,
            identity_provider_url: self.identity_provider_url.as_deref().unwrap_or_default(),
            is_juju: self.is_juju,
            analytics_enabled: self.analytics_enabled,
        }
    }

    fn nginx_context(&self) -> NginxContext<'_> {
        NginxContext {
            port: self.port,
            server_name: self.dns_name.as_deref().unwrap_or_default(),
            dashboard_root: self.dashboard_root.display().to_string(),
            is_juju: self.is_juju,
            controller_ws_api: self.controller_ws_api(),
        }
    }

    pub fn registry(&self) -> Result<Handlebars<'static>, CharmError> {
        build_template_registry(self.template_dir.as_deref())
    }

    pub fn render_config_js(&self, registry: &Handlebars<'_>) -> Result<String, CharmError> {
        render_template(registry, CONFIG_JS_TEMPLATE, &self.config_js_context())
    }

    pub fn render_nginx(&self, registry: &Handlebars<'_>) -> Result<String, CharmError> {
        render_template(registry, NGINX_TEMPLATE, &self.nginx_context())
    }

    /// Both artifacts, config.js first
    pub fn generate(&self) -> Result<(String, String), CharmError> {
        debug!("rendering dashboard config for {}", self.controller_url);
        let registry = self.registry()?;
        Ok((
            self.render_config_js(&registry)?,
            self.render_nginx(&registry)?,
        ))
    }

    /// The files to write: config.js under the dashboard root and the nginx
    /// site at `nginx_path`, each only when requested
    pub fn rendered_files(
        &self,
        nginx_path: &Path,
        write_config_js: bool,
        write_nginx: bool,
    ) -> Result<Vec<RenderedConfigFile>, CharmError> {
        let (config_js, nginx) = self.generate()?;
        let mut files = Vec::new();
        if write_config_js {
            files.push(RenderedConfigFile::new(self.config_path(), config_js));
        }
        if write_nginx {
            files.push(RenderedConfigFile::new(nginx_path, nginx));
        }
        Ok(files)
    }
}

#[derive(Debug, Serialize)]
struct ConfigJsContext<'a> {
    controller_api_endpoint: String,
    base_app_url: &'a str,
    identity_provider_url: &'a str,
    is_juju: bool,
    analytics_enabled: bool,
}

#[derive(Debug, Serialize)]
struct NginxContext<'a> {
    port: u16,
    /// Empty when no DNS name is configured
    server_name: &'a str,
    dashboard_root: String,
    is_juju: bool,
    controller_ws_api: String,
}
