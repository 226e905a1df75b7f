use crate::render::{
    DashboardConfig, DEFAULT_CONFIG_FILE_NAME, DEFAULT_DASHBOARD_ROOT, DEFAULT_PORT,
    NGINX_SITE_PATH,
};
use crate::to_bool;
use clap::{ArgAction, Parser};
use std::convert::Infallible;
use std::path::PathBuf;

fn parse_flag(value: &str) -> Result<bool, Infallible> {
    Ok(to_bool(value))
}

/// Render the dashboard config.js and nginx site from the environment
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[arg(long, env = "DASHBOARD_CONTROLLER_URL")]
    pub controller_url: Option<String>,

    #[arg(long, env = "DASHBOARD_CONFIG_NAME", default_value = DEFAULT_CONFIG_FILE_NAME)]
    pub config_name: String,

    /// Directory with `config.js.hbs` and `nginx.conf.hbs`
    #[arg(long, env = "DASHBOARD_CONFIG_DIR")]
    pub config_dir: Option<PathBuf>,

    #[arg(long, env = "DASHBOARD_IDENTITY_PROVIDER_URL")]
    pub identity_provider_url: Option<String>,

    #[arg(
        long,
        env = "DASHBOARD_IS_JUJU",
        default_value = "true",
        action = ArgAction::Set,
        value_parser = parse_flag
    )]
    pub is_juju: bool,

    #[arg(
        long,
        env = "DASHBOARD_ANALYTICS_ENABLED",
        default_value = "true",
        action = ArgAction::Set,
        value_parser = parse_flag
    )]
    pub analytics_enabled: bool,

    #[arg(long, env = "DASHBOARD_ROOT", default_value = DEFAULT_DASHBOARD_ROOT)]
    pub dashboard_root: PathBuf,

    #[arg(long, env = "DASHBOARD_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    #[arg(
        long,
        env = "HAS_EXTERNAL_CONTROLLER_URL",
        default_value = "false",
        action = ArgAction::Set,
        value_parser = parse_flag
    )]
    pub has_external_controller_url: bool,

    #[arg(
        long,
        env = "WRITE_CONFIG_JS",
        default_value = "true",
        action = ArgAction::Set,
        value_parser = parse_flag
    )]
    pub write_config_js: bool,

    #[arg(
        long,
        env = "WRITE_NGINX",
        default_value = "true",
        action = ArgAction::Set,
        value_parser = parse_flag
    )]
    pub write_nginx: bool,

    #[arg(long, default_value = NGINX_SITE_PATH)]
    pub nginx_path: PathBuf,
}

impl Cli {
    /// None when no controller URL was given
    pub fn dashboard_config(&self) -> Option<DashboardConfig> {
        let controller_url = self.controller_url.as_deref()?;
        Some(DashboardConfig {
            identity_provider_url: self.identity_provider_url.clone(),
            is_juju: self.is_juju,
            analytics_enabled: self.analytics_enabled,
            dashboard_root: self.dashboard_root.clone(),
            port: self.port,
            has_external_controller_url: self.has_external_controller_url,
            config_file_name: Some(self.config_name.clone()),
            template_dir: self.config_dir.clone(),
            ..DashboardConfig::new(controller_url)
        })
    }
}

pub fn parse() -> Cli {
    Cli::parse()
}
