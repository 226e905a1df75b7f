pub mod cli;
pub mod options;
pub mod render;
pub mod template;
pub mod write;

pub use options::{KubernetesOptions, MachineOptions};
pub use render::{DashboardConfig, DEFAULT_CONFIG_FILE_NAME, NGINX_SITE_PATH};
pub use write::{write_config_files, RenderedConfigFile};

/// Loose boolean parsing for values that arrive as strings from relations
/// and the environment
pub fn to_bool(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("true")
}

#[cfg(test)]
mod tests {
    use super::to_bool;

    #[test]
    fn to_bool_is_case_insensitive() {
        assert!(to_bool("True"));
        assert!(to_bool("TRUE"));
        assert!(to_bool("true"));
        assert!(!to_bool("yes"));
        assert!(!to_bool(""));
        assert!(!to_bool("False"));
    }
}
