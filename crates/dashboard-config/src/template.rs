use charm_error::CharmError;
use handlebars::Handlebars;
use serde::Serialize;
use std::path::Path;
use tracing::debug;

pub const CONFIG_JS_TEMPLATE: &str = "config.js";
pub const NGINX_TEMPLATE: &str = "nginx.conf";
const TEMPLATE_EXTENSION: &str = "hbs";

const BUILTIN_TEMPLATES: [(&str, &str); 2] = [
    (CONFIG_JS_TEMPLATE, include_str!("../templates/config.js.hbs")),
    (NGINX_TEMPLATE, include_str!("../templates/nginx.conf.hbs")),
];

/// Build the template registry from the templates shipped with the crate,
/// or from `<template_dir>/<name>.hbs` when a directory is given
pub fn build_template_registry(
    template_dir: Option<&Path>,
) -> Result<Handlebars<'static>, CharmError> {
    let mut registry = Handlebars::new();
    // Strict mode fails on a key the template uses but the context lacks
    registry.set_strict_mode(true);
    registry.register_escape_fn(handlebars::no_escape);

    for (name, builtin) in BUILTIN_TEMPLATES {
        match template_dir {
            Some(dir) => {
                let path = dir.join(format!("{}.{}", name, TEMPLATE_EXTENSION));
                debug!("Registering {} at path '{}'", name, path.display());
                registry.register_template_file(name, &path).map_err(|e| {
                    CharmError::TemplateError(format!("{}: {}", path.display(), e))
                })?;
            }
            None => {
                registry
                    .register_template_string(name, builtin)
                    .map_err(|e| CharmError::TemplateError(format!("{}: {}", name, e)))?;
            }
        }
    }

    Ok(registry)
}

pub fn render_template<T: Serialize>(
    registry: &Handlebars<'_>,
    name: &str,
    data: &T,
) -> Result<String, CharmError> {
    registry
        .render(name, data)
        .map_err(|e| CharmError::TemplateError(format!("{}: {}", name, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[derive(Serialize)]
    struct Greeting {
        name: &'static str,
    }

    #[test]
    fn builtin_templates_parse() {
        let registry = build_template_registry(None).unwrap();
        assert!(registry.has_template(CONFIG_JS_TEMPLATE));
        assert!(registry.has_template(NGINX_TEMPLATE));
    }

    #[test]
    fn templates_load_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("config.js.hbs"), "hello {{name}}").unwrap();
        fs::write(dir.path().join("nginx.conf.hbs"), "server {{name}};").unwrap();

        let registry = build_template_registry(Some(dir.path())).unwrap();
        let greeting = Greeting { name: "dashboard" };
        assert_eq!(
            render_template(&registry, CONFIG_JS_TEMPLATE, &greeting).unwrap(),
            "hello dashboard"
        );
        assert_eq!(
            render_template(&registry, NGINX_TEMPLATE, &greeting).unwrap(),
            "server dashboard;"
        );
    }

    #[test]
    fn missing_template_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("config.js.hbs"), "{{name}}").unwrap();

        let err = build_template_registry(Some(dir.path())).unwrap_err();
        assert!(matches!(
            err,
            CharmError::TemplateError(ref msg) if msg.contains("nginx.conf.hbs")
        ));
    }

    #[test]
    fn strict_mode_rejects_unknown_keys() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("config.js.hbs"), "{{missing}}").unwrap();
        fs::write(dir.path().join("nginx.conf.hbs"), "{{name}}").unwrap();

        let registry = build_template_registry(Some(dir.path())).unwrap();
        let err = render_template(&registry, CONFIG_JS_TEMPLATE, &Greeting { name: "x" })
            .unwrap_err();
        assert!(matches!(err, CharmError::TemplateError(_)));
    }

    #[test]
    fn values_are_not_html_escaped() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("config.js.hbs"), "{{name}}").unwrap();
        fs::write(dir.path().join("nginx.conf.hbs"), "{{name}}").unwrap();

        let registry = build_template_registry(Some(dir.path())).unwrap();
        let rendered =
            render_template(&registry, NGINX_TEMPLATE, &Greeting { name: "a&b=\"c\"" }).unwrap();
        assert_eq!(rendered, "a&b=\"c\"");
    }
}
