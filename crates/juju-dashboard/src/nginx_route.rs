use charm_error::CharmError;
use charm_model::{CharmEvent, EventKey, Model, RelationId};
use std::collections::BTreeMap;
use tracing::debug;

/// Options understood by the nginx ingress integrator. Unset options are
/// not published at all.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NginxRouteConfig {
    pub service_hostname: String,
    pub service_name: String,
    pub service_port: u16,
    /// Defaults to the model name
    pub service_namespace: Option<String>,
    pub additional_hostnames: Option<String>,
    pub backend_protocol: Option<String>,
    pub enable_access_log: Option<bool>,
    pub limit_rps: Option<u32>,
    pub limit_whitelist: Option<String>,
    pub max_body_size: Option<u32>,
    pub owasp_modsecurity_crs: Option<String>,
    pub owasp_modsecurity_custom_rules: Option<String>,
    pub path_routes: Option<String>,
    pub retry_errors: Option<String>,
    pub rewrite_target: Option<String>,
    pub rewrite_enabled: Option<bool>,
    pub session_cookie_max_age: Option<u32>,
    pub tls_secret_name: Option<String>,
}

impl NginxRouteConfig {
    pub fn new(service_hostname: &str, service_name: &str, service_port: u16) -> Self {
        Self {
            service_hostname: service_hostname.to_string(),
            service_name: service_name.to_string(),
            service_port,
            ..Default::default()
        }
    }

    pub fn to_relation_data(&self, model_name: &str) -> BTreeMap<String, String> {
        let mut data = BTreeMap::new();
        let mut put = |key: &str, value: Option<String>| {
            if let Some(value) = value {
                data.insert(key.to_string(), value);
            }
        };

        put("service-hostname", Some(self.service_hostname.clone()));
        put("service-name", Some(self.service_name.clone()));
        put("service-port", Some(self.service_port.to_string()));
        put(
            "service-namespace",
            Some(
                self.service_namespace
                    .clone()
                    .unwrap_or_else(|| model_name.to_string()),
            ),
        );
        put("additional-hostnames", self.additional_hostnames.clone());
        put("backend-protocol", self.backend_protocol.clone());
        put(
            "enable-access-log",
            self.enable_access_log
                .map(|enabled| if enabled { "true" } else { "false" }.to_string()),
        );
        put("limit-rps", self.limit_rps.map(|v| v.to_string()));
        put("limit-whitelist", self.limit_whitelist.clone());
        put("max-body-size", self.max_body_size.map(|v| v.to_string()));
        put("owasp-modsecurity-crs", self.owasp_modsecurity_crs.clone());
        put(
            "owasp-modsecurity-custom-rules",
            self.owasp_modsecurity_custom_rules.clone(),
        );
        put("path-routes", self.path_routes.clone());
        put("retry-errors", self.retry_errors.clone());
        put("rewrite-target", self.rewrite_target.clone());
        put(
            "rewrite-enabled",
            self.rewrite_enabled
                .map(|enabled| if enabled { "True" } else { "False" }.to_string()),
        );
        put(
            "session-cookie-max-age",
            self.session_cookie_max_age.map(|v| v.to_string()),
        );
        put("tls-secret-name", self.tls_secret_name.clone());
        data
    }
}

#[derive(Debug, Clone)]
pub struct NginxRouteRequirer {
    relation_name: String,
    config: NginxRouteConfig,
}

impl NginxRouteRequirer {
    pub fn new(relation_name: &str, config: NginxRouteConfig) -> Self {
        Self {
            relation_name: relation_name.to_string(),
            config,
        }
    }

    pub fn config(&self) -> &NginxRouteConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: NginxRouteConfig) {
        self.config = config;
    }

    pub fn event_keys(&self) -> Vec<EventKey> {
        vec![EventKey::relation_changed(&self.relation_name)]
    }

    pub fn handle(&self, model: &mut Model, event: &CharmEvent) -> Result<(), CharmError> {
        match event.relation() {
            Some(relation) if relation.endpoint == self.relation_name => self.reconcile(model),
            _ => Ok(()),
        }
    }

    /// Make every nginx-route application bag hold exactly the configured keys
    pub fn reconcile(&self, model: &mut Model) -> Result<(), CharmError> {
        if !model.is_leader() {
            return Ok(());
        }
        let desired = self.config.to_relation_data(model.name());
        let ids: Vec<RelationId> = model.relations(&self.relation_name).map(|r| r.id()).collect();

        for id in ids {
            let relation = model
                .relation_by_id_mut(id)
                .ok_or_else(|| CharmError::ShouldNeverHappen(format!("relation id {}", id)))?;
            let databag = relation.local_app_data_mut();
            for key in databag.keys() {
                if !desired.contains_key(&key) {
                    debug!("removing stale nginx-route key {}", key);
                    databag.remove(&key);
                }
            }
            databag.extend(desired.clone());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use charm_model::{Relation, RelationEvent};

    fn model(leader: bool) -> Model {
        let mut model = Model::new("dashboards", "juju-dashboard", "juju-dashboard/0");
        model.set_leader(leader);
        let mut relation = Relation::in_memory(3, "nginx-route", "ingress");
        relation
            .local_app_data_mut()
            .set("tls-secret-name", "old-secret".to_string());
        model.add_relation(relation);
        model
    }

    #[test]
    fn relation_data_uses_model_namespace_by_default() {
        let config = NginxRouteConfig {
            enable_access_log: Some(false),
            ..NginxRouteConfig::new("juju-dashboard", "juju-dashboard", 8080)
        };
        let data = config.to_relation_data("dashboards");
        assert_eq!(data["service-namespace"], "dashboards");
        assert_eq!(data["service-port"], "8080");
        assert_eq!(data["enable-access-log"], "false");
        assert!(!data.contains_key("limit-rps"));
    }

    #[test]
    fn reconcile_replaces_stale_keys() {
        let mut model = model(true);
        let requirer = NginxRouteRequirer::new(
            "nginx-route",
            NginxRouteConfig::new("juju-dashboard", "juju-dashboard", 8080),
        );
        let event = CharmEvent::RelationChanged(RelationEvent::new("nginx-route", 3, "ingress"));
        requirer.handle(&mut model, &event).unwrap();

        let bag = model.relation_by_id(3).unwrap().local_app_data();
        let mut keys = bag.keys();
        keys.sort();
        assert_eq!(
            keys,
            vec!["service-hostname", "service-name", "service-namespace", "service-port"]
        );
    }

    #[test]
    fn followers_leave_relation_alone() {
        let mut model = model(false);
        let requirer = NginxRouteRequirer::new(
            "nginx-route",
            NginxRouteConfig::new("juju-dashboard", "juju-dashboard", 8080),
        );
        requirer.reconcile(&mut model).unwrap();
        let bag = model.relation_by_id(3).unwrap().local_app_data();
        assert_eq!(bag.keys(), vec!["tls-secret-name"]);
    }
}
