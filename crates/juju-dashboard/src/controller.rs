use charm_error::CharmError;
use charm_model::{Databag, Model, RelationId};
use regex::Regex;
use tracing::{debug, warn};

pub const CONTROLLER_URL_KEY: &str = "controller-url";
pub const IDENTITY_PROVIDER_URL_KEY: &str = "identity-provider-url";
pub const IS_JUJU_KEY: &str = "is-juju";
pub const DASHBOARD_INGRESS_KEY: &str = "dashboard-ingress";

/// What the controller tells the dashboard about itself.
///
/// The controller publishes its full API address; the dashboard derives the
/// controller and model endpoints from it, so the `/api` suffix is dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerData {
    pub controller_url: String,
    pub identity_provider_url: String,
    pub is_juju: bool,
}

impl ControllerData {
    pub fn from_databag(databag: &dyn Databag) -> Result<Self, CharmError> {
        let raw = databag.get(CONTROLLER_URL_KEY).unwrap_or_default();
        // k8s controllers publish bracketed addresses with a zero port
        let cleaned = raw.replace('[', "").replace(":0]", "").replace(']', "");
        let api_suffix = Regex::new(r"/api$")
            .map_err(|e| CharmError::ShouldNeverHappen(format!("Invalid regex: {e}")))?;
        let controller_url = api_suffix.replace(&cleaned, "").into_owned();

        let is_juju = databag
            .get(IS_JUJU_KEY)
            .map(|value| value.eq_ignore_ascii_case("true"))
            .unwrap_or(true);

        Ok(Self {
            controller_url,
            identity_provider_url: databag.get(IDENTITY_PROVIDER_URL_KEY).unwrap_or_default(),
            is_juju,
        })
    }

    pub fn has_controller_url(&self) -> bool {
        !self.controller_url.is_empty()
    }
}

/// Tell the controller where this dashboard is reachable. Leader only; other
/// units leave the relation untouched.
pub fn publish_dashboard_ingress(
    model: &mut Model,
    relation_id: RelationId,
) -> Result<(), CharmError> {
    if !model.is_leader() {
        return Ok(());
    }
    let Some(address) = model.bind_address() else {
        warn!("no ingress address bound, not publishing {}", DASHBOARD_INGRESS_KEY);
        return Ok(());
    };
    let relation = model
        .relation_by_id_mut(relation_id)
        .ok_or_else(|| CharmError::RelationNotFound(format!("relation id {}", relation_id)))?;
    debug!("{} = {} on {}", DASHBOARD_INGRESS_KEY, address, relation);
    relation
        .local_app_data_mut()
        .set(DASHBOARD_INGRESS_KEY, address.to_string());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use charm_model::{MemoryDatabag, Relation};

    #[test]
    fn controller_data_strips_api_suffix() {
        let bag = MemoryDatabag::from([
            ("controller-url", "wss://10.10.10.1:17070/api"),
            ("identity-provider-url", "https://candid.example.com"),
            ("is-juju", "True"),
        ]);
        let data = ControllerData::from_databag(&bag).unwrap();
        assert_eq!(data.controller_url, "wss://10.10.10.1:17070");
        assert_eq!(data.identity_provider_url, "https://candid.example.com");
        assert!(data.is_juju);
    }

    #[test]
    fn controller_data_strips_brackets() {
        let bag = MemoryDatabag::from([(
            "controller-url",
            "wss://[controller-service:0]:17070/api",
        )]);
        let data = ControllerData::from_databag(&bag).unwrap();
        assert_eq!(data.controller_url, "wss://controller-service:17070");
    }

    #[test]
    fn controller_data_defaults() {
        let data = ControllerData::from_databag(&MemoryDatabag::new()).unwrap();
        assert_eq!(data.controller_url, "");
        assert_eq!(data.identity_provider_url, "");
        assert!(data.is_juju);
        assert!(!data.has_controller_url());

        let bag = MemoryDatabag::from([("is-juju", "false")]);
        assert!(!ControllerData::from_databag(&bag).unwrap().is_juju);
    }

    #[test]
    fn only_the_leader_publishes_ingress() {
        let mut model = Model::new("test", "dashboard", "dashboard/0");
        model.set_bind_address(Some("10.1.2.3".parse().unwrap()));
        model.add_relation(Relation::in_memory(1, "controller", "controller"));

        publish_dashboard_ingress(&mut model, 1).unwrap();
        let relation = model.relation_by_id(1).unwrap();
        assert!(relation.local_app_data().is_empty());

        model.set_leader(true);
        publish_dashboard_ingress(&mut model, 1).unwrap();
        let relation = model.relation_by_id(1).unwrap();
        assert_eq!(
            relation.local_app_data().get(DASHBOARD_INGRESS_KEY).as_deref(),
            Some("10.1.2.3")
        );
    }
}
