use charm_error::CharmError;
use charm_model::{Model, RelationId};
use tracing::debug;

pub const PORT_KEY: &str = "port";

/// Which local databags receive the port
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortScope {
    Application,
    ApplicationAndUnit,
}

/// Publish the dashboard port on one relation. The application bag is only
/// written by the leader.
pub fn publish_port(
    model: &mut Model,
    relation_id: RelationId,
    port: u16,
    scope: PortScope,
) -> Result<(), CharmError> {
    let leader = model.is_leader();
    let relation = model
        .relation_by_id_mut(relation_id)
        .ok_or_else(|| CharmError::RelationNotFound(format!("relation id {}", relation_id)))?;

    if leader {
        relation.local_app_data_mut().set(PORT_KEY, port.to_string());
    }
    if scope == PortScope::ApplicationAndUnit {
        relation.local_unit_data_mut().set(PORT_KEY, port.to_string());
    }
    debug!("published port {} on {}", port, relation);
    Ok(())
}

/// Requests per-application ingress for the dashboard port
#[derive(Debug, Clone)]
pub struct IngressRequirer {
    relation_name: String,
    port: u16,
}

impl IngressRequirer {
    pub fn new(relation_name: &str, port: u16) -> Self {
        Self {
            relation_name: relation_name.to_string(),
            port,
        }
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Remember `port` and publish it on every ingress relation
    pub fn provide_ingress_requirements(
        &mut self,
        model: &mut Model,
        port: u16,
    ) -> Result<(), CharmError> {
        self.port = port;
        if !model.is_leader() {
            return Ok(());
        }
        let ids: Vec<RelationId> = model.relations(&self.relation_name).map(|r| r.id()).collect();
        for id in ids {
            publish_port(model, id, port, PortScope::Application)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use charm_model::Relation;

    fn model(leader: bool) -> Model {
        let mut model = Model::new("test", "dashboard", "dashboard/0");
        model.set_leader(leader);
        model.add_relation(Relation::in_memory(1, "dashboard", "haproxy"));
        model.add_relation(Relation::in_memory(2, "ingress", "traefik"));
        model
    }

    #[test]
    fn follower_only_writes_unit_bag() {
        let mut model = model(false);
        publish_port(&mut model, 1, 8080, PortScope::ApplicationAndUnit).unwrap();
        let relation = model.relation_by_id(1).unwrap();
        assert!(relation.local_app_data().get(PORT_KEY).is_none());
        assert_eq!(relation.local_unit_data().get(PORT_KEY).as_deref(), Some("8080"));
    }

    #[test]
    fn leader_writes_app_bag() {
        let mut model = model(true);
        publish_port(&mut model, 1, 8080, PortScope::Application).unwrap();
        let relation = model.relation_by_id(1).unwrap();
        assert_eq!(relation.local_app_data().get(PORT_KEY).as_deref(), Some("8080"));
        assert!(relation.local_unit_data().is_empty());
    }

    #[test]
    fn unknown_relation_is_an_error() {
        let mut model = model(true);
        let err = publish_port(&mut model, 42, 8080, PortScope::Application).unwrap_err();
        assert!(matches!(err, CharmError::RelationNotFound(_)));
    }

    #[test]
    fn ingress_requirements_follow_port_changes() {
        let mut model = model(true);
        let mut ingress = IngressRequirer::new("ingress", 8080);
        ingress.provide_ingress_requirements(&mut model, 9090).unwrap();
        assert_eq!(ingress.port(), 9090);
        let relation = model.relation_by_id(2).unwrap();
        assert_eq!(relation.local_app_data().get(PORT_KEY).as_deref(), Some("9090"));
    }
}
