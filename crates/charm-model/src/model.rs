use crate::relation::{Relation, RelationId};
use crate::status::UnitStatus;
use charm_error::CharmError;
use std::collections::BTreeSet;
use std::net::IpAddr;

/// Everything the unit knows about itself and its relations while handling
/// one event.
#[derive(Debug)]
pub struct Model {
    name: String,
    app_name: String,
    unit_name: String,
    leader: bool,
    relations: Vec<Relation>,
    bind_address: Option<IpAddr>,
    status: UnitStatus,
    opened_ports: BTreeSet<u16>,
}

impl Model {
    pub fn new(name: &str, app_name: &str, unit_name: &str) -> Self {
        Self {
            name: name.to_string(),
            app_name: app_name.to_string(),
            unit_name: unit_name.to_string(),
            leader: false,
            relations: Vec::new(),
            bind_address: None,
            status: UnitStatus::default(),
            opened_ports: BTreeSet::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    pub fn unit_name(&self) -> &str {
        &self.unit_name
    }

    pub fn is_leader(&self) -> bool {
        self.leader
    }

    pub fn set_leader(&mut self, leader: bool) {
        self.leader = leader;
    }

    /// Fail unless this unit may write application data
    pub fn ensure_leader(&self, action: &str) -> Result<(), CharmError> {
        if self.leader {
            Ok(())
        } else {
            Err(CharmError::NotLeader(format!(
                "{} cannot {}",
                self.unit_name, action
            )))
        }
    }

    /// First relation established on `endpoint`
    pub fn relation(&self, endpoint: &str) -> Option<&Relation> {
        self.relations.iter().find(|r| r.endpoint() == endpoint)
    }

    pub fn relation_mut(&mut self, endpoint: &str) -> Option<&mut Relation> {
        self.relations.iter_mut().find(|r| r.endpoint() == endpoint)
    }

    pub fn relations<'a>(&'a self, endpoint: &'a str) -> impl Iterator<Item = &'a Relation> {
        self.relations.iter().filter(move |r| r.endpoint() == endpoint)
    }

    pub fn relation_by_id(&self, id: RelationId) -> Option<&Relation> {
        self.relations.iter().find(|r| r.id() == id)
    }

    pub fn relation_by_id_mut(&mut self, id: RelationId) -> Option<&mut Relation> {
        self.relations.iter_mut().find(|r| r.id() == id)
    }

    pub fn add_relation(&mut self, relation: Relation) {
        self.relations.push(relation);
    }

    pub fn remove_relation(&mut self, id: RelationId) -> Option<Relation> {
        let index = self.relations.iter().position(|r| r.id() == id)?;
        Some(self.relations.remove(index))
    }

    pub fn bind_address(&self) -> Option<IpAddr> {
        self.bind_address
    }

    pub fn set_bind_address(&mut self, address: Option<IpAddr>) {
        self.bind_address = address;
    }

    pub fn status(&self) -> &UnitStatus {
        &self.status
    }

    pub fn set_status(&mut self, status: UnitStatus) {
        self.status = status;
    }

    pub fn opened_ports(&self) -> Vec<u16> {
        self.opened_ports.iter().copied().collect()
    }

    pub fn open_port(&mut self, port: u16) {
        self.opened_ports.insert(port);
    }

    pub fn close_port(&mut self, port: u16) {
        self.opened_ports.remove(&port);
    }
}
