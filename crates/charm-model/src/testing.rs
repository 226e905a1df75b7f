//! In-memory harness for driving a charm through hook sequences in tests.

use crate::databag::{Databag, MemoryDatabag};
use crate::event::{CharmEvent, RelationEvent};
use crate::framework::{Charm, Framework};
use crate::model::Model;
use crate::relation::{Relation, RelationId};
use crate::status::UnitStatus;
use charm_error::CharmError;

pub struct Harness<C: Charm> {
    charm: C,
    framework: Framework<C>,
    model: Model,
    hooks_enabled: bool,
    next_relation_id: RelationId,
}

impl<C: Charm> Harness<C> {
    pub fn new(charm: C, model: Model) -> Self {
        let mut framework = Framework::new();
        C::observe(&mut framework);
        Self {
            charm,
            framework,
            model,
            hooks_enabled: true,
            next_relation_id: 0,
        }
    }

    pub fn charm(&self) -> &C {
        &self.charm
    }

    pub fn charm_mut(&mut self) -> &mut C {
        &mut self.charm
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn model_mut(&mut self) -> &mut Model {
        &mut self.model
    }

    pub fn framework(&self) -> &Framework<C> {
        &self.framework
    }

    pub fn status(&self) -> &UnitStatus {
        self.model.status()
    }

    pub fn set_leader(&mut self, leader: bool) {
        self.model.set_leader(leader);
    }

    pub fn disable_hooks(&mut self) {
        self.hooks_enabled = false;
    }

    pub fn enable_hooks(&mut self) {
        self.hooks_enabled = true;
    }

    /// Deliver an event regardless of whether hooks are enabled
    pub fn emit(&mut self, event: CharmEvent) -> Result<(), CharmError> {
        self.framework
            .dispatch(&mut self.charm, &mut self.model, event)
    }

    fn fire(&mut self, event: CharmEvent) -> Result<(), CharmError> {
        if self.hooks_enabled {
            self.emit(event)
        } else {
            Ok(())
        }
    }

    pub fn begin_with_initial_hooks(&mut self) -> Result<(), CharmError> {
        self.fire(CharmEvent::Install)?;
        self.fire(CharmEvent::ConfigChanged)
    }

    pub fn add_relation(
        &mut self,
        endpoint: &str,
        remote_app: &str,
    ) -> Result<RelationId, CharmError> {
        self.next_relation_id += 1;
        let id = self.next_relation_id;
        self.model
            .add_relation(Relation::in_memory(id, endpoint, remote_app));
        self.fire(CharmEvent::RelationCreated(RelationEvent::new(
            endpoint, id, remote_app,
        )))?;
        Ok(id)
    }

    pub fn add_relation_unit(&mut self, id: RelationId, unit: &str) -> Result<(), CharmError> {
        let event = {
            let relation = self.relation_mut(id)?;
            relation.add_unit(unit, Box::new(MemoryDatabag::new()));
            RelationEvent::new(relation.endpoint(), id, relation.remote_app())
        };
        self.fire(CharmEvent::RelationChanged(event))
    }

    /// Update the remote application bag (`owner` is the remote app name) or
    /// a remote unit bag, then fire relation-changed. Empty values delete keys.
    pub fn update_relation_data(
        &mut self,
        id: RelationId,
        owner: &str,
        data: &[(&str, &str)],
    ) -> Result<(), CharmError> {
        let event = {
            let relation = self.relation_mut(id)?;
            let event = RelationEvent::new(relation.endpoint(), id, relation.remote_app());
            let is_app = owner == relation.remote_app();
            if !is_app && relation.unit_data(owner).is_none() {
                return Err(CharmError::RelationNotFound(format!(
                    "{} has no unit {}",
                    relation, owner
                )));
            }
            let bag: &mut dyn Databag = if is_app {
                relation.remote_app_data_mut()
            } else {
                relation
                    .unit_data_mut(owner)
                    .ok_or_else(|| CharmError::ShouldNeverHappen(owner.to_string()))?
            };
            for (key, value) in data {
                bag.set(key, value.to_string());
            }
            event
        };
        self.fire(CharmEvent::RelationChanged(event))
    }

    /// Depart every remote unit, break the relation and drop it from the model
    pub fn remove_relation(&mut self, id: RelationId) -> Result<(), CharmError> {
        let (endpoint, remote_app, units) = {
            let relation = self.relation_mut(id)?;
            (
                relation.endpoint().to_string(),
                relation.remote_app().to_string(),
                relation.unit_names(),
            )
        };

        for unit in units {
            if let Some(relation) = self.model.relation_by_id_mut(id) {
                relation.remove_unit(&unit);
            }
            self.fire(CharmEvent::RelationDeparted(
                RelationEvent::new(&endpoint, id, &remote_app).with_departing_unit(&unit),
            ))?;
        }

        self.model.remove_relation(id);
        self.fire(CharmEvent::RelationBroken(RelationEvent::new(
            &endpoint,
            id,
            &remote_app,
        )))
    }

    /// Apply `update` to the charm options and fire config-changed
    pub fn update_config<F>(&mut self, update: F) -> Result<(), CharmError>
    where
        F: FnOnce(&mut C::Config),
    {
        update(self.charm.config_mut());
        self.fire(CharmEvent::ConfigChanged)
    }

    fn relation_mut(&mut self, id: RelationId) -> Result<&mut Relation, CharmError> {
        self.model
            .relation_by_id_mut(id)
            .ok_or_else(|| CharmError::RelationNotFound(format!("relation id {}", id)))
    }
}
