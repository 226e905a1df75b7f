use crate::relation::RelationId;

/// Relation-scoped payload shared by every relation event kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationEvent {
    pub endpoint: String,
    pub relation_id: RelationId,
    pub remote_app: String,
    /// Set on departed events only
    pub departing_unit: Option<String>,
}

impl RelationEvent {
    pub fn new(endpoint: &str, relation_id: RelationId, remote_app: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            relation_id,
            remote_app: remote_app.to_string(),
            departing_unit: None,
        }
    }

    pub fn with_departing_unit(mut self, unit: &str) -> Self {
        self.departing_unit = Some(unit.to_string());
        self
    }
}

/// Lifecycle and relation events delivered by the orchestrator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CharmEvent {
    Install,
    ConfigChanged,
    UpdateStatus,
    UpgradeCharm,
    RelationCreated(RelationEvent),
    RelationChanged(RelationEvent),
    RelationDeparted(RelationEvent),
    RelationBroken(RelationEvent),
}

impl CharmEvent {
    pub fn key(&self) -> EventKey {
        match self {
            CharmEvent::Install => EventKey::Install,
            CharmEvent::ConfigChanged => EventKey::ConfigChanged,
            CharmEvent::UpdateStatus => EventKey::UpdateStatus,
            CharmEvent::UpgradeCharm => EventKey::UpgradeCharm,
            CharmEvent::RelationCreated(e) => EventKey::RelationCreated(e.endpoint.clone()),
            CharmEvent::RelationChanged(e) => EventKey::RelationChanged(e.endpoint.clone()),
            CharmEvent::RelationDeparted(e) => EventKey::RelationDeparted(e.endpoint.clone()),
            CharmEvent::RelationBroken(e) => EventKey::RelationBroken(e.endpoint.clone()),
        }
    }

    pub fn relation(&self) -> Option<&RelationEvent> {
        match self {
            CharmEvent::RelationCreated(e)
            | CharmEvent::RelationChanged(e)
            | CharmEvent::RelationDeparted(e)
            | CharmEvent::RelationBroken(e) => Some(e),
            _ => None,
        }
    }
}

/// What a handler subscribes to. Relation keys carry the endpoint name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventKey {
    Install,
    ConfigChanged,
    UpdateStatus,
    UpgradeCharm,
    RelationCreated(String),
    RelationChanged(String),
    RelationDeparted(String),
    RelationBroken(String),
}

impl EventKey {
    pub fn relation_created(endpoint: &str) -> Self {
        Self::RelationCreated(endpoint.to_string())
    }

    pub fn relation_changed(endpoint: &str) -> Self {
        Self::RelationChanged(endpoint.to_string())
    }

    pub fn relation_departed(endpoint: &str) -> Self {
        Self::RelationDeparted(endpoint.to_string())
    }

    pub fn relation_broken(endpoint: &str) -> Self {
        Self::RelationBroken(endpoint.to_string())
    }
}

/// Result of a single handler run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    Handled,
    /// Re-deliver the event before the next one
    Deferred,
}
