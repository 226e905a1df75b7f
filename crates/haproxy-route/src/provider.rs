use crate::databag::DatabagModel;
use crate::error::{HaproxyRouteError, Result};
use crate::schema::{
    HaproxyRouteProviderAppData, HaproxyRouteRequirerData, HaproxyRouteRequirersData,
    RequirerApplicationData, RequirerUnitData,
};
use crate::HAPROXY_ROUTE_RELATION_NAME;
use charm_model::{CharmEvent, Databag, EventKey, Model, Relation, RelationId};
use tracing::{debug, error, info};
use url::Url;

/// How the provider treats a requirer whose data fails validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidationMode {
    /// Abort aggregation on the first invalid relation
    Strict,
    /// Skip the relation and report its id
    #[default]
    Lenient,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderEvent {
    DataAvailable(HaproxyRouteRequirersData),
    /// A requirer relation is going away; nothing is re-validated
    DataRemoved { relation_id: RelationId },
}

#[derive(Debug, Clone)]
pub struct HaproxyRouteProvider {
    relation_name: String,
    mode: ValidationMode,
}

impl Default for HaproxyRouteProvider {
    fn default() -> Self {
        Self::new(HAPROXY_ROUTE_RELATION_NAME, ValidationMode::default())
    }
}

impl HaproxyRouteProvider {
    pub fn new(relation_name: &str, mode: ValidationMode) -> Self {
        Self {
            relation_name: relation_name.to_string(),
            mode,
        }
    }

    pub fn relation_name(&self) -> &str {
        &self.relation_name
    }

    pub fn mode(&self) -> ValidationMode {
        self.mode
    }

    /// Events the owning charm should route to [`HaproxyRouteProvider::handle`]
    pub fn event_keys(&self) -> Vec<EventKey> {
        vec![
            EventKey::relation_created(&self.relation_name),
            EventKey::relation_changed(&self.relation_name),
            EventKey::relation_departed(&self.relation_name),
            EventKey::relation_broken(&self.relation_name),
        ]
    }

    pub fn handle(&self, model: &Model, event: &CharmEvent) -> Result<Option<ProviderEvent>> {
        match event.relation() {
            Some(relation) if relation.endpoint == self.relation_name => {}
            _ => return Ok(None),
        }

        match event {
            CharmEvent::RelationCreated(_) | CharmEvent::RelationChanged(_) => {
                let data = self.get_data(model.relations(&self.relation_name))?;
                info!(
                    "haproxy-route data available for {} requirer(s)",
                    data.requirers_data().len()
                );
                Ok(Some(ProviderEvent::DataAvailable(data)))
            }
            CharmEvent::RelationDeparted(relation) | CharmEvent::RelationBroken(relation) => {
                debug!("haproxy-route data removed for relation {}", relation.relation_id);
                Ok(Some(ProviderEvent::DataRemoved {
                    relation_id: relation.relation_id,
                }))
            }
            _ => Ok(None),
        }
    }

    /// Validate and aggregate the data of every given requirer relation
    pub fn get_data<'a, I>(&self, relations: I) -> Result<HaproxyRouteRequirersData>
    where
        I: IntoIterator<Item = &'a Relation>,
    {
        let mut requirers_data = Vec::new();
        let mut invalid = Vec::new();

        for relation in relations {
            match Self::get_requirer_data(relation) {
                Ok(data) => requirers_data.push(data),
                Err(e) => {
                    error!("haproxy-route data validation failed for {}: {}", relation, e);
                    if self.mode == ValidationMode::Strict {
                        return Err(HaproxyRouteError::InvalidRelationData {
                            relation_id: relation.id(),
                            source: Box::new(e),
                        });
                    }
                    invalid.push(relation.id());
                }
            }
        }

        HaproxyRouteRequirersData::new(requirers_data, invalid)
    }

    fn get_requirer_data(relation: &Relation) -> Result<HaproxyRouteRequirerData> {
        let application_data = RequirerApplicationData::load(relation.remote_app_data())?;
        let mut units_data = Vec::new();
        for (unit, databag) in relation.units() {
            if databag.is_empty() {
                error!(
                    "Requirer unit data does not exist even though the unit {} is still present.",
                    unit
                );
                continue;
            }
            units_data.push(RequirerUnitData::load(databag)?);
        }

        Ok(HaproxyRouteRequirerData {
            relation_id: relation.id(),
            application_data,
            units_data,
        })
    }

    /// Publish the proxied endpoints for one requirer relation. Leader only.
    pub fn publish_proxied_endpoints(
        &self,
        model: &mut Model,
        relation_id: RelationId,
        endpoints: Vec<Url>,
    ) -> Result<()> {
        model.ensure_leader("publish proxied endpoints")?;
        let relation = model.relation_by_id_mut(relation_id).ok_or_else(|| {
            charm_error::CharmError::RelationNotFound(format!(
                "{} relation {}",
                self.relation_name, relation_id
            ))
        })?;

        debug!("publishing {} endpoint(s) on {}", endpoints.len(), relation);
        HaproxyRouteProviderAppData { endpoints }.dump(relation.local_app_data_mut(), true)
    }
}
