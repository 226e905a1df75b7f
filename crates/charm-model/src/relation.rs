use crate::databag::{Databag, MemoryDatabag};
use std::collections::BTreeMap;
use std::fmt;

pub type RelationId = u32;

/// One established relation on a local endpoint.
///
/// Holds the four kinds of databags a unit can see: its own application and
/// unit bags, the remote application bag and one bag per remote unit.
pub struct Relation {
    id: RelationId,
    endpoint: String,
    remote_app: String,
    local_app: Box<dyn Databag>,
    local_unit: Box<dyn Databag>,
    remote_app_data: Box<dyn Databag>,
    remote_units: BTreeMap<String, Box<dyn Databag>>,
}

impl Relation {
    pub fn new(
        id: RelationId,
        endpoint: &str,
        remote_app: &str,
        local_app: Box<dyn Databag>,
        local_unit: Box<dyn Databag>,
        remote_app_data: Box<dyn Databag>,
    ) -> Self {
        Self {
            id,
            endpoint: endpoint.to_string(),
            remote_app: remote_app.to_string(),
            local_app,
            local_unit,
            remote_app_data,
            remote_units: BTreeMap::new(),
        }
    }

    /// Relation whose databags all live in memory
    pub fn in_memory(id: RelationId, endpoint: &str, remote_app: &str) -> Self {
        Self::new(
            id,
            endpoint,
            remote_app,
            Box::new(MemoryDatabag::new()),
            Box::new(MemoryDatabag::new()),
            Box::new(MemoryDatabag::new()),
        )
    }

    pub fn id(&self) -> RelationId {
        self.id
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn remote_app(&self) -> &str {
        &self.remote_app
    }

    pub fn local_app_data(&self) -> &dyn Databag {
        self.local_app.as_ref()
    }

    pub fn local_app_data_mut(&mut self) -> &mut dyn Databag {
        self.local_app.as_mut()
    }

    pub fn local_unit_data(&self) -> &dyn Databag {
        self.local_unit.as_ref()
    }

    pub fn local_unit_data_mut(&mut self) -> &mut dyn Databag {
        self.local_unit.as_mut()
    }

    pub fn remote_app_data(&self) -> &dyn Databag {
        self.remote_app_data.as_ref()
    }

    pub fn remote_app_data_mut(&mut self) -> &mut dyn Databag {
        self.remote_app_data.as_mut()
    }

    pub fn units(&self) -> impl Iterator<Item = (&str, &dyn Databag)> {
        self.remote_units
            .iter()
            .map(|(name, bag)| (name.as_str(), bag.as_ref()))
    }

    pub fn unit_names(&self) -> Vec<String> {
        self.remote_units.keys().cloned().collect()
    }

    pub fn unit_data(&self, unit: &str) -> Option<&dyn Databag> {
        self.remote_units.get(unit).map(|bag| bag.as_ref())
    }

    pub fn unit_data_mut(&mut self, unit: &str) -> Option<&mut (dyn Databag + 'static)> {
        self.remote_units.get_mut(unit).map(|bag| bag.as_mut())
    }

    pub fn add_unit(&mut self, unit: &str, databag: Box<dyn Databag>) {
        self.remote_units.insert(unit.to_string(), databag);
    }

    pub fn remove_unit(&mut self, unit: &str) -> bool {
        self.remote_units.remove(unit).is_some()
    }
}

impl fmt::Debug for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Relation")
            .field("id", &self.id)
            .field("endpoint", &self.endpoint)
            .field("remote_app", &self.remote_app)
            .field("units", &self.unit_names())
            .finish()
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Relation {}:{}>", self.endpoint, self.id)
    }
}
