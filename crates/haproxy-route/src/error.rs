use charm_error::CharmError;
use charm_model::RelationId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HaproxyRouteError {
    #[error("invalid databag contents for key {key}: expecting json: {source}")]
    InvalidJson {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to validate databag: {0}")]
    DataValidation(String),

    #[error("haproxy-route data validation failed for relation: {relation_id}")]
    InvalidRelationData {
        relation_id: RelationId,
        #[source]
        source: Box<HaproxyRouteError>,
    },

    #[error("Services declaration by requirers must be unique: {0}")]
    DuplicateService(String),

    #[error("No unit IP available.")]
    MissingUnitAddress,

    #[error(transparent)]
    Charm(#[from] CharmError),
}

impl HaproxyRouteError {
    /// True for malformed or schema-violating databag contents
    pub fn is_data_validation(&self) -> bool {
        matches!(
            self,
            HaproxyRouteError::InvalidJson { .. }
                | HaproxyRouteError::DataValidation(_)
                | HaproxyRouteError::MissingUnitAddress
        )
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        HaproxyRouteError::DataValidation(message.into())
    }
}

impl From<HaproxyRouteError> for CharmError {
    fn from(error: HaproxyRouteError) -> Self {
        match error {
            HaproxyRouteError::Charm(inner) => inner,
            other => CharmError::InvalidRelationData(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, HaproxyRouteError>;
