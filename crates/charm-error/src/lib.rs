use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CharmError {
    #[error("Failed to parse configuration: {0}")]
    ConfigError(String),

    #[error("Relation not found: {0}")]
    RelationNotFound(String),

    #[error("Relation data is invalid: {0}")]
    InvalidRelationData(String),

    #[error("Only the leader unit may write application data: {0}")]
    NotLeader(String),

    #[error("Template error: {0}")]
    TemplateError(String),

    #[error("Unable to write file {path}: {reason}")]
    WriteError { path: String, reason: String },

    #[error("Workload operation failed: {0}")]
    WorkloadError(String),

    #[error("Workload container is not reachable: {0}")]
    ContainerUnreachable(String),

    #[error(
        "[BUG] This should never happen. Please report it with the charm logs attached: {0}"
    )]
    ShouldNeverHappen(String),
}
