use std::fmt;

/// Coarse health of the unit, recomputed on every event
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum UnitStatus {
    #[default]
    Unknown,
    Active,
    Blocked(String),
    Maintenance(String),
}

impl UnitStatus {
    pub fn blocked(message: impl Into<String>) -> Self {
        Self::Blocked(message.into())
    }

    pub fn maintenance(message: impl Into<String>) -> Self {
        Self::Maintenance(message.into())
    }

    pub fn name(&self) -> &'static str {
        match self {
            UnitStatus::Unknown => "unknown",
            UnitStatus::Active => "active",
            UnitStatus::Blocked(_) => "blocked",
            UnitStatus::Maintenance(_) => "maintenance",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            UnitStatus::Unknown | UnitStatus::Active => "",
            UnitStatus::Blocked(message) | UnitStatus::Maintenance(message) => message,
        }
    }
}

impl fmt::Display for UnitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message().is_empty() {
            write!(f, "{}", self.name())
        } else {
            write!(f, "{}: {}", self.name(), self.message())
        }
    }
}
