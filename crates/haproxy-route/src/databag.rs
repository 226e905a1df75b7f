use crate::error::{HaproxyRouteError, Result};
use charm_model::Databag;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{debug, error};

/// A record stored in a relation databag, one JSON document per field.
pub trait DatabagModel: Serialize + DeserializeOwned {
    /// Databag keys that belong to this record. Anything else is ignored.
    const FIELDS: &'static [&'static str];

    /// Cross-field invariants, checked on load and before dump
    fn validate(&self) -> Result<()> {
        Ok(())
    }

    fn load(databag: &dyn Databag) -> Result<Self> {
        let mut object = Map::new();
        for key in Self::FIELDS {
            let Some(raw) = databag.get(key) else {
                continue;
            };
            let value: Value = serde_json::from_str(&raw).map_err(|source| {
                error!("invalid databag contents: expecting json. {}", raw);
                HaproxyRouteError::InvalidJson {
                    key: key.to_string(),
                    source,
                }
            })?;
            object.insert(key.to_string(), value);
        }

        let model: Self = serde_json::from_value(Value::Object(object)).map_err(|e| {
            error!("failed to validate databag: {}", e);
            HaproxyRouteError::validation(e.to_string())
        })?;
        model.validate()?;
        Ok(model)
    }

    /// Write every non-default field into `databag`, optionally clearing it first
    fn dump(&self, databag: &mut dyn Databag, clear: bool) -> Result<()> {
        self.validate()?;
        let Value::Object(fields) =
            serde_json::to_value(self).map_err(|e| HaproxyRouteError::validation(e.to_string()))?
        else {
            return Err(HaproxyRouteError::validation("record is not a JSON object"));
        };

        if clear {
            databag.clear();
        }
        for (key, value) in fields {
            debug!("databag {} = {}", key, value);
            databag.set(&key, value.to_string());
        }
        Ok(())
    }
}
