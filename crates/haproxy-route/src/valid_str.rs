use serde::de::{Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::ops::Deref;
use std::str::FromStr;
use thiserror::Error;

/// Characters that would break the generated haproxy configuration
pub const HAPROXY_CONFIG_INVALID_CHARACTERS: &str = "\n\t#\\'\"\r$ ";

#[derive(Debug, PartialEq, Eq, Error)]
#[error("Relation data contains invalid character(s) {0:?}")]
pub struct InvalidCharacters(pub String);

/// A string that is safe to splice into a haproxy configuration file
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ValidStr(String);

impl ValidStr {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for ValidStr {
    type Err = InvalidCharacters;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value
            .chars()
            .any(|c| HAPROXY_CONFIG_INVALID_CHARACTERS.contains(c))
        {
            return Err(InvalidCharacters(value.to_string()));
        }
        Ok(Self(value.to_string()))
    }
}

impl TryFrom<&str> for ValidStr {
    type Error = InvalidCharacters;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl TryFrom<String> for ValidStr {
    type Error = InvalidCharacters;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl Deref for ValidStr {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<str> for ValidStr {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ValidStr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<str> for ValidStr {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for ValidStr {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

struct ValidStrVisitor;

impl<'de> Visitor<'de> for ValidStrVisitor {
    type Value = ValidStr;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a string without haproxy configuration metacharacters")
    }

    fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        ValidStr::from_str(value).map_err(serde::de::Error::custom)
    }
}

impl<'de> Deserialize<'de> for ValidStr {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_string(ValidStrVisitor)
    }
}

impl Serialize for ValidStr {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_str_accepts_plain_values() {
        let value = ValidStr::from_str("/api/v1").unwrap();
        assert_eq!(value, "/api/v1");
        assert_eq!(value.len(), 7);
    }

    #[test]
    fn valid_str_rejects_metacharacters() {
        for bad in ["a b", "a#b", "a$b", "a\"b", "a'b", "a\\b", "a\nb", "a\tb", "a\rb"] {
            let result = ValidStr::from_str(bad);
            assert_eq!(result.unwrap_err(), InvalidCharacters(bad.to_string()));
        }
    }

    #[test]
    fn valid_str_deserialize_rejects_metacharacters() {
        let result: Result<ValidStr, _> = serde_json::from_str("\"rm -rf\"");
        assert!(result.is_err());

        let result: Result<ValidStr, _> = serde_json::from_str("\"service\"");
        assert_eq!(result.unwrap(), "service");
    }
}
