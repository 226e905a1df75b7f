//! Typed records exchanged over the `haproxy-route` relation.
//!
//! Every record implements [`DatabagModel`]: each top-level field lives under
//! its own databag key as a JSON document, and fields still at their default
//! are left out when publishing.

use crate::databag::DatabagModel;
use crate::error::{HaproxyRouteError, Result};
use crate::valid_str::ValidStr;
use charm_model::RelationId;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use url::Url;

pub const DEFAULT_TIMEOUT_SECONDS: u32 = 60;

fn is_default<T: Default + PartialEq>(value: &T) -> bool {
    *value == T::default()
}

fn default_timeout() -> u32 {
    DEFAULT_TIMEOUT_SECONDS
}

fn is_default_timeout(value: &u32) -> bool {
    *value == DEFAULT_TIMEOUT_SECONDS
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    #[default]
    Http,
    Https,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LoadBalancingAlgorithm {
    #[default]
    #[serde(rename = "leastconn")]
    LeastConnections,
    #[serde(rename = "source")]
    SourceIp,
    #[serde(rename = "roundrobin")]
    RoundRobin,
    #[serde(rename = "cookie")]
    Cookie,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RateLimitPolicy {
    #[default]
    Deny,
    Reject,
    SilentDrop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RewriteMethod {
    SetPath,
    SetQuery,
    SetHeader,
}

/// Health check parameters for the backend servers. `interval`, `rise` and
/// `fall` go together; zero counts as unset.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ServerHealthCheck {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rise: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fall: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<ValidStr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

impl ServerHealthCheck {
    pub fn validate(&self) -> Result<()> {
        let set = [self.interval, self.rise, self.fall]
            .iter()
            .filter(|value| value.is_some_and(|v| v != 0))
            .count();
        if set != 0 && set != 3 {
            return Err(HaproxyRouteError::validation(
                "All three of interval, rise and fall must either be set or unset.",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LoadBalancingConfiguration {
    #[serde(default, skip_serializing_if = "is_default")]
    pub algorithm: LoadBalancingAlgorithm,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cookie: Option<ValidStr>,
    #[serde(default, skip_serializing_if = "is_default")]
    pub consistent_hashing: bool,
}

impl LoadBalancingConfiguration {
    pub fn validate(&self) -> Result<()> {
        let cookie_algorithm = self.algorithm == LoadBalancingAlgorithm::Cookie;
        if self.cookie.is_some() && !cookie_algorithm {
            return Err(HaproxyRouteError::validation(
                "cookie can only be set if load balancing algorithm is COOKIE.",
            ));
        }
        if cookie_algorithm && self.cookie.is_none() {
            return Err(HaproxyRouteError::validation(
                "cookie must be set if load balancing algorithm is COOKIE.",
            ));
        }
        if self.consistent_hashing
            && !matches!(
                self.algorithm,
                LoadBalancingAlgorithm::Cookie | LoadBalancingAlgorithm::SourceIp
            )
        {
            return Err(HaproxyRouteError::validation(
                "Consistent hashing only applies when algorithm is COOKIE or SOURCE_IP.",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimit {
    pub connections_per_minute: u32,
    #[serde(default, skip_serializing_if = "is_default")]
    pub policy: RateLimitPolicy,
}

/// Bytes per second in each direction
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BandwidthLimit {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Retry {
    pub count: u32,
    #[serde(default, skip_serializing_if = "is_default")]
    pub redispatch: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeoutConfiguration {
    #[serde(default = "default_timeout", skip_serializing_if = "is_default_timeout")]
    pub server: u32,
    #[serde(default = "default_timeout", skip_serializing_if = "is_default_timeout")]
    pub connect: u32,
    #[serde(default = "default_timeout", skip_serializing_if = "is_default_timeout")]
    pub queue: u32,
}

impl Default for TimeoutConfiguration {
    fn default() -> Self {
        Self {
            server: DEFAULT_TIMEOUT_SECONDS,
            connect: DEFAULT_TIMEOUT_SECONDS,
            queue: DEFAULT_TIMEOUT_SECONDS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewriteConfiguration {
    pub method: RewriteMethod,
    pub expression: ValidStr,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<ValidStr>,
}

impl RewriteConfiguration {
    pub fn validate(&self) -> Result<()> {
        if self.method == RewriteMethod::SetHeader && self.header.is_none() {
            return Err(HaproxyRouteError::validation(
                "header must be set if rewrite method is SET_HEADER.",
            ));
        }
        Ok(())
    }
}

/// Application-level requirements published by a requirer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequirerApplicationData {
    pub service: ValidStr,
    pub ports: Vec<u16>,
    #[serde(default, skip_serializing_if = "is_default")]
    pub protocol: Protocol,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hosts: Vec<IpAddr>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub paths: Vec<ValidStr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<ValidStr>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub additional_hostnames: Vec<ValidStr>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rewrites: Vec<RewriteConfiguration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check: Option<ServerHealthCheck>,
    #[serde(default, skip_serializing_if = "is_default")]
    pub load_balancing: LoadBalancingConfiguration,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate_limit: Option<RateLimit>,
    #[serde(default, skip_serializing_if = "is_default")]
    pub bandwidth_limit: BandwidthLimit,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry: Option<Retry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub deny_paths: Vec<ValidStr>,
    #[serde(default, skip_serializing_if = "is_default")]
    pub timeout: TimeoutConfiguration,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_maxconn: Option<u32>,
    #[serde(default, skip_serializing_if = "is_default")]
    pub http_server_close: bool,
}

impl RequirerApplicationData {
    pub fn new(service: ValidStr, ports: Vec<u16>) -> Self {
        Self {
            service,
            ports,
            protocol: Protocol::default(),
            hosts: Vec::new(),
            paths: Vec::new(),
            hostname: None,
            additional_hostnames: Vec::new(),
            rewrites: Vec::new(),
            check: None,
            load_balancing: LoadBalancingConfiguration::default(),
            rate_limit: None,
            bandwidth_limit: BandwidthLimit::default(),
            retry: None,
            deny_paths: Vec::new(),
            timeout: TimeoutConfiguration::default(),
            server_maxconn: None,
            http_server_close: false,
        }
    }
}

impl DatabagModel for RequirerApplicationData {
    const FIELDS: &'static [&'static str] = &[
        "service",
        "ports",
        "protocol",
        "hosts",
        "paths",
        "hostname",
        "additional_hostnames",
        "rewrites",
        "check",
        "load_balancing",
        "rate_limit",
        "bandwidth_limit",
        "retry",
        "deny_paths",
        "timeout",
        "server_maxconn",
        "http_server_close",
    ];

    fn validate(&self) -> Result<()> {
        self.load_balancing.validate()?;
        if let Some(check) = &self.check {
            check.validate()?;
        }
        for rewrite in &self.rewrites {
            rewrite.validate()?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequirerUnitData {
    pub address: IpAddr,
}

impl DatabagModel for RequirerUnitData {
    const FIELDS: &'static [&'static str] = &["address"];
}

/// Endpoints the provider exposes for a requirer's service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HaproxyRouteProviderAppData {
    pub endpoints: Vec<Url>,
}

impl DatabagModel for HaproxyRouteProviderAppData {
    const FIELDS: &'static [&'static str] = &["endpoints"];

    fn validate(&self) -> Result<()> {
        for endpoint in &self.endpoints {
            if !matches!(endpoint.scheme(), "http" | "https") || !endpoint.has_host() {
                return Err(HaproxyRouteError::validation(format!(
                    "{} is not an absolute http(s) URL",
                    endpoint
                )));
            }
        }
        Ok(())
    }
}

/// Everything one requirer relation carries, once validated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HaproxyRouteRequirerData {
    pub relation_id: RelationId,
    pub application_data: RequirerApplicationData,
    pub units_data: Vec<RequirerUnitData>,
}

/// Aggregate of every valid requirer. Service names are unique across it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HaproxyRouteRequirersData {
    requirers_data: Vec<HaproxyRouteRequirerData>,
    relation_ids_with_invalid_data: Vec<RelationId>,
}

impl HaproxyRouteRequirersData {
    pub fn new(
        requirers_data: Vec<HaproxyRouteRequirerData>,
        relation_ids_with_invalid_data: Vec<RelationId>,
    ) -> Result<Self> {
        let mut seen: Vec<&str> = Vec::with_capacity(requirers_data.len());
        let mut duplicates: Vec<&str> = Vec::new();
        for requirer in &requirers_data {
            let service = requirer.application_data.service.as_str();
            if seen.contains(&service) {
                if !duplicates.contains(&service) {
                    duplicates.push(service);
                }
            } else {
                seen.push(service);
            }
        }
        if !duplicates.is_empty() {
            return Err(HaproxyRouteError::DuplicateService(duplicates.join(", ")));
        }

        Ok(Self {
            requirers_data,
            relation_ids_with_invalid_data,
        })
    }

    pub fn requirers_data(&self) -> &[HaproxyRouteRequirerData] {
        &self.requirers_data
    }

    pub fn relation_ids_with_invalid_data(&self) -> &[RelationId] {
        &self.relation_ids_with_invalid_data
    }

    pub fn services(&self) -> impl Iterator<Item = &str> {
        self.requirers_data
            .iter()
            .map(|r| r.application_data.service.as_str())
    }
}
