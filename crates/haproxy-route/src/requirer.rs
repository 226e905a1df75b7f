use crate::databag::DatabagModel;
use crate::error::{HaproxyRouteError, Result};
use crate::schema::{
    BandwidthLimit, HaproxyRouteProviderAppData, LoadBalancingAlgorithm,
    LoadBalancingConfiguration, Protocol, RateLimit, RateLimitPolicy, RequirerApplicationData,
    RequirerUnitData, Retry, RewriteConfiguration, RewriteMethod, ServerHealthCheck,
    TimeoutConfiguration, DEFAULT_TIMEOUT_SECONDS,
};
use crate::valid_str::{InvalidCharacters, ValidStr};
use crate::HAPROXY_ROUTE_RELATION_NAME;
use charm_model::{CharmEvent, Databag, EventKey, Model};
use std::net::IpAddr;
use tracing::{debug, error, warn};
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequirerEvent {
    /// The provider published valid endpoints
    Ready(Vec<Url>),
    Removed,
}

/// What publishing does with a health check that sets only some of
/// interval, rise and fall
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PartialHealthCheck {
    /// Leave the check out of the published data
    #[default]
    Drop,
    /// Fail with a validation error
    Reject,
}

/// Flattened requirements a charm asks the proxy for.
///
/// Nothing is validated until the requirements are turned into
/// [`RequirerApplicationData`] on publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteRequirements {
    pub service: String,
    pub ports: Vec<u16>,
    pub protocol: Protocol,
    pub hosts: Vec<String>,
    pub paths: Vec<String>,
    pub hostname: Option<String>,
    pub additional_hostnames: Vec<String>,
    pub check_interval: Option<u32>,
    pub check_rise: Option<u32>,
    pub check_fall: Option<u32>,
    pub check_path: Option<String>,
    pub check_port: Option<u16>,
    pub path_rewrite_expressions: Vec<String>,
    pub query_rewrite_expressions: Vec<String>,
    /// (header, expression) pairs
    pub header_rewrite_expressions: Vec<(String, String)>,
    pub load_balancing_algorithm: LoadBalancingAlgorithm,
    pub load_balancing_cookie: Option<String>,
    pub load_balancing_consistent_hashing: bool,
    pub rate_limit_connections_per_minute: Option<u32>,
    pub rate_limit_policy: RateLimitPolicy,
    pub upload_limit: Option<u64>,
    pub download_limit: Option<u64>,
    pub retry_count: Option<u32>,
    pub retry_redispatch: bool,
    pub deny_paths: Vec<String>,
    pub server_timeout: u32,
    pub connect_timeout: u32,
    pub queue_timeout: u32,
    pub server_maxconn: Option<u32>,
    pub unit_address: Option<String>,
    pub http_server_close: bool,
}

impl Default for RouteRequirements {
    fn default() -> Self {
        Self {
            service: String::new(),
            ports: Vec::new(),
            protocol: Protocol::default(),
            hosts: Vec::new(),
            paths: Vec::new(),
            hostname: None,
            additional_hostnames: Vec::new(),
            check_interval: None,
            check_rise: None,
            check_fall: None,
            check_path: None,
            check_port: None,
            path_rewrite_expressions: Vec::new(),
            query_rewrite_expressions: Vec::new(),
            header_rewrite_expressions: Vec::new(),
            load_balancing_algorithm: LoadBalancingAlgorithm::default(),
            load_balancing_cookie: None,
            load_balancing_consistent_hashing: false,
            rate_limit_connections_per_minute: None,
            rate_limit_policy: RateLimitPolicy::default(),
            upload_limit: None,
            download_limit: None,
            retry_count: None,
            retry_redispatch: false,
            deny_paths: Vec::new(),
            server_timeout: DEFAULT_TIMEOUT_SECONDS,
            connect_timeout: DEFAULT_TIMEOUT_SECONDS,
            queue_timeout: DEFAULT_TIMEOUT_SECONDS,
            server_maxconn: None,
            unit_address: None,
            http_server_close: false,
        }
    }
}

fn valid(value: &str) -> Result<ValidStr> {
    value
        .parse()
        .map_err(|e: InvalidCharacters| HaproxyRouteError::validation(e.to_string()))
}

fn valid_all(values: &[String]) -> Result<Vec<ValidStr>> {
    values.iter().map(|v| valid(v)).collect()
}

fn parse_address(value: &str) -> Result<IpAddr> {
    value
        .parse()
        .map_err(|e| HaproxyRouteError::validation(format!("invalid address {}: {}", value, e)))
}

fn non_zero(value: Option<u32>) -> Option<u32> {
    value.filter(|v| *v != 0)
}

impl RouteRequirements {
    pub fn new(service: &str, ports: Vec<u16>) -> Self {
        Self {
            service: service.to_string(),
            ports,
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.service.is_empty() && self.ports.is_empty()
    }

    /// A check is only emitted once interval, rise and fall are all non-zero,
    /// unless `partial_check` asks for incomplete ones to be rejected
    fn health_check(&self, partial_check: PartialHealthCheck) -> Result<Option<ServerHealthCheck>> {
        let interval = non_zero(self.check_interval);
        let rise = non_zero(self.check_rise);
        let fall = non_zero(self.check_fall);
        let set = [interval, rise, fall].iter().filter(|v| v.is_some()).count();
        match (set, partial_check) {
            (0, _) => return Ok(None),
            (3, _) => {}
            (_, PartialHealthCheck::Drop) => {
                debug!("incomplete health check for {}, leaving it out", self.service);
                return Ok(None);
            }
            (_, PartialHealthCheck::Reject) => {}
        }
        Ok(Some(ServerHealthCheck {
            interval,
            rise,
            fall,
            path: self.check_path.as_deref().map(valid).transpose()?,
            port: self.check_port,
        }))
    }

    fn rewrites(&self) -> Result<Vec<RewriteConfiguration>> {
        let mut rewrites = Vec::new();
        for expression in &self.path_rewrite_expressions {
            rewrites.push(RewriteConfiguration {
                method: RewriteMethod::SetPath,
                expression: valid(expression)?,
                header: None,
            });
        }
        for expression in &self.query_rewrite_expressions {
            rewrites.push(RewriteConfiguration {
                method: RewriteMethod::SetQuery,
                expression: valid(expression)?,
                header: None,
            });
        }
        for (header, expression) in &self.header_rewrite_expressions {
            rewrites.push(RewriteConfiguration {
                method: RewriteMethod::SetHeader,
                expression: valid(expression)?,
                header: Some(valid(header)?),
            });
        }
        Ok(rewrites)
    }

    pub fn to_application_data(
        &self,
        partial_check: PartialHealthCheck,
    ) -> Result<RequirerApplicationData> {
        let mut data = RequirerApplicationData::new(valid(&self.service)?, self.ports.clone());
        data.protocol = self.protocol;
        data.hosts = self
            .hosts
            .iter()
            .map(|h| parse_address(h))
            .collect::<Result<_>>()?;
        data.paths = valid_all(&self.paths)?;
        data.hostname = self.hostname.as_deref().map(valid).transpose()?;
        data.additional_hostnames = valid_all(&self.additional_hostnames)?;
        data.rewrites = self.rewrites()?;
        data.check = self.health_check(partial_check)?;
        data.load_balancing = LoadBalancingConfiguration {
            algorithm: self.load_balancing_algorithm,
            cookie: self.load_balancing_cookie.as_deref().map(valid).transpose()?,
            consistent_hashing: self.load_balancing_consistent_hashing,
        };
        data.rate_limit = non_zero(self.rate_limit_connections_per_minute).map(|connections| {
            RateLimit {
                connections_per_minute: connections,
                policy: self.rate_limit_policy,
            }
        });
        data.bandwidth_limit = BandwidthLimit {
            upload: self.upload_limit,
            download: self.download_limit,
        };
        data.retry = non_zero(self.retry_count).map(|count| Retry {
            count,
            redispatch: self.retry_redispatch,
        });
        data.deny_paths = valid_all(&self.deny_paths)?;
        data.timeout = TimeoutConfiguration {
            server: self.server_timeout,
            connect: self.connect_timeout,
            queue: self.queue_timeout,
        };
        data.server_maxconn = self.server_maxconn;
        data.http_server_close = self.http_server_close;

        data.validate()?;
        Ok(data)
    }

    /// Explicit unit address, else the unit's bind address
    pub fn to_unit_data(&self, bind_address: Option<IpAddr>) -> Result<RequirerUnitData> {
        let address = match &self.unit_address {
            Some(address) => parse_address(address)?,
            None => bind_address.ok_or(HaproxyRouteError::MissingUnitAddress)?,
        };
        Ok(RequirerUnitData { address })
    }
}

/// Publishes route requirements and reads back the proxied endpoints
#[derive(Debug, Clone)]
pub struct HaproxyRouteRequirer {
    relation_name: String,
    requirements: RouteRequirements,
    partial_check: PartialHealthCheck,
}

impl HaproxyRouteRequirer {
    pub fn new(relation_name: &str, requirements: RouteRequirements) -> Self {
        Self {
            relation_name: relation_name.to_string(),
            requirements,
            partial_check: PartialHealthCheck::default(),
        }
    }

    pub fn with_partial_health_check(mut self, partial_check: PartialHealthCheck) -> Self {
        self.partial_check = partial_check;
        self
    }

    pub fn partial_health_check(&self) -> PartialHealthCheck {
        self.partial_check
    }

    pub fn relation_name(&self) -> &str {
        &self.relation_name
    }

    pub fn requirements(&self) -> &RouteRequirements {
        &self.requirements
    }

    pub fn event_keys(&self) -> Vec<EventKey> {
        vec![
            EventKey::relation_created(&self.relation_name),
            EventKey::relation_changed(&self.relation_name),
            EventKey::relation_broken(&self.relation_name),
        ]
    }

    pub fn handle(
        &self,
        model: &mut Model,
        event: &CharmEvent,
    ) -> Result<Option<RequirerEvent>> {
        match event.relation() {
            Some(relation) if relation.endpoint == self.relation_name => {}
            _ => return Ok(None),
        }

        match event {
            CharmEvent::RelationCreated(_) | CharmEvent::RelationChanged(_) => {
                self.update_relation_data(model)?;
                let endpoints = self.get_proxied_endpoints(model);
                if endpoints.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(RequirerEvent::Ready(endpoints)))
                }
            }
            CharmEvent::RelationBroken(_) => Ok(Some(RequirerEvent::Removed)),
            _ => Ok(None),
        }
    }

    /// Replace the held requirements without publishing; the next relation
    /// event publishes them
    pub fn set_requirements(&mut self, requirements: RouteRequirements) {
        self.requirements = requirements;
    }

    /// Replace the held requirements and publish them
    pub fn provide_requirements(
        &mut self,
        model: &mut Model,
        requirements: RouteRequirements,
    ) -> Result<()> {
        self.requirements = requirements;
        self.update_relation_data(model)
    }

    pub fn update_relation_data(&self, model: &mut Model) -> Result<()> {
        if self.requirements.is_empty() {
            warn!("Service and ports are not set, skipping haproxy-route update.");
            return Ok(());
        }

        let leader = model.is_leader();
        let bind_address = model.bind_address();
        let Some(relation) = model.relation_mut(&self.relation_name) else {
            debug!("no {} relation, nothing to publish", self.relation_name);
            return Ok(());
        };

        if leader {
            let application_data = self.requirements.to_application_data(self.partial_check)?;
            application_data.dump(relation.local_app_data_mut(), true)?;
        }
        let unit_data = self.requirements.to_unit_data(bind_address)?;
        unit_data.dump(relation.local_unit_data_mut(), true)
    }

    /// Endpoints published by the provider, empty when missing or invalid
    pub fn get_proxied_endpoints(&self, model: &Model) -> Vec<Url> {
        let Some(relation) = model.relation(&self.relation_name) else {
            return Vec::new();
        };
        let databag = relation.remote_app_data();
        if databag.is_empty() {
            return Vec::new();
        }
        match HaproxyRouteProviderAppData::load(databag) {
            Ok(data) => data.endpoints,
            Err(e) => {
                error!("Invalid provider url: {}", e);
                Vec::new()
            }
        }
    }
}

impl Default for HaproxyRouteRequirer {
    fn default() -> Self {
        Self::new(HAPROXY_ROUTE_RELATION_NAME, RouteRequirements::default())
    }
}
