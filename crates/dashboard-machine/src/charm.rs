use charm_error::CharmError;
use charm_model::{Charm, CharmEvent, EventKey, EventOutcome, Framework, Model, UnitStatus};
use dashboard_config::{DashboardConfig, MachineOptions, NGINX_SITE_PATH};
use dashboard_workload::MachineWorkload;
use haproxy_route::{HaproxyRouteRequirer, RouteRequirements, HAPROXY_ROUTE_RELATION_NAME};
use juju_dashboard::{
    publish_dashboard_ingress, publish_port, ControllerData, PortScope, CONTROLLER_RELATION_NAME,
    DASHBOARD_RELATION_NAME,
};
use std::path::PathBuf;
use tracing::{debug, info};

pub const DEFAULT_DASHBOARD_ROOT: &str = "/srv/juju-dashboard";
pub const HTTPS_PORT: u16 = 443;
const NGINX_SERVICE: &str = "nginx";

/// Juju dashboard on a machine: static files served by the host's nginx,
/// which also proxies the controller API.
pub struct MachineCharm<W: MachineWorkload> {
    config: MachineOptions,
    workload: W,
    dashboard_root: PathBuf,
    nginx_site: PathBuf,
    haproxy_route: HaproxyRouteRequirer,
}

impl<W: MachineWorkload> MachineCharm<W> {
    pub fn new(config: MachineOptions, workload: W) -> Self {
        Self {
            config,
            workload,
            dashboard_root: PathBuf::from(DEFAULT_DASHBOARD_ROOT),
            nginx_site: PathBuf::from(NGINX_SITE_PATH),
            haproxy_route: HaproxyRouteRequirer::default(),
        }
    }

    pub fn with_paths(mut self, dashboard_root: PathBuf, nginx_site: PathBuf) -> Self {
        self.dashboard_root = dashboard_root;
        self.nginx_site = nginx_site;
        self
    }

    pub fn workload(&self) -> &W {
        &self.workload
    }

    pub fn workload_mut(&mut self) -> &mut W {
        &mut self.workload
    }

    pub fn haproxy_route(&self) -> &HaproxyRouteRequirer {
        &self.haproxy_route
    }

    /// nginx moves to the https port once a DNS name is configured
    pub fn listen_port(&self) -> u16 {
        match self.config.dns_name.as_deref() {
            Some(name) if !name.is_empty() => HTTPS_PORT,
            _ => self.config.port,
        }
    }

    fn route_requirements(&self, model: &Model) -> RouteRequirements {
        RouteRequirements::new(model.app_name(), vec![self.listen_port()])
    }

    fn on_install(
        &mut self,
        model: &mut Model,
        _: &CharmEvent,
    ) -> Result<EventOutcome, CharmError> {
        self.workload.install_packages(&[NGINX_SERVICE])?;
        model.open_port(self.listen_port());
        model.set_status(UnitStatus::maintenance("Awaiting controller relation."));
        Ok(EventOutcome::Handled)
    }

    fn on_controller_relation_changed(
        &mut self,
        model: &mut Model,
        event: &CharmEvent,
    ) -> Result<EventOutcome, CharmError> {
        let Some(relation_event) = event.relation() else {
            return Err(CharmError::ShouldNeverHappen(format!("{:?} without a relation", event)));
        };
        let relation = model
            .relation_by_id(relation_event.relation_id)
            .ok_or_else(|| CharmError::RelationNotFound(relation_event.endpoint.clone()))?;
        let data = ControllerData::from_databag(relation.remote_app_data())?;

        publish_dashboard_ingress(model, relation_event.relation_id)?;
        if !data.has_controller_url() {
            model.set_status(UnitStatus::blocked("Missing controller URL"));
            return Ok(EventOutcome::Handled);
        }

        self.sync_port(model)?;
        self.configure(model, &data)?;
        Ok(EventOutcome::Handled)
    }

    fn on_config_changed(
        &mut self,
        model: &mut Model,
        _: &CharmEvent,
    ) -> Result<EventOutcome, CharmError> {
        self.sync_port(model)?;

        let Some(relation) = model.relation(CONTROLLER_RELATION_NAME) else {
            model.set_status(UnitStatus::blocked("Missing controller integration"));
            return Ok(EventOutcome::Handled);
        };
        let data = ControllerData::from_databag(relation.remote_app_data())?;
        self.configure(model, &data)?;
        Ok(EventOutcome::Handled)
    }

    fn on_dashboard_relation_changed(
        &mut self,
        model: &mut Model,
        event: &CharmEvent,
    ) -> Result<EventOutcome, CharmError> {
        if let Some(relation_event) = event.relation() {
            publish_port(
                model,
                relation_event.relation_id,
                self.config.port,
                PortScope::Application,
            )?;
        }
        Ok(EventOutcome::Handled)
    }

    fn on_relation_departed(
        &mut self,
        model: &mut Model,
        _: &CharmEvent,
    ) -> Result<EventOutcome, CharmError> {
        model.set_status(UnitStatus::blocked("Missing controller integration"));
        Ok(EventOutcome::Handled)
    }

    fn on_haproxy_route_event(
        &mut self,
        model: &mut Model,
        event: &CharmEvent,
    ) -> Result<EventOutcome, CharmError> {
        let requirements = self.route_requirements(model);
        if self.haproxy_route.requirements() != &requirements {
            self.haproxy_route.set_requirements(requirements);
        }
        if let Some(outcome) = self.haproxy_route.handle(model, event)? {
            debug!("haproxy-route: {:?}", outcome);
        }
        Ok(EventOutcome::Handled)
    }

    /// Keep exactly the listen port open; haproxy is told whenever it moves
    fn sync_port(&mut self, model: &mut Model) -> Result<(), CharmError> {
        let port = self.listen_port();
        let opened = model.opened_ports();
        if opened == [port] {
            return Ok(());
        }

        for old in opened.into_iter().filter(|p| *p != port) {
            info!("Closing port {}", old);
            model.close_port(old);
        }
        model.open_port(port);

        let requirements = self.route_requirements(model);
        self.haproxy_route.provide_requirements(model, requirements)?;
        Ok(())
    }

    fn configure(&mut self, model: &mut Model, data: &ControllerData) -> Result<(), CharmError> {
        let config = DashboardConfig {
            identity_provider_url: Some(data.identity_provider_url.clone()),
            is_juju: data.is_juju,
            analytics_enabled: self.config.analytics_enabled,
            dashboard_root: self.dashboard_root.clone(),
            port: self.listen_port(),
            dns_name: self.config.dns_name.clone(),
            ..DashboardConfig::new(&data.controller_url)
        };

        for file in config.rendered_files(&self.nginx_site, true, true)? {
            self.workload.write_file(&file)?;
        }

        if self.workload.restart_service(NGINX_SERVICE) {
            model.set_status(UnitStatus::Active);
        } else {
            model.set_status(UnitStatus::blocked("Could not start nginx"));
        }
        Ok(())
    }
}

impl<W: MachineWorkload> Charm for MachineCharm<W> {
    type Config = MachineOptions;

    fn observe(framework: &mut Framework<Self>) {
        framework
            .observe(EventKey::Install, Self::on_install)
            .observe(
                EventKey::relation_changed(CONTROLLER_RELATION_NAME),
                Self::on_controller_relation_changed,
            )
            .observe(
                EventKey::relation_departed(CONTROLLER_RELATION_NAME),
                Self::on_relation_departed,
            )
            .observe(
                EventKey::relation_changed(DASHBOARD_RELATION_NAME),
                Self::on_dashboard_relation_changed,
            )
            .observe(
                EventKey::relation_departed(DASHBOARD_RELATION_NAME),
                Self::on_relation_departed,
            )
            .observe(EventKey::ConfigChanged, Self::on_config_changed)
            .observe(EventKey::UpdateStatus, Self::on_config_changed)
            .observe(EventKey::UpgradeCharm, Self::on_config_changed);

        for key in HaproxyRouteRequirer::default().event_keys() {
            framework.observe(key, Self::on_haproxy_route_event);
        }
        debug!("observing {} relation", HAPROXY_ROUTE_RELATION_NAME);
    }

    fn config(&self) -> &MachineOptions {
        &self.config
    }

    fn config_mut(&mut self) -> &mut MachineOptions {
        &mut self.config
    }
}
