use charm_error::CharmError;
use charm_model::{Charm, CharmEvent, EventKey, EventOutcome, Framework, Model, UnitStatus};
use dashboard_config::{DashboardConfig, KubernetesOptions, NGINX_SITE_PATH};
use dashboard_workload::{Container, Layer, LayerService, Override, Startup};
use juju_dashboard::{
    publish_dashboard_ingress, publish_port, ControllerData, IngressRequirer, NginxRouteConfig,
    NginxRouteRequirer, PortScope, CONTROLLER_RELATION_NAME, DASHBOARD_RELATION_NAME,
    INGRESS_RELATION_NAME, NGINX_ROUTE_RELATION_NAME,
};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{debug, info};

pub const CONTAINER_NAME: &str = "dashboard";
pub const SERVICE_NAME: &str = "dashboard";
const DASHBOARD_ROOT: &str = "/srv";
const CONFIG_JS_PATH: &str = "/srv/config.js";
const ENTRYPOINT: &str = "/srv/entrypoint";

/// The pebble layer running the dashboard server
pub fn dashboard_layer() -> Layer {
    let mut services = BTreeMap::new();
    services.insert(
        SERVICE_NAME.to_string(),
        LayerService {
            override_: Override::Replace,
            summary: "dashboard".to_string(),
            command: ENTRYPOINT.to_string(),
            startup: Startup::Enabled,
            environment: BTreeMap::new(),
        },
    );
    Layer {
        summary: "dashboard layer".to_string(),
        description: "pebble config layer for dashboard".to_string(),
        services,
    }
}

/// Juju dashboard in a workload container. Nothing is pushed to the
/// container until a controller is related.
pub struct KubernetesCharm<C: Container> {
    config: KubernetesOptions,
    container: C,
    ingress: IngressRequirer,
    nginx_route: NginxRouteRequirer,
}

impl<C: Container> KubernetesCharm<C> {
    pub fn new(config: KubernetesOptions, container: C) -> Self {
        let port = config.port;
        Self {
            config,
            container,
            ingress: IngressRequirer::new(INGRESS_RELATION_NAME, port),
            nginx_route: NginxRouteRequirer::new(
                NGINX_ROUTE_RELATION_NAME,
                NginxRouteConfig::default(),
            ),
        }
    }

    pub fn container(&self) -> &C {
        &self.container
    }

    pub fn container_mut(&mut self) -> &mut C {
        &mut self.container
    }

    fn on_install(
        &mut self,
        model: &mut Model,
        _: &CharmEvent,
    ) -> Result<EventOutcome, CharmError> {
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

        self.update(model, &data)
    }

    fn on_config_changed(
        &mut self,
        model: &mut Model,
        _: &CharmEvent,
    ) -> Result<EventOutcome, CharmError> {
        self.ingress
            .provide_ingress_requirements(model, self.config.port)?;
        self.sync_nginx_route(model)?;

        let Some(relation) = model.relation(CONTROLLER_RELATION_NAME) else {
            model.set_status(UnitStatus::blocked("Missing controller integration"));
            return Ok(EventOutcome::Handled);
        };
        let data = ControllerData::from_databag(relation.remote_app_data())?;
        self.update(model, &data)
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
                PortScope::ApplicationAndUnit,
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

    fn on_nginx_route_changed(
        &mut self,
        model: &mut Model,
        event: &CharmEvent,
    ) -> Result<EventOutcome, CharmError> {
        let config = self.nginx_route_config(model);
        self.nginx_route.set_config(config);
        self.nginx_route.handle(model, event)?;
        Ok(EventOutcome::Handled)
    }

    fn on_ingress_changed(
        &mut self,
        model: &mut Model,
        _: &CharmEvent,
    ) -> Result<EventOutcome, CharmError> {
        self.ingress
            .provide_ingress_requirements(model, self.config.port)?;
        Ok(EventOutcome::Handled)
    }

    fn nginx_route_config(&self, model: &Model) -> NginxRouteConfig {
        NginxRouteConfig::new(model.app_name(), model.app_name(), self.config.port)
    }

    fn sync_nginx_route(&mut self, model: &mut Model) -> Result<(), CharmError> {
        let config = self.nginx_route_config(model);
        self.nginx_route.set_config(config);
        self.nginx_route.reconcile(model)
    }

    fn update(
        &mut self,
        model: &mut Model,
        data: &ControllerData,
    ) -> Result<EventOutcome, CharmError> {
        let config = DashboardConfig {
            identity_provider_url: Some(data.identity_provider_url.clone()),
            is_juju: data.is_juju,
            analytics_enabled: self.config.analytics_enabled,
            dashboard_root: PathBuf::from(DASHBOARD_ROOT),
            port: self.config.port,
            ..DashboardConfig::new(&data.controller_url)
        };
        let (dashboard_config, nginx_config) = config.generate()?;

        if !self.container.can_connect() {
            info!("Container {} not reachable, deferring", self.container.name());
            model.set_status(UnitStatus::maintenance("Waiting for container."));
            return Ok(EventOutcome::Deferred);
        }

        self.configure(&dashboard_config, &nginx_config)?;
        model.set_status(UnitStatus::Active);
        Ok(EventOutcome::Handled)
    }

    fn configure(&mut self, dashboard_config: &str, nginx_config: &str) -> Result<(), CharmError> {
        self.container
            .add_layer(CONTAINER_NAME, &dashboard_layer(), true)?;
        self.container.push(CONFIG_JS_PATH, dashboard_config)?;
        self.container.push(NGINX_SITE_PATH, nginx_config)?;
        self.container.replan()?;
        self.container.restart(SERVICE_NAME)?;
        debug!("{} restarted", SERVICE_NAME);
        Ok(())
    }
}

impl<C: Container> Charm for KubernetesCharm<C> {
    type Config = KubernetesOptions;

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
            .observe(EventKey::UpgradeCharm, Self::on_config_changed)
            .observe(
                EventKey::relation_changed(NGINX_ROUTE_RELATION_NAME),
                Self::on_nginx_route_changed,
            )
            .observe(
                EventKey::relation_changed(INGRESS_RELATION_NAME),
                Self::on_ingress_changed,
            );
    }

    fn config(&self) -> &KubernetesOptions {
        &self.config
    }

    fn config_mut(&mut self) -> &mut KubernetesOptions {
        &mut self.config
    }
}
