//! Relation helpers shared by the dashboard charms: the controller relation,
//! the port published to proxies, and the nginx-route requirer.

pub mod controller;
pub mod ingress;
pub mod nginx_route;

pub const CONTROLLER_RELATION_NAME: &str = "controller";
pub const DASHBOARD_RELATION_NAME: &str = "dashboard";
pub const INGRESS_RELATION_NAME: &str = "ingress";
pub const NGINX_ROUTE_RELATION_NAME: &str = "nginx-route";

pub use controller::{publish_dashboard_ingress, ControllerData};
pub use ingress::{publish_port, IngressRequirer, PortScope};
pub use nginx_route::{NginxRouteConfig, NginxRouteRequirer};
