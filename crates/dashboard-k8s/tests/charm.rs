use charm_model::testing::Harness;
use charm_model::{CharmEvent, Model, RelationId, UnitStatus};
use dashboard_config::{KubernetesOptions, NGINX_SITE_PATH};
use dashboard_k8s::{dashboard_layer, KubernetesCharm, CONTAINER_NAME};
use dashboard_workload::testing::MemoryContainer;

struct Fixture {
    harness: Harness<KubernetesCharm<MemoryContainer>>,
    rel_id: RelationId,
}

fn harness() -> Harness<KubernetesCharm<MemoryContainer>> {
    let mut model = Model::new("dashboards", "juju-dashboard", "juju-dashboard/0");
    model.set_leader(true);
    model.set_bind_address(Some("10.1.0.7".parse().unwrap()));
    let charm = KubernetesCharm::new(
        KubernetesOptions::default(),
        MemoryContainer::new(CONTAINER_NAME),
    );
    Harness::new(charm, model)
}

fn setup() -> Fixture {
    let mut harness = harness();
    harness.begin_with_initial_hooks().unwrap();

    let rel_id = harness.add_relation("controller", "controller").unwrap();
    harness.add_relation_unit(rel_id, "controller/0").unwrap();
    harness
        .update_relation_data(
            rel_id,
            "controller",
            &[
                ("controller-url", "wss://10.10.10.1:107070"),
                ("is-juju", "True"),
                ("identity-provider-url", ""),
            ],
        )
        .unwrap();
    Fixture { harness, rel_id }
}

fn pull(fixture: &Fixture, path: &str) -> String {
    fixture
        .harness
        .charm()
        .container()
        .file(path)
        .unwrap_or_default()
        .to_string()
}

#[test]
fn test_install() {
    let mut harness = harness();
    harness.emit(CharmEvent::Install).unwrap();
    assert_eq!(
        harness.status(),
        &UnitStatus::maintenance("Awaiting controller relation.")
    );
}

#[test]
fn test_on_controller_relation_changed() {
    let mut fixture = setup();
    fixture
        .harness
        .update_relation_data(fixture.rel_id, "controller", &[("is-juju", "True")])
        .unwrap();

    assert!(pull(&fixture, NGINX_SITE_PATH).contains("https://10.10.10.1:107070"));
    assert!(pull(&fixture, "/srv/config.js").contains("isJuju: true"));
    assert_eq!(fixture.harness.status(), &UnitStatus::Active);

    let container = fixture.harness.charm().container();
    assert_eq!(container.plan, dashboard_layer());
    assert_eq!(
        container.plan.services["dashboard"].command,
        "/srv/entrypoint"
    );
    assert_eq!(container.restarts.last().map(String::as_str), Some("dashboard"));

    let relation = fixture.harness.model().relation_by_id(fixture.rel_id).unwrap();
    assert_eq!(
        relation.local_app_data().get("dashboard-ingress").as_deref(),
        Some("10.1.0.7")
    );
}

#[test]
fn test_missing_controller_url() {
    let mut fixture = setup();
    fixture
        .harness
        .update_relation_data(fixture.rel_id, "controller", &[("controller-url", "")])
        .unwrap();
    assert_eq!(
        fixture.harness.status(),
        &UnitStatus::blocked("Missing controller URL")
    );
}

#[test]
fn test_relation_departed() {
    let mut fixture = setup();
    fixture.harness.model_mut().set_status(UnitStatus::Active);
    fixture.harness.remove_relation(fixture.rel_id).unwrap();
    assert_eq!(
        fixture.harness.status(),
        &UnitStatus::blocked("Missing controller integration")
    );
}

#[test]
fn test_config_changed() {
    let mut fixture = setup();
    assert!(pull(&fixture, "/srv/config.js").contains("analyticsEnabled: true"));

    fixture
        .harness
        .update_config(|options| options.analytics_enabled = false)
        .unwrap();
    assert!(pull(&fixture, "/srv/config.js").contains("analyticsEnabled: false"));
}

#[test]
fn test_config_changed_no_relation() {
    let mut fixture = setup();
    fixture.harness.remove_relation(fixture.rel_id).unwrap();
    fixture.harness.model_mut().set_status(UnitStatus::Active);

    fixture
        .harness
        .update_config(|options| options.analytics_enabled = false)
        .unwrap();
    assert_eq!(
        fixture.harness.status(),
        &UnitStatus::blocked("Missing controller integration")
    );
}

#[test]
fn test_update_status() {
    let mut fixture = setup();
    fixture.harness.disable_hooks();
    fixture
        .harness
        .update_config(|options| options.analytics_enabled = false)
        .unwrap();
    fixture.harness.enable_hooks();
    assert!(pull(&fixture, "/srv/config.js").contains("analyticsEnabled: true"));

    fixture.harness.emit(CharmEvent::UpdateStatus).unwrap();
    assert!(pull(&fixture, "/srv/config.js").contains("analyticsEnabled: false"));
}

#[test]
fn test_upgrade_charm() {
    let mut fixture = setup();
    fixture.harness.disable_hooks();
    fixture
        .harness
        .update_config(|options| options.analytics_enabled = false)
        .unwrap();
    fixture.harness.enable_hooks();
    assert!(pull(&fixture, "/srv/config.js").contains("analyticsEnabled: true"));

    fixture.harness.emit(CharmEvent::UpgradeCharm).unwrap();
    assert!(pull(&fixture, "/srv/config.js").contains("analyticsEnabled: false"));
}

#[test]
fn test_unreachable_container_defers() {
    let mut fixture = setup();
    fixture.harness.charm_mut().container_mut().connected = false;
    fixture
        .harness
        .update_config(|options| options.analytics_enabled = false)
        .unwrap();

    assert_eq!(
        fixture.harness.status(),
        &UnitStatus::maintenance("Waiting for container.")
    );
    assert_eq!(fixture.harness.framework().deferred().count(), 1);
    assert!(pull(&fixture, "/srv/config.js").contains("analyticsEnabled: true"));

    fixture.harness.charm_mut().container_mut().connected = true;
    fixture.harness.emit(CharmEvent::UpdateStatus).unwrap();

    assert_eq!(fixture.harness.framework().deferred().count(), 0);
    assert_eq!(fixture.harness.status(), &UnitStatus::Active);
    assert!(pull(&fixture, "/srv/config.js").contains("analyticsEnabled: false"));
}

#[test]
fn test_dashboard_relation_publishes_port() {
    let mut fixture = setup();
    let dashboard = fixture.harness.add_relation("dashboard", "proxy").unwrap();
    fixture.harness.add_relation_unit(dashboard, "proxy/0").unwrap();

    let relation = fixture.harness.model().relation_by_id(dashboard).unwrap();
    assert_eq!(relation.local_app_data().get("port").as_deref(), Some("8080"));
    assert_eq!(relation.local_unit_data().get("port").as_deref(), Some("8080"));
}

#[test]
fn test_nginx_route_and_ingress_follow_config() {
    let mut fixture = setup();
    let nginx_route = fixture
        .harness
        .add_relation("nginx-route", "nginx-ingress-integrator")
        .unwrap();
    fixture
        .harness
        .add_relation_unit(nginx_route, "nginx-ingress-integrator/0")
        .unwrap();
    let ingress = fixture.harness.add_relation("ingress", "traefik").unwrap();

    let relation = fixture.harness.model().relation_by_id(nginx_route).unwrap();
    assert_eq!(
        relation.local_app_data().get("service-hostname").as_deref(),
        Some("juju-dashboard")
    );
    assert_eq!(
        relation.local_app_data().get("service-namespace").as_deref(),
        Some("dashboards")
    );

    fixture
        .harness
        .update_config(|options| options.port = 9000)
        .unwrap();

    let relation = fixture.harness.model().relation_by_id(nginx_route).unwrap();
    assert_eq!(
        relation.local_app_data().get("service-port").as_deref(),
        Some("9000")
    );
    let relation = fixture.harness.model().relation_by_id(ingress).unwrap();
    assert_eq!(relation.local_app_data().get("port").as_deref(), Some("9000"));
    assert!(pull(&fixture, NGINX_SITE_PATH).contains("listen 9000;"));
}
