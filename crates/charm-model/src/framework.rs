use crate::event::{CharmEvent, EventKey, EventOutcome};
use crate::model::Model;
use charm_error::CharmError;
use std::collections::VecDeque;
use tracing::{debug, trace};

pub type Handler<C> = fn(&mut C, &mut Model, &CharmEvent) -> Result<EventOutcome, CharmError>;

/// A charm registers its handlers once and is then driven event by event
pub trait Charm: Sized {
    type Config;

    fn observe(framework: &mut Framework<Self>);

    fn config(&self) -> &Self::Config;

    fn config_mut(&mut self) -> &mut Self::Config;
}

/// Explicit handler registry plus the queue of deferred events
pub struct Framework<C> {
    observers: Vec<(EventKey, Handler<C>)>,
    deferred: VecDeque<CharmEvent>,
}

impl<C> Default for Framework<C> {
    fn default() -> Self {
        Self {
            observers: Vec::new(),
            deferred: VecDeque::new(),
        }
    }
}

impl<C> Framework<C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, key: EventKey, handler: Handler<C>) -> &mut Self {
        self.observers.push((key, handler));
        self
    }

    pub fn is_observed(&self, key: &EventKey) -> bool {
        self.observers.iter().any(|(k, _)| k == key)
    }

    pub fn deferred(&self) -> impl Iterator<Item = &CharmEvent> {
        self.deferred.iter()
    }

    /// Deliver `event`. Previously deferred events are re-delivered first,
    /// in the order they were deferred.
    pub fn dispatch(
        &mut self,
        charm: &mut C,
        model: &mut Model,
        event: CharmEvent,
    ) -> Result<(), CharmError> {
        self.reemit(charm, model)?;
        self.run(charm, model, event)
    }

    pub fn reemit(&mut self, charm: &mut C, model: &mut Model) -> Result<(), CharmError> {
        let mut pending = std::mem::take(&mut self.deferred);
        while let Some(event) = pending.pop_front() {
            debug!("Re-emitting deferred event {:?}", event.key());
            if let Err(e) = self.run(charm, model, event.clone()) {
                // the failed event and everything after it stay queued, in order
                pending.push_front(event);
                pending.append(&mut self.deferred);
                self.deferred = pending;
                return Err(e);
            }
        }
        Ok(())
    }

    fn run(
        &mut self,
        charm: &mut C,
        model: &mut Model,
        event: CharmEvent,
    ) -> Result<(), CharmError> {
        let key = event.key();
        let handlers: Vec<Handler<C>> = self
            .observers
            .iter()
            .filter(|(k, _)| *k == key)
            .map(|(_, handler)| *handler)
            .collect();

        if handlers.is_empty() {
            trace!("No observer for {:?}", key);
            return Ok(());
        }

        let mut deferred = false;
        for handler in handlers {
            if handler(charm, model, &event)? == EventOutcome::Deferred {
                deferred = true;
            }
        }

        if deferred {
            debug!("Deferring event {:?}", key);
            self.deferred.push_back(event);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::UnitStatus;

    #[derive(Default)]
    struct Counter {
        installs: u32,
        configs: u32,
        ready: bool,
        failing: bool,
    }

    impl Charm for Counter {
        type Config = ();

        fn observe(framework: &mut Framework<Self>) {
            framework
                .observe(EventKey::Install, |c, _, _| {
                    c.installs += 1;
                    Ok(EventOutcome::Handled)
                })
                .observe(EventKey::ConfigChanged, |c, model, _| {
                    c.configs += 1;
                    if c.failing {
                        return Err(CharmError::WorkloadError("config failed".to_string()));
                    }
                    if c.ready {
                        model.set_status(UnitStatus::Active);
                        Ok(EventOutcome::Handled)
                    } else {
                        Ok(EventOutcome::Deferred)
                    }
                });
        }

        fn config(&self) -> &Self::Config {
            &()
        }

        fn config_mut(&mut self) -> &mut Self::Config {
            unreachable!()
        }
    }

    #[test]
    fn test_deferred_event_is_redelivered_first() {
        let mut framework = Framework::new();
        Counter::observe(&mut framework);
        let mut charm = Counter::default();
        let mut model = Model::new("test", "app", "app/0");

        framework
            .dispatch(&mut charm, &mut model, CharmEvent::ConfigChanged)
            .unwrap();
        assert_eq!(framework.deferred().count(), 1);

        charm.ready = true;
        framework
            .dispatch(&mut charm, &mut model, CharmEvent::Install)
            .unwrap();
        assert_eq!(charm.configs, 2);
        assert_eq!(charm.installs, 1);
        assert_eq!(framework.deferred().count(), 0);
        assert_eq!(model.status(), &UnitStatus::Active);
    }

    #[test]
    fn test_unobserved_event_is_ignored() {
        let mut framework = Framework::new();
        Counter::observe(&mut framework);
        let mut charm = Counter::default();
        let mut model = Model::new("test", "app", "app/0");

        framework
            .dispatch(&mut charm, &mut model, CharmEvent::UpdateStatus)
            .unwrap();
        assert!(!framework.is_observed(&EventKey::UpdateStatus));
        assert_eq!(charm.installs + charm.configs, 0);
    }

    #[test]
    fn test_failed_redelivery_keeps_deferred_events() {
        let mut framework = Framework::new();
        Counter::observe(&mut framework);
        let mut charm = Counter::default();
        let mut model = Model::new("test", "app", "app/0");

        for _ in 0..2 {
            framework
                .dispatch(&mut charm, &mut model, CharmEvent::ConfigChanged)
                .unwrap();
        }
        assert_eq!(framework.deferred().count(), 2);

        charm.failing = true;
        let err = framework
            .dispatch(&mut charm, &mut model, CharmEvent::Install)
            .unwrap_err();
        assert_eq!(err, CharmError::WorkloadError("config failed".to_string()));
        assert_eq!(framework.deferred().count(), 2);
        assert_eq!(charm.installs, 0);

        charm.failing = false;
        charm.ready = true;
        framework
            .dispatch(&mut charm, &mut model, CharmEvent::Install)
            .unwrap();
        assert_eq!(framework.deferred().count(), 0);
        assert_eq!(charm.installs, 1);
        assert_eq!(model.status(), &UnitStatus::Active);
    }
}
