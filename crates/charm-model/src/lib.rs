pub mod databag;
pub mod event;
pub mod framework;
pub mod model;
pub mod relation;
pub mod status;
pub mod testing;

pub use databag::{Databag, MemoryDatabag};
pub use event::{CharmEvent, EventKey, EventOutcome, RelationEvent};
pub use framework::{Charm, Framework, Handler};
pub use model::Model;
pub use relation::{Relation, RelationId};
pub use status::UnitStatus;
