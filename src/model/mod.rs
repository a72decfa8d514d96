pub mod action;
pub mod context;
#[allow(clippy::module_inception)]
pub mod model;
pub mod state;
pub mod types;

pub use action::{Action, ActionRef, StateActionRef, StateRef, Transition};
pub use context::Context;
pub use model::Model;
pub use state::{EntityDelta, EntityState, EnvState, StateDelta};
pub use types::EntityStateType;
