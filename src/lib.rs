//! Reinforcement-learning experience engine for pluggable symbolic cyber
//! systems: typed entity/environment state, an interned action/transition
//! graph, a condition language, role-based reward evaluation, tabular
//! Q-learning, and an assistant layer that turns raw learning into
//! suggestions and warnings (see `SPEC_FULL.md`).

pub mod agent;
pub mod arena;
pub mod assistant;
pub mod condition;
pub mod cyber_agent;
pub mod cyber_system;
pub mod error;
pub mod experience;
pub mod json;
pub mod model;
pub mod role;

pub mod examples;

pub use agent::{AgentConfig, QLearningAgent};
pub use arena::{Actor, SharedArena};
pub use assistant::{ActionOutcome, Assistant, ErrorTag};
pub use condition::{CompareOp, Condition, EntityCondition, FeatureCondition, LogicalOp, RelationshipCondition, PropertyCondition};
pub use cyber_agent::{AgentMode, CyberAgent};
pub use cyber_system::CyberSystem;
pub use error::{Error, Result};
pub use experience::{Episode, Experience, ExperienceLevel, StoreOutcome, ValueTable};
pub use model::{Action, ActionRef, Context, EntityDelta, EntityState, EntityStateType, EnvState, Model, StateActionRef, StateDelta, StateRef, Transition};
pub use role::{OutcomeResult, Role, RewardRules, StateInfo};

/// Installs a terminal logger, mirroring how embedders of this crate are
/// expected to wire up diagnostics; only available with the `native`
/// feature, since a library should never install a logger on a caller's
/// behalf implicitly otherwise.
#[cfg(feature = "native")]
pub fn init_logging(verbose: bool) {
    use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};
    let level = if verbose { LevelFilter::Trace } else { LevelFilter::Info };
    let _ = TermLogger::init(level, Config::default(), TerminalMode::Mixed, ColorChoice::Auto);
}
