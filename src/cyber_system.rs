//! Contract a domain plugin implements to be trained/scored/queried through
//! the shared assistant/agent surface (spec.md §6.1).

use crate::condition::Condition;
use crate::model::{Action, EnvState, Model};

pub trait CyberSystem {
    fn initialize(&mut self, rebuild: bool);
    fn clear(&mut self);
    fn is_initialised(&self) -> bool;

    /// Mutate `dst` to reflect the current system state.
    fn synchronize_state(&self, dst: &mut EnvState);

    /// `smart` is advisory only (spec.md §9, open question 2): the core
    /// never relies on a plugin's pruning guarantee.
    fn get_available_actions(&self, role_id: Option<&str>, smart: bool) -> Vec<Action>;

    /// Returns `false` when the action is malformed or inapplicable.
    fn execute_action(&mut self, action: &Action) -> bool;

    fn interpret_system_state(&self) -> EnvState;
    fn reset_system(&mut self);

    fn init_failure_conditions(&self, model: &Model);
    fn init_roles(&self, model: &Model);
    fn get_failure_condition(&self) -> Condition;

    fn get_system_name(&self) -> String;
    fn get_system_info(&self, info_id: &str) -> String;
    fn get_configuration(&self) -> String;
    fn set_configuration(&mut self, config: &str) -> bool;
    fn read_entity_configuration(&self, id: &str) -> String;
    fn write_entity_configuration(&mut self, id: &str, config: &str) -> bool;
    fn configure_entity(&mut self, id: &str, type_name: &str, config: &str) -> bool;
    fn remove_entity(&mut self, id: &str) -> bool;

    /// Cheap, side-effect-free clone used by the training loop to predict a
    /// candidate action's destination state for loop detection (spec.md
    /// §4.9) without mutating the live system.
    fn box_clone(&self) -> Box<dyn CyberSystem>;
}
