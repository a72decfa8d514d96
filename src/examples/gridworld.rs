//! Deterministic 3×3 grid with a single goal cell (scenario S2).

use std::collections::BTreeMap;

use crate::condition::{CompareOp, Condition, EntityCondition, PropertyCondition};
use crate::model::{Action, EntityState, EnvState, Model};
use crate::role::{OutcomeResult, Role};

pub const WIDTH: i32 = 3;
pub const HEIGHT: i32 = 3;
pub const GOAL_X: i32 = 2;
pub const GOAL_Y: i32 = 2;

/// Agent position on the grid plus a move counter; `execute_action` clamps
/// moves at the boundary rather than rejecting them.
#[derive(Default)]
pub struct Gridworld {
    x: i32,
    y: i32,
    initialised: bool,
}

impl Gridworld {
    pub fn new() -> Self {
        Self::default()
    }

    fn entity_state(&self) -> EntityState {
        let mut props = BTreeMap::new();
        props.insert("x".to_string(), self.x.to_string());
        props.insert("y".to_string(), self.y.to_string());
        EntityState {
            type_name: "Agent".to_string(),
            properties: props,
            relationships: BTreeMap::new(),
        }
    }

    /// `result_reward = {in-progress: -1, succeeded: 10, failed: -10}`.
    pub fn role(model: &str) -> Role {
        let mut role = Role::new(model, "Navigator");
        role.rewards.result_reward.insert(OutcomeResult::InProgress, -1);
        role.rewards.result_reward.insert(OutcomeResult::Succeeded, 10);
        role.rewards.result_reward.insert(OutcomeResult::Failed, -10);
        role.success = Condition::new().with_entity(
            EntityCondition::new("agent")
                .with_property(PropertyCondition::new("x", CompareOp::Equal, GOAL_X.to_string()))
                .with_property(PropertyCondition::new("y", CompareOp::Equal, GOAL_Y.to_string())),
        );
        role
    }
}

impl crate::cyber_system::CyberSystem for Gridworld {
    fn initialize(&mut self, rebuild: bool) {
        if rebuild || !self.initialised {
            self.x = 0;
            self.y = 0;
        }
        self.initialised = true;
    }

    fn clear(&mut self) {
        self.x = 0;
        self.y = 0;
        self.initialised = false;
    }

    fn is_initialised(&self) -> bool {
        self.initialised
    }

    fn synchronize_state(&self, dst: &mut EnvState) {
        dst.entities.insert("agent".to_string(), self.entity_state());
    }

    fn get_available_actions(&self, _role_id: Option<&str>, _smart: bool) -> Vec<Action> {
        ["up", "down", "left", "right"]
            .iter()
            .map(|d| Action::new(*d, vec![]))
            .collect()
    }

    fn execute_action(&mut self, action: &Action) -> bool {
        match action.type_id.as_str() {
            "up" => self.y = (self.y - 1).max(0),
            "down" => self.y = (self.y + 1).min(HEIGHT - 1),
            "left" => self.x = (self.x - 1).max(0),
            "right" => self.x = (self.x + 1).min(WIDTH - 1),
            _ => return false,
        }
        true
    }

    fn interpret_system_state(&self) -> EnvState {
        let mut env = EnvState::new();
        self.synchronize_state(&mut env);
        env
    }

    fn reset_system(&mut self) {
        self.x = 0;
        self.y = 0;
    }

    fn init_failure_conditions(&self, _model: &Model) {}
    fn init_roles(&self, _model: &Model) {}

    fn get_failure_condition(&self) -> Condition {
        Condition::new()
    }

    fn get_system_name(&self) -> String {
        "Gridworld".to_string()
    }

    fn get_system_info(&self, info_id: &str) -> String {
        match info_id {
            "position" => format!("({},{})", self.x, self.y),
            _ => String::new(),
        }
    }

    fn get_configuration(&self) -> String {
        format!("{{\"x\":{},\"y\":{}}}", self.x, self.y)
    }

    fn set_configuration(&mut self, _config: &str) -> bool {
        false
    }

    fn read_entity_configuration(&self, _id: &str) -> String {
        String::new()
    }

    fn write_entity_configuration(&mut self, _id: &str, _config: &str) -> bool {
        false
    }

    fn configure_entity(&mut self, _id: &str, _type_name: &str, _config: &str) -> bool {
        false
    }

    fn remove_entity(&mut self, _id: &str) -> bool {
        false
    }

    fn box_clone(&self) -> Box<dyn crate::cyber_system::CyberSystem> {
        Box::new(Gridworld {
            x: self.x,
            y: self.y,
            initialised: self.initialised,
        })
    }
}
