//! 3×3 tic-tac-toe board from a single role's perspective (scenario S1):
//! only Player1's own marks are tracked, so the role's win condition
//! depends solely on the sequence of moves it chooses.

use std::collections::BTreeMap;

use crate::condition::{CompareOp, Condition, EntityCondition, PropertyCondition};
use crate::model::{Action, EntityState, EnvState, Model};
use crate::role::{OutcomeResult, Role};

const LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

/// Nine cells, each either empty or marked by Player1.
#[derive(Default)]
pub struct TicTacToe {
    marked: [bool; 9],
}

impl TicTacToe {
    pub fn new() -> Self {
        Self::default()
    }

    fn cell_id(row: usize, col: usize) -> String {
        format!("cell_{row}{col}")
    }

    fn has_line(&self) -> bool {
        LINES.iter().any(|line| line.iter().all(|&i| self.marked[i]))
    }

    fn is_full(&self) -> bool {
        self.marked.iter().all(|&m| m)
    }

    pub fn role(model: &str) -> Role {
        let mut role = Role::new(model, "Player1");
        role.rewards.result_reward.insert(OutcomeResult::Succeeded, 1000);
        role.success = Condition::new()
            .with_entity(EntityCondition::new("board").with_property(PropertyCondition::new("won", CompareOp::Equal, "true")));
        role.deadlock = Some(
            Condition::new()
                .with_entity(EntityCondition::new("board").with_property(PropertyCondition::new("full", CompareOp::Equal, "true"))),
        );
        role
    }
}

impl crate::cyber_system::CyberSystem for TicTacToe {
    fn initialize(&mut self, rebuild: bool) {
        if rebuild {
            self.marked = [false; 9];
        }
    }

    fn clear(&mut self) {
        self.marked = [false; 9];
    }

    fn is_initialised(&self) -> bool {
        true
    }

    fn synchronize_state(&self, dst: &mut EnvState) {
        for (i, &marked) in self.marked.iter().enumerate() {
            let row = i / 3;
            let col = i % 3;
            let mut props = BTreeMap::new();
            props.insert("mark".to_string(), marked.to_string());
            dst.entities.insert(
                Self::cell_id(row, col),
                EntityState {
                    type_name: "Cell".to_string(),
                    properties: props,
                    relationships: BTreeMap::new(),
                },
            );
        }
        let mut board_props = BTreeMap::new();
        board_props.insert("won".to_string(), self.has_line().to_string());
        board_props.insert("full".to_string(), self.is_full().to_string());
        dst.entities.insert(
            "board".to_string(),
            EntityState {
                type_name: "Board".to_string(),
                properties: board_props,
                relationships: BTreeMap::new(),
            },
        );
    }

    fn get_available_actions(&self, _role_id: Option<&str>, _smart: bool) -> Vec<Action> {
        let mut out = Vec::new();
        for row in 0..3 {
            for col in 0..3 {
                if !self.marked[row * 3 + col] {
                    out.push(Action::new("move", vec![row.to_string(), col.to_string()]));
                }
            }
        }
        out
    }

    fn execute_action(&mut self, action: &Action) -> bool {
        if action.type_id != "move" || action.params.len() != 2 {
            return false;
        }
        let (Ok(row), Ok(col)) = (action.params[0].parse::<usize>(), action.params[1].parse::<usize>()) else {
            return false;
        };
        if row >= 3 || col >= 3 || self.marked[row * 3 + col] {
            return false;
        }
        self.marked[row * 3 + col] = true;
        true
    }

    fn interpret_system_state(&self) -> EnvState {
        let mut env = EnvState::new();
        self.synchronize_state(&mut env);
        env
    }

    fn reset_system(&mut self) {
        self.marked = [false; 9];
    }

    fn init_failure_conditions(&self, _model: &Model) {}
    fn init_roles(&self, _model: &Model) {}

    fn get_failure_condition(&self) -> Condition {
        Condition::new()
    }

    fn get_system_name(&self) -> String {
        "TicTacToe".to_string()
    }

    fn get_system_info(&self, _info_id: &str) -> String {
        String::new()
    }

    fn get_configuration(&self) -> String {
        self.marked.iter().map(|&m| if m { '1' } else { '0' }).collect()
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
        Box::new(TicTacToe { marked: self.marked })
    }
}
