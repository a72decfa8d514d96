//! End-to-end scenarios and invariants spanning model, role, experience and
//! agent together (spec.md §8).

use cyberxp::agent::{AgentConfig, QLearningAgent};
use cyberxp::condition::{CompareOp, Condition, EntityCondition, FeatureCondition, PropertyCondition};
use cyberxp::cyber_agent::{AgentMode, CyberAgent};
use cyberxp::cyber_system::CyberSystem;
use cyberxp::examples::gridworld::Gridworld;
use cyberxp::examples::tic_tac_toe::TicTacToe;
use cyberxp::experience::{Experience, StoreOutcome};
use cyberxp::model::{Action, ActionRef, Context, StateActionRef, StateRef};
use cyberxp::role::{OutcomeResult, Role};
use cyberxp::{Assistant, ErrorTag};

/// S1 — tic-tac-toe corner/edge/opposite-corner win, performance = 1000·0.9³.
#[test]
fn s1_tic_tac_toe_win_has_discounted_performance() {
    let context = Context::new();
    let model = context.get_or_create("TicTacToe");
    let role = TicTacToe::role("TicTacToe");
    let mut assistant = Assistant::new(model.clone(), role, "trainer", "default");
    let mut system = TicTacToe::new();
    system.initialize(true);

    let initial = model.get_stored(system.interpret_system_state());
    assistant.start_episode(initial);

    let moves = [(0, 0), (0, 2), (0, 1)];
    let mut last_outcome = None;
    for (i, (row, col)) in moves.iter().enumerate() {
        let action = model.encode_action(Action::new("move", vec![row.to_string(), col.to_string()]));
        let outcome = assistant.take_action(&mut system, action, true).unwrap();
        if i == 0 {
            assert_eq!(outcome.result, OutcomeResult::InProgress);
        }
        last_outcome = Some(outcome);
    }

    let outcome = last_outcome.unwrap();
    assert_eq!(outcome.result, OutcomeResult::Succeeded);
    assert_eq!(outcome.reward, 1000);
    assert_eq!(outcome.performance, 729);
}

/// S2 — gridworld deterministic path, performance auto-computed from
/// (in-progress, succeeded) rewards.
#[test]
fn s2_gridworld_path_has_auto_computed_performance() {
    let context = Context::new();
    let model = context.get_or_create("Gridworld");
    let role = Gridworld::role("Gridworld");
    let mut assistant = Assistant::new(model.clone(), role, "trainer", "default");
    assistant.experience_mut().discounting_constant = -1.0;
    let mut system = Gridworld::new();
    system.initialize(true);

    let initial = model.get_stored(system.interpret_system_state());
    assistant.start_episode(initial);

    let moves = ["right", "right", "down", "down"];
    let mut last_outcome = None;
    for m in moves {
        let action = model.encode_action(Action::new(m, vec![]));
        last_outcome = Some(assistant.take_action(&mut system, action, true).unwrap());
    }

    let outcome = last_outcome.unwrap();
    assert_eq!(outcome.result, OutcomeResult::Succeeded);
    assert_eq!(outcome.reward, 10);
    assert_eq!(outcome.performance, 6);
}

/// S6 — optimistic initial values: explore every never-seen action once
/// before repeating (tie-break by list order).
#[test]
fn s6_optimistic_initial_values_cycle_through_actions() {
    let config = AgentConfig {
        initial_value: 5.0,
        fixed_step_size: 0.5,
        sample_average: false,
        discount_rate: 0.9,
        epsilon: 0.0,
        epsilon_reduction: 1.0,
    };
    let mut agent = QLearningAgent::new(config);
    let mut xp = Experience::new("M", "R", "G", "A");
    let state = StateRef(0);
    let actions = [ActionRef(0), ActionRef(1), ActionRef(2)];

    let first = agent.choose_action(&mut xp, &actions, state, true);
    assert_eq!(first, 0);
    xp.values.set(StateActionRef(state, ActionRef(0)), 4.0);

    let second = agent.choose_action(&mut xp, &actions, state, true);
    assert_eq!(second, 1);
    xp.values.set(StateActionRef(state, ActionRef(1)), 4.0);

    let third = agent.choose_action(&mut xp, &actions, state, true);
    assert_eq!(third, 2);
}

/// Invariant 3 restated at the `Assistant` level: simultaneous success and
/// failure resolves to failure.
#[test]
fn failure_takes_precedence_through_assistant() {
    struct Toggle {
        ok: bool,
        burnt: bool,
    }
    impl CyberSystem for Toggle {
        fn initialize(&mut self, _rebuild: bool) {}
        fn clear(&mut self) {}
        fn is_initialised(&self) -> bool {
            true
        }
        fn synchronize_state(&self, _dst: &mut cyberxp::EnvState) {}
        fn get_available_actions(&self, _role_id: Option<&str>, _smart: bool) -> Vec<Action> {
            vec![]
        }
        fn execute_action(&mut self, _action: &Action) -> bool {
            self.ok = true;
            self.burnt = true;
            true
        }
        fn interpret_system_state(&self) -> cyberxp::EnvState {
            let mut env = cyberxp::EnvState::new();
            let mut x = cyberxp::EntityState::new("T", &Default::default());
            x.properties.insert("Ok".into(), self.ok.to_string());
            env.entities.insert("X".into(), x);
            let mut y = cyberxp::EntityState::new("T", &Default::default());
            y.properties.insert("Burnt".into(), self.burnt.to_string());
            env.entities.insert("Y".into(), y);
            env
        }
        fn reset_system(&mut self) {}
        fn init_failure_conditions(&self, _model: &cyberxp::Model) {}
        fn init_roles(&self, _model: &cyberxp::Model) {}
        fn get_failure_condition(&self) -> Condition {
            Condition::new()
        }
        fn get_system_name(&self) -> String {
            "Toggle".into()
        }
        fn get_system_info(&self, _info_id: &str) -> String {
            String::new()
        }
        fn get_configuration(&self) -> String {
            String::new()
        }
        fn set_configuration(&mut self, _config: &str) -> bool {
            true
        }
        fn read_entity_configuration(&self, _id: &str) -> String {
            String::new()
        }
        fn write_entity_configuration(&mut self, _id: &str, _config: &str) -> bool {
            true
        }
        fn configure_entity(&mut self, _id: &str, _type_name: &str, _config: &str) -> bool {
            true
        }
        fn remove_entity(&mut self, _id: &str) -> bool {
            true
        }
        fn box_clone(&self) -> Box<dyn CyberSystem> {
            Box::new(Toggle { ok: self.ok, burnt: self.burnt })
        }
    }

    let context = Context::new();
    let model = context.get_or_create("Toggle");
    let mut role = Role::new("Toggle", "Player1");
    role.success = Condition::new().with_entity(
        EntityCondition::new("X").with_property(PropertyCondition::new("Ok", CompareOp::Equal, "true")),
    );
    role.failure = Some(Condition::new().with_entity(
        EntityCondition::new("Y").with_property(PropertyCondition::new("Burnt", CompareOp::Equal, "true")),
    ));

    let mut assistant = Assistant::new(model.clone(), role, "a1", "g1");
    let mut system = Toggle { ok: false, burnt: false };
    let initial = model.get_stored(system.interpret_system_state());
    assistant.start_episode(initial);
    let action = model.encode_action(Action::new("toggle", vec![]));
    let outcome = assistant.take_action(&mut system, action, true).unwrap();
    assert_eq!(outcome.result, OutcomeResult::Failed);
}

/// Boundary: empty available-action list drives `CyberAgent::take_action`
/// straight to deadlock.
#[test]
fn empty_action_list_is_deadlock() {
    struct Stuck;
    impl CyberSystem for Stuck {
        fn initialize(&mut self, _rebuild: bool) {}
        fn clear(&mut self) {}
        fn is_initialised(&self) -> bool {
            true
        }
        fn synchronize_state(&self, _dst: &mut cyberxp::EnvState) {}
        fn get_available_actions(&self, _role_id: Option<&str>, _smart: bool) -> Vec<Action> {
            vec![]
        }
        fn execute_action(&mut self, _action: &Action) -> bool {
            false
        }
        fn interpret_system_state(&self) -> cyberxp::EnvState {
            cyberxp::EnvState::new()
        }
        fn reset_system(&mut self) {}
        fn init_failure_conditions(&self, _model: &cyberxp::Model) {}
        fn init_roles(&self, _model: &cyberxp::Model) {}
        fn get_failure_condition(&self) -> Condition {
            Condition::new()
        }
        fn get_system_name(&self) -> String {
            "Stuck".into()
        }
        fn get_system_info(&self, _info_id: &str) -> String {
            String::new()
        }
        fn get_configuration(&self) -> String {
            String::new()
        }
        fn set_configuration(&mut self, _config: &str) -> bool {
            true
        }
        fn read_entity_configuration(&self, _id: &str) -> String {
            String::new()
        }
        fn write_entity_configuration(&mut self, _id: &str, _config: &str) -> bool {
            true
        }
        fn configure_entity(&mut self, _id: &str, _type_name: &str, _config: &str) -> bool {
            true
        }
        fn remove_entity(&mut self, _id: &str) -> bool {
            true
        }
        fn box_clone(&self) -> Box<dyn CyberSystem> {
            Box::new(Stuck)
        }
    }

    let context = Context::new();
    let model = context.get_or_create("Stuck");
    let role = Role::new("Stuck", "Player1");
    let assistant = Assistant::new(model, role, "a1", "g1");
    let agent = QLearningAgent::new(AgentConfig::default());
    let mut cyber_agent = CyberAgent::new(assistant, agent);
    let mut system = Stuck;
    cyber_agent.start_episode(&mut system);
    let outcome = cyber_agent.take_action(&mut system, AgentMode::DEFAULT, true).unwrap();
    assert_eq!(outcome.result, OutcomeResult::Deadlock);
    assert!(outcome.completed_episode);
}

/// Loop detection filtering out every candidate action (all of them lead
/// back to an already-visited state) reports `deadlock` instead of falling
/// back to the unfiltered, looping candidate list (spec.md §4.9 step 4).
#[test]
fn loop_detection_filtering_out_all_candidates_reports_deadlock() {
    struct Looper;
    impl CyberSystem for Looper {
        fn initialize(&mut self, _rebuild: bool) {}
        fn clear(&mut self) {}
        fn is_initialised(&self) -> bool {
            true
        }
        fn synchronize_state(&self, _dst: &mut cyberxp::EnvState) {}
        fn get_available_actions(&self, _role_id: Option<&str>, _smart: bool) -> Vec<Action> {
            vec![Action::new("spin", vec![])]
        }
        fn execute_action(&mut self, _action: &Action) -> bool {
            true
        }
        fn interpret_system_state(&self) -> cyberxp::EnvState {
            cyberxp::EnvState::new()
        }
        fn reset_system(&mut self) {}
        fn init_failure_conditions(&self, _model: &cyberxp::Model) {}
        fn init_roles(&self, _model: &cyberxp::Model) {}
        fn get_failure_condition(&self) -> Condition {
            Condition::new()
        }
        fn get_system_name(&self) -> String {
            "Looper".into()
        }
        fn get_system_info(&self, _info_id: &str) -> String {
            String::new()
        }
        fn get_configuration(&self) -> String {
            String::new()
        }
        fn set_configuration(&mut self, _config: &str) -> bool {
            true
        }
        fn read_entity_configuration(&self, _id: &str) -> String {
            String::new()
        }
        fn write_entity_configuration(&mut self, _id: &str, _config: &str) -> bool {
            true
        }
        fn configure_entity(&mut self, _id: &str, _type_name: &str, _config: &str) -> bool {
            true
        }
        fn remove_entity(&mut self, _id: &str) -> bool {
            true
        }
        fn box_clone(&self) -> Box<dyn CyberSystem> {
            Box::new(Looper)
        }
    }

    let context = Context::new();
    let model = context.get_or_create("Looper");
    let role = Role::new("Looper", "Player1");
    let assistant = Assistant::new(model, role, "a1", "g1");
    let agent = QLearningAgent::new(AgentConfig::default());
    let mut cyber_agent = CyberAgent::new(assistant, agent);
    let mut system = Looper;
    cyber_agent.start_episode(&mut system);

    let outcome = cyber_agent.take_action(&mut system, AgentMode::DEFAULT, true).unwrap();
    assert_eq!(outcome.result, OutcomeResult::Deadlock);
    assert!(outcome.completed_episode);
}

/// Boundary: `choose_action` on an empty candidate list returns -1, and
/// `QLearningAgent::learn` is a no-op on an empty transition sequence.
#[test]
fn choose_action_empty_returns_sentinel_and_learn_on_empty_is_noop() {
    let mut agent = QLearningAgent::new(AgentConfig::default());
    let mut xp = Experience::new("M", "R", "G", "A");
    assert_eq!(agent.choose_action(&mut xp, &[], StateRef(0), true), -1);

    let context = Context::new();
    let model = context.get_or_create("Empty");
    let role = Role::new("Empty", "R");
    agent.learn(&mut xp, &model, &role, &[], OutcomeResult::Succeeded);
    assert!(xp.values.iter().next().is_none());
}

/// Boundary: a `defined` feature reward with a non-numeric value adds the
/// reward exactly once (multiplier of 1).
#[test]
fn non_numeric_defined_feature_reward_uses_multiplier_one() {
    let mut role = Role::new("M", "R");
    role.rewards.result_reward.insert(OutcomeResult::Succeeded, 100);
    role.success = Condition::new().with_feature(FeatureCondition::new("tag", CompareOp::Defined, ""));
    role.rewards.feature_terms.push((FeatureCondition::new("tag", CompareOp::Defined, ""), 10));

    let mut env = cyberxp::EnvState::new();
    env.features.insert("tag".into(), "not-a-number".into());
    let info = role.state_info(&env);
    assert_eq!(info.result, OutcomeResult::Succeeded);
    assert_eq!(info.reward, 110);
}

/// Invariant 6 at the `Assistant` level: replaying a winning tic-tac-toe
/// game exactly does not grow `episodes`, but increments `repetitions`.
#[test]
fn replaying_winning_game_suppresses_duplicate_episode() {
    let context = Context::new();
    let model = context.get_or_create("TicTacToeReplay");
    let role = TicTacToe::role("TicTacToeReplay");
    let mut assistant = Assistant::new(model.clone(), role, "trainer", "default");

    let moves = [(0, 0), (0, 2), (0, 1)];
    for round in 0..2 {
        let mut system = TicTacToe::new();
        system.initialize(true);
        let initial = model.get_stored(system.interpret_system_state());
        assistant.start_episode(initial);
        for (row, col) in moves {
            let action = model.encode_action(Action::new("move", vec![row.to_string(), col.to_string()]));
            assistant.take_action(&mut system, action, true).unwrap();
        }
        if round == 0 {
            assert_eq!(assistant.experience().episodes.len(), 1);
        }
    }
    assert_eq!(assistant.experience().episodes.len(), 1);
    assert_eq!(assistant.experience().episodes[0].repetitions, 1);
}

/// Round-trip: an `Assistant`'s denied action leaves the episode untouched
/// and signals `stuck`/`no-action-found` (spec.md §7 action-outcome shape).
#[test]
fn denied_action_reports_stuck_and_error_tag() {
    struct Rejector;
    impl CyberSystem for Rejector {
        fn initialize(&mut self, _rebuild: bool) {}
        fn clear(&mut self) {}
        fn is_initialised(&self) -> bool {
            true
        }
        fn synchronize_state(&self, _dst: &mut cyberxp::EnvState) {}
        fn get_available_actions(&self, _role_id: Option<&str>, _smart: bool) -> Vec<Action> {
            vec![Action::new("noop", vec![])]
        }
        fn execute_action(&mut self, _action: &Action) -> bool {
            false
        }
        fn interpret_system_state(&self) -> cyberxp::EnvState {
            cyberxp::EnvState::new()
        }
        fn reset_system(&mut self) {}
        fn init_failure_conditions(&self, _model: &cyberxp::Model) {}
        fn init_roles(&self, _model: &cyberxp::Model) {}
        fn get_failure_condition(&self) -> Condition {
            Condition::new()
        }
        fn get_system_name(&self) -> String {
            "Rejector".into()
        }
        fn get_system_info(&self, _info_id: &str) -> String {
            String::new()
        }
        fn get_configuration(&self) -> String {
            String::new()
        }
        fn set_configuration(&mut self, _config: &str) -> bool {
            true
        }
        fn read_entity_configuration(&self, _id: &str) -> String {
            String::new()
        }
        fn write_entity_configuration(&mut self, _id: &str, _config: &str) -> bool {
            true
        }
        fn configure_entity(&mut self, _id: &str, _type_name: &str, _config: &str) -> bool {
            true
        }
        fn remove_entity(&mut self, _id: &str) -> bool {
            true
        }
        fn box_clone(&self) -> Box<dyn CyberSystem> {
            Box::new(Rejector)
        }
    }

    let context = Context::new();
    let model = context.get_or_create("Rejector");
    let role = Role::new("Rejector", "Player1");
    let mut assistant = Assistant::new(model.clone(), role, "a1", "g1");
    let mut system = Rejector;
    let initial = model.get_stored(system.interpret_system_state());
    assistant.start_episode(initial);
    let action = model.encode_action(Action::new("noop", vec![]));
    let outcome = assistant.take_action(&mut system, action, true).unwrap();
    assert!(outcome.stuck);
    assert_eq!(outcome.error, ErrorTag::NoActionFound);
    assert!(!outcome.completed_episode);
}

/// `CyberAgent::train` runs to completion and stores at least one episode
/// for a solvable deterministic environment (gridworld).
#[test]
fn training_loop_completes_and_stores_episodes() {
    let context = Context::new();
    let model = context.get_or_create("GridTrain");
    let role = Gridworld::role("GridTrain");
    let assistant = Assistant::new(model, role, "trainer", "default");
    let agent = QLearningAgent::new(AgentConfig::default());
    let mut cyber_agent = CyberAgent::new(assistant, agent);
    let mut system = Gridworld::new();

    cyber_agent.train(&mut system, 5).unwrap();
    let total_plays: usize = cyber_agent
        .assistant()
        .experience()
        .episodes
        .iter()
        .map(|e| 1 + e.repetitions as usize)
        .sum();
    assert_eq!(total_plays, 5);
}

/// Experience JSON round trip (invariant: `parse(serialize(x)) == x`).
#[test]
fn experience_json_round_trip_preserves_values_and_episodes() {
    use cyberxp::experience::Episode;

    let context = Context::new();
    let model = context.get_or_create("ExperienceRoundTrip");
    let action_ref = model.encode_action(Action::new("advance", vec!["1".into()]));

    let mut xp = Experience::new("M", "R", "G", "A");
    let mut ep = Episode::new(StateRef(0));
    ep.transitions = vec![cyberxp::Transition {
        start: StateRef(0),
        action: action_ref,
        end: StateRef(1),
    }];
    ep.last = StateRef(1);
    ep.result = OutcomeResult::Succeeded;
    ep.performance = 42;
    assert!(matches!(xp.store_episode(ep, true), StoreOutcome::Stored));
    xp.values.set(StateActionRef(StateRef(0), action_ref), 1.5);

    let json = cyberxp::json::experience_to_json(&xp, &model).unwrap();
    let back = cyberxp::json::experience_from_json(&json, &model).unwrap();

    assert_eq!(back.episodes.len(), xp.episodes.len());
    assert_eq!(back.episodes[0].transitions, xp.episodes[0].transitions);
    assert_eq!(
        back.values.get(StateActionRef(StateRef(0), action_ref)),
        xp.values.get(StateActionRef(StateRef(0), action_ref))
    );
}
