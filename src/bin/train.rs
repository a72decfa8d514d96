//! CLI driver: trains a bundled cyber system for N episodes and reports the
//! resulting experience (native feature only).

use clap::{Parser, ValueEnum};
use colored::Colorize;

use cyberxp::agent::{AgentConfig, QLearningAgent};
use cyberxp::cyber_agent::CyberAgent;
use cyberxp::cyber_system::CyberSystem;
use cyberxp::examples::gridworld::Gridworld;
use cyberxp::examples::tic_tac_toe::TicTacToe;
use cyberxp::model::Context;
use cyberxp::{Assistant, ExperienceLevel};

#[derive(Copy, Clone, ValueEnum)]
enum System {
    Gridworld,
    TicTacToe,
}

#[derive(Parser)]
#[command(name = "train", about = "Train a bundled cyber system with tabular Q-learning")]
struct Args {
    #[arg(value_enum, default_value_t = System::Gridworld)]
    system: System,

    #[arg(short, long, default_value_t = 200)]
    episodes: u32,

    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

fn main() {
    let args = Args::parse();
    cyberxp::init_logging(args.verbose);

    match args.system {
        System::Gridworld => run("Gridworld", Gridworld::role("Gridworld"), Box::new(Gridworld::new()), args.episodes),
        System::TicTacToe => run("TicTacToe", TicTacToe::role("TicTacToe"), Box::new(TicTacToe::new()), args.episodes),
    }
}

fn run(model_name: &str, role: cyberxp::Role, mut system: Box<dyn CyberSystem>, episodes: u32) {
    let context = Context::new();
    let model = context.get_or_create(model_name);
    let assistant = Assistant::new(model, role, "trainer", "default");
    let agent = QLearningAgent::new(AgentConfig::default());
    let mut cyber_agent = CyberAgent::new(assistant, agent);

    if let Err(e) = cyber_agent.train(system.as_mut(), episodes) {
        eprintln!("{}", format!("training failed: {e}").red());
        std::process::exit(1);
    }

    let xp = cyber_agent.assistant().experience();
    let best = xp.best_episode().map(|e| e.performance);
    println!(
        "{} {} episodes stored, level={}, best performance={:?}",
        "trained".green(),
        xp.episodes.len(),
        level_name(xp.level),
        best,
    );
}

fn level_name(level: ExperienceLevel) -> &'static str {
    match level {
        ExperienceLevel::None => "none",
        ExperienceLevel::Trainee => "trainee",
        ExperienceLevel::Assistant => "assistant",
        ExperienceLevel::Trainer => "trainer",
    }
}
