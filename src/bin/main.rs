use std::path::PathBuf;

use clap::Parser;
use lemons::{
    Result,
    config::{Config, Preset},
    learning::policy::Constant,
    simulation::Simulation,
};
use log::info;

#[derive(Parser, Debug)]
#[command(name = "lemons", about = "Train a Q-learning agent on a market for lemons")]
struct Args {
    /// TOML config file. Fields it leaves out take the preset's defaults.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Parameter set used when no config file is given.
    #[arg(short, long, default_value = "dealership")]
    preset: Preset,

    /// Number of training episodes (overrides the config).
    #[arg(short, long)]
    episodes: Option<u32>,

    /// Seed for all random draws (overrides the config).
    #[arg(short, long)]
    seed: Option<u64>,

    /// Greedy evaluation episodes to play after training.
    #[arg(long, default_value_t = 1000)]
    evaluate: u32,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::preset(args.preset),
    };
    if let Some(episodes) = args.episodes {
        config.training.episodes = episodes;
    }
    if args.seed.is_some() {
        config.training.seed = args.seed;
    }

    let mut sim = Simulation::new(&config)?;
    info!(
        "Agent initialized: state shape {:?}, {} actions",
        sim.agent.shape(),
        sim.agent.action_size()
    );

    let report = sim.train(config.training.episodes)?;
    info!(
        "Trained {} episodes: Avg. Reward: {:.2}, deals {}, rejections {}, resales {}",
        report.tally.episodes,
        report.mean_reward,
        report.tally.deals,
        report.tally.rejections,
        report.tally.resales
    );

    if args.evaluate > 0 {
        let greedy = sim.evaluate(args.evaluate)?;
        info!(
            "Greedy policy: Avg. Reward: {:.2}, Deal rate: {:.3}",
            greedy.mean_reward(),
            greedy.deal_rate()
        );
        for action in 0..sim.schedule.action_size() {
            let baseline = sim.evaluate_policy(&Constant(action), args.evaluate)?;
            info!(
                "Always offer {:.2} x price: Avg. Reward: {:.2}, Deal rate: {:.3}",
                sim.schedule.multipliers[action],
                baseline.mean_reward(),
                baseline.deal_rate()
            );
        }
    }

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
