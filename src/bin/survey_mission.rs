// Survey mission: plan a coverage path, then fly it while repairing the
// route around obstacles discovered in flight.

use std::path::PathBuf;

use clap::Parser;
use env_logger::Env;
use log::{error, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;

use survey_planner::mission_planning::{
    CoveragePlanner, DynamicMission, MissionReport, ObstacleSchedule, ReplanOutcome,
};
use survey_planner::{MissionConfig, SurveyResult};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Mission configuration (TOML). The sample mission is used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write the plan, execution and statistics to this JSON file
    #[arg(short, long)]
    export: Option<PathBuf>,

    /// Replace the configured obstacle schedule with N random discoveries
    #[arg(short, long, value_name = "N")]
    random_obstacles: Option<usize>,

    /// Seed for the random obstacle schedule
    #[arg(short, long, default_value_t = 42)]
    seed: u64,
}

fn run(args: &Args) -> SurveyResult<()> {
    let config = match &args.config {
        Some(path) => MissionConfig::load(path)?,
        None => {
            let config = MissionConfig::default();
            config.validate()?;
            config
        }
    };

    let mut planning_grid = config.map.build_grid()?;
    let planner = CoveragePlanner::new(config.router.clone(), config.battery);
    let plan = planner.plan(&mut planning_grid);
    info!(
        "plan: {:?}, coverage {}%, {} steps, energy {:.2}, battery left {:.2}",
        plan.status,
        plan.stats.coverage_pct,
        plan.stats.total_steps,
        plan.stats.total_energy,
        plan.stats.battery_remaining
    );

    let schedule = match args.random_obstacles {
        Some(count) => {
            let mut rng = StdRng::seed_from_u64(args.seed);
            ObstacleSchedule::random(&plan.path, count, &mut rng)
        }
        None => config.map.schedule(),
    };
    for (step, cell) in schedule.iter() {
        info!("obstacle {} will be discovered at step {}", cell, step);
    }

    let mut grid = config.map.build_grid()?;
    let summary = DynamicMission::new(&mut grid, plan.path.clone(), config.battery, schedule)
        .with_execution(config.execution.clone())
        .with_replanner(config.replanner.clone())
        .run();

    for outcome in &summary.outcomes {
        match outcome {
            ReplanOutcome::Replanned(event) => info!(
                "step {}: replanned at {} around {}, new path {} cells",
                event.step, event.position, event.obstacle, event.new_path_length
            ),
            ReplanOutcome::NoAlternative { step, position, obstacle } => warn!(
                "step {}: no way around {} from {}, kept previous route",
                step, obstacle, position
            ),
            ReplanOutcome::BudgetExceeded { step, position, obstacle } => warn!(
                "step {}: replanning around {} from {} ran out of budget, kept previous route",
                step, obstacle, position
            ),
        }
    }
    info!(
        "execution: {:?}, {} steps flown, coverage {}%, battery left {:.1}",
        summary.status,
        summary.executed.len(),
        summary.coverage_pct,
        summary.battery_remaining
    );

    if let Some(path) = &args.export {
        MissionReport::new(&plan, Some(summary)).save(path)?;
        info!("report written to {}", path.display());
    }
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    if let Err(e) = run(&args) {
        error!("{}", e);
        std::process::exit(1);
    }
}
