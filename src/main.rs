use std::io::stdout;
use std::time::Instant;

use epinet::engine::{DailyStats, TerminalState, YEAR_LIMIT};
use epinet::error::SimResult;
use epinet::graph::{degree_distribution, report_distribution};
use epinet::params::SimulationParams;
use epinet::simulation::Simulation;
use pcg_rand::Pcg64;
use rand::{Rng, SeedableRng};
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(
    name = "epinet",
    about = "Simulates SEIRD epidemic spread over a scale-free contact network"
)]
pub struct Options {
    #[structopt(short = "n", long, default_value = "200")]
    pub population_size: usize,

    #[structopt(short = "i", long, default_value = "10")]
    pub initial_infected: usize,

    #[structopt(long, default_value = "2.5")]
    pub r0: f64,

    #[structopt(long, default_value = "5")]
    pub incubation_period: u32,

    #[structopt(long, default_value = "10")]
    pub infectious_period: u32,

    #[structopt(long, default_value = "0.05")]
    pub recovery_rate: f64,

    #[structopt(long, default_value = "0.0")]
    pub social_distancing: f64,

    #[structopt(long, default_value = "0.0")]
    pub vaccination_rate: f64,

    #[structopt(long, default_value = "0.0")]
    pub mask_usage: f64,

    #[structopt(long, default_value = "0.005")]
    pub infectious_mortality_rate: f64,

    #[structopt(short = "s", long)]
    pub seed_value: Option<u64>,

    /// Stop after this many simulated days even if the epidemic persists.
    #[structopt(short = "d", long, default_value = "365")]
    pub max_days: u32,

    #[structopt(short = "r", long)]
    pub report_degree_distribution: bool,

    /// Emit per-day stats as JSON lines and a final JSON summary.
    #[structopt(short = "j", long)]
    pub json: bool,
}

impl Options {
    fn params(&self) -> SimulationParams {
        SimulationParams {
            population_size: self.population_size,
            initial_infected: self.initial_infected,
            r0: self.r0,
            incubation_period: self.incubation_period,
            infectious_period: self.infectious_period,
            recovery_rate: self.recovery_rate,
            social_distancing: self.social_distancing,
            vaccination_rate: self.vaccination_rate,
            mask_usage: self.mask_usage,
            infectious_mortality_rate: self.infectious_mortality_rate,
        }
    }
}

fn execute(rng: &mut impl Rng, opt: &Options) -> SimResult<()> {
    let start = Instant::now();
    let mut simulation = Simulation::generate(opt.params(), rng)?;

    if opt.report_degree_distribution {
        let distr = degree_distribution(simulation.graph().degrees().into_iter());
        report_distribution(&distr, &mut stdout().lock()).unwrap();
    }

    report_day(opt, &simulation.current_stats());
    while simulation.terminal() == TerminalState::None {
        if simulation.day() >= opt.max_days && simulation.day() < YEAR_LIMIT {
            break;
        }
        let day_before = simulation.day();
        let outcome = simulation.step(rng)?;
        // a step that only declares the year limit does not advance the day
        if outcome.stats.day > day_before {
            report_day(opt, &outcome.stats);
        }
    }

    if opt.json {
        let summary = serde_json::json!({
            "params": simulation.params(),
            "days": simulation.day(),
            "terminal": simulation.terminal(),
            "population_mortality_rate": simulation.population_mortality_rate(),
            "final": simulation.current_stats(),
        });
        println!("{}", summary);
    } else {
        match simulation.terminal() {
            TerminalState::NaturalExtinction => {
                println!("extinct after {} days", simulation.day())
            }
            TerminalState::YearLimit => println!("year limit reached"),
            TerminalState::None => println!("stopped at day {}", simulation.day()),
        }
    }

    println!("runtime_s:{}", start.elapsed().as_secs_f64());
    Ok(())
}

fn report_day(opt: &Options, stats: &DailyStats) {
    if opt.json {
        println!("{}", serde_json::to_string(stats).unwrap());
    } else {
        println!(
            "day {:>3}  S {:>5}  E {:>5}  I {:>5}  R {:>5}  D {:>5}",
            stats.day,
            stats.susceptible,
            stats.exposed,
            stats.infectious,
            stats.recovered,
            stats.deceased
        );
    }
}

fn main() {
    let opt = Options::from_args();

    let mut rng = if let Some(seed_value) = opt.seed_value {
        Pcg64::seed_from_u64(seed_value)
    } else {
        Pcg64::from_entropy()
    };

    if let Err(err) = execute(&mut rng, &opt) {
        eprintln!("error: {}", err);
        std::process::exit(1);
    }
}
