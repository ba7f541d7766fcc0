//! Zuma Chain entry point
//!
//! Plays a level headless with the autoplay shooter and reports the outcome.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use zuma_chain::consts::*;
use zuma_chain::sim::{Chain, GameEvent, GamePhase, Shooter, autoplay, tick};
use zuma_chain::{ChainError, LevelSettings};

#[derive(Parser, Debug)]
#[command(name = "zuma-chain", about = "Run a level headless with the autoplay shooter")]
struct Args {
    /// Level settings JSON (built-in level when omitted)
    #[arg(long)]
    level: Option<PathBuf>,
    /// Override the level seed
    #[arg(long)]
    seed: Option<u64>,
    /// Give up after this many simulated seconds
    #[arg(long, default_value_t = 600.0)]
    max_seconds: f32,
    /// Simulated seconds between autoplay shots
    #[arg(long, default_value_t = 0.75)]
    shot_interval: f32,
    /// Frame time fed to the fixed-step accumulator
    #[arg(long, default_value_t = 1.0 / 30.0)]
    frame_time: f32,
    /// Print the final chain as JSON
    #[arg(long)]
    dump: bool,
}

/// Level instance driven by a fixed-step accumulator
struct Runner {
    chain: Chain,
    shooter: Shooter,
    accumulator: f32,
    shot_timer: f32,
    shot_interval: f32,
    shots: u32,
    misses: u32,
}

impl Runner {
    fn new(settings: &LevelSettings, shot_interval: f32) -> Result<Self, ChainError> {
        let chain = Chain::new(settings)?;
        let shooter = Shooter::new(&chain, settings.seed.wrapping_add(1));
        Ok(Self {
            chain,
            shooter,
            accumulator: 0.0,
            shot_timer: 0.0,
            shot_interval,
            shots: 0,
            misses: 0,
        })
    }

    /// Run simulation ticks for one frame
    fn update(&mut self, dt: f32) {
        let dt = dt.min(0.1);
        self.accumulator += dt;

        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            tick(&mut self.chain, SIM_DT);
            self.accumulator -= SIM_DT;
            substeps += 1;

            self.shot_timer += SIM_DT;
            if self.shot_timer >= self.shot_interval {
                self.shot_timer = 0.0;
                self.shoot();
            }
            self.report_events();
        }
    }

    fn shoot(&mut self) {
        if self.chain.phase() != GamePhase::Playing {
            return;
        }
        let Some(aim) = autoplay::pick_shot(&self.chain, self.shooter.current_color()) else {
            return;
        };
        self.shots += 1;
        if self.shooter.fire(&mut self.chain, aim).is_none() {
            self.misses += 1;
        }
    }

    fn report_events(&mut self) {
        for event in self.chain.drain_events() {
            match event {
                GameEvent::BallsRemoved {
                    count,
                    points,
                    combo,
                    at,
                    ..
                } => {
                    log::info!(
                        "+{} ({} balls, combo {}) at ({:.1}, {:.1})",
                        points,
                        count,
                        combo,
                        at.x,
                        at.y
                    );
                }
                GameEvent::ScoreChanged { score } => log::debug!("Score: {}", score),
                GameEvent::BallInserted { index, color_id } => {
                    log::trace!("Inserted color {} at {}", color_id, index)
                }
                GameEvent::LevelWon | GameEvent::LevelLost => {}
            }
        }
    }
}

fn run(args: &Args) -> Result<GamePhase, ChainError> {
    let mut settings = match &args.level {
        Some(path) => LevelSettings::load(path)?,
        None => LevelSettings::default(),
    };
    if let Some(seed) = args.seed {
        settings.seed = seed;
    }
    if args.frame_time <= 0.0 {
        return Err(ChainError::InvalidSetting {
            field: "frame_time",
            reason: "must be positive".into(),
        });
    }

    let mut runner = Runner::new(&settings, args.shot_interval)?;
    log::info!("Level starting (seed {})", settings.seed);

    let mut elapsed = 0.0;
    while runner.chain.phase() == GamePhase::Playing && elapsed < args.max_seconds {
        runner.update(args.frame_time);
        elapsed += args.frame_time;
    }

    let chain = &runner.chain;
    println!("Outcome: {:?}", chain.phase());
    println!("Score:   {}", chain.score());
    println!("Stars:   {}", chain.stars());
    println!("Shots:   {} ({} missed)", runner.shots, runner.misses);
    println!("Balls:   {}", chain.len());
    println!("Time:    {:.1}s ({} ticks)", elapsed, chain.time_ticks());

    if args.dump {
        println!("{}", serde_json::to_string_pretty(chain.balls())?);
    }
    Ok(chain.phase())
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    match run(&args) {
        Ok(GamePhase::Won) => ExitCode::SUCCESS,
        Ok(_) => ExitCode::from(1),
        Err(e) => {
            log::error!("{e}");
            eprintln!("error: {e}");
            ExitCode::from(2)
        }
    }
}
