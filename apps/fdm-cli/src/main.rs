use clap::{Args, Parser, Subcommand};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use fdm_app::{AppError, AppResult, MAX_TIME_COEF, MIN_TIME_COEF, RealTimeWorker, SimulationManager, logging};
use fdm_config::{AircraftDef, EngineDef};
use fdm_core::units;
use fdm_model::{DataInp, DataOut, Phase};
use tracing::info;

#[derive(Parser)]
#[command(name = "fdm-cli")]
#[command(about = "Real-time flight dynamics model - configuration checks, batch and real-time runs", long_about = None)]
struct Cli {
    /// Log filter (e.g. "info", "fdm_model=debug"); overrides RUST_LOG
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load and validate an aircraft configuration file
    Validate {
        /// Path to the aircraft YAML or JSON file
        aircraft: PathBuf,
    },
    /// Summarize an aircraft configuration
    Info {
        /// Path to the aircraft YAML or JSON file
        aircraft: PathBuf,
    },
    /// Run a batch simulation as fast as possible and write CSV telemetry
    Run {
        /// Path to the aircraft YAML or JSON file
        aircraft: PathBuf,
        /// Simulated time in seconds
        #[arg(long, default_value_t = 10.0)]
        duration: f64,
        /// Write one CSV row every N ticks
        #[arg(long, default_value_t = 10)]
        every: usize,
        /// Output CSV file path (optional, defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Print the final output snapshot as JSON on stderr
        #[arg(long)]
        json: bool,
        #[command(flatten)]
        start: StartArgs,
    },
    /// Run on a worker thread at wall-clock pace
    Realtime {
        /// Path to the aircraft YAML or JSON file
        aircraft: PathBuf,
        /// Wall-clock run time in seconds
        #[arg(long, default_value_t = 10.0)]
        duration: f64,
        /// Simulated seconds per wall-clock second
        #[arg(long, default_value_t = 1.0)]
        time_coef: f64,
        #[command(flatten)]
        start: StartArgs,
    },
}

/// Initial conditions and the input snapshot applied at start.
#[derive(Args)]
struct StartArgs {
    /// JSON file holding a full input snapshot; flags below override it
    #[arg(long)]
    input: Option<PathBuf>,
    #[arg(long)]
    lat_deg: Option<f64>,
    #[arg(long)]
    lon_deg: Option<f64>,
    /// Height above terrain in feet
    #[arg(long)]
    altitude_ft: Option<f64>,
    #[arg(long)]
    heading_deg: Option<f64>,
    #[arg(long)]
    airspeed_kts: Option<f64>,
    /// Throttle for every engine, 0..1
    #[arg(long)]
    throttle: Option<f64>,
    /// Start with engines running
    #[arg(long)]
    engines_on: bool,
}

impl StartArgs {
    fn input(&self, def: &AircraftDef) -> AppResult<DataInp> {
        let mut inp = DataInp::for_aircraft(def);
        if let Some(path) = &self.input {
            let given: serde_json::Value = serde_json::from_reader(File::open(path)?)?;
            let mut merged = serde_json::to_value(inp)?;
            overlay(&mut merged, given);
            inp = serde_json::from_value(merged)?;
        }
        let ic = &mut inp.initial;
        if let Some(v) = self.lat_deg {
            ic.latitude = units::deg_to_rad(v);
        }
        if let Some(v) = self.lon_deg {
            ic.longitude = units::deg_to_rad(v);
        }
        if let Some(v) = self.altitude_ft {
            ic.altitude_agl = units::ft_to_m(v);
        }
        if let Some(v) = self.heading_deg {
            ic.heading = units::deg_to_rad(v);
        }
        if let Some(v) = self.airspeed_kts {
            ic.airspeed = units::kts_to_mps(v);
        }
        ic.engines_on |= self.engines_on;
        if let Some(throttle) = self.throttle {
            if !(0.0..=1.0).contains(&throttle) {
                return Err(AppError::InvalidInput(format!("throttle {throttle} outside [0, 1]")));
            }
            for engine in &mut inp.engines {
                engine.throttle = throttle;
            }
        }
        inp.phase = Phase::Work;
        Ok(inp)
    }
}

/// Merge `patch` into `base`, keeping base fields the patch leaves out so a
/// partial file keeps the aircraft's station masses and environment.
fn overlay(base: &mut serde_json::Value, patch: serde_json::Value) {
    match (base, patch) {
        (serde_json::Value::Object(base), serde_json::Value::Object(patch)) => {
            for (key, value) in patch {
                match base.get_mut(&key) {
                    Some(slot) => overlay(slot, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, patch) => *base = patch,
    }
}

fn main() -> AppResult<()> {
    let cli = Cli::parse();
    logging::init(cli.log_level.as_deref())?;

    match cli.command {
        Commands::Validate { aircraft } => cmd_validate(&aircraft),
        Commands::Info { aircraft } => cmd_info(&aircraft),
        Commands::Run {
            aircraft,
            duration,
            every,
            output,
            json,
            start,
        } => cmd_run(&aircraft, duration, every, output.as_deref(), json, &start),
        Commands::Realtime {
            aircraft,
            duration,
            time_coef,
            start,
        } => cmd_realtime(&aircraft, duration, time_coef, &start),
    }
}

fn cmd_validate(path: &Path) -> AppResult<()> {
    println!("Validating aircraft: {}", path.display());
    let def = fdm_config::load(path)?;
    println!("✓ Aircraft '{}' is valid", def.name);
    Ok(())
}

fn cmd_info(path: &Path) -> AppResult<()> {
    let def = fdm_config::load(path)?;
    println!("Aircraft: {}", def.name);
    println!("  Time step:  {} s ({:?})", def.time_step, def.integrator);
    println!("  Navigation: {:?}", def.navigation);

    let stations: f64 = def.mass.stations.iter().map(|s| s.initial).sum();
    println!(
        "  Mass: {:.1} kg empty, {:.1} kg loaded",
        def.mass.empty_mass,
        def.mass.empty_mass + stations
    );
    for station in &def.mass.stations {
        let tank = if station.fuel_tank { " (fuel)" } else { "" };
        println!("    {} {:.1}/{:.1} kg{}", station.name, station.initial, station.max, tank);
    }

    println!("  Engines: {}", def.propulsion.engines.len());
    for engine in &def.propulsion.engines {
        let kind = match engine {
            EngineDef::Piston(_) => "piston",
            EngineDef::Turbojet(_) => "turbojet",
        };
        println!("    {} ({})", engine.name(), kind);
    }

    println!("  Wheels: {}", def.landing_gear.wheels.len());
    for wheel in &def.landing_gear.wheels {
        println!("    {}", wheel.name);
    }

    println!("  Control channels: {}", def.controls.channels.len());
    for channel in &def.controls.channels {
        println!(
            "    {} -> {} ({} elements)",
            channel.name,
            channel.output,
            channel.elements.len()
        );
    }

    if let Some(vne) = def.limits.vne {
        println!("  Vne: {:.0} kts", units::mps_to_kts(vne));
    }
    Ok(())
}

const CSV_HEADER: &str = "time_s,lat_deg,lon_deg,alt_ft,agl_ft,ias_kts,tas_kts,vs_fpm,\
heading_deg,pitch_deg,roll_deg,aoa_deg,load_factor,rpm,thrust_n,fuel_kg,crash";

fn csv_row(out: &DataOut) -> String {
    let f = &out.flight;
    format!(
        "{:.3},{:.6},{:.6},{:.1},{:.1},{:.1},{:.1},{:.0},{:.2},{:.2},{:.2},{:.2},{:.3},{:.0},{:.1},{:.2},{:?}",
        out.sim_time,
        units::rad_to_deg(f.latitude),
        units::rad_to_deg(f.longitude),
        units::m_to_ft(f.altitude_asl),
        units::m_to_ft(f.altitude_agl),
        units::mps_to_kts(f.indicated_airspeed),
        units::mps_to_kts(f.true_airspeed),
        units::mps_to_fpm(f.vertical_speed),
        units::rad_to_deg(f.heading),
        units::rad_to_deg(f.pitch),
        units::rad_to_deg(f.roll),
        units::rad_to_deg(f.angle_of_attack),
        f.load_factor,
        out.engines[0].rpm,
        out.engines.iter().map(|e| e.thrust).sum::<f64>(),
        out.mass.fuel,
        out.crash,
    )
}

fn cmd_run(
    path: &Path,
    duration: f64,
    every: usize,
    output: Option<&Path>,
    json: bool,
    start: &StartArgs,
) -> AppResult<()> {
    if !(duration > 0.0) {
        return Err(AppError::InvalidInput(format!("duration {duration} must be positive")));
    }
    let def = fdm_config::load(path)?;
    let inp = start.input(&def)?;
    let mut manager = SimulationManager::new(def);
    manager.set_input(inp);

    let mut sink: Box<dyn Write> = match output {
        Some(p) => Box::new(BufWriter::new(File::create(p)?)),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };
    writeln!(sink, "{CSV_HEADER}")?;

    let every = every.max(1);
    let dt = manager.time_step() * inp.time_coef.clamp(MIN_TIME_COEF, MAX_TIME_COEF);
    let ticks = (duration / dt).round() as usize;
    let started = Instant::now();
    let mut rows = 0usize;
    for k in 0..ticks {
        let out = *manager.tick();
        if let Some(err) = manager.last_error() {
            return Err(err.clone().into());
        }
        if k % every == 0 || out.crash.is_crash() {
            writeln!(sink, "{}", csv_row(&out))?;
            rows += 1;
        }
        if out.crash.is_crash() {
            break;
        }
    }
    sink.flush()?;

    let out = manager.output();
    info!(
        ticks = manager.work_ticks(),
        rows,
        sim_time = out.sim_time,
        wall_s = started.elapsed().as_secs_f64(),
        crash = ?out.crash,
        "batch run finished"
    );
    if let Some(p) = output {
        eprintln!("✓ Wrote {} rows to {}", rows, p.display());
    }
    if json {
        eprintln!("{}", serde_json::to_string_pretty(out)?);
    }
    Ok(())
}

fn cmd_realtime(path: &Path, duration: f64, time_coef: f64, start: &StartArgs) -> AppResult<()> {
    let def = fdm_config::load(path)?;
    let mut inp = start.input(&def)?;
    inp.time_coef = time_coef;
    let period = Duration::from_secs_f64(def.time_step);
    let worker = RealTimeWorker::spawn(SimulationManager::new(def), period, 256)?;
    if !worker.send_input(inp) {
        return Err(AppError::WorkerPanicked);
    }

    let started = Instant::now();
    let run_for = Duration::from_secs_f64(duration.max(0.0));
    let mut last = DataOut::default();
    while started.elapsed() < run_for {
        std::thread::sleep(Duration::from_secs(1).min(run_for.saturating_sub(started.elapsed())));
        if let Some(out) = worker.latest_output() {
            last = out;
        }
        let f = &last.flight;
        println!(
            "t={:7.2}s  phase={:?}  alt={:7.0} ft  ias={:5.1} kts  hdg={:5.1}  crash={:?}",
            last.sim_time,
            last.phase,
            units::m_to_ft(f.altitude_asl),
            units::mps_to_kts(f.indicated_airspeed),
            units::rad_to_deg(f.heading),
            last.crash,
        );
        if last.crash.is_crash() {
            break;
        }
    }

    let manager = worker.shutdown()?;
    if let Some(err) = manager.last_error() {
        return Err(err.clone().into());
    }
    println!(
        "✓ Real-time run finished: {:.2} s simulated in {:.2} s",
        manager.output().sim_time,
        started.elapsed().as_secs_f64()
    );
    Ok(())
}
