use clap::Parser;
use jetting_core::collaborators::{ConditionsSource, Coordinates, FixedConditionsSource};
use jetting_core::validation::{validate_reference_jet, ReferenceConditionsRequest};
use jetting_core::{
    parse_forecast, JettingEngine, JettingError, JettingRequest, JettingResult, ProfileTable, SessionPlan,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Carburetor jetting calculator with configurable conditions
#[derive(Parser, Debug)]
#[command(name = "jetting-demo")]
#[command(about = "Rotax MAX carburetor jetting calculator", long_about = None)]
struct Args {
    /// Temperature in °C
    #[arg(short, long, allow_hyphen_values = true)]
    temperature: Option<f64>,

    /// Station pressure in hPa
    #[arg(short, long)]
    pressure: Option<f64>,

    /// Relative humidity in %
    #[arg(long)]
    humidity: Option<f64>,

    /// Track elevation in meters (informational)
    #[arg(short, long, allow_hyphen_values = true)]
    altitude: Option<f64>,

    /// Engine model
    #[arg(short, long, default_value = "Senior MAX EVO")]
    engine: String,

    /// Main jet known to work under the reference conditions
    #[arg(short = 'j', long)]
    reference_jet: Option<i64>,

    /// Reference temperature in °C
    #[arg(long, allow_hyphen_values = true)]
    reference_temperature: Option<f64>,

    /// Reference pressure in hPa
    #[arg(long)]
    reference_pressure: Option<f64>,

    /// Reference relative humidity in %
    #[arg(long)]
    reference_humidity: Option<f64>,

    /// Use the sample conditions source for the given "LAT,LON" instead of -t/-p/--humidity
    #[arg(long, value_name = "LAT,LON")]
    sample_weather: Option<String>,

    /// Engine profile table (JSON) replacing the built-in Rotax MAX profiles
    #[arg(long)]
    profiles: Option<PathBuf>,

    /// Evaluate a JSON array of forecast points as a session plan
    #[arg(short, long)]
    forecast: Option<PathBuf>,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,

    /// List available engine profiles and exit
    #[arg(long)]
    list_engines: bool,
}

/// Exit status for input rejected by validation
const EXIT_INVALID_INPUT: u8 = 2;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let profiles = match &args.profiles {
        Some(path) => match ProfileTable::load(path) {
            Ok(table) => table,
            Err(e) => {
                eprintln!("Error: {e}");
                return ExitCode::FAILURE;
            }
        },
        None => ProfileTable::rotax_max(),
    };
    let engine = JettingEngine::with_profiles(profiles);

    if args.list_engines {
        list_engines(&engine);
        return ExitCode::SUCCESS;
    }

    if let Some(path) = &args.forecast {
        return run_forecast(&engine, &args, path);
    }

    let request = match build_request(&args) {
        Ok(r) => r,
        Err(msg) => {
            eprintln!("Error: {msg}");
            return ExitCode::from(EXIT_INVALID_INPUT);
        }
    };

    match engine.calculate(&request) {
        Ok(result) => {
            if args.json {
                print_json(&result);
            } else {
                print_report(&result);
            }
            ExitCode::SUCCESS
        }
        Err(e) => exit_for(&e),
    }
}

fn exit_for(error: &JettingError) -> ExitCode {
    eprintln!("Error: {error}");
    if error.is_bad_request() {
        ExitCode::from(EXIT_INVALID_INPUT)
    } else {
        ExitCode::FAILURE
    }
}

fn build_request(args: &Args) -> Result<JettingRequest, String> {
    let mut request = JettingRequest {
        temperature: args.temperature,
        pressure: args.pressure,
        humidity: args.humidity,
        altitude: args.altitude,
        engine_type: args.engine.clone(),
        reference_jet: args.reference_jet,
        reference_conditions: None,
    };

    if let Some(spec) = &args.sample_weather {
        let (lat, lon) = spec
            .split_once(',')
            .ok_or_else(|| format!("--sample-weather expects LAT,LON, got '{spec}'"))?;
        let parse = |s: &str| s.trim().parse::<f64>().map_err(|e| format!("invalid coordinate '{s}': {e}"));
        let at = Coordinates::new(parse(lat)?, parse(lon)?).map_err(|e| e.to_string())?;

        let source = FixedConditionsSource::default();
        let reading = source.reading_at(at).map_err(|e| e.to_string())?;
        info!(latitude = at.latitude, longitude = at.longitude, "Using sample weather");
        request.temperature = Some(*reading.temperature);
        request.pressure = Some(*reading.pressure);
        request.humidity = Some(*reading.humidity);
        request.altitude = Some(*reading.altitude);
    }

    request.reference_conditions = reference_request(args);
    Ok(request)
}

/// Reference conditions from the flags, if any reference flag was given
fn reference_request(args: &Args) -> Option<ReferenceConditionsRequest> {
    let any = args.reference_temperature.is_some() || args.reference_pressure.is_some() || args.reference_humidity.is_some();
    any.then(|| ReferenceConditionsRequest {
        temperature: args.reference_temperature,
        pressure: args.reference_pressure,
        humidity: args.reference_humidity,
    })
}

fn run_forecast(engine: &JettingEngine, args: &Args, path: &Path) -> ExitCode {
    let contents = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: failed to read {}: {e}", path.display());
            return ExitCode::FAILURE;
        }
    };
    let points = match parse_forecast(&contents) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::from(EXIT_INVALID_INPUT);
        }
    };

    let reference_jet = match args.reference_jet.map(validate_reference_jet).transpose() {
        Ok(jet) => jet,
        Err(e) => return exit_for(&e.into()),
    };
    let reference_conditions = match reference_request(args).as_ref().map(ReferenceConditionsRequest::validate).transpose() {
        Ok(conditions) => conditions,
        Err(e) => return exit_for(&e.into()),
    };

    let plan = engine.recommend_series(&points, &args.engine, reference_jet, reference_conditions.as_ref());

    if args.json {
        match serde_json::to_string_pretty(&plan) {
            Ok(s) => println!("{s}"),
            Err(e) => {
                eprintln!("Error: {e}");
                return ExitCode::FAILURE;
            }
        }
    } else {
        print_plan(&plan);
    }
    ExitCode::SUCCESS
}

fn list_engines(engine: &JettingEngine) {
    let profiles = engine.profiles();
    println!("=== Engine Profiles ===\n");
    for profile in profiles.iter() {
        let marker = if profile.name == profiles.default_name() { " (default)" } else { "" };
        println!("{}{}", profile.name, marker);
        println!(
            "  Jet: {} (range {}), Needle: {} @ {} of {:?}",
            profile.default_jet,
            profile.jet_range,
            profile.default_needle,
            profile.default_needle_position,
            profile.needle_options
        );
    }
}

fn print_json(result: &JettingResult) {
    match serde_json::to_string_pretty(result) {
        Ok(s) => println!("{s}"),
        Err(e) => eprintln!("Error: {e}"),
    }
}

fn print_report(result: &JettingResult) {
    let input = &result.input;
    let calc = &result.calculations;
    let rec = &result.recommendations;

    println!("=== Jetting Calculator ===\n");
    println!(
        "Conditions: {}, {:.1} hPa, {:.0}% RH, {:.0} m",
        input.temperature, *input.pressure, *input.humidity, *input.altitude
    );
    println!("Engine: {}\n", input.engine_type);

    println!("Air density:       {}", calc.current_air_density);
    println!("Reference density: {}", calc.reference_air_density);
    println!("Density ratio:     {:.4}\n", calc.density_ratio);

    println!("Main jet:        {}", rec.main_jet);
    println!("Needle:          {} @ position {}", rec.needle_type, rec.needle_position);
    println!("Float height:    {}", rec.float_height);

    if !result.warnings.is_empty() {
        println!("\nWarnings:");
        for w in &result.warnings {
            println!("  [{}] {}", w.kind, w.message);
        }
    }
}

fn print_plan(plan: &SessionPlan) {
    println!("=== Session Plan: {} ===\n", plan.engine_type);
    println!("{:<12} {:>8} {:>7} {:>7} {:>7}  Warnings", "Point", "Density", "Jet", "Needle", "Float");
    for entry in &plan.entries {
        match &entry.outcome {
            Ok(r) => {
                let warnings: Vec<&str> = r.warnings.iter().map(|w| w.kind.as_str()).collect();
                println!(
                    "{:<12} {:>8.4} {:>7} {:>7} {:>7.1}  {}",
                    entry.label,
                    *r.calculations.current_air_density,
                    r.recommendations.main_jet,
                    r.recommendations.needle_position.value(),
                    *r.recommendations.float_height,
                    warnings.join(", ")
                );
            }
            Err(e) => println!("{:<12} error: {e}", entry.label),
        }
    }

    if let (Some(min), Some(max)) = (plan.min_jet, plan.max_jet) {
        if min == max {
            println!("\nMain jet stays at {min} all session");
        } else {
            println!("\nMain jet ranges from {min} to {max}");
        }
    }
    if plan.any_warnings {
        println!("Some points carry warnings; check the table above");
    }
}
