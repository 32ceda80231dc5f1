use chrono::{Timelike, Utc};
use clap::Args;
use punch_reminder_core::{geofence, Config, FileConfigSource, LocationFix};

#[derive(Args)]
pub struct EvaluateArgs {
    /// Latitude in degrees
    #[arg(long, allow_hyphen_values = true)]
    lat: f64,
    /// Longitude in degrees
    #[arg(long, allow_hyphen_values = true)]
    lng: f64,
    /// Local hour to evaluate at (default: current hour)
    #[arg(long, value_parser = clap::value_parser!(u32).range(0..24))]
    hour: Option<u32>,
}

pub fn run(source: &FileConfigSource, args: EvaluateArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_from(source.path())?;
    if !config.office_is_set() {
        return Err("office location is not configured (set office_lat and office_lng)".into());
    }

    let hour = args.hour.unwrap_or_else(|| chrono::Local::now().hour());
    let fix = LocationFix::live("cli", args.lat, args.lng, Utc::now());
    let reading = geofence::evaluate(&fix, &config, hour);

    println!("{}", serde_json::to_string_pretty(&reading)?);
    Ok(())
}
