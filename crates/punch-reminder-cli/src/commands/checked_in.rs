use std::sync::Arc;

use clap::Args;
use punch_reminder_core::{FileConfigSource, MonitorService};

use super::SideFiles;
use crate::adapters;

#[derive(Args)]
pub struct CheckedInArgs {
    #[command(flatten)]
    files: SideFiles,
}

/// Print whether the check-in app was used since local midnight.
pub fn run(source: FileConfigSource, args: CheckedInArgs) -> Result<(), Box<dyn std::error::Error>> {
    let (fix_file, marker) = args.files.resolve(&source);
    let service = MonitorService::new(Arc::new(source), adapters::desktop(fix_file, marker));
    let status = service.checked_in_today()?;
    println!("{}", serde_json::to_string_pretty(&status)?);
    Ok(())
}
