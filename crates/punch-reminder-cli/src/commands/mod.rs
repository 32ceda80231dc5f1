use std::path::PathBuf;

use clap::Args;
use punch_reminder_core::FileConfigSource;

pub mod checked_in;
pub mod config;
pub mod evaluate;
pub mod run;

/// Files standing in for location and usage statistics on the desktop.
#[derive(Args)]
pub struct SideFiles {
    /// Position file, JSON `{"latitude": .., "longitude": ..}` (default: position.json next to the config)
    #[arg(long)]
    fix_file: Option<PathBuf>,
    /// Marker file; touching it counts as a check-in (default: checkin next to the config)
    #[arg(long)]
    checkin_marker: Option<PathBuf>,
}

impl SideFiles {
    /// `(fix_file, checkin_marker)`, defaulting to the config's directory.
    pub fn resolve(self, source: &FileConfigSource) -> (PathBuf, PathBuf) {
        let dir = source
            .path()
            .parent()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        (
            self.fix_file.unwrap_or_else(|| dir.join("position.json")),
            self.checkin_marker.unwrap_or_else(|| dir.join("checkin")),
        )
    }
}
