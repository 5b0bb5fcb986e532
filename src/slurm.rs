//! Submit job scripts to SLURM and read back the queue

use chrono::Duration;

/// Render the `#SBATCH` header with TinyTemplate
pub mod header;

/// Run sbatch and squeue
pub mod sbatch;

pub use sbatch::Slurm;

/// Format a walltime as `HH:MM:SS`, hours are not wrapped into days
pub fn format_walltime(walltime: &Duration) -> String {
    let seconds = walltime.num_seconds().max(0);
    format!("{:02}:{:02}:{:02}", seconds / 3600, seconds % 3600 / 60, seconds % 60)
}
