use chrono::Utc;
use serde::Serialize;
use tinytemplate::TinyTemplate;

use crate::error::Result;
use crate::project::HeaderContext;
use crate::slurm::format_walltime;

/// Rendering context for header
///
/// Job name, processor count and dependencies are passed to sbatch on the command line,
/// because they are only known once every operation block has been written.
#[derive(Serialize)]
struct SbatchHeader {
    project: String,
    walltime: Option<String>,
    hold: bool,
    time_now: String,
}

/// Render the SBATCH header using TinyTemplate
pub fn render_header(context: &HeaderContext) -> Result<String> {
    /// included header template
    static HEADER: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/data/templates/header.txt"));
    let mut tt = TinyTemplate::new();
    tt.set_default_formatter(&tinytemplate::format_unescaped);
    tt.add_template("header", HEADER)?;

    let header = SbatchHeader {
        project: context.project.to_string(),
        walltime: context.walltime.as_ref().map(format_walltime),
        hold: context.hold,
        time_now: Utc::now().to_string(),
    };

    Ok(tt.render("header", &header)?)
}
