use std::path::{Path, PathBuf};

use crate::db::Job;
use crate::eligibility::Eligibility;
use crate::error::Result;
use crate::project::{HeaderContext, Project};
use crate::script::{JobScript, MpiWrapper};
use crate::slurm::header::render_header;

/// Runs one operation per job by filling `{job}` and `{operation}` into a command template
///
/// Used by the command line interface, where there is no project code to ask.
pub struct CommandProject {
    name: String,
    root: PathBuf,
    operation: String,
    command: String,
    np: u32,
    mpi: Option<Box<MpiWrapper>>,
}

impl CommandProject {
    pub fn new(name: &str, root: &Path, operation: &str, command: &str) -> CommandProject {
        CommandProject {
            name: name.to_string(),
            root: root.to_path_buf(),
            operation: operation.to_string(),
            command: command.to_string(),
            np: 1,
            mpi: None,
        }
    }

    pub fn with_processors(mut self, np: u32) -> CommandProject {
        self.np = np;
        self
    }

    pub fn with_mpi(mut self, wrapper: Box<MpiWrapper>) -> CommandProject {
        self.mpi = Some(wrapper);
        self
    }

    fn render_command(&self, job: &Job, operation: &str) -> String {
        self.command.replace("{job}", job.id()).replace("{operation}", operation)
    }
}

impl Project for CommandProject {
    fn name(&self) -> &str {
        &self.name
    }

    fn root(&self) -> &Path {
        &self.root
    }

    fn eligible(&self, _job: &Job, operation: &str) -> Eligibility {
        Eligibility::from(operation == self.operation)
    }

    fn next_operation(&self, _job: &Job) -> Option<String> {
        Some(self.operation.clone())
    }

    fn mpi_wrapper(&self) -> Option<&MpiWrapper> {
        self.mpi.as_deref()
    }

    fn write_header(&self, script: &mut JobScript, context: &HeaderContext) -> Result<()> {
        script.write(&render_header(context)?);
        Ok(())
    }

    fn write_user(
        &self,
        script: &mut JobScript,
        job: &Job,
        operation: &str,
        parallel: bool,
        mpi: Option<&MpiWrapper>,
    ) -> Result<Option<u32>> {
        script.write_statepoint(job)?;
        let cmd = self.render_command(job, operation);
        script.write_cmd(&cmd, parallel, self.np, mpi).map(Some)
    }
}
