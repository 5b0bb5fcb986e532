//! Assemble the text of one scheduler submission
//!
//! A job script is a header followed by one block per operation and a final `wait`. Each
//! block is a commented state-point dump and a command line. The script also keeps track of
//! how many processors its operations asked for.

use crate::db::Job;
use crate::error::{FlowError, Result};

/// Wraps a command so that it runs on `np` processors
pub type MpiWrapper = dyn Fn(&str, u32) -> String;

/// Stock MPI wrapper
pub fn mpirun(cmd: &str, np: u32) -> String {
    format!("mpirun -np {np} {cmd}")
}

/// How the operations of one script run relative to each other
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Composition {
    /// One after another: the script needs as many processors as its largest operation
    Serial,
    /// All started at once: the script needs the sum of all operations' processors
    Parallel,
}

#[derive(Debug, Default)]
pub struct JobScript {
    content: String,
    session: String,
    total_processors: u32,
    peak_processors: u32,
}

impl JobScript {
    pub fn new() -> JobScript {
        JobScript::default()
    }

    pub fn write(&mut self, text: &str) {
        self.content.push_str(text);
    }

    pub fn writeline(&mut self, line: &str) {
        self.content.push_str(line);
        self.content.push('\n');
    }

    /// Name the operation session whose block is written next, used in error messages
    pub fn enter(&mut self, session: &str) {
        self.session = session.to_string();
    }

    /// Informational dump of the job's parameters
    pub fn write_statepoint(&mut self, job: &Job) -> Result<()> {
        let dump = serde_json::to_string_pretty(job.statepoint())?;
        self.writeline("# Statepoint:");
        self.writeline("#");
        for line in dump.lines() {
            self.writeline(&format!("# {line}"));
        }
        self.writeline("");
        Ok(())
    }

    /// Write a command line, MPI-wrapped when it needs more than one processor
    ///
    /// Parallel commands are sent to the background so the next block starts right away.
    /// Returns `np` so that `write_user` implementations can pass it straight on.
    pub fn write_cmd(&mut self, cmd: &str, parallel: bool, np: u32, mpi: Option<&MpiWrapper>) -> Result<u32> {
        let mut line = match (np > 1, mpi) {
            (true, Some(wrap)) => wrap(cmd, np),
            (true, None) => {
                return Err(FlowError::MissingMpiWrapper { session: self.session.clone(), np });
            }
            (false, _) => cmd.to_string(),
        };
        if parallel {
            line.push_str(" &");
        }
        self.writeline(&line);
        Ok(np)
    }

    /// Record the processor need of one operation block
    pub fn account(&mut self, np: u32) {
        self.total_processors += np;
        self.peak_processors = self.peak_processors.max(np);
    }

    pub fn processors(&self, composition: Composition) -> u32 {
        match composition {
            Composition::Serial => self.peak_processors,
            Composition::Parallel => self.total_processors,
        }
    }

    /// Wait for background commands before the script exits
    pub fn finish(&mut self) {
        self.writeline("wait");
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}
