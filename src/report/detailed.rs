use std::io::Write;

use serde_json::Value;

use crate::db::job::lookup;
use crate::db::JobStore;
use crate::error::Result;
use crate::report::table::tabulate;
use crate::report::JobStatusRecord;

/// One row per job; parameters are read from the job's state-point, not from the record
pub fn format_row(store: &dyn JobStore, status: &JobStatusRecord, parameters: &[String]) -> Result<Vec<String>> {
    let mut row = vec![status.job_id.clone()];
    if !parameters.is_empty() {
        let job = store.open_job(&status.job_id)?;
        for parameter in parameters {
            row.push(lookup(job.statepoint(), parameter).map(format_value).unwrap_or_default());
        }
    }
    row.push(status.submission_status.join(", "));
    row.push(status.operation.clone().unwrap_or_default());
    row.push(status.labels.join(", "));
    Ok(row)
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub fn print_detailed(
    store: &dyn JobStore,
    stati: &[JobStatusRecord],
    parameters: &[String],
    skip_active: bool,
    out: &mut dyn Write,
) -> Result<()> {
    let mut headers = vec!["job_id".to_string()];
    headers.extend(parameters.iter().cloned());
    headers.extend(["status", "next_job", "labels"].map(String::from));

    let rows = stati
        .iter()
        .filter(|status| !(skip_active && status.active))
        .map(|status| format_row(store, status, parameters))
        .collect::<Result<Vec<Vec<String>>>>()?;

    write!(out, "{}", tabulate(&headers, &rows))?;
    Ok(())
}
