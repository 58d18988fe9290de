use crate::cancel::CancelToken;
use crate::collect::collect_job;
use crate::error::Result;
use crate::model::{AggregationTable, StatJob};
use crate::remote::RepoHost;
use crate::report::Reporter;

/// Runs every job in order and commits each tally under its label.
///
/// A later job with an already-used label replaces the earlier tally. The
/// table is only returned once every job has completed.
pub fn run_jobs(
    jobs: &[StatJob],
    host: &dyn RepoHost,
    reporter: &Reporter,
    cancel: &CancelToken,
) -> Result<AggregationTable> {
    let mut table = AggregationTable::new();

    for job in jobs {
        reporter.job(&job.label);
        let tally = collect_job(host, job, reporter, cancel)?;
        table.commit(&job.label, tally);
    }

    Ok(table)
}
