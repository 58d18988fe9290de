use crate::cancel::CancelToken;
use crate::error::Result;
use crate::model::{AuthorTally, CommitRecord, StatJob};
use crate::remote::RepoHost;
use crate::report::{RepoProgress, Reporter};

/// Extension token of a changed file: the text after the last `.` of the
/// reported path, case preserved. A path without a dot is its own token.
pub fn file_extension(path: &str) -> &str {
    path.rsplit('.').next().unwrap_or(path)
}

/// Runs one stat job against `host` and returns its tally.
///
/// Repositories are scanned in listed order. Any resolution or query error
/// aborts the job; commits without an attributable author are skipped.
pub fn collect_job(
    host: &dyn RepoHost,
    job: &StatJob,
    reporter: &Reporter,
    cancel: &CancelToken,
) -> Result<AuthorTally> {
    let mut tally = AuthorTally::new();

    for full_name in &job.repositories {
        cancel.check()?;
        let progress = reporter.repo(full_name);
        let repo = host.resolve(full_name)?;

        let mut commits = host.commits(&repo, &job.window);
        loop {
            cancel.check()?;
            let Some(commit) = commits.next() else { break };
            let commit = commit?;
            progress.commit_scanned();
            accumulate(&mut tally, job, &commit, &progress);
        }

        progress.finish();
    }

    Ok(tally)
}

/// Folds the qualifying files of one commit into `tally`.
fn accumulate(tally: &mut AuthorTally, job: &StatJob, commit: &CommitRecord, progress: &RepoProgress) {
    let Some(author) = commit.author.as_deref() else {
        return;
    };

    for file in &commit.files {
        if !job.matches_extension(file_extension(&file.filename)) {
            continue;
        }
        progress.file_change(&file.filename, author, file.changes);
        tally.add(author, file.changes);
    }
}
