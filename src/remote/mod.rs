//! Access to the repository host.
//!
//! The collector only talks to [`RepoHost`]; [`GitHubClient`] is the
//! production implementation.

pub mod github;

pub use github::GitHubClient;

use crate::error::Result;
use crate::model::{CommitRecord, RepoRef, TimeWindow};

pub type CommitIter<'a> = Box<dyn Iterator<Item = Result<CommitRecord>> + 'a>;

pub trait RepoHost {
    /// Look up `owner/name`. Failure is [`crate::error::ContribError::RepoResolve`].
    fn resolve(&self, full_name: &str) -> Result<RepoRef>;

    /// Commits of `repo` whose timestamp lies inside `window`, in host order.
    ///
    /// Each item may issue remote requests when pulled.
    fn commits<'a>(&'a self, repo: &'a RepoRef, window: &TimeWindow) -> CommitIter<'a>;
}
