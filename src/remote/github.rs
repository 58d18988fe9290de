use super::{CommitIter, RepoHost};
use crate::error::{ContribError, Result};
use crate::model::{CommitRecord, FileChange, RepoRef, TimeWindow};
use chrono::SecondsFormat;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::time::Duration;
use tracing::debug;

const API_ROOT: &str = "https://api.github.com";
const PAGE_SIZE: usize = 100;
const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);
const READ_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Deserialize)]
struct RepoPayload {
    full_name: String,
}

#[derive(Debug, Deserialize)]
struct UserRef {
    login: String,
}

#[derive(Debug, Deserialize)]
struct ListedCommit {
    sha: String,
    author: Option<UserRef>,
}

#[derive(Debug, Deserialize)]
struct CommitDetail {
    #[serde(default)]
    files: Vec<FilePayload>,
}

#[derive(Debug, Deserialize)]
struct FilePayload {
    filename: String,
    #[serde(default)]
    changes: u64,
}

#[derive(Debug, Deserialize)]
struct UserProfile {
    name: Option<String>,
}

/// Builds the record for one listed commit. Files only count when the
/// author resolved to a display name.
fn commit_record(author: Option<String>, detail: Option<CommitDetail>) -> CommitRecord {
    let files = match (&author, detail) {
        (Some(_), Some(detail)) => detail
            .files
            .into_iter()
            .map(|f| FileChange::new(f.filename, f.changes))
            .collect(),
        _ => Vec::new(),
    };
    CommitRecord { author, files }
}

/// Blocking GitHub REST client.
pub struct GitHubClient {
    agent: ureq::Agent,
    token: Option<String>,
    display_names: RefCell<HashMap<String, Option<String>>>,
}

impl GitHubClient {
    pub fn new(token: Option<String>) -> Self {
        let agent = ureq::AgentBuilder::new()
            .user_agent(concat!("contrib-stats/", env!("CARGO_PKG_VERSION")))
            .timeout_connect(CONNECT_TIMEOUT)
            .timeout_read(READ_TIMEOUT)
            .build();
        Self {
            agent,
            token,
            display_names: RefCell::new(HashMap::new()),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> std::result::Result<T, ureq::Error> {
        let url = format!("{API_ROOT}{path}");
        debug!(%url, ?query, "GET");

        let mut request = self
            .agent
            .get(&url)
            .set("Accept", "application/vnd.github+json");
        if let Some(token) = &self.token {
            request = request.set("Authorization", &format!("Bearer {token}"));
        }
        for (key, value) in query {
            request = request.query(key, value);
        }

        let response = request.call()?;
        Ok(response.into_json()?)
    }

    /// Profile display name for `login`, fetched once per login.
    fn display_name(&self, login: &str) -> Result<Option<String>> {
        if let Some(cached) = self.display_names.borrow().get(login) {
            return Ok(cached.clone());
        }
        let profile: UserProfile = self
            .get_json(&format!("/users/{login}"), &[])
            .map_err(|e| remote_error(&format!("user {login}"), e))?;
        self.display_names
            .borrow_mut()
            .insert(login.to_string(), profile.name.clone());
        Ok(profile.name)
    }

    fn commit_detail(&self, repo: &RepoRef, sha: &str) -> Result<CommitDetail> {
        self.get_json(&format!("/repos/{}/commits/{sha}", repo.full_name), &[])
            .map_err(|e| remote_error(&format!("commit {sha}"), e))
    }
}

impl RepoHost for GitHubClient {
    fn resolve(&self, full_name: &str) -> Result<RepoRef> {
        let payload: RepoPayload = self
            .get_json(&format!("/repos/{full_name}"), &[])
            .map_err(|e| resolve_error(full_name, e))?;
        Ok(RepoRef {
            full_name: payload.full_name,
        })
    }

    fn commits<'a>(&'a self, repo: &'a RepoRef, window: &TimeWindow) -> CommitIter<'a> {
        Box::new(CommitPages {
            client: self,
            repo,
            since: window.start.to_rfc3339_opts(SecondsFormat::Secs, true),
            until: window.end.to_rfc3339_opts(SecondsFormat::Secs, true),
            page: 0,
            buffer: VecDeque::new(),
            exhausted: false,
        })
    }
}

/// Lazily walks the paged commit listing, fetching file details per commit.
struct CommitPages<'a> {
    client: &'a GitHubClient,
    repo: &'a RepoRef,
    since: String,
    until: String,
    page: u32,
    buffer: VecDeque<ListedCommit>,
    exhausted: bool,
}

impl CommitPages<'_> {
    fn fetch_page(&mut self) -> Result<()> {
        self.page += 1;
        let query = [
            ("since", self.since.clone()),
            ("until", self.until.clone()),
            ("per_page", PAGE_SIZE.to_string()),
            ("page", self.page.to_string()),
        ];
        let listed: Vec<ListedCommit> = self
            .client
            .get_json(&format!("/repos/{}/commits", self.repo.full_name), &query)
            .map_err(|e| remote_error(&format!("commits of {}", self.repo.full_name), e))?;
        self.absorb_page(listed);
        Ok(())
    }

    /// A page shorter than `PAGE_SIZE` is the last one.
    fn absorb_page(&mut self, listed: Vec<ListedCommit>) {
        if listed.len() < PAGE_SIZE {
            self.exhausted = true;
        }
        self.buffer.extend(listed);
    }

    fn record(&self, listed: ListedCommit) -> Result<CommitRecord> {
        let author = match &listed.author {
            Some(user) => self.client.display_name(&user.login)?,
            None => None,
        };
        // no point fetching files nobody will be credited for
        let detail = match author {
            Some(_) => Some(self.client.commit_detail(self.repo, &listed.sha)?),
            None => None,
        };
        Ok(commit_record(author, detail))
    }
}

impl Iterator for CommitPages<'_> {
    type Item = Result<CommitRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.buffer.is_empty() && !self.exhausted {
            if let Err(e) = self.fetch_page() {
                self.exhausted = true;
                return Some(Err(e));
            }
        }
        let listed = self.buffer.pop_front()?;
        Some(self.record(listed))
    }
}

fn describe(err: ureq::Error) -> String {
    match err {
        ureq::Error::Status(code, response) => {
            format!("{code} {}", response.status_text())
        }
        ureq::Error::Transport(transport) => transport.to_string(),
    }
}

fn resolve_error(full_name: &str, err: ureq::Error) -> ContribError {
    ContribError::RepoResolve {
        repo: full_name.to_string(),
        reason: describe(err),
    }
}

fn remote_error(what: &str, err: ureq::Error) -> ContribError {
    ContribError::Remote(format!("{what}: {}", describe(err)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn listed(value: serde_json::Value) -> Vec<ListedCommit> {
        serde_json::from_value(value).unwrap()
    }

    fn pages<'a>(client: &'a GitHubClient, repo: &'a RepoRef) -> CommitPages<'a> {
        CommitPages {
            client,
            repo,
            since: String::new(),
            until: String::new(),
            page: 1,
            buffer: VecDeque::new(),
            exhausted: false,
        }
    }

    #[test]
    fn null_author_yields_no_author_and_no_files() {
        let client = GitHubClient::new(None);
        let repo = RepoRef { full_name: "o/r".into() };
        let mut pages = pages(&client, &repo);
        pages.absorb_page(listed(json!([{ "sha": "abc", "author": null }])));

        let record = pages.next().unwrap().unwrap();
        assert_eq!(record, CommitRecord { author: None, files: vec![] });
        assert!(pages.next().is_none());
    }

    #[test]
    fn profile_without_name_counts_as_no_author() {
        let client = GitHubClient::new(None);
        let profile: UserProfile = serde_json::from_value(json!({ "login": "ghost", "name": null })).unwrap();
        client
            .display_names
            .borrow_mut()
            .insert("ghost".into(), profile.name);
        let repo = RepoRef { full_name: "o/r".into() };
        let mut pages = pages(&client, &repo);
        pages.absorb_page(listed(json!([{ "sha": "abc", "author": { "login": "ghost" } }])));

        let record = pages.next().unwrap().unwrap();
        assert_eq!(record.author, None);
        assert!(record.files.is_empty());
    }

    #[test]
    fn detail_files_map_with_missing_changes_as_zero() {
        let detail: CommitDetail = serde_json::from_value(json!({
            "sha": "abc",
            "files": [
                { "filename": "src/a.ts", "changes": 4 },
                { "filename": "bin/blob.png" }
            ]
        }))
        .unwrap();

        let record = commit_record(Some("Alice".into()), Some(detail));
        assert_eq!(
            record.files,
            vec![FileChange::new("src/a.ts", 4), FileChange::new("bin/blob.png", 0)]
        );
    }

    #[test]
    fn files_dropped_without_author() {
        let detail: CommitDetail =
            serde_json::from_value(json!({ "files": [{ "filename": "a.ts", "changes": 1 }] })).unwrap();
        assert!(commit_record(None, Some(detail)).files.is_empty());
        assert!(commit_record(Some("Bob".into()), None).files.is_empty());
    }

    #[test]
    fn short_page_ends_listing() {
        let client = GitHubClient::new(None);
        let repo = RepoRef { full_name: "o/r".into() };

        let mut full = pages(&client, &repo);
        let commits: Vec<_> = (0..PAGE_SIZE)
            .map(|i| json!({ "sha": format!("{i:x}"), "author": null }))
            .collect();
        full.absorb_page(listed(serde_json::Value::Array(commits)));
        assert!(!full.exhausted);

        let mut short = pages(&client, &repo);
        short.absorb_page(listed(json!([{ "sha": "a", "author": null }])));
        assert!(short.exhausted);

        let mut empty = pages(&client, &repo);
        empty.absorb_page(Vec::new());
        assert!(empty.exhausted);
        assert!(empty.next().is_none());
    }

    #[test]
    fn missing_repository_maps_to_resolve_error() {
        let response = ureq::Response::new(404, "Not Found", "{}").unwrap();
        let err = resolve_error("o/missing", ureq::Error::Status(404, response));

        assert!(matches!(err, ContribError::RepoResolve { ref repo, ref reason }
            if repo == "o/missing" && reason == "404 Not Found"));
        assert_eq!(err.exit_code(), 4);
    }
}
