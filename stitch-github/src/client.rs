//! GitHub Issues REST client.
//!
//! Implements [`TicketTracker`] over the v3 REST API. The identity marker is
//! embedded on create and re-embedded on update; list responses have the
//! marker extracted into the structured `identity` field and stripped from
//! the body, so no other code ever sees marker text.

use serde::Deserialize;
use serde_json::json;

use stitch_core::types::{NewTicket, Ticket, TicketPatch, TicketState};

use crate::error::TrackerError;
use crate::marker;

/// GitHub API base URL.
const GITHUB_API_BASE: &str = "https://api.github.com";

/// User-Agent header required by the GitHub API.
const USER_AGENT: &str = "stitch-cli";

/// Issues returned per list page.
const PAGE_SIZE: usize = 100;

/// The ticket tracker interface consumed by the sync pipeline.
///
/// The pipeline holds this as a trait object so tests can substitute an
/// in-memory tracker.
pub trait TicketTracker {
    fn list_tickets(&self, state: TicketState) -> Result<Vec<Ticket>, TrackerError>;
    fn create_ticket(&self, req: &NewTicket) -> Result<u64, TrackerError>;
    fn update_ticket(&self, number: u64, patch: &TicketPatch) -> Result<(), TrackerError>;
    fn close_ticket(&self, number: u64, comment: &str) -> Result<(), TrackerError>;
}

/// GitHub Issues client for a single repository.
#[derive(Debug, Clone)]
pub struct GithubClient {
    repo: String,
    token: String,
    api_base: String,
}

impl GithubClient {
    /// Client for `owner/name` authenticated with a personal access token.
    pub fn new(repo: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            repo: repo.into(),
            token: token.into(),
            api_base: GITHUB_API_BASE.to_owned(),
        }
    }

    /// Override the API base URL (tests against a local stub).
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    pub fn repo(&self) -> &str {
        &self.repo
    }

    fn request(&self, method: &str, url: &str) -> ureq::Request {
        ureq::request(method, url)
            .set("Authorization", &format!("Bearer {}", self.token))
            .set("Accept", "application/vnd.github+json")
            .set("User-Agent", USER_AGENT)
            .set("X-GitHub-Api-Version", "2022-11-28")
    }

    fn issues_url(&self) -> String {
        format!("{}/repos/{}/issues", self.api_base, self.repo)
    }

    fn issue_url(&self, number: u64) -> String {
        format!("{}/{}", self.issues_url(), number)
    }
}

impl TicketTracker for GithubClient {
    fn list_tickets(&self, state: TicketState) -> Result<Vec<Ticket>, TrackerError> {
        let mut tickets = Vec::new();
        let mut page = 1;
        loop {
            let url = format!(
                "{}?state={}&per_page={}&page={}",
                self.issues_url(),
                state,
                PAGE_SIZE,
                page
            );
            let batch: Vec<IssueWire> = self
                .request("GET", &url)
                .call()
                .map_err(|e| map_status(e, &format!("list issues in {}", self.repo)))?
                .into_json()
                .map_err(|e| TrackerError::Parse(e.to_string()))?;

            let done = batch.len() < PAGE_SIZE;
            tickets.extend(into_tickets(batch));
            if done {
                return Ok(tickets);
            }
            page += 1;
        }
    }

    fn create_ticket(&self, req: &NewTicket) -> Result<u64, TrackerError> {
        let payload = json!({
            "title": req.title,
            "body": marker::append_marker(&req.body, &req.identity),
            "labels": req.labels,
            "assignees": req.assignees,
        });
        let created: CreatedWire = self
            .request("POST", &self.issues_url())
            .send_json(payload)
            .map_err(|e| map_status(e, &format!("create issue in {}", self.repo)))?
            .into_json()
            .map_err(|e| TrackerError::Parse(e.to_string()))?;
        tracing::info!("created issue #{} in {}", created.number, self.repo);
        Ok(created.number)
    }

    fn update_ticket(&self, number: u64, patch: &TicketPatch) -> Result<(), TrackerError> {
        let body = match &patch.identity {
            Some(identity) => marker::append_marker(&patch.body, identity),
            None => patch.body.clone(),
        };
        let payload = json!({
            "title": patch.title,
            "body": body,
            "labels": patch.labels,
            "assignees": patch.assignees,
        });
        self.request("PATCH", &self.issue_url(number))
            .send_json(payload)
            .map_err(|e| map_status(e, &format!("update issue #{number}")))?;
        tracing::info!("updated issue #{number} in {}", self.repo);
        Ok(())
    }

    fn close_ticket(&self, number: u64, comment: &str) -> Result<(), TrackerError> {
        if !comment.is_empty() {
            self.request("POST", &format!("{}/comments", self.issue_url(number)))
                .send_json(json!({ "body": comment }))
                .map_err(|e| map_status(e, &format!("comment on issue #{number}")))?;
        }
        self.request("PATCH", &self.issue_url(number))
            .send_json(json!({ "state": "closed" }))
            .map_err(|e| map_status(e, &format!("close issue #{number}")))?;
        tracing::info!("closed issue #{number} in {}", self.repo);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct IssueWire {
    number: u64,
    title: String,
    #[serde(default)]
    body: Option<String>,
    #[serde(default)]
    labels: Vec<LabelWire>,
    #[serde(default)]
    assignees: Vec<AssigneeWire>,
    state: String,
    /// Present when the "issue" is actually a pull request.
    #[serde(default)]
    pull_request: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct LabelWire {
    name: String,
}

#[derive(Debug, Deserialize)]
struct AssigneeWire {
    login: String,
}

#[derive(Debug, Deserialize)]
struct CreatedWire {
    number: u64,
}

/// Convert wire issues to tickets: drop pull requests, extract the identity
/// marker, strip it from the body.
fn into_tickets(batch: Vec<IssueWire>) -> Vec<Ticket> {
    batch
        .into_iter()
        .filter(|issue| issue.pull_request.is_none())
        .map(|issue| {
            let raw_body = issue.body.unwrap_or_default();
            let identity = marker::extract_marker(&raw_body);
            Ticket {
                number: issue.number,
                title: issue.title,
                body: marker::strip_marker(&raw_body),
                labels: issue.labels.into_iter().map(|l| l.name).collect(),
                assignees: issue.assignees.into_iter().map(|a| a.login).collect(),
                state: if issue.state == "open" {
                    TicketState::Open
                } else {
                    TicketState::Closed
                },
                identity,
            }
        })
        .collect()
}

/// Map HTTP failures onto the tracker error taxonomy. GitHub reports rate
/// limiting as 403 with a rate-limit body as well as 429.
fn map_status(err: ureq::Error, what: &str) -> TrackerError {
    match err {
        ureq::Error::Status(401, _) => {
            TrackerError::Auth(format!("{what}: 401 Unauthorized"))
        }
        ureq::Error::Status(403, resp) => {
            let body = resp.into_string().unwrap_or_default();
            if body.to_ascii_lowercase().contains("rate limit") {
                TrackerError::RateLimited(format!("{what}: {body}"))
            } else {
                TrackerError::Auth(format!("{what}: 403 Forbidden: {body}"))
            }
        }
        ureq::Error::Status(404, _) => TrackerError::NotFound(what.to_owned()),
        ureq::Error::Status(429, resp) => {
            let body = resp.into_string().unwrap_or_default();
            TrackerError::RateLimited(format!("{what}: {body}"))
        }
        ureq::Error::Status(code, resp) => {
            let body = resp.into_string().unwrap_or_default();
            TrackerError::Http(format!("{what}: HTTP {code}: {body}"))
        }
        e => TrackerError::Http(e.to_string()),
    }
}
