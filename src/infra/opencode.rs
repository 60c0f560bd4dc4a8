use crate::domain::{SessionSummary, unix_ms_to_datetime};
use crate::infra::Config;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use url::Url;

/// A permission rule with this name and a `deny` action marks a sub-agent session.
const SUBAGENT_DENIED_PERMISSION: &str = "todowrite";

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("OpenCode server unavailable at {url}: {reason}")]
    Unavailable { url: String, reason: String },

    #[error("unexpected response from {url}: {reason}")]
    Decode { url: String, reason: String },
}

/// The slice of the OpenCode server API the launcher needs.
pub trait SessionService {
    fn list(&self, directory: &str, limit: usize) -> Result<Vec<RemoteSession>, ServiceError>;

    fn messages(
        &self,
        session_id: &str,
        directory: &str,
        limit: usize,
    ) -> Result<Vec<RemoteMessage>, ServiceError>;

    fn create(&self, title: &str, directory: &str) -> Result<String, ServiceError>;
}

#[derive(Clone, Debug, Deserialize)]
pub struct RemoteSession {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub directory: String,
    pub time: RemoteSessionTime,
    #[serde(default)]
    pub permission: Option<Vec<PermissionRule>>,
}

#[derive(Clone, Copy, Debug, Deserialize)]
pub struct RemoteSessionTime {
    pub created: i64,
    pub updated: i64,
}

#[derive(Clone, Debug, Deserialize)]
pub struct PermissionRule {
    pub permission: String,
    pub action: String,
}

impl RemoteSession {
    pub fn is_interactive(&self) -> bool {
        let Some(rules) = self.permission.as_ref() else {
            return true;
        };
        !rules
            .iter()
            .any(|rule| rule.permission == SUBAGENT_DENIED_PERMISSION && rule.action == "deny")
    }
}

impl From<RemoteSession> for SessionSummary {
    fn from(remote: RemoteSession) -> Self {
        let is_interactive = remote.is_interactive();
        Self {
            id: remote.id,
            title: remote.title,
            directory: remote.directory,
            created_at: unix_ms_to_datetime(remote.time.created),
            updated_at: unix_ms_to_datetime(remote.time.updated),
            is_interactive,
            last_user_message_preview: None,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct RemoteMessage {
    pub info: RemoteMessageInfo,
    #[serde(default)]
    pub parts: Vec<RemoteMessagePart>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct RemoteMessageInfo {
    pub role: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct RemoteMessagePart {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub text: Option<String>,
}

impl RemoteMessage {
    pub fn is_from_user(&self) -> bool {
        self.info.role == "user"
    }

    /// First `text` part with non-empty content.
    pub fn first_text(&self) -> Option<&str> {
        self.parts
            .iter()
            .filter(|part| part.kind == "text")
            .find_map(|part| part.text.as_deref().filter(|text| !text.is_empty()))
    }
}

#[derive(Debug, Serialize)]
struct CreateSessionBody<'a> {
    title: &'a str,
}

#[derive(Debug, Deserialize)]
struct CreatedSession {
    id: String,
}

pub struct OpenCodeClient {
    base_url: Url,
    agent: ureq::Agent,
}

impl OpenCodeClient {
    pub fn new(config: &Config) -> Self {
        let agent_config = ureq::Agent::config_builder()
            .timeout_global(Some(config.request_timeout))
            .build();
        Self {
            base_url: config.server_url.clone(),
            agent: agent_config.into(),
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Cheap reachability probe: any successful session listing counts.
    pub fn ping(&self) -> Result<(), ServiceError> {
        let url = self.endpoint(&["session"], &[("limit", "1")]);
        self.agent
            .get(url.as_str())
            .call()
            .map_err(|error| unavailable(&url, &error))?;
        Ok(())
    }

    fn endpoint(&self, segments: &[&str], query: &[(&str, &str)]) -> String {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        url.to_string()
    }

    fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, ServiceError> {
        debug!(%url, "GET");
        let response = self
            .agent
            .get(url)
            .call()
            .map_err(|error| unavailable(url, &error))?;
        let mut body = response.into_body();
        body.read_json::<T>()
            .map_err(|error| decode_failed(url, &error))
    }
}

impl SessionService for OpenCodeClient {
    fn list(&self, directory: &str, limit: usize) -> Result<Vec<RemoteSession>, ServiceError> {
        let limit = limit.to_string();
        let url = self.endpoint(
            &["session"],
            &[("directory", directory), ("limit", limit.as_str())],
        );
        self.get_json(&url)
    }

    fn messages(
        &self,
        session_id: &str,
        directory: &str,
        limit: usize,
    ) -> Result<Vec<RemoteMessage>, ServiceError> {
        let limit = limit.to_string();
        let url = self.endpoint(
            &["session", session_id, "message"],
            &[("directory", directory), ("limit", limit.as_str())],
        );
        self.get_json(&url)
    }

    fn create(&self, title: &str, directory: &str) -> Result<String, ServiceError> {
        let url = self.endpoint(&["session"], &[("directory", directory)]);
        debug!(%url, title, "POST");
        let response = self
            .agent
            .post(url.as_str())
            .send_json(&CreateSessionBody { title })
            .map_err(|error| unavailable(&url, &error))?;
        let mut body = response.into_body();
        let created: CreatedSession = body
            .read_json()
            .map_err(|error| decode_failed(&url, &error))?;
        if created.id.is_empty() {
            return Err(ServiceError::Decode {
                url,
                reason: "created session has no id".to_string(),
            });
        }
        Ok(created.id)
    }
}

fn unavailable(url: &str, error: &ureq::Error) -> ServiceError {
    ServiceError::Unavailable {
        url: url.to_string(),
        reason: error.to_string(),
    }
}

fn decode_failed(url: &str, error: &ureq::Error) -> ServiceError {
    ServiceError::Decode {
        url: url.to_string(),
        reason: error.to_string(),
    }
}
