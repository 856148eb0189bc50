//! Blocking Hub API client.

use crate::error::{decode, rejection, transport};
use crate::wire::{
    CreateRepo, CreatedRepo, DeleteRepo, Hardware, Key, KeyValue, MoveRepo, SleepTime,
    SpaceInfo, Storage, Visibility, listed_keys,
};
use declarative::{Result, SpaceClient, SpaceId, SpaceRecord, SpaceSpec};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use ureq::http::Response;
use ureq::{Agent, Body, RequestBuilder};

/// Public hub endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://huggingface.co";

const USER_AGENT: &str = concat!("hfspaces/", env!("CARGO_PKG_VERSION"));

/// Hub API client implementing [`SpaceClient`].
///
/// One request per call, no retries. Non-success statuses are read as
/// values (not transport errors) so that the body message can be kept.
///
/// # Example
///
/// ```no_run
/// use hubkit::HubClient;
/// use declarative::{SpaceClient, SpaceId};
///
/// let client = HubClient::new(Some(std::env::var("HF_TOKEN").unwrap()));
/// let record = client.fetch(&SpaceId::parse("alice/demo").unwrap()).unwrap();
/// println!("{} has {:?} likes", record.id, record.likes);
/// ```
pub struct HubClient {
    /// HTTP agent for requests.
    agent: Agent,
    /// Hub base URL, without trailing slash.
    endpoint: String,
    /// Bearer token; anonymous when `None`.
    token: Option<String>,
}

impl HubClient {
    /// Create a client for the public hub.
    #[must_use]
    pub fn new(token: Option<String>) -> Self {
        Self::with_endpoint(DEFAULT_ENDPOINT, token)
    }

    /// Create a client for a custom endpoint (mirrors, testing).
    #[must_use]
    pub fn with_endpoint(endpoint: impl Into<String>, token: Option<String>) -> Self {
        let config = Agent::config_builder().http_status_as_error(false).build();
        Self {
            agent: Agent::new_with_config(config),
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.is_empty()),
        }
    }

    /// Get the current endpoint.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Whether requests carry a bearer token.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.endpoint, path)
    }

    fn space_url(&self, id: &SpaceId, suffix: &str) -> String {
        self.url(&format!("/api/spaces/{}/{}{}", id.owner(), id.name(), suffix))
    }

    fn authorize<B>(&self, request: RequestBuilder<B>) -> RequestBuilder<B> {
        let request = request
            .header("User-Agent", USER_AGENT)
            .header("Accept", "application/json");
        match &self.token {
            Some(token) => request.header("Authorization", format!("Bearer {token}")),
            None => request,
        }
    }

    fn get(&self, url: &str) -> Result<Response<Body>> {
        log::debug!("GET {url}");
        let result = self.authorize(self.agent.get(url)).call();
        finish("GET", url, result)
    }

    fn post<T: Serialize>(&self, url: &str, body: &T) -> Result<Response<Body>> {
        log::debug!("POST {url}");
        let result = self.authorize(self.agent.post(url)).send_json(body);
        finish("POST", url, result)
    }

    fn put<T: Serialize>(&self, url: &str, body: &T) -> Result<Response<Body>> {
        log::debug!("PUT {url}");
        let result = self.authorize(self.agent.put(url)).send_json(body);
        finish("PUT", url, result)
    }

    fn delete_with_body<T: Serialize>(&self, url: &str, body: &T) -> Result<Response<Body>> {
        log::debug!("DELETE {url}");
        let result = self
            .authorize(self.agent.delete(url))
            .force_send_body()
            .send_json(body);
        finish("DELETE", url, result)
    }

    fn list(&self, id: &SpaceId, collection: &str) -> Result<Vec<String>> {
        let body: Value = read_json(self.get(&self.space_url(id, collection))?)?;
        listed_keys(&body)
    }
}

/// Turn a raw outcome into a success response or a classified error.
fn finish(
    method: &str,
    url: &str,
    result: std::result::Result<Response<Body>, ureq::Error>,
) -> Result<Response<Body>> {
    let mut response = result.map_err(transport)?;
    let status = response.status();
    log::trace!("{method} {url} -> {status}");
    if status.is_success() {
        return Ok(response);
    }
    let body = error_body(method, url, response.body_mut().read_to_string());
    Err(rejection(status.as_u16(), &body))
}

/// Body of a rejected request; an unreadable body falls back to the bare status.
fn error_body(method: &str, url: &str, read: std::result::Result<String, ureq::Error>) -> String {
    read.unwrap_or_else(|e| {
        log::trace!("{method} {url}: could not read error body: {e}");
        String::new()
    })
}

fn read_json<T: DeserializeOwned>(mut response: Response<Body>) -> Result<T> {
    let text = response.body_mut().read_to_string().map_err(transport)?;
    serde_json::from_str(&text).map_err(decode)
}

impl SpaceClient for HubClient {
    fn create(&self, spec: &SpaceSpec) -> Result<SpaceId> {
        let response = self.post(&self.url("/api/repos/create"), &CreateRepo::space(spec))?;
        let created: CreatedRepo = read_json(response)?;
        created.identity(spec)
    }

    fn rename(&self, id: &SpaceId, new_name: &str) -> Result<SpaceId> {
        let to = id.with_name(new_name)?;
        let body = MoveRepo {
            from_repo: id.to_string(),
            to_repo: to.to_string(),
            kind: "space",
        };
        self.post(&self.url("/api/repos/move"), &body)?;
        Ok(to)
    }

    fn set_visibility(&self, id: &SpaceId, private: bool) -> Result<()> {
        self.put(&self.space_url(id, "/settings"), &Visibility { private })?;
        Ok(())
    }

    fn set_hardware(&self, id: &SpaceId, tier: &str) -> Result<()> {
        self.post(&self.space_url(id, "/hardware"), &Hardware { flavor: tier })?;
        Ok(())
    }

    fn set_storage(&self, id: &SpaceId, tier: &str) -> Result<()> {
        self.post(&self.space_url(id, "/storage"), &Storage { tier })?;
        Ok(())
    }

    fn set_sleep_time(&self, id: &SpaceId, seconds: i64) -> Result<()> {
        self.post(&self.space_url(id, "/sleeptime"), &SleepTime { seconds })?;
        Ok(())
    }

    fn add_secret(&self, id: &SpaceId, key: &str, value: &str) -> Result<()> {
        self.post(&self.space_url(id, "/secrets"), &KeyValue { key, value })?;
        Ok(())
    }

    fn remove_secret(&self, id: &SpaceId, key: &str) -> Result<()> {
        self.delete_with_body(&self.space_url(id, "/secrets"), &Key { key })?;
        Ok(())
    }

    fn list_secret_keys(&self, id: &SpaceId) -> Result<Vec<String>> {
        self.list(id, "/secrets")
    }

    fn add_variable(&self, id: &SpaceId, key: &str, value: &str) -> Result<()> {
        self.post(&self.space_url(id, "/variables"), &KeyValue { key, value })?;
        Ok(())
    }

    fn remove_variable(&self, id: &SpaceId, key: &str) -> Result<()> {
        self.delete_with_body(&self.space_url(id, "/variables"), &Key { key })?;
        Ok(())
    }

    fn list_variable_keys(&self, id: &SpaceId) -> Result<Vec<String>> {
        self.list(id, "/variables")
    }

    fn delete(&self, id: &SpaceId) -> Result<()> {
        let body = DeleteRepo {
            kind: "space",
            name: id.name(),
            organization: id.owner(),
        };
        self.delete_with_body(&self.url("/api/repos/delete"), &body)?;
        Ok(())
    }

    fn fetch(&self, id: &SpaceId) -> Result<SpaceRecord> {
        let info: SpaceInfo = read_json(self.get(&self.space_url(id, ""))?)?;
        info.into_record()
    }
}
