//! Thin Wikibase action API client.
//!
//! Covers the handful of calls a claim-writing bot needs: bot-password
//! login, item lookup by sitelink or id, claim creation and reference
//! attachment. No caching; writes rejected for `maxlag` are retried after
//! the wait the server asks for.
//!
//! # Example
//!
//! ```rust,ignore
//! use wikibase_client::{ItemId, WikibaseClient, WikibaseOptions};
//!
//! let mut client = WikibaseClient::new(WikibaseOptions::default())?;
//! client.login("Bot@import", "secret").await?;
//!
//! let item = client.get_item_by_title("enwiki", "Atomoxetine", "en").await?;
//! if let Some(item) = item {
//!     println!("{:?}", item.label("en"));
//! }
//! ```

pub mod error;
pub mod types;

pub use error::{Result, WikibaseError};
pub use types::{parse_single_entity, Item, ItemId, SnakValue, Statement};

use reqwest::Client;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, warn};

pub const WIKIDATA_API_URL: &str = "https://www.wikidata.org/w/api.php";

const DEFAULT_MAXLAG_RETRIES: u32 = 5;

/// Wait used when a `maxlag` rejection carries neither `Retry-After` nor `lag`.
const DEFAULT_MAXLAG_WAIT: Duration = Duration::from_secs(5);

const DEFAULT_USER_AGENT: &str = concat!("wikibase-client/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone)]
pub struct WikibaseOptions {
    pub api_url: String,
    pub user_agent: String,
    /// Sent as `maxlag` on writes.
    pub maxlag: Option<u32>,
    /// Write retries after a `maxlag` rejection before giving up.
    pub maxlag_retries: u32,
    /// Minimum spacing between two writes.
    pub edit_interval: Duration,
}

impl Default for WikibaseOptions {
    fn default() -> Self {
        Self {
            api_url: WIKIDATA_API_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            maxlag: None,
            maxlag_retries: DEFAULT_MAXLAG_RETRIES,
            edit_interval: Duration::ZERO,
        }
    }
}

pub struct WikibaseClient {
    client: Client,
    options: WikibaseOptions,
    csrf_token: Option<String>,
    last_write: Mutex<Option<Instant>>,
}

impl WikibaseClient {
    pub fn new(options: WikibaseOptions) -> Result<Self> {
        let mut builder = Client::builder()
            .cookie_store(true)
            .user_agent(options.user_agent.clone());
        if is_loopback(&options.api_url) {
            builder = builder.no_proxy();
        }
        let client = builder.build()?;
        Ok(Self {
            client,
            options,
            csrf_token: None,
            last_write: Mutex::new(None),
        })
    }

    pub fn api_url(&self) -> &str {
        &self.options.api_url
    }

    pub fn is_logged_in(&self) -> bool {
        self.csrf_token.is_some()
    }

    /// Log in with a bot password and fetch the CSRF token used for writes.
    pub async fn login(&mut self, username: &str, password: &str) -> Result<()> {
        let body = self
            .get_json(&[("action", "query".into()), ("meta", "tokens".into()), ("type", "login".into())])
            .await?;
        let login_token = token_from(&body, "logintoken")?;

        let body = self
            .post_json(&[
                ("action", "login".into()),
                ("lgname", username.into()),
                ("lgpassword", password.into()),
                ("lgtoken", login_token),
            ])
            .await?;
        let result = body["login"]["result"].as_str().unwrap_or_default();
        if result != "Success" {
            let reason = body["login"]["reason"]
                .as_str()
                .unwrap_or(result)
                .to_string();
            warn!(username, result, "Wikibase login rejected");
            return Err(WikibaseError::Login(reason));
        }

        let body = self
            .get_json(&[("action", "query".into()), ("meta", "tokens".into())])
            .await?;
        self.csrf_token = Some(token_from(&body, "csrftoken")?);
        debug!(username, "Logged in to Wikibase");
        Ok(())
    }

    /// Resolve the item linked to `title` on `site` (e.g. `enwiki`).
    pub async fn get_item_by_title(&self, site: &str, title: &str, lang: &str) -> Result<Option<Item>> {
        let body = self
            .get_json(&[
                ("action", "wbgetentities".into()),
                ("sites", site.into()),
                ("titles", title.into()),
                ("props", "labels|claims".into()),
                ("languages", lang.into()),
                ("redirects", "yes".into()),
                ("normalize", "1".into()),
            ])
            .await?;
        parse_single_entity(body)
    }

    pub async fn get_item(&self, id: &ItemId, lang: &str) -> Result<Option<Item>> {
        let body = self
            .get_json(&[
                ("action", "wbgetentities".into()),
                ("ids", id.to_string()),
                ("props", "labels|claims".into()),
                ("languages", lang.into()),
            ])
            .await;
        match body {
            Ok(body) => parse_single_entity(body),
            Err(WikibaseError::Api { code, .. }) if code == "no-such-entity" => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Add an item-valued statement and return its GUID.
    pub async fn create_item_claim(&self, subject: &ItemId, property: &str, target: &ItemId) -> Result<String> {
        let body = self
            .write(vec![
                ("action", "wbcreateclaim".into()),
                ("entity", subject.to_string()),
                ("property", property.into()),
                ("snaktype", "value".into()),
                ("value", types::item_datavalue(target).to_string()),
            ])
            .await?;
        body["claim"]["id"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| WikibaseError::Parse("wbcreateclaim response has no claim id".into()))
    }

    /// Attach a single-snak reference (`property` → `target`) to a statement.
    pub async fn add_item_reference(&self, statement: &str, property: &str, target: &ItemId) -> Result<()> {
        self.write(vec![
            ("action", "wbsetreference".into()),
            ("statement", statement.into()),
            ("snaks", types::reference_snaks(property, target).to_string()),
        ])
        .await?;
        Ok(())
    }

    async fn write(&self, mut params: Vec<(&str, String)>) -> Result<serde_json::Value> {
        let token = self
            .csrf_token
            .clone()
            .ok_or_else(|| WikibaseError::Login("not logged in".into()))?;

        self.throttle().await;

        params.push(("bot", "1".into()));
        if let Some(maxlag) = self.options.maxlag {
            params.push(("maxlag", maxlag.to_string()));
        }
        params.push(("token", token));

        let mut attempt = 0;
        loop {
            match self.post_json(&params).await {
                Err(WikibaseError::MaxLag { retry_after }) if attempt < self.options.maxlag_retries => {
                    attempt += 1;
                    warn!(
                        attempt,
                        wait_ms = retry_after.as_millis() as u64,
                        "Server lagged, retrying write"
                    );
                    tokio::time::sleep(retry_after).await;
                    self.throttle().await;
                }
                result => return result,
            }
        }
    }

    async fn throttle(&self) {
        let mut last_write = self.last_write.lock().await;
        if let Some(previous) = *last_write {
            let elapsed = previous.elapsed();
            if elapsed < self.options.edit_interval {
                let wait = self.options.edit_interval - elapsed;
                debug!(wait_ms = wait.as_millis() as u64, "Throttling write");
                tokio::time::sleep(wait).await;
            }
        }
        *last_write = Some(Instant::now());
    }

    async fn get_json(&self, params: &[(&str, String)]) -> Result<serde_json::Value> {
        let resp = self
            .client
            .get(&self.options.api_url)
            .query(&[("format", "json"), ("formatversion", "1")])
            .query(params)
            .send()
            .await?;
        Self::read_body(resp).await
    }

    async fn post_json(&self, params: &[(&str, String)]) -> Result<serde_json::Value> {
        let resp = self
            .client
            .post(&self.options.api_url)
            .query(&[("format", "json"), ("formatversion", "1")])
            .form(params)
            .send()
            .await?;
        Self::read_body(resp).await
    }

    async fn read_body(resp: reqwest::Response) -> Result<serde_json::Value> {
        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(WikibaseError::Status {
                status: status.as_u16(),
                message,
            });
        }
        let retry_after = resp
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_secs);

        let body: serde_json::Value = resp.json().await?;
        if body["error"]["code"] == "maxlag" {
            let lag = body["error"]["lag"]
                .as_f64()
                .filter(|lag| lag.is_finite() && *lag >= 0.0)
                .map(Duration::from_secs_f64);
            return Err(WikibaseError::MaxLag {
                retry_after: retry_after.or(lag).unwrap_or(DEFAULT_MAXLAG_WAIT),
            });
        }
        types::check_api_error(&body)?;
        Ok(body)
    }
}

fn is_loopback(api_url: &str) -> bool {
    reqwest::Url::parse(api_url)
        .ok()
        .and_then(|url| url.host_str().map(str::to_string))
        .is_some_and(|host| matches!(host.as_str(), "localhost" | "127.0.0.1" | "[::1]"))
}

fn token_from(body: &serde_json::Value, name: &str) -> Result<String> {
    body["query"]["tokens"][name]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| WikibaseError::Parse(format!("response has no {}", name)))
}
