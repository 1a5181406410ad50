//! Trello REST API client.
//!
//! Authenticates with an API key and member token passed as query
//! parameters on every request.

use std::time::Duration;

use async_trait::async_trait;
use relay_hub::{ActionSource, FetchError};
use relay_models::{Action, BoardId, CardId, EventTypeFilter};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::{debug, trace};

use crate::error::{Result, TrelloError};
use crate::types::{Board, Card};

/// Default Trello API base URL.
pub const DEFAULT_API_URL: &str = "https://api.trello.com/1";

/// Actions requested per board fetch unless configured otherwise.
pub const DEFAULT_ACTION_LIMIT: u32 = 50;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Query arguments expanding a card with its members and checklists.
const CARD_ARGS: [(&str, &str); 4] = [
    ("members", "true"),
    ("member_fields", "username"),
    ("checklists", "all"),
    ("checkItemStates", "false"),
];

/// Trello API client. Cheap to clone; clones share one connection pool.
#[derive(Clone)]
pub struct TrelloClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    token: String,
    action_limit: u32,
}

impl std::fmt::Debug for TrelloClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrelloClient")
            .field("base_url", &self.base_url)
            .field("action_limit", &self.action_limit)
            .finish_non_exhaustive()
    }
}

impl TrelloClient {
    /// Create a client for the public Trello API.
    pub fn new(api_key: impl Into<String>, token: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("board-relay/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: DEFAULT_API_URL.to_string(),
            api_key: api_key.into(),
            token: token.into(),
            action_limit: DEFAULT_ACTION_LIMIT,
        })
    }

    /// Point the client at another API root (proxies, test servers).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set how many actions each board fetch requests.
    pub fn with_action_limit(mut self, limit: u32) -> Self {
        self.action_limit = limit.max(1);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch a board's most recent actions, newest first.
    ///
    /// An empty filter requests every action type.
    pub async fn board_actions(
        &self,
        board_id: &BoardId,
        filter: &EventTypeFilter,
    ) -> Result<Vec<Action>> {
        let limit = self.action_limit.to_string();
        let mut query = vec![("limit", limit)];
        if let Some(types) = filter.to_query() {
            query.push(("filter", types));
        }

        let actions: Vec<Action> = self
            .get_json(
                &format!("boards/{}/actions", board_id),
                &query,
                ("board", board_id.as_str()),
            )
            .await?;

        debug!(board_id = %board_id, count = actions.len(), "fetched board actions");
        Ok(actions)
    }

    /// Fetch a board's metadata. Used to check that a board id is valid.
    pub async fn get_board(&self, board_id: &BoardId) -> Result<Board> {
        self.get_json(
            &format!("boards/{}", board_id),
            &[("fields", "id,name,url,shortUrl,closed".to_string())],
            ("board", board_id.as_str()),
        )
        .await
    }

    /// Fetch a card with its members and checklists.
    pub async fn get_card(&self, card_id: &CardId) -> Result<Card> {
        let query: Vec<(&str, String)> = CARD_ARGS
            .iter()
            .map(|(k, v)| (*k, v.to_string()))
            .collect();
        self.get_json(&format!("cards/{}", card_id), &query, ("card", card_id.as_str()))
            .await
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        resource: (&'static str, &str),
    ) -> Result<T> {
        let url = format!("{}/{}", self.base_url, path);
        trace!(url = %url, "GET");

        let response = self
            .client
            .get(&url)
            .query(&[("key", self.api_key.as_str()), ("token", self.token.as_str())])
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(match status {
                StatusCode::NOT_FOUND => TrelloError::NotFound {
                    kind: resource.0,
                    id: resource.1.to_string(),
                },
                StatusCode::TOO_MANY_REQUESTS => TrelloError::RateLimited,
                _ => TrelloError::Status {
                    status: status.as_u16(),
                    body,
                },
            });
        }

        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl ActionSource for TrelloClient {
    async fn fetch_board_actions(
        &self,
        board_id: &BoardId,
        filter: &EventTypeFilter,
    ) -> std::result::Result<Vec<Action>, FetchError> {
        self.board_actions(board_id, filter)
            .await
            .map_err(|e| e.into_fetch_error(board_id))
    }
}
