// Spotify Web API playback source
// Only the two player endpoints the monitor needs. The access token comes
// from config; getting and refreshing it is someone else's job.

use crate::config::SpotifyConfig;
use crate::error::{ConfigError, SourceError, SourceResult};
use crate::playback::{ItemId, PlaybackSnapshot, PlaybackSource};
use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct SpotifyClient {
    http: Client,
    api_base: String,
    access_token: String,
}

/// Body of `GET /me/player`
#[derive(Debug, Deserialize)]
struct PlayerState {
    #[serde(default)]
    is_playing: bool,
    progress_ms: Option<u64>,
    item: Option<PlayerItem>,
}

#[derive(Debug, Deserialize)]
struct PlayerItem {
    // Local files have no id, fall back to the uri
    id: Option<String>,
    uri: Option<String>,
    name: Option<String>,
}

impl From<PlayerState> for PlaybackSnapshot {
    fn from(state: PlayerState) -> Self {
        let (item_id, title) = match state.item {
            Some(item) => (item.id.or(item.uri).map(ItemId::new), item.name),
            None => (None, None),
        };

        PlaybackSnapshot {
            item_id,
            is_playing: state.is_playing,
            progress: Duration::from_millis(state.progress_ms.unwrap_or(0)),
            title,
        }
    }
}

impl SpotifyClient {
    pub fn new(config: &SpotifyConfig) -> Result<Self, ConfigError> {
        let access_token = config
            .access_token
            .clone()
            .filter(|t| !t.is_empty())
            .ok_or(ConfigError::MissingAccessToken)?;

        Ok(Self {
            http: Client::new(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            access_token,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }

    async fn check(response: reqwest::Response) -> SourceResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(SourceError::Status {
            status: status.as_u16(),
            body,
        })
    }

    fn parse_player_state(body: &[u8]) -> SourceResult<PlaybackSnapshot> {
        let state: PlayerState = serde_json::from_slice(body)?;
        Ok(state.into())
    }
}

#[async_trait]
impl PlaybackSource for SpotifyClient {
    async fn fetch_current_playback(&self) -> SourceResult<PlaybackSnapshot> {
        let response = self
            .http
            .get(self.url("/me/player"))
            .bearer_auth(&self.access_token)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;
        let response = Self::check(response).await?;

        // 204 means no active device
        if response.status() == StatusCode::NO_CONTENT {
            return Ok(PlaybackSnapshot::idle());
        }

        let body = response.bytes().await?;
        if body.is_empty() {
            return Ok(PlaybackSnapshot::idle());
        }
        Self::parse_player_state(&body)
    }

    async fn skip_to_next(&self) -> SourceResult<()> {
        debug!("POST /me/player/next");
        let response = self
            .http
            .post(self.url("/me/player/next"))
            .bearer_auth(&self.access_token)
            .header(header::CONTENT_LENGTH, 0)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }
}
