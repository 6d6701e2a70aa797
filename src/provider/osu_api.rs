//! osu! API v2 backed provider.
//!
//! Beatmap sets come from `GET /beatmapsets/{id}` using a client-credentials
//! token. Deep difficulty data is computed locally from the raw `.osu` file.

use super::{DataProvider, ProviderCache, ProviderError};
use crate::difficulty::{DeepDifficultyData, OsuCalculator};
use crate::models::settings::ApiSettings;
use crate::models::{BeatmapId, CachedDiffEntry, MapsetData, MapsetId};
use log::{debug, info};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Tokens are refreshed this long before the server-side expiry.
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
struct AccessToken {
    value: String,
    expires_at: Instant,
}

impl AccessToken {
    fn is_valid_at(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

#[derive(Debug, Serialize)]
struct TokenRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    grant_type: &'static str,
    scope: &'static str,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

pub struct OsuApiProvider {
    client: reqwest::Client,
    settings: ApiSettings,
    token: RefCell<Option<AccessToken>>,
    cache: RefCell<ProviderCache>,
}

impl OsuApiProvider {
    pub fn new(settings: ApiSettings, max_cache_entries: usize) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .user_agent(concat!("osu-lens/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            settings,
            token: RefCell::new(None),
            cache: RefCell::new(ProviderCache::with_max_size(max_cache_entries)),
        })
    }

    fn mapset_url(&self, id: MapsetId) -> String {
        format!("{}/beatmapsets/{}", self.settings.base_url.trim_end_matches('/'), id)
    }

    fn osu_file_url(&self, id: BeatmapId) -> String {
        format!("{}/{}", self.settings.osu_file_base.trim_end_matches('/'), id)
    }

    async fn access_token(&self) -> Result<String, ProviderError> {
        let cached = self
            .token
            .borrow()
            .as_ref()
            .filter(|token| token.is_valid_at(Instant::now()))
            .map(|token| token.value.clone());
        if let Some(value) = cached {
            return Ok(value);
        }

        let (Some(client_id), Some(client_secret)) = (
            self.settings.client_id.as_deref(),
            self.settings.client_secret.as_deref(),
        ) else {
            return Err(ProviderError::MissingCredentials);
        };

        info!("API: requesting a new access token");
        let response = self
            .client
            .post(&self.settings.oauth_url)
            .form(&TokenRequest {
                client_id,
                client_secret,
                grant_type: "client_credentials",
                scope: "public",
            })
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ProviderError::UnexpectedStatus {
                url: self.settings.oauth_url.clone(),
                status: response.status(),
            });
        }

        let token: TokenResponse = response.json().await?;
        let lifetime = Duration::from_secs(token.expires_in).saturating_sub(TOKEN_EXPIRY_MARGIN);
        *self.token.borrow_mut() = Some(AccessToken {
            value: token.access_token.clone(),
            expires_at: Instant::now() + lifetime,
        });
        Ok(token.access_token)
    }
}

impl DataProvider for OsuApiProvider {
    async fn fetch_mapset(&self, id: MapsetId) -> Result<Option<Rc<MapsetData>>, ProviderError> {
        if let Some(data) = self.cache.borrow().mapset(id) {
            return Ok(Some(data));
        }

        let token = self.access_token().await?;
        let url = self.mapset_url(id);
        debug!("API: GET {url}");
        let response = self.client.get(&url).bearer_auth(token).send().await?;
        match response.status() {
            StatusCode::NOT_FOUND => {
                debug!("API: mapset {id} not found");
                return Ok(None);
            }
            status if !status.is_success() => {
                return Err(ProviderError::UnexpectedStatus { url, status });
            }
            _ => {}
        }

        let data = Rc::new(response.json::<MapsetData>().await?);
        self.cache.borrow_mut().insert_mapset(Rc::clone(&data));
        Ok(Some(data))
    }

    async fn fetch_deep_difficulty(
        &self,
        id: BeatmapId,
    ) -> Result<DeepDifficultyData, ProviderError> {
        if let Some(data) = self.cached_deep_difficulty(id) {
            return Ok(data);
        }

        let url = self.osu_file_url(id);
        debug!("API: GET {url}");
        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(ProviderError::UnexpectedStatus {
                url,
                status: response.status(),
            });
        }

        // Unknown ids come back as an empty 200.
        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Err(ProviderError::EmptyBeatmapFile(id));
        }

        let data = OsuCalculator::calculate_from_bytes(&bytes)?;
        self.cache.borrow_mut().insert_deep(id, data.clone());
        Ok(data)
    }

    fn cached_deep_difficulty(&self, id: BeatmapId) -> Option<DeepDifficultyData> {
        self.cache.borrow().deep(id).cloned()
    }

    fn cached_diff_entry(&self, id: BeatmapId) -> Option<CachedDiffEntry> {
        self.cache.borrow().diff_entry(id).cloned()
    }

    fn reset(&self) {
        info!("API: clearing provider cache");
        self.cache.borrow_mut().clear();
    }
}
