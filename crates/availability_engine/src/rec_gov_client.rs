use reqwest::{Client, Request};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::availability_types::MonthToken;
use crate::config::EngineConfig;
use crate::run_context::RunContext;
use crate::source::{
    AvailabilitySource, CampgroundMetadata, CampgroundMetadataResponse, FacilityDetails,
    MonthlyAvailability, RecDataResponse,
};

/// Errors from a single upstream call
#[derive(thiserror::Error, Debug)]
pub enum RecGovError {
    /// HTTP client could not be built
    #[error("Failed to create HTTP client: {0}")]
    ClientInit(String),

    /// Request never got a response
    #[error("HTTP request failed: {0}")]
    Network(String),

    /// Rate limited by external API
    #[error("Rate limited by external API")]
    RateLimited,

    /// Authentication failed with external service
    #[error("Authentication failed with external service")]
    AuthenticationFailed,

    /// Resource does not exist upstream
    #[error("Not found")]
    NotFound,

    /// Any other non-success status
    #[error("API error: {0}")]
    ApiError(String),

    /// Body was not the JSON we expected
    #[error("Failed to parse response: {0}")]
    Parse(String),
}

struct CallFailure {
    status: Option<u16>,
    error: RecGovError,
}

/// Client for the recreation.gov internal API and the RIDB API
pub struct RecGovClient {
    client: Client,
    rec_gov_base_url: String,
    ridb_base_url: String,
    api_key: Option<String>,
}

impl RecGovClient {
    /// Create a new recreation.gov API client
    pub fn new(config: &EngineConfig) -> Result<Self, RecGovError> {
        let client = Client::builder()
            .user_agent("Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36")
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| RecGovError::ClientInit(e.to_string()))?;

        Ok(Self {
            client,
            rec_gov_base_url: config.rec_gov_base_url.trim_end_matches('/').to_string(),
            ridb_base_url: config.ridb_base_url.trim_end_matches('/').to_string(),
            api_key: config.ridb_api_key.clone(),
        })
    }

    /// GET a JSON document and record the call, whatever happens
    async fn get_json<T: DeserializeOwned>(
        &self,
        ctx: &RunContext,
        context: &str,
        url: &str,
        params: &[(&str, String)],
        with_api_key: bool,
    ) -> Option<T> {
        let mut builder = self.client.get(url).query(params);
        if with_api_key {
            if let Some(ref api_key) = self.api_key {
                builder = builder.header("apikey", api_key);
            }
        }

        let request = match builder.build() {
            Ok(request) => request,
            Err(e) => {
                let error = RecGovError::ApiError(format!("Invalid request: {}", e));
                ctx.record_failure(context, url, None, &error.to_string());
                return None;
            }
        };

        let logged_url = request.url().to_string();
        debug!("Making request to: {}", logged_url);

        match self.execute_json(request).await {
            Ok((status, body)) => {
                ctx.record_success(context, &logged_url, status);
                Some(body)
            }
            Err(failure) => {
                ctx.record_failure(
                    context,
                    &logged_url,
                    failure.status,
                    &failure.error.to_string(),
                );
                None
            }
        }
    }

    async fn execute_json<T: DeserializeOwned>(
        &self,
        request: Request,
    ) -> Result<(u16, T), CallFailure> {
        let response = self
            .client
            .execute(request)
            .await
            .map_err(|e| CallFailure {
                status: None,
                error: RecGovError::Network(e.to_string()),
            })?;

        let status = response.status();
        let code = status.as_u16();

        if !status.is_success() {
            let error = match code {
                429 => RecGovError::RateLimited,
                401 | 403 => RecGovError::AuthenticationFailed,
                404 => RecGovError::NotFound,
                _ => RecGovError::ApiError(format!("HTTP {}", status)),
            };
            return Err(CallFailure {
                status: Some(code),
                error,
            });
        }

        let body = response.json::<T>().await.map_err(|e| CallFailure {
            status: Some(code),
            error: RecGovError::Parse(e.to_string()),
        })?;

        Ok((code, body))
    }
}

#[async_trait::async_trait]
impl AvailabilitySource for RecGovClient {
    async fn fetch_campground_metadata(
        &self,
        ctx: &RunContext,
        campground_id: &str,
    ) -> Option<CampgroundMetadata> {
        let url = format!("{}/camps/campgrounds/{}", self.rec_gov_base_url, campground_id);
        self.get_json::<CampgroundMetadataResponse>(ctx, "campground metadata", &url, &[], false)
            .await
            .map(|response| response.campground)
    }

    async fn fetch_monthly_availability(
        &self,
        ctx: &RunContext,
        campground_id: &str,
        month: MonthToken,
    ) -> Option<MonthlyAvailability> {
        let url = format!(
            "{}/camps/availability/campground/{}/month",
            self.rec_gov_base_url, campground_id
        );
        let params = [("start_date", month.start_date_param())];
        let context = format!("availability {}", month);
        self.get_json(ctx, &context, &url, &params, false).await
    }

    async fn fetch_facility_details(
        &self,
        ctx: &RunContext,
        facility_id: &str,
    ) -> Option<FacilityDetails> {
        let url = format!("{}/facilities/{}", self.ridb_base_url, facility_id);
        let params = [("full", "true".to_string())];
        self.get_json(ctx, "facility details", &url, &params, true)
            .await
    }

    async fn fetch_rec_area_details(&self, ctx: &RunContext, rec_area_id: &str) -> Option<Value> {
        let url = format!("{}/recareas/{}", self.ridb_base_url, rec_area_id);
        let params = [("full", "true".to_string())];
        self.get_json(ctx, "rec area details", &url, &params, true)
            .await
    }

    async fn fetch_rec_area_events(
        &self,
        ctx: &RunContext,
        rec_area_id: &str,
    ) -> Option<Vec<Value>> {
        let url = format!("{}/recareas/{}/events", self.ridb_base_url, rec_area_id);
        self.get_json::<RecDataResponse>(ctx, "rec area events", &url, &[], true)
            .await
            .map(|response| response.rec_data)
    }

    async fn fetch_rec_area_media(
        &self,
        ctx: &RunContext,
        rec_area_id: &str,
    ) -> Option<Vec<Value>> {
        let url = format!("{}/recareas/{}/media", self.ridb_base_url, rec_area_id);
        self.get_json::<RecDataResponse>(ctx, "rec area media", &url, &[], true)
            .await
            .map(|response| response.rec_data)
    }

    async fn fetch_campsite_details(
        &self,
        ctx: &RunContext,
        facility_id: &str,
        campsite_id: &str,
    ) -> Option<Value> {
        let url = format!(
            "{}/facilities/{}/campsites/{}",
            self.ridb_base_url, facility_id, campsite_id
        );
        let context = format!("campsite details {}", campsite_id);
        self.get_json(ctx, &context, &url, &[], true).await
    }

    async fn fetch_search_summary(&self, ctx: &RunContext, campground_id: &str) -> Option<Value> {
        let url = format!("{}/search", self.rec_gov_base_url);
        let params = [
            ("fq", format!("entity_id:{}", campground_id)),
            ("size", "1".to_string()),
        ];
        self.get_json(ctx, "search summary", &url, &params, false)
            .await
    }
}
