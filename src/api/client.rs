//! HTTP client for the Onoma API with safe request logging.
//!
//! # Security
//!
//! - Names and phone numbers are never logged
//! - The API key is never logged
//! - Only HTTP method, path, status code, and duration are logged

use std::time::{Duration, Instant};

use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::info;
use url::Url;

use crate::api::dispatch::{NameOracle, OracleFuture};
use crate::api::types::{
    BatchNamesIn, BatchNamesOut, BatchPhoneNamesIn, BatchPhoneNamesOut, CountriedName,
    DiasporaName, GenderedName, OriginatedName, ParsedName, PhoneCodedName, SoftwareVersionOut,
    UsRaceEthnicityName,
};
use crate::error::AppError;
use crate::record::{
    FirstLastName, FirstLastNameGeo, FirstLastNamePhone, PersonalName, PersonalNameGeo,
};

// ─────────────────────────────────────────────────────────────────────────────
// Constants
// ─────────────────────────────────────────────────────────────────────────────

/// Default API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.onoma.io/v2/";

/// User agent string for all API requests.
const CLIENT_USER_AGENT: &str = concat!("onoma/", env!("CARGO_PKG_VERSION"));

/// Header carrying the API key.
const API_KEY_HEADER: &str = "X-API-KEY";

// Endpoint paths, relative to the base URL.
const EP_SOFTWARE_VERSION: &str = "json/softwareVersion";
const EP_PARSE: &str = "json/parseNameBatch";
const EP_PARSE_GEO: &str = "json/parseNameGeoBatch";
const EP_GENDER: &str = "json/genderBatch";
const EP_GENDER_GEO: &str = "json/genderGeoBatch";
const EP_GENDER_FULL: &str = "json/genderFullBatch";
const EP_GENDER_FULL_GEO: &str = "json/genderFullGeoBatch";
const EP_ORIGIN: &str = "json/originBatch";
const EP_COUNTRY: &str = "json/countryBatch";
const EP_DIASPORA: &str = "json/diasporaBatch";
const EP_US_RACE_ETHNICITY: &str = "json/usRaceEthnicityBatch";
const EP_PHONE_CODE: &str = "json/phoneCodeBatch";

// ─────────────────────────────────────────────────────────────────────────────
// OnomaClient
// ─────────────────────────────────────────────────────────────────────────────

/// HTTP client for the Onoma batch API.
#[derive(Clone)]
pub struct OnomaClient {
    http: reqwest::Client,
    base_url: Url,
}

impl OnomaClient {
    /// Creates a client with the API key installed as a default header.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` for an unusable base URL or key and
    /// `AppError::Internal` if the HTTP client fails to initialize.
    pub fn new(api_key: &str, base_url: &str, timeout: Duration) -> Result<Self, AppError> {
        // A trailing slash keeps Url::join from replacing the last segment.
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{base_url}/")
        };
        let base_url = Url::parse(&normalized)
            .map_err(|e| AppError::Config(format!("Invalid base URL: {e}")))?;

        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(CLIENT_USER_AGENT));
        let mut key_value = HeaderValue::from_str(api_key)
            .map_err(|_| AppError::Config("API key contains invalid characters".into()))?;
        key_value.set_sensitive(true);
        headers.insert(API_KEY_HEADER, key_value);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self { http, base_url })
    }

    fn endpoint(&self, path: &str) -> Result<Url, AppError> {
        self.base_url
            .join(path)
            .map_err(|_| AppError::Internal(format!("Invalid endpoint path: {path}")))
    }

    /// POSTs a batch body and decodes the JSON response.
    async fn post_json<B, O>(&self, path: &str, body: &B) -> Result<O, AppError>
    where
        B: Serialize + ?Sized,
        O: DeserializeOwned,
    {
        let url = self.endpoint(path)?;
        let start = Instant::now();

        let result = self.http.post(url).json(body).send().await;
        let duration_ms = start.elapsed().as_millis();

        let response = match result {
            Ok(response) => {
                info!(
                    "[ONOMA] POST {} {} {}ms",
                    path,
                    response.status().as_u16(),
                    duration_ms
                );
                response
            }
            Err(e) => {
                info!("[ONOMA] POST {} FAILED {}ms", path, duration_ms);
                return Err(AppError::ConnectionFailed(format!(
                    "Request to {path} failed: {e}"
                )));
            }
        };

        let status = response.status();
        if !status.is_success() {
            return Err(parse_error_response(response, status.as_u16()).await);
        }

        response
            .json::<O>()
            .await
            .map_err(|e| AppError::ApiError {
                status: status.as_u16(),
                message: format!("Failed to decode response: {e}"),
            })
    }

    /// GETs and decodes a JSON response.
    async fn get_json<O: DeserializeOwned>(&self, path: &str) -> Result<O, AppError> {
        let url = self.endpoint(path)?;
        let start = Instant::now();

        let result = self.http.get(url).send().await;
        let duration_ms = start.elapsed().as_millis();

        let response = match result {
            Ok(response) => {
                info!(
                    "[ONOMA] GET {} {} {}ms",
                    path,
                    response.status().as_u16(),
                    duration_ms
                );
                response
            }
            Err(e) => {
                info!("[ONOMA] GET {} FAILED {}ms", path, duration_ms);
                return Err(AppError::ConnectionFailed(format!(
                    "Request to {path} failed: {e}"
                )));
            }
        };

        let status = response.status();
        if !status.is_success() {
            return Err(parse_error_response(response, status.as_u16()).await);
        }

        response
            .json::<O>()
            .await
            .map_err(|e| AppError::ApiError {
                status: status.as_u16(),
                message: format!("Failed to decode response: {e}"),
            })
    }

    async fn names_batch<I, O>(&self, path: &str, names: &[I]) -> Result<Vec<O>, AppError>
    where
        I: Serialize + Clone,
        O: DeserializeOwned,
    {
        let body = BatchNamesIn {
            personal_names: names.to_vec(),
        };
        let out: BatchNamesOut<O> = self.post_json(path, &body).await?;
        Ok(out.personal_names)
    }
}

/// Extracts a usable message from an error response body.
async fn parse_error_response(response: reqwest::Response, status: u16) -> AppError {
    #[derive(serde::Deserialize)]
    struct ApiErrorBody {
        message: String,
    }

    let body = response.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<ApiErrorBody>(&body) {
        Ok(parsed) => parsed.message,
        Err(_) => {
            let mut raw = body;
            raw.truncate(200);
            raw
        }
    };
    AppError::ApiError { status, message }
}

// ─────────────────────────────────────────────────────────────────────────────
// NameOracle implementation
// ─────────────────────────────────────────────────────────────────────────────

impl NameOracle for OnomaClient {
    fn software_version(&self) -> OracleFuture<'_, String> {
        Box::pin(async move {
            let out: SoftwareVersionOut = self.get_json(EP_SOFTWARE_VERSION).await?;
            Ok(out.software_name_and_version)
        })
    }

    fn parse_batch<'a>(&'a self, names: &'a [PersonalName]) -> OracleFuture<'a, Vec<ParsedName>> {
        Box::pin(self.names_batch(EP_PARSE, names))
    }

    fn parse_geo_batch<'a>(
        &'a self,
        names: &'a [PersonalNameGeo],
    ) -> OracleFuture<'a, Vec<ParsedName>> {
        Box::pin(self.names_batch(EP_PARSE_GEO, names))
    }

    fn gender_batch<'a>(
        &'a self,
        names: &'a [FirstLastName],
    ) -> OracleFuture<'a, Vec<GenderedName>> {
        Box::pin(self.names_batch(EP_GENDER, names))
    }

    fn gender_geo_batch<'a>(
        &'a self,
        names: &'a [FirstLastNameGeo],
    ) -> OracleFuture<'a, Vec<GenderedName>> {
        Box::pin(self.names_batch(EP_GENDER_GEO, names))
    }

    fn gender_full_batch<'a>(
        &'a self,
        names: &'a [PersonalName],
    ) -> OracleFuture<'a, Vec<GenderedName>> {
        Box::pin(self.names_batch(EP_GENDER_FULL, names))
    }

    fn gender_full_geo_batch<'a>(
        &'a self,
        names: &'a [PersonalNameGeo],
    ) -> OracleFuture<'a, Vec<GenderedName>> {
        Box::pin(self.names_batch(EP_GENDER_FULL_GEO, names))
    }

    fn origin_batch<'a>(
        &'a self,
        names: &'a [FirstLastName],
    ) -> OracleFuture<'a, Vec<OriginatedName>> {
        Box::pin(self.names_batch(EP_ORIGIN, names))
    }

    fn country_batch<'a>(
        &'a self,
        names: &'a [PersonalName],
    ) -> OracleFuture<'a, Vec<CountriedName>> {
        Box::pin(self.names_batch(EP_COUNTRY, names))
    }

    fn diaspora_batch<'a>(
        &'a self,
        names: &'a [FirstLastNameGeo],
    ) -> OracleFuture<'a, Vec<DiasporaName>> {
        Box::pin(self.names_batch(EP_DIASPORA, names))
    }

    fn us_race_ethnicity_batch<'a>(
        &'a self,
        names: &'a [FirstLastNameGeo],
    ) -> OracleFuture<'a, Vec<UsRaceEthnicityName>> {
        Box::pin(self.names_batch(EP_US_RACE_ETHNICITY, names))
    }

    fn phone_code_batch<'a>(
        &'a self,
        names: &'a [FirstLastNamePhone],
    ) -> OracleFuture<'a, Vec<PhoneCodedName>> {
        Box::pin(async move {
            let body = BatchPhoneNamesIn {
                personal_names_with_phone_numbers: names.to_vec(),
            };
            let out: BatchPhoneNamesOut<PhoneCodedName> =
                self.post_json(EP_PHONE_CODE, &body).await?;
            Ok(out.personal_names_with_phone_numbers)
        })
    }
}
