use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::blocking::Client as HttpClient;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use url::Url;

use crate::error::Result;
use crate::request::{BoundingBox, CityName, Units, WeatherRequest};
use crate::response::ApiResponse;
use crate::sources::{DEFAULT_BASE_URL, PRO_BASE_URL, Tier};
use crate::url_builder::{endpoint_url, redact_appid, validate_base_url};

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientOptions {
    pub api_key: String,
    /// Host for current weather and air pollution.
    pub base_url: String,
    /// Host for the hourly and daily forecast products.
    pub pro_base_url: String,
    pub timeout_secs: u64,
    /// Log outgoing URLs with `appid=***` instead of the key.
    pub redact_api_key_in_logs: bool,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            pro_base_url: PRO_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            redact_api_key_in_logs: false,
        }
    }
}

impl fmt::Debug for ClientOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientOptions")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("pro_base_url", &self.pro_base_url)
            .field("timeout_secs", &self.timeout_secs)
            .field("redact_api_key_in_logs", &self.redact_api_key_in_logs)
            .finish()
    }
}

/// Blocking OpenWeatherMap client.
///
/// Every call is a single GET. Nothing is retried, cached or validated, and
/// HTTP error statuses are not turned into errors: the provider's error body
/// comes back as an ordinary [`ApiResponse`]. Only transport failures
/// (connect, DNS, timeout) are returned as `Err`.
#[derive(Debug, Clone)]
pub struct Client {
    opts: ClientOptions,
    http: HttpClient,
}

impl Client {
    pub fn new(opts: ClientOptions) -> Result<Self> {
        validate_base_url(&opts.base_url)?;
        validate_base_url(&opts.pro_base_url)?;

        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static("openweather-client-rs/0.1"),
        );

        let http = HttpClient::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(opts.timeout_secs))
            .build()?;

        Ok(Self { opts, http })
    }

    /// Client with the given key and default hosts and timeout.
    pub fn with_api_key(api_key: impl Into<String>) -> Result<Self> {
        Self::new(ClientOptions {
            api_key: api_key.into(),
            ..ClientOptions::default()
        })
    }

    pub fn options(&self) -> &ClientOptions {
        &self.opts
    }

    /// Build the full URL for a request without sending it.
    pub fn request_url(&self, request: &WeatherRequest) -> Result<Url> {
        let base = match request.endpoint().tier() {
            Tier::Standard => &self.opts.base_url,
            Tier::Pro => &self.opts.pro_base_url,
        };
        endpoint_url(base, request.endpoint(), &request.params(), &self.opts.api_key)
    }

    pub fn send(&self, request: &WeatherRequest) -> Result<ApiResponse> {
        let url = self.request_url(request)?;
        self.dispatch(url)
    }

    /// GET a fully formed URL and return its body, decoded when it is JSON.
    pub fn send_request(&self, url: &str) -> Result<ApiResponse> {
        self.dispatch(Url::parse(url)?)
    }

    fn dispatch(&self, url: Url) -> Result<ApiResponse> {
        if self.opts.redact_api_key_in_logs {
            info!("sending request to:\t{}", redact_appid(&url));
        } else {
            info!("sending request to:\t{url}");
        }

        let resp = self.http.get(url).send()?;
        let status = resp.status();
        let body = resp.text()?;
        debug!(status = status.as_u16(), bytes = body.len(), "response received");

        let out = ApiResponse::from_body(body);
        if !out.is_decoded() {
            warn!("JSON response error, returning raw text");
        }
        Ok(out)
    }

    // Current weather: https://openweathermap.org/current

    /// `q` is `city`, `city,state`, `city,state,country`, or `city,country`.
    pub fn current_weather_by_city_name(
        &self,
        city_name: &str,
        state_code: Option<&str>,
        country_code: Option<&str>,
        units: Units,
    ) -> Result<ApiResponse> {
        self.send(&WeatherRequest::CurrentByCityName {
            city: CityName::from_parts(city_name, state_code, country_code),
            units,
        })
    }

    pub fn current_weather_by_city_id(&self, city_id: u64, units: Units) -> Result<ApiResponse> {
        self.send(&WeatherRequest::CurrentByCityId { id: city_id, units })
    }

    pub fn current_weather_by_geo_coordinates(
        &self,
        lat: f64,
        lon: f64,
        units: Units,
    ) -> Result<ApiResponse> {
        self.send(&WeatherRequest::CurrentByCoordinates { lat, lon, units })
    }

    pub fn current_weather_by_zip_code(
        &self,
        zip_code: impl ToString,
        country_code: Option<&str>,
        units: Units,
    ) -> Result<ApiResponse> {
        self.send(&WeatherRequest::CurrentByZipCode {
            zip_code: zip_code.to_string(),
            country_code: country_code.map(str::to_string),
            units,
        })
    }

    /// Cities inside a rectangle; see [`BoundingBox`] for the default zoom.
    pub fn current_weather_with_bound_box(
        &self,
        bbox: BoundingBox,
        units: Units,
    ) -> Result<ApiResponse> {
        self.send(&WeatherRequest::CurrentInBoundingBox { bbox, units })
    }

    /// Up to `count` cities around a point.
    pub fn current_weather_with_circle(
        &self,
        lat: f64,
        lon: f64,
        count: u32,
        units: Units,
    ) -> Result<ApiResponse> {
        self.send(&WeatherRequest::CurrentInCircle {
            lat,
            lon,
            count,
            units,
        })
    }

    /// The provider documents a limit of 20 ids per call. It is not enforced here.
    pub fn current_weather_with_several_city_ids(
        &self,
        city_ids: &[u64],
        units: Units,
    ) -> Result<ApiResponse> {
        self.send(&WeatherRequest::CurrentForCityIds {
            ids: city_ids.to_vec(),
            units,
        })
    }

    // Hourly forecast: https://openweathermap.org/api/hourly-forecast
    // Needs a paid subscription; a free key gets a 401 body back.

    pub fn hourly_forecast_by_city_name(&self, city_name: &str) -> Result<ApiResponse> {
        self.send(&WeatherRequest::HourlyForecastByCityName {
            city_name: city_name.to_string(),
        })
    }

    pub fn hourly_forecast_by_zip_code(
        &self,
        zip_code: impl ToString,
        country_code: Option<&str>,
    ) -> Result<ApiResponse> {
        self.send(&WeatherRequest::HourlyForecastByZipCode {
            zip_code: zip_code.to_string(),
            country_code: country_code.map(str::to_string),
        })
    }

    // Daily forecast 16 days: https://openweathermap.org/forecast16
    // Same subscription caveat as the hourly forecast.

    pub fn daily_forecast_by_city_name(
        &self,
        city_name: &str,
        state_code: Option<&str>,
        country_code: Option<&str>,
        cnt: u32,
        units: Units,
    ) -> Result<ApiResponse> {
        self.send(&WeatherRequest::DailyForecastByCityName {
            city: CityName::from_parts(city_name, state_code, country_code),
            cnt,
            units,
        })
    }

    // Air pollution: https://openweathermap.org/api/air-pollution

    pub fn current_air_pollution_data(&self, lat: f64, lon: f64) -> Result<ApiResponse> {
        self.send(&WeatherRequest::AirPollution { lat, lon })
    }

    pub fn forecast_air_pollution_data(&self, lat: f64, lon: f64) -> Result<ApiResponse> {
        self.send(&WeatherRequest::AirPollutionForecast { lat, lon })
    }

    /// `start` and `end` are unix timestamps (UTC seconds).
    pub fn historical_air_pollution_data(
        &self,
        lat: f64,
        lon: f64,
        start: i64,
        end: i64,
    ) -> Result<ApiResponse> {
        self.send(&WeatherRequest::AirPollutionHistory {
            lat,
            lon,
            start,
            end,
        })
    }

    pub fn historical_air_pollution_between(
        &self,
        lat: f64,
        lon: f64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<ApiResponse> {
        self.historical_air_pollution_data(lat, lon, start.timestamp(), end.timestamp())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::logger::tests::capture;
    use crate::request::DEFAULT_DAILY_COUNT;
    use std::collections::BTreeSet;
    use tracing::Level;

    fn client() -> Client {
        Client::with_api_key("KEY").unwrap()
    }

    fn query_keys(url: &Url) -> BTreeSet<String> {
        url.query_pairs().map(|(k, _)| k.into_owned()).collect()
    }

    #[test]
    fn city_id_url_matches_provider_docs() {
        let url = client()
            .request_url(&WeatherRequest::CurrentByCityId {
                id: 5308655,
                units: Units::default(),
            })
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.openweathermap.org/data/2.5/weather?id=5308655&units=imperial&appid=KEY"
        );
    }

    #[test]
    fn city_ids_above_i64_max_are_not_wrapped() {
        let c = client();
        let single = c
            .request_url(&WeatherRequest::CurrentByCityId {
                id: u64::MAX,
                units: Units::Imperial,
            })
            .unwrap();
        assert!(single.query().unwrap().starts_with("id=18446744073709551615&"));

        let group = c
            .request_url(&WeatherRequest::CurrentForCityIds {
                ids: vec![1, 9223372036854775808],
                units: Units::Imperial,
            })
            .unwrap();
        let id = group.query_pairs().find(|(k, _)| k == "id").map(|(_, v)| v.into_owned());
        assert_eq!(id.as_deref(), Some("1,9223372036854775808"));
    }

    #[test]
    fn history_url_has_exact_keys() {
        let url = client()
            .request_url(&WeatherRequest::AirPollutionHistory {
                lat: 29.0,
                lon: -98.0,
                start: 1606223802,
                end: 1606482999,
            })
            .unwrap();

        let expected: BTreeSet<String> = ["lat", "lon", "start", "end", "appid"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(query_keys(&url), expected);
        assert_eq!(url.path(), "/data/2.5/air_pollution/history");
        assert_eq!(
            url.query(),
            Some("lat=29&lon=-98&start=1606223802&end=1606482999&appid=KEY")
        );
    }

    #[test]
    fn forecasts_use_pro_host() {
        let c = client();
        let daily = c
            .request_url(&WeatherRequest::DailyForecastByCityName {
                city: CityName::new("Houston"),
                cnt: DEFAULT_DAILY_COUNT,
                units: Units::Imperial,
            })
            .unwrap();
        assert_eq!(daily.host_str(), Some("pro.openweathermap.org"));
        assert_eq!(
            daily.query(),
            Some("q=Houston&cnt=10&units=imperial&appid=KEY")
        );

        let hourly = c
            .request_url(&WeatherRequest::HourlyForecastByCityName {
                city_name: "Tucson".into(),
            })
            .unwrap();
        assert_eq!(hourly.host_str(), Some("pro.openweathermap.org"));
        assert_eq!(hourly.path(), "/data/2.5/forecast/hourly");
        assert!(!query_keys(&hourly).contains("units"));
    }

    #[test]
    fn api_key_is_never_in_debug_output() {
        let c = Client::with_api_key("SUPER-SECRET").unwrap();
        let shown = format!("{c:?}");
        assert!(!shown.contains("SUPER-SECRET"));
        assert!(shown.contains("<redacted>"));
    }

    #[test]
    fn rejects_bad_base_url() {
        let err = Client::new(ClientOptions {
            api_key: "KEY".into(),
            base_url: "api.openweathermap.org/data/2.5".into(),
            ..ClientOptions::default()
        })
        .unwrap_err();
        assert!(matches!(err, Error::InvalidBaseUrl(_)));
    }

    #[test]
    fn options_deserialize_with_defaults() {
        let opts: ClientOptions = serde_json::from_str(r#"{"api_key":"KEY","timeout_secs":5}"#).unwrap();
        assert_eq!(opts.api_key, "KEY");
        assert_eq!(opts.timeout_secs, 5);
        assert_eq!(opts.base_url, DEFAULT_BASE_URL);
        assert_eq!(opts.pro_base_url, PRO_BASE_URL);
        assert!(!opts.redact_api_key_in_logs);
    }

    fn unreachable_client(redact: bool) -> Client {
        Client::new(ClientOptions {
            api_key: "SECRET".into(),
            base_url: "http://127.0.0.1:1".into(),
            timeout_secs: 5,
            redact_api_key_in_logs: redact,
            ..ClientOptions::default()
        })
        .unwrap()
    }

    #[test]
    fn connection_failure_is_a_transport_error() {
        let err = unreachable_client(false)
            .current_air_pollution_data(29.0, -98.0)
            .unwrap_err();
        assert!(matches!(err, Error::Http(_)));
    }

    #[test]
    fn outgoing_url_is_logged_with_key() {
        let (logger, out) = capture("owm", Level::INFO);
        let c = unreachable_client(false);
        let _ = logger.in_scope(|| c.current_weather_by_city_id(5308655, Units::Metric));

        let text = out.text();
        assert!(text.contains("sending request to:"));
        assert!(text.contains("id=5308655&units=metric&appid=SECRET"));
    }

    #[test]
    fn outgoing_url_can_be_redacted() {
        let (logger, out) = capture("owm", Level::INFO);
        let c = unreachable_client(true);
        let _ = logger.in_scope(|| c.current_weather_by_city_id(5308655, Units::Metric));

        let text = out.text();
        assert!(text.contains("appid=***"));
        assert!(!text.contains("SECRET"));
    }
}
