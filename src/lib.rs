#![forbid(unsafe_code)]

//! Blocking Rust client for the OpenWeatherMap REST API.
//!
//! Each method maps one-to-one onto a documented endpoint: the arguments become
//! query parameters, the API key is appended as `appid`, and a single GET is
//! issued. The body comes back as [`ApiResponse::Decoded`] when it is JSON and
//! as [`ApiResponse::Raw`] otherwise. Provider error payloads (bad key, unknown
//! city) are returned as data, not as errors.
//!
//! **Quick start**
//! ```no_run
//! use openweather_client::{Client, Units};
//!
//! let client = Client::with_api_key("<api key>")?;
//! let phoenix = client.current_weather_by_city_id(5308655, Units::Imperial)?;
//! if let Some(json) = phoenix.as_json() {
//!     println!("{}", json["weather"][0]["main"]);
//! }
//! # Ok::<(), openweather_client::Error>(())
//! ```
//!
//! **Request style**
//! ```no_run
//! use openweather_client::{BoundingBox, Client, Units, WeatherRequest};
//!
//! let client = Client::with_api_key("<api key>")?;
//! let req = WeatherRequest::CurrentInBoundingBox {
//!     bbox: BoundingBox::new(12.0, 32.0, 15.0, 37.0).zoom(10),
//!     units: Units::Metric,
//! };
//! println!("{}", client.request_url(&req)?);
//! let cities = client.send(&req)?;
//! # Ok::<(), openweather_client::Error>(())
//! ```
//!
//! Notes:
//! - The hourly and daily forecast endpoints live on the `pro` host and need a
//!   paid subscription; with a free key they return a 401 error body.
//! - Outgoing URLs are logged at `info` level through `tracing`, key included,
//!   unless [`ClientOptions::redact_api_key_in_logs`] is set.

mod client;
mod error;
mod logger;
mod request;
mod response;
mod sources;
mod url_builder;

pub use crate::client::{Client, ClientOptions, DEFAULT_TIMEOUT_SECS};
pub use crate::error::{Error, Result};
pub use crate::logger::{ConsoleLogger, create_console_logger};
pub use crate::request::{
    BoundingBox, CityName, DEFAULT_DAILY_COUNT, QueryParams, QueryValue, Units, WeatherRequest,
};
pub use crate::response::ApiResponse;
pub use crate::sources::{DEFAULT_BASE_URL, PRO_BASE_URL, Tier};
pub use crate::url_builder::Endpoint;
