use url::Url;

use crate::error::{Error, Result};
use crate::request::QueryParams;
use crate::sources::{Tier, is_http_url};

/// A documented provider path with a fixed parameter set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Weather,
    BoxCity,
    Find,
    Group,
    ForecastHourly,
    ForecastDaily,
    AirPollution,
    AirPollutionForecast,
    AirPollutionHistory,
}

impl Endpoint {
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::Weather => "weather",
            Endpoint::BoxCity => "box/city",
            Endpoint::Find => "find",
            Endpoint::Group => "group",
            Endpoint::ForecastHourly => "forecast/hourly",
            Endpoint::ForecastDaily => "forecast/daily",
            Endpoint::AirPollution => "air_pollution",
            Endpoint::AirPollutionForecast => "air_pollution/forecast",
            Endpoint::AirPollutionHistory => "air_pollution/history",
        }
    }

    pub fn tier(&self) -> Tier {
        match self {
            Endpoint::ForecastHourly | Endpoint::ForecastDaily => Tier::Pro,
            _ => Tier::Standard,
        }
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path())
    }
}

/// Check that a configured base URL is usable before any request is built.
pub fn validate_base_url(base_url: &str) -> Result<()> {
    if !is_http_url(base_url) {
        return Err(Error::InvalidBaseUrl(base_url.to_string()));
    }
    Url::parse(base_url)?;
    Ok(())
}

/// `{base}/{path}?{params}&appid={api_key}`.
///
/// Values are percent-encoded with the `application/x-www-form-urlencoded`
/// rules, so a space becomes `+` rather than `%20` and `,` becomes `%2C`. The
/// provider decodes both forms to the same value. `appid` always comes last.
pub fn endpoint_url(
    base_url: &str,
    endpoint: Endpoint,
    params: &QueryParams,
    api_key: &str,
) -> Result<Url> {
    let raw = format!("{}/{}", base_url.trim_end_matches('/'), endpoint.path());
    let mut url = Url::parse(&raw)?;

    {
        let mut pairs = url.query_pairs_mut();
        for (key, value) in params.iter() {
            pairs.append_pair(key, &value.to_query_string());
        }
        pairs.append_pair("appid", api_key);
    }

    Ok(url)
}

/// Replace the `appid` value so the URL can be logged without leaking the key.
pub fn redact_appid(url: &Url) -> String {
    let mut redacted = url.clone();
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            let v = if k == "appid" { "***".to_string() } else { v.into_owned() };
            (k.into_owned(), v)
        })
        .collect();
    redacted.query_pairs_mut().clear().extend_pairs(pairs);
    redacted.to_string()
}
