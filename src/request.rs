use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::url_builder::Endpoint;

/// Units of measurement understood by the provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    /// Kelvin.
    Standard,
    /// Celsius.
    Metric,
    /// Fahrenheit.
    #[default]
    Imperial,
}

impl Units {
    pub fn as_str(&self) -> &'static str {
        match self {
            Units::Standard => "standard",
            Units::Metric => "metric",
            Units::Imperial => "imperial",
        }
    }
}

impl fmt::Display for Units {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Units {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" => Ok(Units::Standard),
            "metric" => Ok(Units::Metric),
            "imperial" => Ok(Units::Imperial),
            _ => Err(Error::InvalidUnits(s.to_string())),
        }
    }
}

/// Value type for a query parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryValue {
    Str(String),
    Int(i64),
    UInt(u64),
    Float(f64),
    /// Serialized comma-joined, in order.
    IntList(Vec<i64>),
    /// Serialized comma-joined, in order.
    UIntList(Vec<u64>),
}

impl From<&str> for QueryValue {
    fn from(value: &str) -> Self {
        QueryValue::Str(value.to_string())
    }
}

impl From<String> for QueryValue {
    fn from(value: String) -> Self {
        QueryValue::Str(value)
    }
}

impl From<&String> for QueryValue {
    fn from(value: &String) -> Self {
        QueryValue::Str(value.clone())
    }
}

impl From<i64> for QueryValue {
    fn from(value: i64) -> Self {
        QueryValue::Int(value)
    }
}

impl From<i32> for QueryValue {
    fn from(value: i32) -> Self {
        QueryValue::Int(value as i64)
    }
}

impl From<u32> for QueryValue {
    fn from(value: u32) -> Self {
        QueryValue::Int(value as i64)
    }
}

impl From<u64> for QueryValue {
    fn from(value: u64) -> Self {
        QueryValue::UInt(value)
    }
}

impl From<f64> for QueryValue {
    fn from(value: f64) -> Self {
        QueryValue::Float(value)
    }
}

impl From<f32> for QueryValue {
    fn from(value: f32) -> Self {
        QueryValue::Float(value as f64)
    }
}

impl From<Vec<i64>> for QueryValue {
    fn from(value: Vec<i64>) -> Self {
        QueryValue::IntList(value)
    }
}

impl From<&[u64]> for QueryValue {
    fn from(value: &[u64]) -> Self {
        QueryValue::UIntList(value.to_vec())
    }
}

impl From<Units> for QueryValue {
    fn from(value: Units) -> Self {
        QueryValue::Str(value.as_str().to_string())
    }
}

impl QueryValue {
    /// Wire form before URL escaping.
    ///
    /// Floats with no fractional part print without a trailing `.0`, so `12.0`
    /// and `12` both become `"12"`.
    pub fn to_query_string(&self) -> String {
        match self {
            QueryValue::Str(s) => s.clone(),
            QueryValue::Int(i) => i.to_string(),
            QueryValue::UInt(u) => u.to_string(),
            QueryValue::Float(x) => x.to_string(),
            QueryValue::IntList(xs) => join_numbers(xs),
            QueryValue::UIntList(xs) => join_numbers(xs),
        }
    }
}

impl fmt::Display for QueryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_query_string())
    }
}

/// Ordered query parameters for a single call. `appid` is not part of it; the
/// client appends the key when the URL is built.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryParams {
    pairs: Vec<(&'static str, QueryValue)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self { pairs: Vec::new() }
    }

    pub fn push(&mut self, key: &'static str, value: impl Into<QueryValue>) {
        self.pairs.push((key, value.into()));
    }

    pub fn with(mut self, key: &'static str, value: impl Into<QueryValue>) -> Self {
        self.push(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&QueryValue> {
        self.pairs.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.pairs.iter().map(|(k, _)| *k)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &QueryValue)> {
        self.pairs.iter().map(|(k, v)| (*k, v))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// City lookup for the `q` parameter: `city[,state][,country]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CityName {
    pub name: String,
    pub state_code: Option<String>,
    pub country_code: Option<String>,
}

impl CityName {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state_code: None,
            country_code: None,
        }
    }

    pub fn state(mut self, code: impl Into<String>) -> Self {
        self.state_code = Some(code.into());
        self
    }

    pub fn country(mut self, code: impl Into<String>) -> Self {
        self.country_code = Some(code.into());
        self
    }

    pub(crate) fn from_parts(name: &str, state_code: Option<&str>, country_code: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            state_code: non_empty(state_code),
            country_code: non_empty(country_code),
        }
    }

    /// Positional join. A country without a state is sent as `city,country`,
    /// which the provider also accepts.
    pub fn to_query_string(&self) -> String {
        let mut q = self.name.clone();
        for part in [&self.state_code, &self.country_code].into_iter().flatten() {
            q.push(',');
            q.push_str(part);
        }
        q
    }
}

impl From<&str> for CityName {
    fn from(value: &str) -> Self {
        CityName::new(value)
    }
}

impl From<String> for CityName {
    fn from(value: String) -> Self {
        CityName::new(value)
    }
}

/// Rectangle for the `box/city` endpoint, serialized as `left,bottom,right,top,zoom`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub lon_left: f64,
    pub lat_bottom: f64,
    pub lon_right: f64,
    pub lat_top: f64,
    pub zoom: u32,
}

impl BoundingBox {
    pub const DEFAULT_ZOOM: u32 = 10;

    pub fn new(lon_left: f64, lat_bottom: f64, lon_right: f64, lat_top: f64) -> Self {
        Self {
            lon_left,
            lat_bottom,
            lon_right,
            lat_top,
            zoom: Self::DEFAULT_ZOOM,
        }
    }

    pub fn zoom(mut self, zoom: u32) -> Self {
        self.zoom = zoom;
        self
    }

    pub fn to_query_string(&self) -> String {
        [
            QueryValue::Float(self.lon_left),
            QueryValue::Float(self.lat_bottom),
            QueryValue::Float(self.lon_right),
            QueryValue::Float(self.lat_top),
            QueryValue::from(self.zoom),
        ]
        .iter()
        .map(QueryValue::to_query_string)
        .collect::<Vec<_>>()
        .join(",")
    }
}

/// Default `cnt` for the daily forecast.
pub const DEFAULT_DAILY_COUNT: u32 = 10;

/// One documented query shape. Turned into an [`Endpoint`] plus [`QueryParams`]
/// by [`WeatherRequest::endpoint`] and [`WeatherRequest::params`].
///
/// No values are range-checked: out-of-range coordinates, unknown ids or a
/// city-id list longer than the provider's 20-id cap are sent as given.
#[derive(Debug, Clone, PartialEq)]
pub enum WeatherRequest {
    CurrentByCityName {
        city: CityName,
        units: Units,
    },
    CurrentByCityId {
        id: u64,
        units: Units,
    },
    CurrentByCoordinates {
        lat: f64,
        lon: f64,
        units: Units,
    },
    CurrentByZipCode {
        zip_code: String,
        country_code: Option<String>,
        units: Units,
    },
    CurrentInBoundingBox {
        bbox: BoundingBox,
        units: Units,
    },
    CurrentInCircle {
        lat: f64,
        lon: f64,
        count: u32,
        units: Units,
    },
    CurrentForCityIds {
        ids: Vec<u64>,
        units: Units,
    },
    /// Pro tier.
    HourlyForecastByCityName {
        city_name: String,
    },
    /// Pro tier.
    HourlyForecastByZipCode {
        zip_code: String,
        country_code: Option<String>,
    },
    /// Pro tier.
    DailyForecastByCityName {
        city: CityName,
        cnt: u32,
        units: Units,
    },
    AirPollution {
        lat: f64,
        lon: f64,
    },
    AirPollutionForecast {
        lat: f64,
        lon: f64,
    },
    /// `start`/`end` are unix seconds, UTC.
    AirPollutionHistory {
        lat: f64,
        lon: f64,
        start: i64,
        end: i64,
    },
}

impl WeatherRequest {
    pub fn endpoint(&self) -> Endpoint {
        match self {
            WeatherRequest::CurrentByCityName { .. }
            | WeatherRequest::CurrentByCityId { .. }
            | WeatherRequest::CurrentByCoordinates { .. }
            | WeatherRequest::CurrentByZipCode { .. } => Endpoint::Weather,
            WeatherRequest::CurrentInBoundingBox { .. } => Endpoint::BoxCity,
            WeatherRequest::CurrentInCircle { .. } => Endpoint::Find,
            WeatherRequest::CurrentForCityIds { .. } => Endpoint::Group,
            WeatherRequest::HourlyForecastByCityName { .. }
            | WeatherRequest::HourlyForecastByZipCode { .. } => Endpoint::ForecastHourly,
            WeatherRequest::DailyForecastByCityName { .. } => Endpoint::ForecastDaily,
            WeatherRequest::AirPollution { .. } => Endpoint::AirPollution,
            WeatherRequest::AirPollutionForecast { .. } => Endpoint::AirPollutionForecast,
            WeatherRequest::AirPollutionHistory { .. } => Endpoint::AirPollutionHistory,
        }
    }

    /// Units sent with the request, if the endpoint takes any.
    pub fn units(&self) -> Option<Units> {
        match self {
            WeatherRequest::CurrentByCityName { units, .. }
            | WeatherRequest::CurrentByCityId { units, .. }
            | WeatherRequest::CurrentByCoordinates { units, .. }
            | WeatherRequest::CurrentByZipCode { units, .. }
            | WeatherRequest::CurrentInBoundingBox { units, .. }
            | WeatherRequest::CurrentInCircle { units, .. }
            | WeatherRequest::CurrentForCityIds { units, .. }
            | WeatherRequest::DailyForecastByCityName { units, .. } => Some(*units),
            WeatherRequest::HourlyForecastByCityName { .. }
            | WeatherRequest::HourlyForecastByZipCode { .. }
            | WeatherRequest::AirPollution { .. }
            | WeatherRequest::AirPollutionForecast { .. }
            | WeatherRequest::AirPollutionHistory { .. } => None,
        }
    }

    /// Endpoint parameters in wire order, `units` last.
    pub fn params(&self) -> QueryParams {
        let mut p = QueryParams::new();

        match self {
            WeatherRequest::CurrentByCityName { city, .. } => {
                p.push("q", city.to_query_string());
            }
            WeatherRequest::CurrentByCityId { id, .. } => {
                p.push("id", *id);
            }
            WeatherRequest::CurrentByCoordinates { lat, lon, .. }
            | WeatherRequest::AirPollution { lat, lon }
            | WeatherRequest::AirPollutionForecast { lat, lon } => {
                p.push("lat", *lat);
                p.push("lon", *lon);
            }
            WeatherRequest::CurrentByZipCode {
                zip_code,
                country_code,
                ..
            }
            | WeatherRequest::HourlyForecastByZipCode {
                zip_code,
                country_code,
            } => {
                p.push("zip", zip_query(zip_code, country_code.as_deref()));
            }
            WeatherRequest::CurrentInBoundingBox { bbox, .. } => {
                p.push("bbox", bbox.to_query_string());
            }
            WeatherRequest::CurrentInCircle {
                lat, lon, count, ..
            } => {
                p.push("lat", *lat);
                p.push("lon", *lon);
                p.push("cnt", *count);
            }
            WeatherRequest::CurrentForCityIds { ids, .. } => {
                p.push("id", ids.as_slice());
            }
            WeatherRequest::HourlyForecastByCityName { city_name } => {
                p.push("q", city_name);
            }
            WeatherRequest::DailyForecastByCityName { city, cnt, .. } => {
                p.push("q", city.to_query_string());
                p.push("cnt", *cnt);
            }
            WeatherRequest::AirPollutionHistory {
                lat,
                lon,
                start,
                end,
            } => {
                p.push("lat", *lat);
                p.push("lon", *lon);
                p.push("start", *start);
                p.push("end", *end);
            }
        }

        if let Some(units) = self.units() {
            p.push("units", units);
        }

        p
    }
}

fn join_numbers<T: ToString>(xs: &[T]) -> String {
    xs.iter()
        .map(|x| x.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

fn zip_query(zip_code: &str, country_code: Option<&str>) -> String {
    match country_code.filter(|c| !c.is_empty()) {
        Some(cc) => format!("{zip_code},{cc}"),
        None => zip_code.to_string(),
    }
}

fn non_empty(s: Option<&str>) -> Option<String> {
    s.filter(|x| !x.is_empty()).map(|x| x.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(r: &WeatherRequest) -> Vec<&'static str> {
        r.params().keys().collect()
    }

    #[test]
    fn units_parse_and_print() {
        assert_eq!("metric".parse::<Units>().unwrap(), Units::Metric);
        assert_eq!(" Imperial ".parse::<Units>().unwrap(), Units::Imperial);
        assert_eq!(Units::default(), Units::Imperial);
        assert_eq!(Units::Standard.to_string(), "standard");
        assert!(matches!("kelvin".parse::<Units>(), Err(Error::InvalidUnits(_))));
    }

    #[test]
    fn float_values_drop_trailing_zero() {
        assert_eq!(QueryValue::Float(12.0).to_query_string(), "12");
        assert_eq!(QueryValue::Float(-112.074).to_query_string(), "-112.074");
        assert_eq!(QueryValue::from(55.5).to_query_string(), "55.5");
    }

    #[test]
    fn city_name_is_positional() {
        assert_eq!(CityName::new("Tucson").to_query_string(), "Tucson");
        assert_eq!(CityName::new("Tucson").state("AZ").to_query_string(), "Tucson,AZ");
        assert_eq!(
            CityName::new("Tucson").state("AZ").country("US").to_query_string(),
            "Tucson,AZ,US"
        );
        assert_eq!(CityName::new("London").country("GB").to_query_string(), "London,GB");
    }

    #[test]
    fn city_name_from_parts_ignores_empty_codes() {
        let c = CityName::from_parts("Houston", Some(""), Some("US"));
        assert_eq!(c.to_query_string(), "Houston,US");
    }

    #[test]
    fn current_by_city_name_has_single_q_and_units() {
        let r = WeatherRequest::CurrentByCityName {
            city: CityName::new("San Antonio").state("TX"),
            units: Units::Metric,
        };
        let p = r.params();
        assert_eq!(keys(&r), vec!["q", "units"]);
        assert_eq!(p.get("q"), Some(&QueryValue::Str("San Antonio,TX".into())));
        assert_eq!(p.get("units"), Some(&QueryValue::Str("metric".into())));
        assert_eq!(r.endpoint(), Endpoint::Weather);
    }

    #[test]
    fn bbox_keeps_fixed_order_for_ints_and_floats() {
        let ints = BoundingBox::new(12.0, 32.0, 15.0, 37.0);
        assert_eq!(ints.to_query_string(), "12,32,15,37,10");

        let floats = BoundingBox::new(12.5, -32.25, 15.0, 37.75).zoom(7);
        assert_eq!(floats.to_query_string(), "12.5,-32.25,15,37.75,7");

        let r = WeatherRequest::CurrentInBoundingBox {
            bbox: ints,
            units: Units::Imperial,
        };
        assert_eq!(r.endpoint(), Endpoint::BoxCity);
        assert_eq!(keys(&r), vec!["bbox", "units"]);
    }

    #[test]
    fn circle_maps_count_to_cnt() {
        let r = WeatherRequest::CurrentInCircle {
            lat: 55.5,
            lon: 37.5,
            count: 10,
            units: Units::Imperial,
        };
        assert_eq!(keys(&r), vec!["lat", "lon", "cnt", "units"]);
        assert_eq!(r.params().get("cnt"), Some(&QueryValue::Int(10)));
        assert_eq!(r.endpoint(), Endpoint::Find);
    }

    #[test]
    fn city_ids_are_joined_in_input_order() {
        let r = WeatherRequest::CurrentForCityIds {
            ids: vec![524901, 703448, 2643743],
            units: Units::Imperial,
        };
        assert_eq!(
            r.params().get("id").map(QueryValue::to_query_string).as_deref(),
            Some("524901,703448,2643743")
        );
        assert_eq!(r.endpoint(), Endpoint::Group);
    }

    #[test]
    fn city_id_list_is_not_capped() {
        let ids: Vec<u64> = (1..=25).collect();
        let r = WeatherRequest::CurrentForCityIds {
            ids,
            units: Units::Metric,
        };
        let joined = r.params().get("id").map(QueryValue::to_query_string).unwrap();
        assert_eq!(joined.split(',').count(), 25);
    }

    #[test]
    fn large_city_ids_are_sent_unchanged() {
        let single = WeatherRequest::CurrentByCityId {
            id: u64::MAX,
            units: Units::Imperial,
        };
        assert_eq!(single.params().get("id"), Some(&QueryValue::UInt(u64::MAX)));
        assert_eq!(
            single.params().get("id").map(QueryValue::to_query_string).as_deref(),
            Some("18446744073709551615")
        );

        let group = WeatherRequest::CurrentForCityIds {
            ids: vec![1, 9223372036854775808],
            units: Units::Imperial,
        };
        assert_eq!(
            group.params().get("id").map(QueryValue::to_query_string).as_deref(),
            Some("1,9223372036854775808")
        );
    }

    #[test]
    fn zip_with_and_without_country() {
        let with = WeatherRequest::CurrentByZipCode {
            zip_code: "78205".into(),
            country_code: Some("US".into()),
            units: Units::Imperial,
        };
        assert_eq!(with.params().get("zip"), Some(&QueryValue::Str("78205,US".into())));

        let without = WeatherRequest::CurrentByZipCode {
            zip_code: "78232".into(),
            country_code: None,
            units: Units::Imperial,
        };
        assert_eq!(without.params().get("zip"), Some(&QueryValue::Str("78232".into())));
    }

    #[test]
    fn hourly_forecast_has_no_units() {
        let by_city = WeatherRequest::HourlyForecastByCityName {
            city_name: "Tucson".into(),
        };
        assert_eq!(keys(&by_city), vec!["q"]);
        assert_eq!(by_city.endpoint(), Endpoint::ForecastHourly);

        let by_zip = WeatherRequest::HourlyForecastByZipCode {
            zip_code: "78232".into(),
            country_code: Some("US".into()),
        };
        assert_eq!(keys(&by_zip), vec!["zip"]);
        assert!(by_zip.units().is_none());
    }

    #[test]
    fn daily_forecast_carries_cnt_and_units() {
        let r = WeatherRequest::DailyForecastByCityName {
            city: CityName::new("Houston"),
            cnt: DEFAULT_DAILY_COUNT,
            units: Units::Imperial,
        };
        assert_eq!(keys(&r), vec!["q", "cnt", "units"]);
        assert_eq!(r.params().get("cnt"), Some(&QueryValue::Int(10)));
    }

    #[test]
    fn air_pollution_never_sends_units() {
        let current = WeatherRequest::AirPollution { lat: 29.0, lon: -98.0 };
        let forecast = WeatherRequest::AirPollutionForecast { lat: 29.0, lon: -98.0 };
        let history = WeatherRequest::AirPollutionHistory {
            lat: 29.0,
            lon: -98.0,
            start: 1606223802,
            end: 1606482999,
        };

        assert_eq!(keys(&current), vec!["lat", "lon"]);
        assert_eq!(keys(&forecast), vec!["lat", "lon"]);
        assert_eq!(keys(&history), vec!["lat", "lon", "start", "end"]);
        assert_eq!(history.params().get("lon"), Some(&QueryValue::Float(-98.0)));
        assert_eq!(history.endpoint(), Endpoint::AirPollutionHistory);
    }

    #[test]
    fn query_params_builder() {
        let p = QueryParams::new().with("lat", 1.5).with("lon", 2);
        assert_eq!(p.len(), 2);
        assert!(p.contains_key("lon"));
        assert!(!p.contains_key("units"));
        assert!(!p.is_empty());
    }
}
