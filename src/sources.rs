/// Base URL of the free-tier data API.
pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";

/// Base URL of the subscription tier serving the hourly and daily forecast products.
pub const PRO_BASE_URL: &str = "https://pro.openweathermap.org/data/2.5";

/// Which host an endpoint lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Standard,
    Pro,
}

pub fn is_http_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}
