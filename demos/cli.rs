use std::env;
use std::str::FromStr;

use openweather_client::{BoundingBox, Client, Units, create_console_logger};
use tracing::Level;

const USAGE: &str = "Usage:
  cargo run --example cli -- [--api-key <key>] <command> [args...]

Commands:
  city <name> [state] [country]      current weather by city name
  id <city id>                       current weather by city id
  coords <lat> <lon>                 current weather by coordinates
  zip <zip> [country]                current weather by ZIP code
  box <left> <bottom> <right> <top>  cities in a bounding box (zoom 10)
  circle <lat> <lon> <count>         cities around a point
  group <id,id,...>                  several city ids (max 20)
  hourly <name>                      hourly forecast (paid tier)
  daily <name> [cnt]                 daily forecast (paid tier)
  air <lat> <lon>                    current air pollution
  air-forecast <lat> <lon>           air pollution forecast
  air-history <lat> <lon> <start> <end>
                                     air pollution history (unix seconds)

The API key is taken from --api-key, or else from OPENWEATHER_API_KEY.
Set OPENWEATHER_UNITS to standard, metric or imperial (default imperial).";

fn usage_error(message: &str) -> ! {
    eprintln!("{message}\n\n{USAGE}");
    std::process::exit(2);
}

fn try_parse_arg<T: FromStr>(args: &[String], i: usize) -> Result<T, String> {
    let raw = args.get(i).ok_or_else(|| format!("missing argument {i}"))?;
    raw.trim()
        .parse()
        .map_err(|_| format!("argument {i} is not valid: {raw:?}"))
}

/// Parse argument `i` as `T`, exiting with usage on a missing or malformed value.
fn parse_arg<T: FromStr>(args: &[String], i: usize) -> T {
    try_parse_arg(args, i).unwrap_or_else(|e| usage_error(&e))
}

fn parse_city_ids(list: &str) -> Result<Vec<u64>, String> {
    list.split(',')
        .map(|s| {
            s.trim()
                .parse()
                .map_err(|_| format!("invalid city id: {s:?}"))
        })
        .collect()
}

/// Remove a leading `--api-key <key>` from `args` and return the key.
fn take_api_key_flag(args: &mut Vec<String>) -> Result<Option<String>, String> {
    if args.first().map(String::as_str) != Some("--api-key") {
        return Ok(None);
    }
    if args.len() < 2 {
        return Err("--api-key needs a value".to_string());
    }
    let key = args.remove(1);
    args.remove(0);
    Ok(Some(key))
}

fn main() {
    let mut args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() {
        eprintln!("{USAGE}");
        return;
    }

    let flag_key = take_api_key_flag(&mut args).unwrap_or_else(|e| usage_error(&e));

    let Some(api_key) = flag_key.or_else(|| env::var("OPENWEATHER_API_KEY").ok()) else {
        usage_error("no API key: pass --api-key or set OPENWEATHER_API_KEY.");
    };

    let units = match env::var("OPENWEATHER_UNITS") {
        Ok(s) => s.parse::<Units>().unwrap_or_else(|e| {
            eprintln!("{e}");
            std::process::exit(2);
        }),
        Err(_) => Units::default(),
    };

    if let Err(e) = create_console_logger("openweather", Level::INFO).init() {
        eprintln!("{e}");
    }

    let client = Client::with_api_key(api_key).unwrap_or_else(|e| {
        eprintln!("create client failed: {e}");
        std::process::exit(1);
    });

    let arg = |i: usize| args.get(i).map(String::as_str);
    let num = |i: usize| -> f64 { parse_arg(&args, i) };
    let text = |i: usize| arg(i).unwrap_or_else(|| usage_error(&format!("missing argument {i}")));

    let result = match arg(0) {
        Some("city") => client.current_weather_by_city_name(text(1), arg(2), arg(3), units),
        Some("id") => client.current_weather_by_city_id(parse_arg(&args, 1), units),
        Some("coords") => client.current_weather_by_geo_coordinates(num(1), num(2), units),
        Some("zip") => client.current_weather_by_zip_code(text(1), arg(2), units),
        Some("box") => client.current_weather_with_bound_box(
            BoundingBox::new(num(1), num(2), num(3), num(4)),
            units,
        ),
        Some("circle") => client.current_weather_with_circle(num(1), num(2), parse_arg(&args, 3), units),
        Some("group") => {
            let ids = parse_city_ids(text(1)).unwrap_or_else(|e| usage_error(&e));
            client.current_weather_with_several_city_ids(&ids, units)
        }
        Some("hourly") => client.hourly_forecast_by_city_name(text(1)),
        Some("daily") => {
            let cnt = if args.len() > 2 { parse_arg(&args, 2) } else { 10 };
            client.daily_forecast_by_city_name(text(1), None, None, cnt, units)
        }
        Some("air") => client.current_air_pollution_data(num(1), num(2)),
        Some("air-forecast") => client.forecast_air_pollution_data(num(1), num(2)),
        Some("air-history") => {
            let start: i64 = parse_arg(&args, 3);
            let end: i64 = parse_arg(&args, 4);
            client.historical_air_pollution_data(num(1), num(2), start, end)
        }
        _ => usage_error("Unknown command."),
    };

    match result {
        Ok(resp) => {
            if let Some((code, message)) = resp.provider_error() {
                eprintln!("provider returned {code}: {message}");
            }
            match resp.as_json() {
                Some(v) => println!(
                    "{}",
                    serde_json::to_string_pretty(v).unwrap_or_else(|_| v.to_string())
                ),
                None => println!("{resp}"),
            }
        }
        Err(e) => {
            eprintln!("request failed: {e}");
            std::process::exit(1);
        }
    }
}
