//! `weather`: deterministic forecasts with dynamic unit and city options.
//!
//! Forecasts are derived from the city name so results are stable without
//! network access.

use dockyard_core::connector::{
    ConnectorError, ConnectorModule, ConnectorResult, MethodContext, OptionsContext, RunContext,
};
use serde_json::{Value, json};

/// Package slug.
pub const SLUG: &str = "weather";

const CONDITIONS: [&str; 5] = ["sunny", "cloudy", "rain", "windy", "snow"];

const CITIES: [&str; 9] = [
    "NYC", "London", "Paris", "Tokyo", "Sydney", "Lagos", "Lima", "Oslo", "Pune",
];

/// Cities returned per options page.
pub const CITY_PAGE_SIZE: usize = 4;

/// Build the compiled module.
pub fn module() -> ConnectorModule {
    ConnectorModule::builder(SLUG)
        .method("forecast", forecast)
        .entry_point("get_forecast", get_forecast)
        .options_resolver("list_units", list_units)
        .options_resolver("list_cities", list_cities)
        .build()
}

/// Compute a forecast for `city` in `units`.
pub fn forecast_for(city: &str, units: &str) -> ConnectorResult<Value> {
    let seed: u32 = city.bytes().map(u32::from).sum();
    let celsius = (seed % 35) as i64 - 5;
    let (temperature, symbol) = match units {
        "metric" => (celsius, "C"),
        "imperial" => (celsius * 9 / 5 + 32, "F"),
        "standard" => (celsius + 273, "K"),
        other => {
            return Err(ConnectorError::new(format!("unknown units '{}'", other))
                .with_debug(json!({ "allowed": ["metric", "imperial", "standard"] })));
        }
    };
    Ok(json!({
        "city": city,
        "units": units,
        "temperature": temperature,
        "symbol": symbol,
        "conditions": CONDITIONS[(seed as usize) % CONDITIONS.len()],
    }))
}

async fn forecast(ctx: MethodContext) -> ConnectorResult<Value> {
    let city = ctx
        .arg_str("city")
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| ConnectorError::new("city is required"))?;
    forecast_for(city.trim(), ctx.arg_str("units").unwrap_or("metric"))
}

async fn get_forecast(ctx: RunContext) -> ConnectorResult<Value> {
    let city = ctx.prop_str("city").unwrap_or("NYC").to_string();
    let units = ctx.prop_str("units").unwrap_or("metric").to_string();

    let result = ctx
        .app
        .call("forecast", json!({ "city": city, "units": units }))
        .await?;

    let summary = format!("Forecast for {}", city);
    ctx.exports.export("summary", summary.clone());
    ctx.exports.summary(summary);
    Ok(result)
}

async fn list_units(_ctx: OptionsContext) -> ConnectorResult<Value> {
    Ok(json!([
        { "label": "Celsius", "value": "metric" },
        { "label": "Fahrenheit", "value": "imperial" },
        { "label": "Kelvin", "value": "standard" },
    ]))
}

/// Pages through the known cities. The cursor is the next offset; the last
/// page carries no cursor.
async fn list_cities(ctx: OptionsContext) -> ConnectorResult<Value> {
    let offset = ctx
        .prev_context
        .as_ref()
        .and_then(|c| c.get("offset"))
        .and_then(Value::as_u64)
        .unwrap_or(0) as usize;

    let page: Vec<&str> = CITIES.iter().skip(offset).take(CITY_PAGE_SIZE).copied().collect();
    let next = offset + page.len();
    let context = if next < CITIES.len() {
        json!({ "offset": next })
    } else {
        Value::Null
    };
    Ok(json!({ "options": page, "context": context }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use dockyard_core::connector::{AppMethods, Exports};
    use dockyard_core::credential::Credential;
    use serde_json::Map;

    fn options_ctx(prev_context: Option<Value>) -> OptionsContext {
        OptionsContext {
            slug: SLUG.to_string(),
            component_key: "get_forecast".to_string(),
            prop_name: "city".to_string(),
            user_id: "u".to_string(),
            configured_props: Map::new(),
            prev_context,
            credential: Credential::new(),
            app: AppMethods::empty(SLUG),
            exports: Exports::new(),
        }
    }

    #[test]
    fn forecasts_are_deterministic() {
        let a = forecast_for("NYC", "metric").unwrap();
        let b = forecast_for("NYC", "metric").unwrap();
        assert_eq!(a, b);

        let f = forecast_for("NYC", "imperial").unwrap();
        assert_eq!(f["symbol"], "F");
        assert!(forecast_for("NYC", "rankine").is_err());
    }

    #[tokio::test]
    async fn forecast_exports_summary() {
        let module = module();
        let exports = Exports::new();
        let ctx = RunContext {
            slug: SLUG.to_string(),
            component_key: "get_forecast".to_string(),
            user_id: "u".to_string(),
            props: serde_json::from_value(json!({"city": "Paris"})).unwrap(),
            credential: Credential::new(),
            app: AppMethods::bind(SLUG, module.methods(), Credential::new(), exports.clone()),
            exports: exports.clone(),
        };

        let out = get_forecast(ctx).await.unwrap();
        assert_eq!(out["city"], "Paris");
        assert_eq!(exports.get("summary"), Some(json!("Forecast for Paris")));
        assert_eq!(exports.get("$summary"), Some(json!("Forecast for Paris")));
    }

    #[tokio::test]
    async fn cities_paginate_until_exhausted() {
        let first = list_cities(options_ctx(None)).await.unwrap();
        assert_eq!(first["options"].as_array().unwrap().len(), CITY_PAGE_SIZE);
        assert_eq!(first["context"], json!({"offset": 4}));

        let last = list_cities(options_ctx(Some(json!({"offset": 8})))).await.unwrap();
        assert_eq!(last["options"], json!(["Pune"]));
        assert!(last["context"].is_null());
    }
}
