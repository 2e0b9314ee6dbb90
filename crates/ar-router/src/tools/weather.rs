//! get_weather: current conditions or forecast for a location.

use std::sync::LazyLock;

use ar_protocol::{ArgMap, ArgSpec, ToolSpec};
use regex::Regex;
use serde_json::json;

use super::{Tool, compile};
use crate::coerce::clean_text;

static TRIGGERS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"\b(?:check|get|what'?s|what\s+is)\s+(?:the\s+)?(?:weather|forecast|temperature)\b",
        r"\bweather\b",
        r"\bforecast\b",
        r"\btemperature\b",
        r"\bhow\s+(?:cold|hot|warm|chilly)\b",
        r"\b(?:raining|snowing|sunny)\b",
    ])
});

// Capitalized place after a preposition: "in Chicago", "for New York".
static PROPER_PLACE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:in|for|at)\s+([A-Z][\w.'-]*(?:\s+[A-Z][\w.'-]*)*)").unwrap()
});

// Any place after a weather word: "weather in new york today".
static LOOSE_PLACE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:weather|forecast|temperature|it)\s+(?:like\s+)?(?:in|for|at)\s+([a-z][\w .'-]*?)(?:\s+(?:today|tomorrow|tonight|right\s+now|now|this\s+\w+))?[?.!]*$",
    )
    .unwrap()
});

static UNITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(celsius|fahrenheit)\b").unwrap());

pub struct GetWeather;

impl Tool for GetWeather {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new("get_weather", "Get current weather for a location")
            .with_arg(ArgSpec::string("location", "City name").required())
            .with_arg(ArgSpec::enumeration(
                "units",
                "Temperature units",
                &["celsius", "fahrenheit"],
            ))
    }

    fn triggers(&self) -> &[Regex] {
        &TRIGGERS
    }

    fn cues(&self) -> &'static [&'static str] {
        &["check", "get", "what's", "what", "how", "give me"]
    }

    fn extract(&self, text: &str) -> ArgMap {
        let mut args = ArgMap::new();
        let location = PROPER_PLACE
            .captures(text)
            .or_else(|| LOOSE_PLACE.captures(text))
            .map(|caps| clean_text(&caps[1]))
            .filter(|l| !l.is_empty());
        if let Some(location) = location {
            args.insert("location".into(), json!(location));
        }
        if let Some(caps) = UNITS.captures(text) {
            args.insert("units".into(), json!(caps[1].to_lowercase()));
        }
        args
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weather_in_city() {
        assert_eq!(GetWeather.extract("check the weather in Chicago")["location"], "Chicago");
    }

    #[test]
    fn how_cold_question() {
        assert_eq!(GetWeather.extract("How cold is it in Denver?")["location"], "Denver");
    }

    #[test]
    fn forecast_for() {
        let args = GetWeather.extract("Give me the forecast for Seattle");
        assert_eq!(args["location"], "Seattle");
    }

    #[test]
    fn multi_word_city() {
        let args = GetWeather.extract("What's the weather in San Francisco today?");
        assert_eq!(args["location"], "San Francisco");
    }

    #[test]
    fn lowercase_city_with_trailing_time() {
        let args = GetWeather.extract("what's the weather like in new york today");
        assert_eq!(args["location"], "new york");
    }

    #[test]
    fn units() {
        let args = GetWeather.extract("weather in Oslo in Celsius");
        assert_eq!(args["location"], "Oslo");
        assert_eq!(args["units"], "celsius");
    }

    #[test]
    fn no_location() {
        assert!(GetWeather.extract("what's the weather").get("location").is_none());
    }

    #[test]
    fn scores() {
        assert!(GetWeather.match_score("check the weather in Chicago") > 0.9);
        assert!(GetWeather.match_score("How cold is it in Denver?") > 0.5);
    }
}
