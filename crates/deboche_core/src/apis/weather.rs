//! wttr.in current conditions and forecast.

use serde::Deserialize;

use super::{ApiClient, capitalize, join_url};
use crate::reply::{EmbedSpec, Reply};
use crate::{CoreError, Result};

pub const DEFAULT_PLACE: &str = "Santarém";

#[derive(Debug, Clone, Deserialize)]
pub struct WeatherReport {
    #[serde(skip)]
    pub place: String,
    pub current_condition: Vec<CurrentCondition>,
    #[serde(default)]
    pub weather: Vec<DailyForecast>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Described {
    pub value: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CurrentCondition {
    #[serde(rename = "temp_C")]
    pub temp_c: String,
    #[serde(rename = "FeelsLikeC")]
    pub feels_like_c: String,
    #[serde(rename = "windspeedKmph")]
    pub wind_kmph: String,
    #[serde(rename = "winddir16Point")]
    pub wind_dir: String,
    pub humidity: String,
    pub pressure: String,
    pub visibility: String,
    pub cloudcover: String,
    #[serde(rename = "uvIndex")]
    pub uv_index: String,
    #[serde(default)]
    pub lang_pt: Vec<Described>,
    #[serde(rename = "weatherDesc", default)]
    pub weather_desc: Vec<Described>,
}

impl CurrentCondition {
    /// Portuguese description when wttr.in supplied one
    pub fn description(&self) -> &str {
        self.lang_pt
            .first()
            .or(self.weather_desc.first())
            .map(|d| d.value.as_str())
            .unwrap_or("?")
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DailyForecast {
    pub date: String,
    #[serde(rename = "maxtempC")]
    pub max_c: String,
    #[serde(rename = "mintempC")]
    pub min_c: String,
    #[serde(rename = "avgtempC")]
    pub avg_c: String,
    #[serde(rename = "sunHour", default)]
    pub sun_hours: Option<String>,
    #[serde(default)]
    pub hourly: Vec<HourlyForecast>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HourlyForecast {
    #[serde(default)]
    pub lang_pt: Vec<Described>,
    #[serde(rename = "weatherDesc", default)]
    pub weather_desc: Vec<Described>,
}

impl ApiClient {
    pub async fn weather(&self, place: &str) -> Result<WeatherReport> {
        let place = match place.trim() {
            "" => DEFAULT_PLACE,
            place => place,
        };
        let url = join_url(
            &self.urls().weather_url,
            &urlencoding::encode(place),
        );
        let mut report: WeatherReport = self
            .get_json("wttr.in", &url, &[("format", "j1"), ("lang", "pt")])
            .await?
            .ok_or_else(|| CoreError::not_found("local", place))?;

        if report.current_condition.is_empty() {
            return Err(CoreError::not_found("local", place));
        }
        report.place = place.to_string();
        Ok(report)
    }
}

pub fn render(report: &WeatherReport) -> Reply {
    let Some(now) = report.current_condition.first() else {
        return Reply::error(format!("❌ Sem dados do clima para {}", report.place));
    };

    let forecast = report
        .weather
        .iter()
        .map(|day| {
            let summary = day
                .hourly
                .first()
                .and_then(|h| h.lang_pt.first().or(h.weather_desc.first()))
                .map(|d| d.value.as_str())
                .unwrap_or("?");
            format!(
                "**{}**: {}, {}°C - {}°C, média: {}°C, sol: {}",
                day.date,
                summary,
                day.min_c,
                day.max_c,
                day.avg_c,
                day.sun_hours.as_deref().unwrap_or("N/A")
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let mut embed = EmbedSpec::new(format!("Clima em {}", capitalize(&report.place)))
        .description(format!("**{}**", now.description()))
        .colour(0x2F3136)
        .field(
            "Temperatura",
            format!("{}°C (Sensação: {}°C)", now.temp_c, now.feels_like_c),
            true,
        )
        .field("Vento", format!("{} km/h ({})", now.wind_kmph, now.wind_dir), true)
        .field("Humidade", format!("{}%", now.humidity), true)
        .field("Pressão", format!("{} hPa", now.pressure), true)
        .field("Visibilidade", format!("{} km", now.visibility), true)
        .field("Nuvens", format!("{}%", now.cloudcover), true)
        .field("Índice UV", now.uv_index.clone(), true);

    if !forecast.is_empty() {
        embed = embed.field("Previsão próximos dias", forecast, false);
    }

    Reply::embed(embed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = r#"{
        "current_condition": [{
            "FeelsLikeC": "17", "cloudcover": "25", "humidity": "72",
            "lang_pt": [{"value": "Parcialmente nublado"}],
            "pressure": "1019", "temp_C": "18", "uvIndex": "4", "visibility": "10",
            "weatherDesc": [{"value": "Partly cloudy"}],
            "winddir16Point": "NW", "windspeedKmph": "13"
        }],
        "weather": [
            {"date": "2024-05-01", "maxtempC": "22", "mintempC": "12", "avgtempC": "17",
             "sunHour": "11.5", "hourly": [{"lang_pt": [{"value": "Sol"}], "weatherDesc": [{"value": "Sunny"}]}]},
            {"date": "2024-05-02", "maxtempC": "20", "mintempC": "11", "avgtempC": "15",
             "hourly": [{"weatherDesc": [{"value": "Rain"}]}]}
        ]
    }"#;

    fn sample() -> WeatherReport {
        let mut report: WeatherReport = serde_json::from_str(SAMPLE).unwrap();
        report.place = "santarém".to_string();
        report
    }

    #[test]
    fn test_parse_sample() {
        let report = sample();
        assert_eq!(report.current_condition[0].temp_c, "18");
        assert_eq!(report.current_condition[0].description(), "Parcialmente nublado");
        assert_eq!(report.weather.len(), 2);
    }

    #[test]
    fn test_render() {
        let reply = render(&sample());
        let embed = reply.embed.unwrap();
        assert_eq!(embed.title.as_deref(), Some("Clima em Santarém"));
        assert_eq!(embed.fields[0].value, "18°C (Sensação: 17°C)");

        let forecast = &embed.fields.last().unwrap().value;
        assert!(forecast.contains("**2024-05-01**: Sol, 12°C - 22°C, média: 17°C, sol: 11.5"));
        assert!(forecast.contains("**2024-05-02**: Rain, 11°C - 20°C, média: 15°C, sol: N/A"));
    }
}
