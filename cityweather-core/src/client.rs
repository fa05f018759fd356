use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Deserializer};
use std::sync::Arc;
use tracing::debug;

use crate::{
    cache::ResponseCache,
    config::Config,
    error::Error,
    model::{ForecastEntry, ForecastSet, WeatherSnapshot},
};

/// Abstract HTTP GET: returns the response body or fails. Keeps the engine
/// testable without a network and independent of the transport stack.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str) -> Result<String, Error>;
}

/// Production transport backed by reqwest.
///
/// HTTP status is deliberately not checked here: the API reports failures
/// through the `cod` field of a JSON body, which the client validates.
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    http: Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self { http: Client::new() }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str) -> Result<String, Error> {
        let res = self.http.get(url).send().await?;
        let body = res.text().await?;
        Ok(body)
    }
}

/// Fetches current weather and forecasts for a city id, consulting the
/// [`ResponseCache`] before going to the network. Failed fetches are never
/// cached.
pub struct WeatherClient {
    transport: Arc<dyn Transport>,
    cache: ResponseCache,
    api_key: String,
    base_url: String,
}

impl WeatherClient {
    pub fn new(
        transport: Arc<dyn Transport>,
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            cache: ResponseCache::new(),
            api_key: api_key.into(),
            base_url: base_url.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(Arc::new(HttpTransport::new()), config.api_key(), config.base_url())
    }

    pub async fn fetch_current(&mut self, city_id: i64) -> Result<WeatherSnapshot, Error> {
        if let Some(snapshot) = self.cache.get_current(city_id) {
            return Ok(snapshot.clone());
        }

        let url = format!("{}/weather?id={}&appid={}", self.base_url, city_id, self.api_key);
        debug!(city_id, "fetching current weather");

        let body = self.transport.get(&url).await?;
        let snapshot = decode_current(&body)?;

        self.cache.put_current(city_id, snapshot.clone());
        Ok(snapshot)
    }

    pub async fn fetch_forecast(&mut self, city_id: i64) -> Result<ForecastSet, Error> {
        if let Some(forecast) = self.cache.get_forecast(city_id) {
            return Ok(forecast.clone());
        }

        let url = format!("{}/forecast?id={}&appid={}", self.base_url, city_id, self.api_key);
        debug!(city_id, "fetching forecast");

        let body = self.transport.get(&url).await?;
        let forecast = decode_forecast(&body)?;

        self.cache.put_forecast(city_id, forecast.clone());
        Ok(forecast)
    }
}

/// The API encodes its status as `cod`, sometimes a number and sometimes a
/// string ("404"). Normalize to i64.
fn de_cod<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Cod {
        Num(i64),
        Str(String),
    }

    match Option::<Cod>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Cod::Num(n)) => Ok(Some(n)),
        Some(Cod::Str(s)) => s.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

/// Status envelope shared by both endpoints. `message` is a string on error
/// responses but a number on successful forecast responses, hence the Value.
#[derive(Debug, Deserialize)]
struct StatusWire {
    #[serde(default, deserialize_with = "de_cod")]
    cod: Option<i64>,
    #[serde(default)]
    message: Option<serde_json::Value>,
}

/// Both endpoints are validated uniformly against the status envelope.
fn check_status(body: &str) -> Result<(), Error> {
    let status: StatusWire = serde_json::from_str(body)?;

    match status.cod {
        Some(code) if code != 200 => {
            let message = match status.message {
                Some(serde_json::Value::String(s)) => s,
                Some(other) => other.to_string(),
                None => String::from("no message"),
            };
            Err(Error::Api { code, message })
        }
        _ => Ok(()),
    }
}

#[derive(Debug, Deserialize)]
struct MainWire {
    temp: f64,
}

#[derive(Debug, Deserialize)]
struct DescriptionWire {
    description: String,
}

#[derive(Debug, Deserialize)]
struct SysWire {
    country: String,
}

#[derive(Debug, Deserialize)]
struct CurrentWire {
    name: String,
    sys: SysWire,
    main: MainWire,
    weather: Vec<DescriptionWire>,
}

fn decode_current(body: &str) -> Result<WeatherSnapshot, Error> {
    check_status(body)?;
    let wire: CurrentWire = serde_json::from_str(body)?;

    let description = wire
        .weather
        .into_iter()
        .next()
        .map(|w| w.description)
        .ok_or(Error::MalformedPayload("weather description"))?;

    Ok(WeatherSnapshot {
        name: wire.name,
        country: wire.sys.country,
        temperature_k: wire.main.temp,
        description,
    })
}

#[derive(Debug, Deserialize)]
struct CityWire {
    name: String,
    country: String,
}

#[derive(Debug, Deserialize)]
struct ForecastEntryWire {
    dt: i64,
    main: MainWire,
    weather: Vec<DescriptionWire>,
}

#[derive(Debug, Deserialize)]
struct ForecastWire {
    city: CityWire,
    list: Vec<ForecastEntryWire>,
}

fn decode_forecast(body: &str) -> Result<ForecastSet, Error> {
    check_status(body)?;
    let wire: ForecastWire = serde_json::from_str(body)?;

    let mut entries = Vec::with_capacity(wire.list.len());
    for entry in wire.list {
        let description = entry
            .weather
            .into_iter()
            .next()
            .map(|w| w.description)
            .ok_or(Error::MalformedPayload("weather description"))?;

        entries.push(ForecastEntry {
            timestamp: entry.dt,
            temperature_k: entry.main.temp,
            description,
        });
    }

    Ok(ForecastSet {
        city_name: wire.city.name,
        country: wire.city.country,
        entries,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const CURRENT_OK: &str = r#"{
        "cod": 200,
        "name": "London",
        "sys": {"country": "GB"},
        "main": {"temp": 280.32},
        "weather": [{"description": "light intensity drizzle"}]
    }"#;

    const FORECAST_OK: &str = r#"{
        "cod": "200",
        "message": 0,
        "city": {"name": "London", "country": "GB"},
        "list": [
            {"dt": 1451649600, "main": {"temp": 277.1}, "weather": [{"description": "clear sky"}]},
            {"dt": 1451660400, "main": {"temp": 278.4}, "weather": [{"description": "few clouds"}]}
        ]
    }"#;

    /// Counting stub: serves fixed bodies per endpoint, or a transport
    /// failure when none is configured.
    #[derive(Default)]
    struct StubTransport {
        current_body: Option<String>,
        forecast_body: Option<String>,
        calls: AtomicUsize,
    }

    impl StubTransport {
        fn current(body: &str) -> Arc<Self> {
            Arc::new(Self { current_body: Some(body.into()), ..Self::default() })
        }

        fn forecast(body: &str) -> Arc<Self> {
            Arc::new(Self { forecast_body: Some(body.into()), ..Self::default() })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Transport for StubTransport {
        async fn get(&self, url: &str) -> Result<String, Error> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let body = if url.contains("/weather?") {
                &self.current_body
            } else {
                &self.forecast_body
            };
            body.clone().ok_or_else(|| Error::RequestFailed("stub: connection refused".into()))
        }
    }

    fn client(transport: Arc<StubTransport>) -> WeatherClient {
        WeatherClient::new(transport, "KEY", "http://weather.test/data/2.5")
    }

    #[tokio::test]
    async fn fetch_current_normalizes_payload() {
        let mut client = client(StubTransport::current(CURRENT_OK));
        let snapshot = client.fetch_current(2643743).await.unwrap();

        assert_eq!(snapshot.name, "London");
        assert_eq!(snapshot.country, "GB");
        assert_eq!(snapshot.temperature_k, 280.32);
        assert_eq!(snapshot.description, "light intensity drizzle");
    }

    #[tokio::test]
    async fn repeated_fetch_within_window_hits_network_once() {
        let transport = StubTransport::current(CURRENT_OK);
        let mut client = client(Arc::clone(&transport));

        let first = client.fetch_current(2643743).await.unwrap();
        let second = client.fetch_current(2643743).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn api_error_is_surfaced_and_not_cached() {
        let transport = StubTransport::current(r#"{"cod": 401, "message": "Invalid API key"}"#);
        let mut client = client(Arc::clone(&transport));

        let err = client.fetch_current(2643743).await.unwrap_err();
        assert!(matches!(err, Error::Api { code: 401, .. }));

        // A second call goes back to the network: the failure was not stored.
        let _ = client.fetch_current(2643743).await.unwrap_err();
        assert_eq!(transport.calls(), 2);
    }

    #[tokio::test]
    async fn forecast_status_is_validated_too() {
        let transport =
            StubTransport::forecast(r#"{"cod": "404", "message": "city not found"}"#);
        let mut client = client(transport);

        let err = client.fetch_forecast(2643743).await.unwrap_err();
        assert!(matches!(err, Error::Api { code: 404, .. }));
    }

    #[tokio::test]
    async fn garbage_body_is_a_decode_failure() {
        let mut client = client(StubTransport::current("<html>gateway timeout</html>"));

        let err = client.fetch_current(2643743).await.unwrap_err();
        assert!(matches!(err, Error::DecodeFailed(_)));
    }

    #[tokio::test]
    async fn empty_description_list_is_malformed() {
        let body = r#"{"cod": 200, "name": "London", "sys": {"country": "GB"},
                       "main": {"temp": 280.32}, "weather": []}"#;
        let mut client = client(StubTransport::current(body));

        let err = client.fetch_current(2643743).await.unwrap_err();
        assert!(matches!(err, Error::MalformedPayload("weather description")));
    }

    #[tokio::test]
    async fn transport_failure_is_request_failed() {
        let mut client = client(Arc::new(StubTransport::default()));

        let err = client.fetch_current(2643743).await.unwrap_err();
        assert!(matches!(err, Error::RequestFailed(_)));
    }

    #[tokio::test]
    async fn fetch_forecast_normalizes_and_caches() {
        let transport = StubTransport::forecast(FORECAST_OK);
        let mut client = client(Arc::clone(&transport));

        let forecast = client.fetch_forecast(2643743).await.unwrap();
        assert_eq!(forecast.city_name, "London");
        assert_eq!(forecast.entries.len(), 2);
        assert_eq!(forecast.entries[0].timestamp, 1451649600);
        assert_eq!(forecast.entries[1].description, "few clouds");

        let again = client.fetch_forecast(2643743).await.unwrap();
        assert_eq!(forecast, again);
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn http_transport_builds_expected_urls() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/weather"))
            .and(query_param("id", "2643743"))
            .and(query_param("appid", "KEY"))
            .respond_with(ResponseTemplate::new(200).set_body_string(CURRENT_OK))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/forecast"))
            .and(query_param("id", "2643743"))
            .and(query_param("appid", "KEY"))
            .respond_with(ResponseTemplate::new(200).set_body_string(FORECAST_OK))
            .expect(1)
            .mount(&server)
            .await;

        let mut client =
            WeatherClient::new(Arc::new(HttpTransport::new()), "KEY", server.uri());

        let snapshot = client.fetch_current(2643743).await.unwrap();
        assert_eq!(snapshot.name, "London");

        let forecast = client.fetch_forecast(2643743).await.unwrap();
        assert_eq!(forecast.entries.len(), 2);
    }
}
