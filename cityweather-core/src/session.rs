use tracing::debug;

use crate::{
    client::WeatherClient,
    error::Error,
    format,
    index::CityIndex,
    sink::{Directive, EntryRow, PresentationSink, SelectionStep, StepValue},
};

/// Commands offered at the root state.
pub const ROOT_COMMANDS: [&str; 2] = ["weather <full city name>", "forecast <full city name>"];

/// Context option a host may surface on city entries to jump straight to
/// the forecast listing.
pub const FORECAST_CONTEXT_OPTION: &str = "Forecast";

/// The two verbs the command grammar knows. Parsed once per dispatch and
/// carried through, never re-split downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verb {
    Weather,
    Forecast,
}

/// `"<verb> <city name>"`; the city name is the remaining tokens rejoined
/// with single spaces. An unknown verb is a host contract breach.
fn parse_command(command: &str) -> Result<(Verb, String), Error> {
    let mut tokens = command.split_whitespace();
    let verb = match tokens.next() {
        Some("weather") => Verb::Weather,
        Some("forecast") => Verb::Forecast,
        _ => return Err(Error::Critical(format!("unknown command {command:?}"))),
    };

    let city = tokens.collect::<Vec<_>>().join(" ");
    Ok((verb, city))
}

/// What the selected row means when sent to the clipboard. The city header
/// marker copies the city name the path refers to.
fn clipboard_text(step: &SelectionStep, city: &str) -> String {
    match step {
        SelectionStep::Entry { value, .. } => value.clone(),
        SelectionStep::Command(command) => command.clone(),
        SelectionStep::Value(StepValue::Text(text)) => text.clone(),
        SelectionStep::Value(StepValue::Timestamp(ts)) => format::forecast_timestamp(*ts),
        SelectionStep::Value(StepValue::CityHeader) => city.to_string(),
    }
}

/// Outcome of one dispatch pass.
enum Flow {
    Done,
    /// Self-transition: replace the path and run the machine again.
    Redispatch(Vec<SelectionStep>),
}

/// The selection state machine: interprets a selection path of depth 0–3
/// and drives the weather client, formatter and presentation sink.
///
/// One session owns its index, client (and thereby its caches) and sink;
/// selections are processed one at a time to completion.
pub struct Session<S: PresentationSink> {
    index: CityIndex,
    client: WeatherClient,
    sink: S,
}

impl<S: PresentationSink> Session<S> {
    pub fn new(index: CityIndex, client: WeatherClient, sink: S) -> Self {
        Self { index, client, sink }
    }

    pub fn index(&self) -> &CityIndex {
        &self.index
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Process one selection event to completion.
    ///
    /// Recoverable failures are reported to the sink and the selection is
    /// reset to the root so the user can retry; critical failures are
    /// reported fatally. Nothing is retried automatically.
    pub async fn handle_selection(&mut self, path: &[SelectionStep]) {
        let mut path = path.to_vec();
        loop {
            debug!(depth = path.len(), "dispatching selection");
            match self.dispatch(&path).await {
                Ok(Flow::Done) => return,
                Ok(Flow::Redispatch(next)) => {
                    self.sink.emit(Directive::SetSelection(next.clone()));
                    path = next;
                }
                Err(err) if err.is_critical() => {
                    self.sink.emit(Directive::CriticalError(err.to_string()));
                    return;
                }
                Err(err) => {
                    self.sink.emit(Directive::ReportError(err.to_string()));
                    self.sink.emit(Directive::SetSelection(Vec::new()));
                    return;
                }
            }
        }
    }

    async fn dispatch(&mut self, path: &[SelectionStep]) -> Result<Flow, Error> {
        match path.len() {
            0 => {
                self.show_root();
                Ok(Flow::Done)
            }
            1 => self.dispatch_depth_one(&path[0]).await,
            2 => self.dispatch_depth_two(path).await,
            3 => self.dispatch_depth_three(path),
            depth => Err(Error::Critical(format!("selection depth {depth}"))),
        }
    }

    /// Root state: default header, command templates, full city listing.
    fn show_root(&mut self) {
        self.sink.emit(Directive::SetHeader(None));
        self.sink.emit(Directive::ReplaceCommandList(
            ROOT_COMMANDS.iter().map(|c| (*c).to_string()).collect(),
        ));

        let rows = self.index.display_names().iter().map(|name| EntryRow::city(name.clone())).collect();
        self.sink.emit(Directive::ReplaceEntryList(rows));
    }

    async fn dispatch_depth_one(&mut self, step: &SelectionStep) -> Result<Flow, Error> {
        match step {
            // A city was picked from the listing: synthesize the matching
            // command selection instead of duplicating the weather flow.
            SelectionStep::Entry { value, context_option } => {
                let verb = if context_option.as_deref() == Some(FORECAST_CONTEXT_OPTION) {
                    "forecast"
                } else {
                    "weather"
                };
                Ok(Flow::Redispatch(vec![SelectionStep::command(format!("{verb} {value}"))]))
            }
            SelectionStep::Command(command) => {
                let (verb, city) = parse_command(command)?;
                let city_id = self.resolve(&city)?;

                self.sink.emit(Directive::ReplaceCommandList(Vec::new()));
                match verb {
                    Verb::Weather => self.show_current(city_id).await?,
                    Verb::Forecast => self.show_forecast_listing(city_id).await?,
                }
                Ok(Flow::Done)
            }
            SelectionStep::Value(_) => {
                Err(Error::Critical("value step without a preceding command".into()))
            }
        }
    }

    async fn dispatch_depth_two(&mut self, path: &[SelectionStep]) -> Result<Flow, Error> {
        let SelectionStep::Command(command) = &path[0] else {
            return Err(Error::Critical("deep selection without a leading command".into()));
        };
        let (verb, city) = parse_command(command)?;

        match verb {
            Verb::Forecast => {
                let timestamp = match &path[1] {
                    SelectionStep::Value(StepValue::Timestamp(ts)) => *ts,
                    // The city/header row doubles as a breadcrumb: drop
                    // back to the forecast listing.
                    _ => return Ok(Flow::Redispatch(vec![path[0].clone()])),
                };

                let city_id = self.resolve(&city)?;
                self.show_forecast_detail(city_id, timestamp).await?;
                Ok(Flow::Done)
            }
            Verb::Weather => {
                self.sink.emit(Directive::CopyToClipboard(clipboard_text(&path[1], &city)));
                self.sink.emit(Directive::Close);
                Ok(Flow::Done)
            }
        }
    }

    /// Depth 3 is only reachable through the forecast path; the picked row
    /// is final.
    fn dispatch_depth_three(&mut self, path: &[SelectionStep]) -> Result<Flow, Error> {
        let city = match &path[0] {
            SelectionStep::Command(command) => {
                parse_command(command).map(|(_, city)| city).unwrap_or_default()
            }
            _ => String::new(),
        };

        self.sink.emit(Directive::CopyToClipboard(clipboard_text(&path[2], &city)));
        self.sink.emit(Directive::Close);
        Ok(Flow::Done)
    }

    fn resolve(&self, display_name: &str) -> Result<i64, Error> {
        self.index
            .lookup(display_name)
            .map(|record| record.id)
            .ok_or_else(|| Error::ResolutionFailed(display_name.to_string()))
    }

    async fn show_current(&mut self, city_id: i64) -> Result<(), Error> {
        let snapshot = self.client.fetch_current(city_id).await?;

        self.sink.emit(Directive::SetHeader(Some(format::place_name(&snapshot))));
        self.sink.emit(Directive::ReplaceEntryList(vec![
            EntryRow::detail(format::temperature_string(snapshot.temperature_k)),
            EntryRow::detail(format::weather_description(&snapshot.description)),
        ]));
        Ok(())
    }

    async fn show_forecast_listing(&mut self, city_id: i64) -> Result<(), Error> {
        let forecast = self.client.fetch_forecast(city_id).await?;

        self.sink.emit(Directive::SetHeader(Some(format!(
            "{} ({})",
            forecast.city_name, forecast.country
        ))));
        self.sink.emit(Directive::ReplaceEntryList(Vec::new()));
        for entry in &forecast.entries {
            self.sink.emit(Directive::AddEntry(EntryRow::forecast_date(
                format::forecast_timestamp(entry.timestamp),
                entry.timestamp,
            )));
        }
        Ok(())
    }

    /// Exact timestamp match; on no match the entry list is presented
    /// empty rather than erroring.
    async fn show_forecast_detail(&mut self, city_id: i64, timestamp: i64) -> Result<(), Error> {
        let forecast = self.client.fetch_forecast(city_id).await?;

        let rows = match forecast.entry_at(timestamp) {
            Some(entry) => vec![
                EntryRow::detail(format::temperature_string(entry.temperature_k)),
                EntryRow::detail(format::weather_description(&entry.description)),
            ],
            None => Vec::new(),
        };

        self.sink.emit(Directive::SetHeader(Some(format!(
            "{} ({})",
            forecast.city_name, forecast.country
        ))));
        self.sink.emit(Directive::ReplaceEntryList(rows));
        Ok(())
    }
}
