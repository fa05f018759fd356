use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use inquire::{InquireError, Select, Text};
use std::path::{Path, PathBuf};

use cityweather_core::{
    CityIndex, Config, Directive, EntryRow, FORECAST_CONTEXT_OPTION, PresentationSink,
    SelectionStep, Session, StepValue, WeatherClient,
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "cityweather", version, about = "City weather browser")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store an OpenWeatherMap API key in the config file.
    Configure,

    /// Browse current weather and forecasts interactively.
    Browse {
        /// Path to the line-delimited city dataset (city.list.json).
        cities: PathBuf,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Browse { cities } => browse(&cities).await,
        }
    }
}

fn configure() -> Result<()> {
    let mut config = Config::load()?;

    let key = Text::new("OpenWeatherMap API key:")
        .prompt()
        .context("Configuration aborted")?;
    config.set_api_key(key);
    config.save()?;

    println!("Saved to {}", Config::config_file_path()?.display());
    Ok(())
}

/// Terminal implementation of the presentation sink: keeps the current view
/// so the browse loop can render it between selections.
#[derive(Debug, Default)]
struct TerminalSink {
    header: Option<String>,
    commands: Vec<String>,
    entries: Vec<EntryRow>,
    selection_override: Option<Vec<SelectionStep>>,
    closed: bool,
}

impl PresentationSink for TerminalSink {
    fn emit(&mut self, directive: Directive) {
        match directive {
            Directive::SetHeader(header) => self.header = header,
            Directive::ReplaceCommandList(commands) => self.commands = commands,
            Directive::ReplaceEntryList(entries) => self.entries = entries,
            Directive::AddEntry(row) => self.entries.push(row),
            Directive::SetSelection(path) => self.selection_override = Some(path),
            Directive::ReportError(message) => eprintln!("error: {message}"),
            Directive::CriticalError(message) => {
                eprintln!("critical: {message}");
                self.closed = true;
            }
            Directive::CopyToClipboard(text) => println!("copied: {text}"),
            Directive::Close => self.closed = true,
        }
    }
}

async fn browse(cities: &Path) -> Result<()> {
    let config = Config::load()?;
    let index = CityIndex::load(cities)?;
    println!("Loaded {} cities", index.len());

    let client = WeatherClient::from_config(&config);
    let mut session = Session::new(index, client, TerminalSink::default());

    let mut path: Vec<SelectionStep> = Vec::new();
    loop {
        session.handle_selection(&path).await;

        let sink = session.sink_mut();
        if sink.closed {
            return Ok(());
        }
        // The engine corrected or reset the selection; run it through again
        // so the view matches before prompting.
        if let Some(corrected) = sink.selection_override.take() {
            path = corrected;
            continue;
        }

        match prompt(&session, path.is_empty())? {
            Choice::Quit => return Ok(()),
            Choice::StartOver => path.clear(),
            Choice::Step(step) => path.push(step),
        }
    }
}

enum Choice {
    Quit,
    StartOver,
    Step(SelectionStep),
}

fn prompt(session: &Session<TerminalSink>, at_root: bool) -> Result<Choice> {
    let sink = session.sink();
    let title = sink.header.clone().unwrap_or_else(|| "cityweather".to_string());

    let mut options: Vec<(String, Option<SelectionStep>)> = Vec::new();
    if !at_root {
        options.push(("‹ start over".to_string(), None));
    }

    // In a forecast listing the city header doubles as a breadcrumb row.
    let listing_dates = sink
        .entries
        .iter()
        .any(|row| matches!(row.step, SelectionStep::Value(StepValue::Timestamp(_))));
    if listing_dates {
        if let Some(header) = &sink.header {
            options.push((header.clone(), Some(SelectionStep::Value(StepValue::CityHeader))));
        }
    }

    for row in &sink.entries {
        options.push((row.label.clone(), Some(row.step.clone())));
    }

    let labels: Vec<String> = options.iter().map(|(label, _)| label.clone()).collect();
    let mut select = Select::new(&title, labels);
    let hint = (!sink.commands.is_empty()).then(|| sink.commands.join("  |  "));
    if let Some(hint) = &hint {
        select = select.with_help_message(hint);
    }
    let picked = match select.raw_prompt() {
        Ok(picked) => picked,
        Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => {
            return Ok(Choice::Quit);
        }
        Err(err) => return Err(err.into()),
    };

    let (_, step) = options.swap_remove(picked.index);
    let Some(step) = step else {
        return Ok(Choice::StartOver);
    };

    // A city picked from the root listing can go either way; surface the
    // forecast context option the engine understands.
    if let SelectionStep::Entry { value, .. } = &step {
        let view = Select::new(value, vec!["Current weather", "Forecast"])
            .prompt()
            .unwrap_or("Current weather");
        let context_option = (view == "Forecast").then(|| FORECAST_CONTEXT_OPTION.to_string());
        return Ok(Choice::Step(SelectionStep::Entry { value: value.clone(), context_option }));
    }

    Ok(Choice::Step(step))
}
