//! Core library for the `cityweather` browser.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The static city index and the time-bounded response cache
//! - The weather client over an abstract HTTP transport
//! - Display formatting helpers
//! - The selection state machine driving an abstract presentation sink
//!
//! It is used by `cityweather-cli`, but can also be reused by other hosts
//! (launchers, bots, services) that supply their own presentation sink.

pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod format;
pub mod index;
pub mod model;
pub mod session;
pub mod sink;

pub use cache::ResponseCache;
pub use client::{HttpTransport, Transport, WeatherClient};
pub use config::{Config, TemperatureUnit};
pub use error::Error;
pub use index::CityIndex;
pub use model::{CityRecord, ForecastEntry, ForecastSet, WeatherSnapshot};
pub use session::{FORECAST_CONTEXT_OPTION, ROOT_COMMANDS, Session};
pub use sink::{Directive, EntryRow, PresentationSink, SelectionStep, StepValue};
