//! The protocol between the engine and its host: selection steps coming in,
//! display directives going out.

/// One step of a user selection path, tagged by where it was picked from.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectionStep {
    /// A city picked from the entry listing, optionally carrying a context
    /// option the host surfaced (e.g. "Forecast").
    Entry {
        value: String,
        context_option: Option<String>,
    },
    /// A typed or picked command, e.g. `"weather London (GB)"`.
    Command(String),
    /// A row picked from a result list.
    Value(StepValue),
}

impl SelectionStep {
    pub fn entry(value: impl Into<String>) -> Self {
        SelectionStep::Entry { value: value.into(), context_option: None }
    }

    pub fn command(value: impl Into<String>) -> Self {
        SelectionStep::Command(value.into())
    }
}

/// Tagged value of a result-list row. Distinguishing the city/header row
/// from a forecast date row explicitly, instead of inferring it from how
/// the value happens to parse.
#[derive(Debug, Clone, PartialEq)]
pub enum StepValue {
    /// The city breadcrumb row at the top of a forecast listing.
    CityHeader,
    /// A forecast row, addressed by its exact unix timestamp.
    Timestamp(i64),
    /// A plain detail row (temperature or description text).
    Text(String),
}

/// One selectable row of an entry list. The step is what the host should
/// append to the selection path when the user picks this row, so the engine
/// always gets back exactly the tagged value it emitted.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryRow {
    pub label: String,
    pub step: SelectionStep,
}

impl EntryRow {
    pub fn city(display_name: impl Into<String>) -> Self {
        let label = display_name.into();
        Self { step: SelectionStep::entry(label.clone()), label }
    }

    pub fn detail(text: impl Into<String>) -> Self {
        let label = text.into();
        Self { step: SelectionStep::Value(StepValue::Text(label.clone())), label }
    }

    pub fn forecast_date(label: impl Into<String>, timestamp: i64) -> Self {
        Self { label: label.into(), step: SelectionStep::Value(StepValue::Timestamp(timestamp)) }
    }
}

/// Display directives emitted towards the host. How they reach a screen or
/// a clipboard is the host's concern.
#[derive(Debug, Clone, PartialEq)]
pub enum Directive {
    /// `None` resets the header to its default.
    SetHeader(Option<String>),
    ReplaceCommandList(Vec<String>),
    ReplaceEntryList(Vec<EntryRow>),
    AddEntry(EntryRow),
    /// Overrides the host's current selection path.
    SetSelection(Vec<SelectionStep>),
    /// Recoverable; the host should show it and carry on.
    ReportError(String),
    /// Contract breach; the host should treat the session as broken.
    CriticalError(String),
    CopyToClipboard(String),
    Close,
}

pub trait PresentationSink {
    fn emit(&mut self, directive: Directive);
}
