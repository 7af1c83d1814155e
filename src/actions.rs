//! Prompt-driven handlers behind the detail view's buttons. Each one gathers
//! input through a [`Prompter`], hands it to the [`Ledger`], and reports
//! validation failures back to the user instead of propagating them.

use crate::ledger::{Ledger, LedgerError};
use crate::models::{CascadeSummary, Deal, DealDraft, DealStatus, Meeting, MeetingDraft};
use crate::prompt::Prompter;
use crate::schedule::parse_meeting_date;
use crate::store::KeyValueStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    Applied(T),
    Aborted,
}

impl<T> Outcome<T> {
    pub fn applied(self) -> Option<T> {
        match self {
            Outcome::Applied(value) => Some(value),
            Outcome::Aborted => None,
        }
    }
}

/// Turns a ledger result into an outcome. Lookups that fail are returned as
/// errors so the caller can fall back to the list view.
pub fn settle<T>(
    prompter: &mut dyn Prompter,
    result: Result<T, LedgerError>,
) -> Result<Outcome<T>, LedgerError> {
    match result {
        Ok(value) => Ok(Outcome::Applied(value)),
        Err(err) if err.is_not_found() => Err(err),
        Err(err) => {
            if !err.is_silent() {
                prompter.notify(&err.to_string());
            }
            tracing::debug!(error = %err, "operation aborted");
            Ok(Outcome::Aborted)
        }
    }
}

/// Answers already given on the command line. Each one becomes the default
/// of the matching prompt.
#[derive(Debug, Clone, Default)]
pub struct MeetingPrefill {
    pub client_name: Option<String>,
    pub date: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct DealPrefill {
    pub client_name: Option<String>,
    pub value: Option<String>,
    pub status: Option<DealStatus>,
}

pub fn add_meeting<S: KeyValueStore>(
    ledger: &mut Ledger<S>,
    prompter: &mut dyn Prompter,
    sales_person_id: &str,
    prefill: MeetingPrefill,
) -> Result<Outcome<Meeting>, LedgerError> {
    ledger.sales_person(sales_person_id)?;

    let Some(client_name) =
        prompter.request_text("Enter client name:", prefill.client_name.as_deref())
    else {
        return Ok(Outcome::Aborted);
    };
    let date = prefill.date.unwrap_or_else(|| ledger.today().to_string());
    let Some(date) = prompter.request_text("Enter meeting date (YYYY-MM-DD):", Some(&date)) else {
        return Ok(Outcome::Aborted);
    };
    let notes = prompter.request_text("Enter meeting notes (optional):", prefill.notes.as_deref());

    let draft = MeetingDraft {
        client_name,
        date,
        notes,
        outcome: None,
    };
    let result = ledger.add_meeting(sales_person_id, draft);
    settle(prompter, result)
}

pub fn edit_meeting<S: KeyValueStore>(
    ledger: &mut Ledger<S>,
    prompter: &mut dyn Prompter,
    meeting_id: &str,
) -> Result<Outcome<Meeting>, LedgerError> {
    let existing = ledger.meeting(meeting_id)?;

    let Some(client_name) = prompter.request_text("Client name:", Some(&existing.client_name))
    else {
        return Ok(Outcome::Aborted);
    };
    let current_date = existing.date.to_string();
    let Some(date) = prompter.request_text("Meeting date (YYYY-MM-DD):", Some(&current_date))
    else {
        return Ok(Outcome::Aborted);
    };
    let notes = prompter.request_text("Notes:", existing.notes.as_deref());

    // Outcome is only asked for once the (possibly new) date has passed.
    let outcome = match parse_meeting_date(&date) {
        Some(parsed) if parsed < ledger.today() => {
            prompter.request_text("Outcome (optional):", existing.outcome.as_deref())
        }
        _ => existing.outcome,
    };

    let draft = MeetingDraft {
        client_name,
        date,
        notes,
        outcome,
    };
    let result = ledger.edit_meeting(meeting_id, draft);
    settle(prompter, result)
}

pub fn delete_meeting<S: KeyValueStore>(
    ledger: &mut Ledger<S>,
    prompter: &mut dyn Prompter,
    meeting_id: &str,
) -> Result<Outcome<Meeting>, LedgerError> {
    ledger.meeting(meeting_id)?;
    if !prompter.confirm("Are you sure you want to delete this meeting?") {
        return Ok(Outcome::Aborted);
    }
    let result = ledger.delete_meeting(meeting_id);
    settle(prompter, result)
}

pub fn add_deal<S: KeyValueStore>(
    ledger: &mut Ledger<S>,
    prompter: &mut dyn Prompter,
    sales_person_id: &str,
    prefill: DealPrefill,
) -> Result<Outcome<Deal>, LedgerError> {
    ledger.sales_person(sales_person_id)?;

    let Some(client_name) =
        prompter.request_text("Enter client name:", prefill.client_name.as_deref())
    else {
        return Ok(Outcome::Aborted);
    };
    if client_name.trim().is_empty() {
        return Ok(Outcome::Aborted);
    }
    let Some(value) = prompter.request_text("Enter deal value:", prefill.value.as_deref()) else {
        return Ok(Outcome::Aborted);
    };
    let status_default = prefill.status.map(|status| status.label().to_ascii_lowercase());
    let Some(answer) = prompter.request_text("Was the deal won or lost?", status_default.as_deref())
    else {
        return Ok(Outcome::Aborted);
    };
    let Some(status) = DealStatus::parse(&answer) else {
        return settle(prompter, Err(LedgerError::InvalidDealStatus(answer)));
    };

    let draft = DealDraft {
        client_name,
        value,
        status,
    };
    let result = ledger.add_deal(sales_person_id, draft);
    settle(prompter, result)
}

pub fn delete_deal<S: KeyValueStore>(
    ledger: &mut Ledger<S>,
    prompter: &mut dyn Prompter,
    deal_id: &str,
) -> Result<Outcome<Deal>, LedgerError> {
    ledger.deal(deal_id)?;
    if !prompter.confirm("Are you sure you want to delete this deal?") {
        return Ok(Outcome::Aborted);
    }
    let result = ledger.delete_deal(deal_id);
    settle(prompter, result)
}

pub fn delete_sales_person<S: KeyValueStore>(
    ledger: &mut Ledger<S>,
    prompter: &mut dyn Prompter,
    sales_person_id: &str,
) -> Result<Outcome<CascadeSummary>, LedgerError> {
    ledger.sales_person(sales_person_id)?;
    if !prompter.confirm(
        "Are you sure you want to delete this sales person? \
         This will also delete all their meetings and deals.",
    ) {
        return Ok(Outcome::Aborted);
    }
    let result = ledger.delete_sales_person(sales_person_id);
    settle(prompter, result)
}
