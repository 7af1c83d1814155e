use chrono::{Datelike, NaiveDate};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    CascadeSummary, CounterDrift, Deal, DealDraft, Kpi, Meeting, MeetingDraft, SalesPerson,
    SalesPersonDraft, DEALS_KEY, MEETINGS_KEY, SALES_PEOPLE_KEY,
};
use crate::schedule::{is_this_week, is_weekend, parse_meeting_date};
use crate::store::{Collections, KeyValueStore};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("client name is required")]
    EmptyClientName,
    #[error("please enter a date as YYYY-MM-DD (got {0:?})")]
    InvalidDate(String),
    #[error("meetings cannot be scheduled on a weekend ({0} is a {1:?})")]
    WeekendDate(NaiveDate, chrono::Weekday),
    #[error("please enter a valid number for the deal value (got {0:?})")]
    InvalidDealValue(String),
    #[error("please answer won or lost (got {0:?})")]
    InvalidDealStatus(String),
    #[error("an outcome can only be recorded for a meeting that has already happened")]
    OutcomeBeforeMeeting,
    #[error("name is required")]
    EmptyName,
    #[error("please enter a valid email address (got {0:?})")]
    InvalidEmail(String),
    #[error("targets must be at least 1")]
    InvalidTarget,
    #[error("sales person not found: {0}")]
    SalesPersonNotFound(String),
    #[error("meeting not found: {0}")]
    MeetingNotFound(String),
    #[error("deal not found: {0}")]
    DealNotFound(String),
}

impl LedgerError {
    /// Aborts that are not worth a message to the user.
    pub fn is_silent(&self) -> bool {
        matches!(self, LedgerError::EmptyClientName)
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            LedgerError::SalesPersonNotFound(_)
                | LedgerError::MeetingNotFound(_)
                | LedgerError::DealNotFound(_)
        )
    }
}

/// A sales person as shown on the detail view, with their own records.
#[derive(Debug, Clone)]
pub struct PersonView {
    pub person: SalesPerson,
    pub meetings: Vec<Meeting>,
    pub deals: Vec<Deal>,
}

/// Owns the three collections and keeps every sales person's `current`
/// counters consistent with the meetings and deals that reference them.
///
/// Every mutation validates first, then performs all of its collection writes
/// before returning. Counters are adjusted incrementally; only
/// [`Ledger::open_sales_person`] recomputes the meeting count from scratch.
pub struct Ledger<S> {
    collections: Collections<S>,
    today: NaiveDate,
}

impl<S: KeyValueStore> Ledger<S> {
    pub fn new(store: S, today: NaiveDate) -> Self {
        Self {
            collections: Collections::new(store),
            today,
        }
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn sales_people(&self) -> Vec<SalesPerson> {
        self.collections.get(SALES_PEOPLE_KEY)
    }

    pub fn meetings(&self) -> Vec<Meeting> {
        self.collections.get(MEETINGS_KEY)
    }

    pub fn deals(&self) -> Vec<Deal> {
        self.collections.get(DEALS_KEY)
    }

    pub fn sales_person(&self, id: &str) -> Result<SalesPerson, LedgerError> {
        self.sales_people()
            .into_iter()
            .find(|p| p.id == id)
            .ok_or_else(|| LedgerError::SalesPersonNotFound(id.to_string()))
    }

    pub fn meeting(&self, id: &str) -> Result<Meeting, LedgerError> {
        self.meetings()
            .into_iter()
            .find(|m| m.id == id)
            .ok_or_else(|| LedgerError::MeetingNotFound(id.to_string()))
    }

    pub fn deal(&self, id: &str) -> Result<Deal, LedgerError> {
        self.deals()
            .into_iter()
            .find(|d| d.id == id)
            .ok_or_else(|| LedgerError::DealNotFound(id.to_string()))
    }

    /// Writes the default roster, but only into a store that has never held
    /// one. Returns the number of people written.
    pub fn seed_defaults(&mut self) -> usize {
        if self.collections.contains(SALES_PEOPLE_KEY) {
            tracing::info!("sales people already present; skipping seed");
            return 0;
        }

        let roster = vec![
            SalesPerson {
                id: "1".to_string(),
                name: "John Doe".to_string(),
                email: "john@example.com".to_string(),
                target: Kpi { meetings: 20, deals: 10 },
                current: Kpi::default(),
            },
            SalesPerson {
                id: "2".to_string(),
                name: "Jane Smith".to_string(),
                email: "jane@example.com".to_string(),
                target: Kpi { meetings: 20, deals: 10 },
                current: Kpi::default(),
            },
        ];
        self.collections.set(SALES_PEOPLE_KEY, &roster);
        if !self.collections.contains(MEETINGS_KEY) {
            self.collections.set::<Meeting>(MEETINGS_KEY, &[]);
        }
        if !self.collections.contains(DEALS_KEY) {
            self.collections.set::<Deal>(DEALS_KEY, &[]);
        }
        roster.len()
    }

    pub fn add_sales_person(&mut self, draft: SalesPersonDraft) -> Result<SalesPerson, LedgerError> {
        let name = draft.name.trim();
        if name.is_empty() {
            return Err(LedgerError::EmptyName);
        }
        let email = draft.email.trim();
        if !looks_like_email(email) {
            return Err(LedgerError::InvalidEmail(email.to_string()));
        }
        if draft.target.meetings < 1 || draft.target.deals < 1 {
            return Err(LedgerError::InvalidTarget);
        }

        let person = SalesPerson {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            email: email.to_string(),
            target: draft.target,
            current: Kpi::default(),
        };

        let mut people = self.sales_people();
        people.push(person.clone());
        self.collections.set(SALES_PEOPLE_KEY, &people);
        tracing::info!(id = %person.id, name = %person.name, "sales person added");
        Ok(person)
    }

    /// Loads a sales person for display. The meeting counter is recomputed
    /// from the collection and persisted; the deal counter is taken as stored.
    pub fn open_sales_person(&mut self, id: &str) -> Result<PersonView, LedgerError> {
        let mut people = self.sales_people();
        let person = people
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| LedgerError::SalesPersonNotFound(id.to_string()))?;

        let meetings: Vec<Meeting> = self
            .meetings()
            .into_iter()
            .filter(|m| m.sales_person_id == id)
            .collect();
        let deals: Vec<Deal> = self
            .deals()
            .into_iter()
            .filter(|d| d.sales_person_id == id)
            .collect();

        let this_week = count_this_week(&meetings, self.today);
        if person.current.meetings != this_week {
            tracing::info!(
                id,
                stored = person.current.meetings,
                recomputed = this_week,
                "meeting counter corrected on load"
            );
        }
        person.current.meetings = this_week;
        let person = person.clone();
        self.collections.set(SALES_PEOPLE_KEY, &people);

        Ok(PersonView {
            person,
            meetings,
            deals,
        })
    }

    /// Removes a sales person along with every meeting and deal referencing
    /// them.
    pub fn delete_sales_person(&mut self, id: &str) -> Result<CascadeSummary, LedgerError> {
        let mut people = self.sales_people();
        let before = people.len();
        people.retain(|p| p.id != id);
        if people.len() == before {
            return Err(LedgerError::SalesPersonNotFound(id.to_string()));
        }

        let mut meetings = self.meetings();
        let meetings_before = meetings.len();
        meetings.retain(|m| m.sales_person_id != id);

        let mut deals = self.deals();
        let deals_before = deals.len();
        deals.retain(|d| d.sales_person_id != id);

        self.collections.set(MEETINGS_KEY, &meetings);
        self.collections.set(DEALS_KEY, &deals);
        self.collections.set(SALES_PEOPLE_KEY, &people);

        let summary = CascadeSummary {
            meetings_removed: meetings_before - meetings.len(),
            deals_removed: deals_before - deals.len(),
        };
        tracing::info!(
            id,
            meetings = summary.meetings_removed,
            deals = summary.deals_removed,
            "sales person deleted"
        );
        Ok(summary)
    }

    pub fn add_meeting(
        &mut self,
        sales_person_id: &str,
        draft: MeetingDraft,
    ) -> Result<Meeting, LedgerError> {
        let client_name = required_client_name(&draft.client_name)?;
        let date = self.validated_date(&draft.date)?;
        let outcome = self.validated_outcome(draft.outcome, date)?;
        let mut people = self.sales_people();
        let person_idx = position_of(&people, sales_person_id)?;

        let meeting = Meeting {
            id: format!("meeting-{}", Uuid::new_v4()),
            sales_person_id: sales_person_id.to_string(),
            client_name,
            date,
            notes: non_empty(draft.notes),
            outcome,
        };

        let mut meetings = self.meetings();
        meetings.push(meeting.clone());
        self.collections.set(MEETINGS_KEY, &meetings);

        if is_this_week(date, self.today) {
            people[person_idx].current.meetings += 1;
            self.collections.set(SALES_PEOPLE_KEY, &people);
        }

        tracing::info!(id = %meeting.id, sales_person_id, %date, "meeting added");
        Ok(meeting)
    }

    /// Replaces a meeting's client, date, notes and outcome. The owner's
    /// counter moves only when the meeting enters or leaves this week.
    ///
    /// Moving a meeting to today or later drops the outcome it already had;
    /// a new outcome on such a date is rejected.
    pub fn edit_meeting(
        &mut self,
        meeting_id: &str,
        draft: MeetingDraft,
    ) -> Result<Meeting, LedgerError> {
        let client_name = required_client_name(&draft.client_name)?;
        let date = self.validated_date(&draft.date)?;

        let mut meetings = self.meetings();
        let meeting = meetings
            .iter_mut()
            .find(|m| m.id == meeting_id)
            .ok_or_else(|| LedgerError::MeetingNotFound(meeting_id.to_string()))?;

        let requested = non_empty(draft.outcome);
        let carried_over = requested.is_some() && requested == meeting.outcome;
        let outcome = if carried_over && date >= self.today {
            tracing::info!(meeting_id, %date, "outcome cleared by reschedule");
            None
        } else {
            self.validated_outcome(requested, date)?
        };

        let was_this_week = is_this_week(meeting.date, self.today);
        let now_this_week = is_this_week(date, self.today);

        meeting.client_name = client_name;
        meeting.date = date;
        meeting.notes = non_empty(draft.notes);
        meeting.outcome = outcome;
        let updated = meeting.clone();

        let mut people = self.sales_people();
        let person_idx = people.iter().position(|p| p.id == updated.sales_person_id);

        self.collections.set(MEETINGS_KEY, &meetings);

        match (person_idx, was_this_week, now_this_week) {
            (Some(idx), false, true) => {
                people[idx].current.meetings += 1;
                self.collections.set(SALES_PEOPLE_KEY, &people);
            }
            (Some(idx), true, false) => {
                people[idx].current.meetings = people[idx].current.meetings.saturating_sub(1);
                self.collections.set(SALES_PEOPLE_KEY, &people);
            }
            (None, _, _) => {
                tracing::warn!(
                    meeting_id,
                    sales_person_id = %updated.sales_person_id,
                    "edited meeting has no owner"
                );
            }
            _ => {}
        }

        tracing::info!(id = meeting_id, date = %updated.date, "meeting updated");
        Ok(updated)
    }

    /// Sets only the outcome of a meeting that has already taken place.
    pub fn record_outcome(
        &mut self,
        meeting_id: &str,
        outcome: Option<String>,
    ) -> Result<Meeting, LedgerError> {
        let mut meetings = self.meetings();
        let meeting = meetings
            .iter_mut()
            .find(|m| m.id == meeting_id)
            .ok_or_else(|| LedgerError::MeetingNotFound(meeting_id.to_string()))?;
        meeting.outcome = self.validated_outcome(outcome, meeting.date)?;
        let updated = meeting.clone();
        self.collections.set(MEETINGS_KEY, &meetings);
        Ok(updated)
    }

    /// Removes a meeting. The owner's counter drops only if the meeting was
    /// inside this week's window.
    pub fn delete_meeting(&mut self, meeting_id: &str) -> Result<Meeting, LedgerError> {
        let mut meetings = self.meetings();
        let idx = meetings
            .iter()
            .position(|m| m.id == meeting_id)
            .ok_or_else(|| LedgerError::MeetingNotFound(meeting_id.to_string()))?;
        let removed = meetings.remove(idx);
        self.collections.set(MEETINGS_KEY, &meetings);

        if is_this_week(removed.date, self.today) {
            let delta = Kpi { meetings: 1, deals: 0 };
            self.decrement(&removed.sales_person_id, delta);
        }

        tracing::info!(id = meeting_id, "meeting deleted");
        Ok(removed)
    }

    pub fn add_deal(&mut self, sales_person_id: &str, draft: DealDraft) -> Result<Deal, LedgerError> {
        let client_name = required_client_name(&draft.client_name)?;
        let value = parse_deal_value(&draft.value)?;
        let mut people = self.sales_people();
        let person_idx = position_of(&people, sales_person_id)?;

        let deal = Deal {
            id: format!("deal-{}", Uuid::new_v4()),
            sales_person_id: sales_person_id.to_string(),
            client_name,
            value,
            closed_date: self.today,
            status: draft.status,
        };

        let mut deals = self.deals();
        deals.push(deal.clone());
        self.collections.set(DEALS_KEY, &deals);

        if deal.is_won() {
            people[person_idx].current.deals += 1;
            self.collections.set(SALES_PEOPLE_KEY, &people);
        }

        tracing::info!(id = %deal.id, sales_person_id, value, status = deal.status.label(), "deal added");
        Ok(deal)
    }

    pub fn delete_deal(&mut self, deal_id: &str) -> Result<Deal, LedgerError> {
        let mut deals = self.deals();
        let idx = deals
            .iter()
            .position(|d| d.id == deal_id)
            .ok_or_else(|| LedgerError::DealNotFound(deal_id.to_string()))?;
        let removed = deals.remove(idx);
        self.collections.set(DEALS_KEY, &deals);

        if removed.is_won() {
            let delta = Kpi { meetings: 0, deals: 1 };
            self.decrement(&removed.sales_person_id, delta);
        }

        tracing::info!(id = deal_id, "deal deleted");
        Ok(removed)
    }

    /// Compares every stored counter with the value the collections imply.
    pub fn audit(&self) -> Vec<CounterDrift> {
        let meetings = self.meetings();
        let deals = self.deals();

        self.sales_people()
            .into_iter()
            .filter_map(|person| {
                let expected = Kpi {
                    meetings: meetings
                        .iter()
                        .filter(|m| m.sales_person_id == person.id && is_this_week(m.date, self.today))
                        .count() as u32,
                    deals: deals
                        .iter()
                        .filter(|d| d.sales_person_id == person.id && d.is_won())
                        .count() as u32,
                };
                (expected != person.current).then(|| CounterDrift {
                    sales_person_id: person.id,
                    name: person.name,
                    stored: person.current,
                    expected,
                })
            })
            .collect()
    }

    fn decrement(&mut self, sales_person_id: &str, delta: Kpi) {
        let mut people = self.sales_people();
        match people.iter_mut().find(|p| p.id == sales_person_id) {
            Some(person) => {
                person.current.meetings = person.current.meetings.saturating_sub(delta.meetings);
                person.current.deals = person.current.deals.saturating_sub(delta.deals);
                self.collections.set(SALES_PEOPLE_KEY, &people);
            }
            None => tracing::warn!(sales_person_id, "record removed for unknown sales person"),
        }
    }

    fn validated_date(&self, raw: &str) -> Result<NaiveDate, LedgerError> {
        let date = parse_meeting_date(raw).ok_or_else(|| LedgerError::InvalidDate(raw.to_string()))?;
        if is_weekend(date) {
            return Err(LedgerError::WeekendDate(date, date.weekday()));
        }
        Ok(date)
    }

    fn validated_outcome(
        &self,
        outcome: Option<String>,
        date: NaiveDate,
    ) -> Result<Option<String>, LedgerError> {
        let outcome = non_empty(outcome);
        if outcome.is_some() && date >= self.today {
            return Err(LedgerError::OutcomeBeforeMeeting);
        }
        Ok(outcome)
    }
}

pub fn count_this_week(meetings: &[Meeting], today: NaiveDate) -> u32 {
    meetings
        .iter()
        .filter(|m| is_this_week(m.date, today))
        .count() as u32
}

pub fn parse_deal_value(raw: &str) -> Result<i64, LedgerError> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| LedgerError::InvalidDealValue(raw.to_string()))
}

fn required_client_name(raw: &str) -> Result<String, LedgerError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(LedgerError::EmptyClientName);
    }
    Ok(trimmed.to_string())
}

fn looks_like_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty() && !domain.contains('@'),
        None => false,
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn position_of(people: &[SalesPerson], id: &str) -> Result<usize, LedgerError> {
    people
        .iter()
        .position(|p| p.id == id)
        .ok_or_else(|| LedgerError::SalesPersonNotFound(id.to_string()))
}
