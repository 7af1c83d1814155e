use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const SALES_PEOPLE_KEY: &str = "salesPeople";
pub const MEETINGS_KEY: &str = "meetings";
pub const DEALS_KEY: &str = "deals";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Kpi {
    pub meetings: u32,
    pub deals: u32,
}

/// A sales person with weekly targets and the cached progress against them.
///
/// `current` mirrors the meeting and deal collections and is kept in step by
/// the ledger on every mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesPerson {
    pub id: String,
    pub name: String,
    pub email: String,
    pub target: Kpi,
    #[serde(default)]
    pub current: Kpi,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meeting {
    pub id: String,
    pub sales_person_id: String,
    pub client_name: String,
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DealStatus {
    Won,
    Lost,
}

impl DealStatus {
    pub fn from_won(won: bool) -> Self {
        if won {
            DealStatus::Won
        } else {
            DealStatus::Lost
        }
    }

    /// Reads a typed answer such as "won", "W" or "lost".
    pub fn parse(answer: &str) -> Option<Self> {
        match answer.trim().to_ascii_lowercase().as_str() {
            "won" | "w" => Some(DealStatus::Won),
            "lost" | "l" => Some(DealStatus::Lost),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DealStatus::Won => "WON",
            DealStatus::Lost => "LOST",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deal {
    pub id: String,
    pub sales_person_id: String,
    pub client_name: String,
    pub value: i64,
    pub closed_date: NaiveDate,
    pub status: DealStatus,
}

impl Deal {
    pub fn is_won(&self) -> bool {
        self.status == DealStatus::Won
    }
}

#[derive(Debug, Clone)]
pub struct SalesPersonDraft {
    pub name: String,
    pub email: String,
    pub target: Kpi,
}

/// Raw user input for creating or editing a meeting. The date is kept as text
/// so that parsing happens inside the validated entry point.
#[derive(Debug, Clone, Default)]
pub struct MeetingDraft {
    pub client_name: String,
    pub date: String,
    pub notes: Option<String>,
    pub outcome: Option<String>,
}

#[derive(Debug, Clone)]
pub struct DealDraft {
    pub client_name: String,
    pub value: String,
    pub status: DealStatus,
}

/// Stored counters that disagree with the collections they summarize.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterDrift {
    pub sales_person_id: String,
    pub name: String,
    pub stored: Kpi,
    pub expected: Kpi,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CascadeSummary {
    pub meetings_removed: usize,
    pub deals_removed: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meeting_uses_camel_case_and_ignores_legacy_fields() {
        let raw = r#"{
            "id": "meeting-1",
            "salesPersonId": "1",
            "clientName": "Acme",
            "date": "2024-06-10",
            "notes": "",
            "needsReschedule": true
        }"#;
        let meeting: Meeting = serde_json::from_str(raw).unwrap();
        assert_eq!(meeting.sales_person_id, "1");
        assert_eq!(meeting.date, NaiveDate::from_ymd_opt(2024, 6, 10).unwrap());
        assert_eq!(meeting.outcome, None);

        let json = serde_json::to_value(&meeting).unwrap();
        assert_eq!(json["clientName"], "Acme");
        assert!(json.get("outcome").is_none());
    }

    #[test]
    fn deal_status_serializes_lowercase() {
        let deal = Deal {
            id: "deal-1".to_string(),
            sales_person_id: "2".to_string(),
            client_name: "Globex".to_string(),
            value: 500,
            closed_date: NaiveDate::from_ymd_opt(2024, 6, 12).unwrap(),
            status: DealStatus::Won,
        };
        let json = serde_json::to_value(&deal).unwrap();
        assert_eq!(json["status"], "won");
        assert_eq!(json["closedDate"], "2024-06-12");
        assert_eq!(DealStatus::Lost.label(), "LOST");
    }

    #[test]
    fn deal_status_reads_typed_answers() {
        assert_eq!(DealStatus::parse(" Won "), Some(DealStatus::Won));
        assert_eq!(DealStatus::parse("l"), Some(DealStatus::Lost));
        assert_eq!(DealStatus::parse("yes"), None);
        assert_eq!(DealStatus::parse(""), None);
    }
}
