use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

use crate::ledger::Ledger;
use crate::models::MeetingDraft;
use crate::store::KeyValueStore;

#[derive(Debug, Deserialize)]
struct MeetingRow {
    client_name: String,
    date: String,
    #[serde(default)]
    notes: Option<String>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ImportSummary {
    pub imported: usize,
    pub skipped: usize,
}

/// Imports meetings for one sales person from a CSV with the columns
/// `client_name,date,notes`. Rows that fail validation are skipped.
pub fn import_meetings<S: KeyValueStore>(
    ledger: &mut Ledger<S>,
    sales_person_id: &str,
    csv_path: &Path,
) -> anyhow::Result<ImportSummary> {
    let reader = csv::Reader::from_path(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    import_meetings_from(ledger, sales_person_id, reader)
}

pub fn import_meetings_from<S: KeyValueStore, R: std::io::Read>(
    ledger: &mut Ledger<S>,
    sales_person_id: &str,
    mut reader: csv::Reader<R>,
) -> anyhow::Result<ImportSummary> {
    ledger.sales_person(sales_person_id)?;

    let mut summary = ImportSummary::default();
    for (line, result) in reader.deserialize::<MeetingRow>().enumerate() {
        let row = result.with_context(|| format!("malformed CSV record {}", line + 1))?;
        let draft = MeetingDraft {
            client_name: row.client_name,
            date: row.date,
            notes: row.notes,
            outcome: None,
        };
        match ledger.add_meeting(sales_person_id, draft) {
            Ok(_) => summary.imported += 1,
            Err(err) => {
                tracing::warn!(record = line + 1, error = %err, "skipping meeting row");
                summary.skipped += 1;
            }
        }
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::models::{Kpi, SalesPersonDraft};
    use crate::store::MemoryStore;

    #[test]
    fn imports_valid_rows_and_skips_the_rest() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 12).unwrap();
        let mut ledger = Ledger::new(MemoryStore::new(), today);
        let person = ledger
            .add_sales_person(SalesPersonDraft {
                name: "Kiara Patel".to_string(),
                email: "kiara@example.com".to_string(),
                target: Kpi { meetings: 5, deals: 2 },
            })
            .unwrap();

        let data = "client_name,date,notes\n\
                    Acme,2024-06-13,Demo\n\
                    Globex,2024-06-15,Saturday slot\n\
                    Initech,not-a-date,\n\
                    Umbrella,2024-06-24,\n";
        let reader = csv::Reader::from_reader(data.as_bytes());
        let summary = import_meetings_from(&mut ledger, &person.id, reader).unwrap();

        assert_eq!(summary, ImportSummary { imported: 2, skipped: 2 });
        assert_eq!(ledger.meetings().len(), 2);
        assert_eq!(ledger.sales_person(&person.id).unwrap().current.meetings, 1);
    }

    #[test]
    fn unknown_person_fails_before_reading() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 12).unwrap();
        let mut ledger = Ledger::new(MemoryStore::new(), today);
        let reader = csv::Reader::from_reader("client_name,date,notes\n".as_bytes());
        assert!(import_meetings_from(&mut ledger, "nobody", reader).is_err());
    }
}
