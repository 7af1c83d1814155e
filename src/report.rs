use std::fmt::Write;

use chrono::NaiveDate;

use crate::ledger::PersonView;
use crate::models::{CounterDrift, Deal, SalesPerson};
use crate::schedule::{BucketedMeetings, WeekWindow};

const BAR_WIDTH: usize = 20;

pub fn progress_percent(current: u32, target: u32) -> f64 {
    if target == 0 {
        return 100.0;
    }
    (f64::from(current) / f64::from(target) * 100.0).min(100.0)
}

pub fn progress_bar(current: u32, target: u32) -> String {
    let percent = progress_percent(current, target);
    let filled = ((percent / 100.0) * BAR_WIDTH as f64).round() as usize;
    format!(
        "[{}{}] {:>3.0}%",
        "#".repeat(filled),
        "-".repeat(BAR_WIDTH - filled),
        percent
    )
}

/// Formats whole currency units with thousands separators, e.g. `$12,500`.
pub fn format_currency(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::new();
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if value < 0 {
        format!("-${grouped}")
    } else {
        format!("${grouped}")
    }
}

pub fn build_list(people: &[SalesPerson], today: NaiveDate) -> String {
    let window = WeekWindow::for_day(today);
    let mut output = String::new();

    let _ = writeln!(output, "# Sales People");
    let _ = writeln!(
        output,
        "Week of {} to {}",
        window.monday.date(),
        window.friday.date()
    );
    let _ = writeln!(output);

    if people.is_empty() {
        let _ = writeln!(output, "No sales people yet.");
        return output;
    }

    for person in people {
        let _ = writeln!(output, "## {} <{}>", person.name, person.email);
        let _ = writeln!(output, "id: {}", person.id);
        let _ = writeln!(
            output,
            "- Meetings {:>3} / {:<3} {}",
            person.current.meetings,
            person.target.meetings,
            progress_bar(person.current.meetings, person.target.meetings)
        );
        let _ = writeln!(
            output,
            "- Deals    {:>3} / {:<3} {}",
            person.current.deals,
            person.target.deals,
            progress_bar(person.current.deals, person.target.deals)
        );
        let _ = writeln!(output);
    }

    output
}

pub fn build_detail(view: &PersonView, today: NaiveDate) -> String {
    let person = &view.person;
    let mut output = String::new();

    let _ = writeln!(output, "# {}", person.name);
    let _ = writeln!(output, "{}", person.email);
    let _ = writeln!(output);
    let _ = writeln!(output, "## KPIs");
    let _ = writeln!(
        output,
        "- Meetings this week: {} / {}",
        person.current.meetings, person.target.meetings
    );
    let _ = writeln!(
        output,
        "- Deals closed: {} / {}",
        person.current.deals, person.target.deals
    );

    let buckets = BucketedMeetings::from_meetings(&view.meetings, today);
    let _ = writeln!(output);
    let _ = writeln!(output, "## Meetings");
    if view.meetings.is_empty() {
        let _ = writeln!(output, "No meetings recorded yet.");
    } else {
        for (bucket, meetings) in buckets.sections() {
            if meetings.is_empty() {
                continue;
            }
            let _ = writeln!(output, "### {}", bucket.title());
            for meeting in meetings {
                let _ = write!(
                    output,
                    "- {} {} ({})",
                    meeting.date, meeting.client_name, meeting.id
                );
                if let Some(notes) = &meeting.notes {
                    let _ = write!(output, ": {notes}");
                }
                if let Some(outcome) = &meeting.outcome {
                    let _ = write!(output, " [outcome: {outcome}]");
                }
                let _ = writeln!(output);
            }
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Deals");
    if view.deals.is_empty() {
        let _ = writeln!(output, "No deals recorded yet.");
    } else {
        let mut deals: Vec<&Deal> = view.deals.iter().collect();
        deals.sort_by(|a, b| b.closed_date.cmp(&a.closed_date));
        for deal in deals {
            let _ = writeln!(
                output,
                "- {} {} {} closed on {} ({})",
                deal.client_name,
                format_currency(deal.value),
                deal.status.label(),
                deal.closed_date,
                deal.id
            );
        }
    }

    output
}

pub fn build_audit(drift: &[CounterDrift]) -> String {
    let mut output = String::new();
    if drift.is_empty() {
        let _ = writeln!(output, "All counters match their records.");
        return output;
    }

    let _ = writeln!(output, "Counters out of step with their records:");
    for entry in drift {
        let _ = writeln!(
            output,
            "- {} ({}): meetings {} (expected {}), deals {} (expected {})",
            entry.name,
            entry.sales_person_id,
            entry.stored.meetings,
            entry.expected.meetings,
            entry.stored.deals,
            entry.expected.deals
        );
    }
    output
}

/// The full dashboard: list view followed by every person's detail view.
pub fn build_report(views: &[PersonView], today: NaiveDate) -> String {
    let people: Vec<SalesPerson> = views.iter().map(|v| v.person.clone()).collect();
    let mut output = build_list(&people, today);
    for view in views {
        let _ = writeln!(output, "---");
        let _ = writeln!(output);
        output.push_str(&build_detail(view, today));
        let _ = writeln!(output);
    }
    output
}
