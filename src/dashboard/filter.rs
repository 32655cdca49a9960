use chrono::{DateTime, Datelike, Days, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};

use crate::models::{DocumentFilter, DocumentRecord, TimeWindow};

/// Apply `filter` to `records`, preserving order.
///
/// Time windows are evaluated on the wall clock of `now`'s time zone: today
/// starts at local midnight, the week at midnight of the most recent Sunday,
/// the month at midnight of the 1st.
pub fn filter_documents<'a, Tz: TimeZone>(
    records: impl IntoIterator<Item = &'a DocumentRecord>,
    filter: &DocumentFilter,
    now: &DateTime<Tz>,
) -> Vec<&'a DocumentRecord> {
    let term = filter.normalized_term();
    let since = filter.time_window.map(|w| window_start(w, now.naive_local().date()));
    let tz = now.timezone();

    records
        .into_iter()
        .filter(|r| term.as_deref().map_or(true, |t| matches_term(r, t)))
        .filter(|r| filter.status.map_or(true, |s| r.status() == s))
        .filter(|r| {
            since.map_or(true, |start| {
                r.uploaded_at().with_timezone(&tz).naive_local() >= start
            })
        })
        .collect()
}

/// `filter_documents` against the system clock and time zone.
pub fn filter_documents_now<'a>(
    records: impl IntoIterator<Item = &'a DocumentRecord>,
    filter: &DocumentFilter,
) -> Vec<&'a DocumentRecord> {
    filter_documents(records, filter, &Local::now())
}

fn window_start(window: TimeWindow, today: NaiveDate) -> NaiveDateTime {
    let first_day = match window {
        TimeWindow::Today => today,
        TimeWindow::Week => {
            today - Days::new(u64::from(today.weekday().num_days_from_sunday()))
        }
        TimeWindow::Month => today - Days::new(u64::from(today.day0())),
    };
    first_day.and_time(NaiveTime::MIN)
}

/// Name, document type code and department code. Display names are not
/// searched.
fn matches_term(record: &DocumentRecord, term: &str) -> bool {
    let classification = record.classification();

    record.name().to_lowercase().contains(term)
        || classification.document_type.as_str().contains(term)
        || classification.department.as_str().contains(term)
}
