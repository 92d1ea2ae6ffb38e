//! Test helpers for seeding catalogues on disk.

use camino::{Utf8Path, Utf8PathBuf};
use chrono::{NaiveTime, Weekday};
use savour_core::{
    AttributeFlag, OpeningHours, RatingEvent, RecordOutcome, ReviewGate, ReviewVerdict,
    SqliteCatalog, UserId, VenueId, VenueRecord,
};
use tempfile::TempDir;

pub(super) const DINER: &str = "diner";
pub(super) const NEWCOMER: &str = "newcomer";

/// Gate that accepts every review.
pub(super) struct AcceptAll;

impl ReviewGate for AcceptAll {
    fn classify(&self, _text: &str) -> ReviewVerdict {
        ReviewVerdict::Genuine
    }
}

/// Gate that refuses every review.
pub(super) struct RejectAll;

impl ReviewGate for RejectAll {
    fn classify(&self, _text: &str) -> ReviewVerdict {
        ReviewVerdict::MachineGenerated
    }
}

pub(super) fn utf8_root(tmp: &TempDir) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).expect("utf-8 workspace")
}

fn venue(key: &str, city: &str, rating: f64, count: u32, delivery: bool) -> VenueRecord {
    VenueRecord::new(VenueId::new(key).expect("venue id"), rating, count)
        .with_name(key.replace('-', " "))
        .with_city(city)
        .with_price_tier(2)
        .with_all_flags(false)
        .with_flag(AttributeFlag::Delivery, delivery)
}

fn friday(open: (u32, u32), close: (u32, u32)) -> OpeningHours {
    let at = |(hour, minute)| NaiveTime::from_hms_opt(hour, minute, 0).expect("valid time");
    OpeningHours::new(at(open), at(close))
}

/// Write a catalogue with three Leeds venues, one York venue, and a single
/// five-star rating of the Leeds noodle bar by [`DINER`].
///
/// On Fridays the curry house opens for the evening and the noodle bar for
/// lunch; the cafe has no recorded hours.
pub(super) fn seed_catalog(path: &Utf8Path) {
    let catalog = SqliteCatalog::create(path.as_std_path()).expect("create catalogue");
    for record in [
        venue("leeds-curry-house", "Leeds", 4.6, 120, true)
            .with_hours(Weekday::Fri, friday((17, 0), (23, 0))),
        venue("leeds-cafe", "Leeds", 3.9, 15, false),
        venue("leeds-noodle-bar", "Leeds", 4.2, 60, true)
            .with_hours(Weekday::Fri, friday((11, 30), (15, 0))),
        venue("york-bistro", "York", 4.8, 200, false)
            .with_hours(Weekday::Fri, friday((18, 0), (22, 0))),
    ] {
        catalog.insert_venue(&record).expect("insert venue");
    }
    let rating = RatingEvent::new(
        UserId::new(DINER).expect("user id"),
        VenueId::new("leeds-noodle-bar").expect("venue id"),
        5.0,
        1_700_000_000,
    )
    .expect("valid rating");
    let outcome = catalog
        .record_rating(&rating, "Hand-pulled noodles, worth the queue.", &AcceptAll)
        .expect("record rating");
    assert_eq!(outcome, RecordOutcome::Stored);
}
