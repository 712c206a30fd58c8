// tests/extract_fields.rs
use beacon_resources::extract::{extract, RawEvent};

fn event(description: &str) -> RawEvent {
    RawEvent {
        id: Some("ev-1".to_string()),
        summary: "Mobile Food Pantry".to_string(),
        location: "45 Elm St, Hartford".to_string(),
        description: description.to_string(),
        ..Default::default()
    }
}

#[test]
fn round_trip_extracts_all_fields() {
    let ev = event("<b>9:00AM-5:00PM</b> FAIRFIELD COUNTY Every 2 weeks on Tuesday, open to all");
    let r = extract(&ev);

    assert_eq!(r.time, "9:00AM-5:00PM");
    assert_eq!(r.county, "FAIRFIELD COUNTY");
    assert_eq!(r.schedule, "Every 2 weeks on Tuesday");
    assert_eq!(r.description, "open to all");
}

#[test]
fn missing_description_yields_empty_fields() {
    let ev = event("");
    let r = extract(&ev);

    assert_eq!(r.name, "Mobile Food Pantry");
    assert_eq!(r.address, "45 Elm St, Hartford");
    assert!(r.time.is_empty());
    assert!(r.county.is_empty());
    assert!(r.schedule.is_empty());
    assert!(r.description.is_empty());
    assert!(r.lat.is_none() && r.lng.is_none());
}

#[test]
fn unmatched_patterns_degrade_to_residual_text() {
    let ev = event("<p>Walk-ins welcome, bring a photo ID.</p>");
    let r = extract(&ev);

    assert!(r.time.is_empty());
    assert!(r.county.is_empty());
    assert!(r.schedule.is_empty());
    assert_eq!(r.description, "Walk-ins welcome, bring a photo ID.");
}

#[test]
fn name_and_address_are_trimmed() {
    let ev = RawEvent {
        summary: "  Diaper Bank  ".to_string(),
        location: " 12 Oak Ave \n".to_string(),
        ..Default::default()
    };
    let r = extract(&ev);
    assert_eq!(r.name, "Diaper Bank");
    assert_eq!(r.address, "12 Oak Ave");
}

#[test]
fn singular_week_schedule_matches() {
    let ev = event("Every 1 week on Friday");
    let r = extract(&ev);
    assert_eq!(r.schedule, "Every 1 week on Friday");
}

#[test]
fn time_outside_bold_span_is_ignored() {
    let ev = event("Doors open 9:00AM-5:00PM in HARTFORD COUNTY");
    let r = extract(&ev);
    assert!(r.time.is_empty());
    assert_eq!(r.county, "HARTFORD COUNTY");
    // The unextracted time range stays part of the residual description.
    assert_eq!(r.description, "Doors open 9:00AM-5:00PM in");
}

#[test]
fn inline_coordinates_are_copied() {
    let ev = RawEvent {
        location: "45 Elm St".to_string(),
        lat: Some(41.76),
        lng: Some(-72.67),
        ..Default::default()
    };
    let r = extract(&ev);
    assert_eq!(r.lat, Some(41.76));
    assert_eq!(r.lng, Some(-72.67));
    assert!(r.is_complete());
}
