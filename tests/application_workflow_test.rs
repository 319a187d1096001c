// Restaurant application workflow rules that hold regardless of storage:
// which states may submit, which states an admin decision may produce, and
// the completeness gates checked before a submission is accepted.

use chrono::Utc;
use nearbite_api::models::{Restaurant, RestaurantStatus};
use uuid::Uuid;

fn restaurant(status: &str) -> Restaurant {
    Restaurant {
        id: Uuid::new_v4(),
        phone: "+919876543210".to_string(),
        firebase_uid: "firebase-uid".to_string(),
        owner_name: Some("Ravi Kumar".to_string()),
        name: Some("Spice Garden".to_string()),
        fssai_number: Some("10012031000123".to_string()),
        photo_url: None,
        status: status.to_string(),
        review_reason: None,
        application_submitted_at: None,
        application_reviewed_at: None,
        lat: Some(12.9716),
        lng: Some(77.5946),
        address: Some("MG Road, Bengaluru".to_string()),
        created_at: Utc::now(),
    }
}

#[test]
fn submit_is_allowed_only_from_draft_or_rejected() {
    assert!(restaurant("draft").status().can_submit());
    assert!(restaurant("rejected").status().can_submit());
    assert!(!restaurant("pending").status().can_submit());
    assert!(!restaurant("approved").status().can_submit());
}

#[test]
fn review_decisions_are_approved_or_rejected() {
    assert!(RestaurantStatus::Approved.is_review_decision());
    assert!(RestaurantStatus::Rejected.is_review_decision());
    assert!(!RestaurantStatus::Draft.is_review_decision());
    assert!(!RestaurantStatus::Pending.is_review_decision());
}

#[test]
fn profile_gate_needs_names_and_one_verification_artifact() {
    let complete = restaurant("draft");
    assert!(complete.has_profile());

    let mut missing_artifact = restaurant("draft");
    missing_artifact.fssai_number = None;
    missing_artifact.photo_url = None;
    assert!(!missing_artifact.has_profile());

    let mut photo_only = restaurant("draft");
    photo_only.fssai_number = None;
    photo_only.photo_url = Some("https://example.com/license.jpg".to_string());
    assert!(photo_only.has_profile());

    let mut no_owner = restaurant("draft");
    no_owner.owner_name = None;
    assert!(!no_owner.has_profile());
}

#[test]
fn location_gate_needs_both_coordinates() {
    let mut restaurant = restaurant("draft");
    assert!(restaurant.has_location());

    restaurant.lat = None;
    assert!(!restaurant.has_location());
}

#[test]
fn unknown_status_value_is_read_as_draft() {
    assert_eq!(restaurant("archived").status(), RestaurantStatus::Draft);
}

#[test]
fn status_strings_round_trip() {
    for status in [
        RestaurantStatus::Draft,
        RestaurantStatus::Pending,
        RestaurantStatus::Approved,
        RestaurantStatus::Rejected,
    ] {
        assert_eq!(RestaurantStatus::from_str(status.as_str()), Ok(status));
    }
}
