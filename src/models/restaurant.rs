// Restaurant database model, application-review status machine and queries
//
// Status only ever moves draft|rejected -> pending (submit) and
// pending -> approved|rejected (admin review). Every transition is a single
// conditional UPDATE guarded by the current status, so a lost race updates
// zero rows and is reported as a conflict by the caller.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::upsert::excluded;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schema::restaurants;

/// Application review states
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RestaurantStatus {
    Draft,
    Pending,
    Approved,
    Rejected,
}

impl RestaurantStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RestaurantStatus::Draft => "draft",
            RestaurantStatus::Pending => "pending",
            RestaurantStatus::Approved => "approved",
            RestaurantStatus::Rejected => "rejected",
        }
    }

    pub fn from_str(s: &str) -> Result<Self, String> {
        match s {
            "draft" => Ok(RestaurantStatus::Draft),
            "pending" => Ok(RestaurantStatus::Pending),
            "approved" => Ok(RestaurantStatus::Approved),
            "rejected" => Ok(RestaurantStatus::Rejected),
            other => Err(format!("Invalid restaurant status: {}", other)),
        }
    }

    /// States from which an application may be (re)submitted
    pub fn can_submit(&self) -> bool {
        matches!(self, RestaurantStatus::Draft | RestaurantStatus::Rejected)
    }

    /// States an admin review decision may land on
    pub fn is_review_decision(&self) -> bool {
        matches!(self, RestaurantStatus::Approved | RestaurantStatus::Rejected)
    }
}

impl std::fmt::Display for RestaurantStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Restaurant row
#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Serialize, Deserialize)]
#[diesel(table_name = restaurants)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Restaurant {
    pub id: Uuid,
    pub phone: String,
    pub firebase_uid: String,
    pub owner_name: Option<String>,
    pub name: Option<String>,
    pub fssai_number: Option<String>,
    pub photo_url: Option<String>,
    pub status: String,
    pub review_reason: Option<String>,
    pub application_submitted_at: Option<DateTime<Utc>>,
    pub application_reviewed_at: Option<DateTime<Utc>>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = restaurants)]
struct NewRestaurant<'a> {
    phone: &'a str,
    firebase_uid: &'a str,
    status: &'a str,
}

impl Restaurant {
    pub fn status(&self) -> RestaurantStatus {
        // The status column carries a CHECK constraint; anything else means
        // the row predates the constraint and is treated as draft.
        RestaurantStatus::from_str(&self.status).unwrap_or(RestaurantStatus::Draft)
    }

    /// Owner name, restaurant name, and at least one verification artifact
    /// (FSSAI number or a document photo)
    pub fn has_profile(&self) -> bool {
        self.owner_name.is_some()
            && self.name.is_some()
            && (self.fssai_number.is_some() || self.photo_url.is_some())
    }

    pub fn has_location(&self) -> bool {
        self.lat.is_some() && self.lng.is_some()
    }
}

/// Insert-or-update a restaurant by phone; new rows start in draft
pub async fn upsert_restaurant_by_phone(
    conn: &mut AsyncPgConnection,
    phone: &str,
    firebase_uid: &str,
) -> QueryResult<Uuid> {
    diesel::insert_into(restaurants::table)
        .values(NewRestaurant {
            phone,
            firebase_uid,
            status: RestaurantStatus::Draft.as_str(),
        })
        .on_conflict(restaurants::phone)
        .do_update()
        .set(restaurants::firebase_uid.eq(excluded(restaurants::firebase_uid)))
        .returning(restaurants::id)
        .get_result(conn)
        .await
}

pub async fn find_restaurant_by_id(
    conn: &mut AsyncPgConnection,
    restaurant_id: Uuid,
) -> QueryResult<Option<Restaurant>> {
    restaurants::table
        .find(restaurant_id)
        .select(Restaurant::as_select())
        .first(conn)
        .await
        .optional()
}

pub async fn update_restaurant_profile(
    conn: &mut AsyncPgConnection,
    restaurant_id: Uuid,
    owner_name: &str,
    name: &str,
    fssai_number: Option<&str>,
    photo_url: Option<&str>,
) -> QueryResult<Option<Restaurant>> {
    diesel::update(restaurants::table.find(restaurant_id))
        .set((
            restaurants::owner_name.eq(owner_name),
            restaurants::name.eq(name),
            restaurants::fssai_number.eq(fssai_number),
            restaurants::photo_url.eq(photo_url),
        ))
        .returning(Restaurant::as_returning())
        .get_result(conn)
        .await
        .optional()
}

pub async fn update_restaurant_location(
    conn: &mut AsyncPgConnection,
    restaurant_id: Uuid,
    lat: f64,
    lng: f64,
    address: Option<&str>,
) -> QueryResult<Option<Restaurant>> {
    diesel::update(restaurants::table.find(restaurant_id))
        .set((
            restaurants::lat.eq(lat),
            restaurants::lng.eq(lng),
            restaurants::address.eq(address),
        ))
        .returning(Restaurant::as_returning())
        .get_result(conn)
        .await
        .optional()
}

/// Move a draft or rejected application to pending. The status predicate
/// makes concurrent double-submission safe: only one submit can match the
/// row, the loser sees `None`.
pub async fn submit_restaurant_application(
    conn: &mut AsyncPgConnection,
    restaurant_id: Uuid,
) -> QueryResult<Option<Restaurant>> {
    diesel::update(
        restaurants::table
            .find(restaurant_id)
            .filter(restaurants::status.eq_any(["draft", "rejected"])),
    )
    .set((
        restaurants::status.eq(RestaurantStatus::Pending.as_str()),
        restaurants::review_reason.eq(None::<String>),
        restaurants::application_submitted_at.eq(Some(Utc::now())),
        restaurants::application_reviewed_at.eq(None::<DateTime<Utc>>),
    ))
    .returning(Restaurant::as_returning())
    .get_result(conn)
    .await
    .optional()
}

/// Approve or reject a pending application. Returns `None` when the row is
/// no longer pending (e.g. a second admin won the race).
pub async fn review_restaurant_application(
    conn: &mut AsyncPgConnection,
    restaurant_id: Uuid,
    decision: RestaurantStatus,
    reason: Option<&str>,
) -> QueryResult<Option<Restaurant>> {
    debug_assert!(decision.is_review_decision());

    diesel::update(
        restaurants::table
            .find(restaurant_id)
            .filter(restaurants::status.eq(RestaurantStatus::Pending.as_str())),
    )
    .set((
        restaurants::status.eq(decision.as_str()),
        restaurants::review_reason.eq(reason),
        restaurants::application_reviewed_at.eq(Some(Utc::now())),
    ))
    .returning(Restaurant::as_returning())
    .get_result(conn)
    .await
    .optional()
}

/// List applications for the admin dashboard, newest submissions first.
/// Without a filter, draft rows (never submitted) are excluded.
pub async fn list_restaurant_applications(
    conn: &mut AsyncPgConnection,
    status: Option<RestaurantStatus>,
) -> QueryResult<Vec<Restaurant>> {
    let mut query = restaurants::table
        .select(Restaurant::as_select())
        .into_boxed();

    query = match status {
        Some(status) => query.filter(restaurants::status.eq(status.as_str())),
        None => query.filter(restaurants::status.eq_any(["pending", "approved", "rejected"])),
    };

    query
        .order((
            restaurants::application_submitted_at.desc().nulls_last(),
            restaurants::created_at.desc(),
        ))
        .load(conn)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_restaurant() -> Restaurant {
        Restaurant {
            id: Uuid::new_v4(),
            phone: "+919876543210".to_string(),
            firebase_uid: "uid-1".to_string(),
            owner_name: Some("Ravi".to_string()),
            name: Some("Spice Garden".to_string()),
            fssai_number: Some("12345678901234".to_string()),
            photo_url: None,
            status: "draft".to_string(),
            review_reason: None,
            application_submitted_at: None,
            application_reviewed_at: None,
            lat: Some(12.9716),
            lng: Some(77.5946),
            address: Some("Bengaluru".to_string()),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_status_round_trip() {
        for status in [
            RestaurantStatus::Draft,
            RestaurantStatus::Pending,
            RestaurantStatus::Approved,
            RestaurantStatus::Rejected,
        ] {
            assert_eq!(RestaurantStatus::from_str(status.as_str()), Ok(status));
        }
        assert!(RestaurantStatus::from_str("unknown").is_err());
    }

    #[test]
    fn test_submit_allowed_from_draft_and_rejected_only() {
        assert!(RestaurantStatus::Draft.can_submit());
        assert!(RestaurantStatus::Rejected.can_submit());
        assert!(!RestaurantStatus::Pending.can_submit());
        assert!(!RestaurantStatus::Approved.can_submit());
    }

    #[test]
    fn test_profile_requires_fssai_or_photo() {
        let mut restaurant = sample_restaurant();
        assert!(restaurant.has_profile());

        restaurant.fssai_number = None;
        assert!(!restaurant.has_profile());

        restaurant.photo_url = Some("https://example.com/doc.jpg".to_string());
        assert!(restaurant.has_profile());
    }

    #[test]
    fn test_profile_requires_both_names() {
        let mut restaurant = sample_restaurant();
        restaurant.owner_name = None;
        assert!(!restaurant.has_profile());

        let mut restaurant = sample_restaurant();
        restaurant.name = None;
        assert!(!restaurant.has_profile());
    }

    #[test]
    fn test_location_requires_both_coordinates() {
        let mut restaurant = sample_restaurant();
        assert!(restaurant.has_location());

        restaurant.lng = None;
        assert!(!restaurant.has_location());
    }

    #[test]
    fn test_unknown_status_treated_as_draft() {
        let mut restaurant = sample_restaurant();
        restaurant.status = "bogus".to_string();
        assert_eq!(restaurant.status(), RestaurantStatus::Draft);
    }
}
