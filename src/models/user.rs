// User database model and queries
// Users are keyed by phone number; the Firebase UID is refreshed on every
// successful verification.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::upsert::excluded;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schema::{user_locations, users};

/// User row
#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Serialize, Deserialize)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct User {
    pub id: Uuid,
    pub phone: String,
    pub firebase_uid: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// User location row, one per user, created lazily on first location save
#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = user_locations)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UserLocation {
    pub user_id: Uuid,
    pub lat: f64,
    pub lng: f64,
    pub accuracy_m: Option<f64>,
    pub address: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = users)]
struct NewUser<'a> {
    phone: &'a str,
    firebase_uid: &'a str,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = user_locations)]
struct NewUserLocation<'a> {
    user_id: Uuid,
    lat: f64,
    lng: f64,
    accuracy_m: Option<f64>,
    address: Option<&'a str>,
}

impl User {
    /// True when the user has finished onboarding: a name plus a saved location
    pub fn is_profile_complete(&self, location: Option<&UserLocation>) -> bool {
        self.name.is_some() && location.is_some()
    }
}

/// Insert-or-update a user by phone. A repeated verification for the same
/// phone refreshes `firebase_uid` without creating a second row.
pub async fn upsert_user_by_phone(
    conn: &mut AsyncPgConnection,
    phone: &str,
    firebase_uid: &str,
) -> QueryResult<Uuid> {
    diesel::insert_into(users::table)
        .values(NewUser {
            phone,
            firebase_uid,
        })
        .on_conflict(users::phone)
        .do_update()
        .set(users::firebase_uid.eq(excluded(users::firebase_uid)))
        .returning(users::id)
        .get_result(conn)
        .await
}

pub async fn find_user_by_id(
    conn: &mut AsyncPgConnection,
    user_id: Uuid,
) -> QueryResult<Option<User>> {
    users::table
        .find(user_id)
        .select(User::as_select())
        .first(conn)
        .await
        .optional()
}

pub async fn update_user_profile(
    conn: &mut AsyncPgConnection,
    user_id: Uuid,
    name: &str,
    email: Option<&str>,
) -> QueryResult<Option<User>> {
    diesel::update(users::table.find(user_id))
        .set((users::name.eq(name), users::email.eq(email)))
        .returning(User::as_returning())
        .get_result(conn)
        .await
        .optional()
}

pub async fn find_user_location(
    conn: &mut AsyncPgConnection,
    user_id: Uuid,
) -> QueryResult<Option<UserLocation>> {
    user_locations::table
        .find(user_id)
        .select(UserLocation::as_select())
        .first(conn)
        .await
        .optional()
}

pub async fn upsert_user_location(
    conn: &mut AsyncPgConnection,
    user_id: Uuid,
    lat: f64,
    lng: f64,
    accuracy_m: Option<f64>,
    address: Option<&str>,
) -> QueryResult<UserLocation> {
    diesel::insert_into(user_locations::table)
        .values(NewUserLocation {
            user_id,
            lat,
            lng,
            accuracy_m,
            address,
        })
        .on_conflict(user_locations::user_id)
        .do_update()
        .set((
            user_locations::lat.eq(excluded(user_locations::lat)),
            user_locations::lng.eq(excluded(user_locations::lng)),
            user_locations::accuracy_m.eq(excluded(user_locations::accuracy_m)),
            user_locations::address.eq(excluded(user_locations::address)),
            user_locations::updated_at.eq(Utc::now()),
        ))
        .returning(UserLocation::as_returning())
        .get_result(conn)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user(name: Option<&str>) -> User {
        User {
            id: Uuid::new_v4(),
            phone: "+919876543210".to_string(),
            firebase_uid: "uid-1".to_string(),
            name: name.map(String::from),
            email: None,
            created_at: Utc::now(),
        }
    }

    fn sample_location(user_id: Uuid) -> UserLocation {
        UserLocation {
            user_id,
            lat: 12.9716,
            lng: 77.5946,
            accuracy_m: Some(12.5),
            address: Some("Bengaluru".to_string()),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_profile_complete_requires_name_and_location() {
        let user = sample_user(Some("Asha"));
        let location = sample_location(user.id);
        assert!(user.is_profile_complete(Some(&location)));
    }

    #[test]
    fn test_profile_incomplete_without_name() {
        let user = sample_user(None);
        let location = sample_location(user.id);
        assert!(!user.is_profile_complete(Some(&location)));
    }

    #[test]
    fn test_profile_incomplete_without_location() {
        let user = sample_user(Some("Asha"));
        assert!(!user.is_profile_complete(None));
    }
}
