// Session identity wire shapes and the per-role cookie mapping

use nearbite_api::middleware::{session_cookie_name, Role, LEGACY_SESSION_COOKIE_NAME};
use nearbite_api::SessionPayload;

#[test]
fn session_payload_matches_stored_json_shape() {
    let payload = SessionPayload {
        user_id: "0a1b2c3d-0000-4000-8000-000000000001".to_string(),
        role: Role::Restaurant,
    };

    let json = serde_json::to_value(&payload).unwrap();
    assert_eq!(json["userId"], "0a1b2c3d-0000-4000-8000-000000000001");
    assert_eq!(json["role"], "restaurant");
}

#[test]
fn admin_identity_is_the_literal_admin_string() {
    let payload: SessionPayload =
        serde_json::from_str(r#"{"userId":"admin","role":"admin"}"#).unwrap();
    assert_eq!(payload.user_id, "admin");
    assert_eq!(payload.role, Role::Admin);
}

#[test]
fn unknown_roles_fail_to_decode() {
    let result: Result<SessionPayload, _> =
        serde_json::from_str(r#"{"userId":"x","role":"moderator"}"#);
    assert!(result.is_err());
}

#[test]
fn each_role_has_a_distinct_cookie() {
    let names = [
        session_cookie_name(Role::User),
        session_cookie_name(Role::Restaurant),
        session_cookie_name(Role::Admin),
    ];

    for name in &names {
        assert!(name.starts_with("nearbite_"));
        assert_ne!(*name, LEGACY_SESSION_COOKIE_NAME);
    }
    assert_ne!(names[0], names[1]);
    assert_ne!(names[1], names[2]);
}
