pub mod restaurant;
pub mod user;

pub use restaurant::{
    find_restaurant_by_id, list_restaurant_applications, review_restaurant_application,
    submit_restaurant_application, update_restaurant_location, update_restaurant_profile,
    upsert_restaurant_by_phone, Restaurant, RestaurantStatus,
};
pub use user::{
    find_user_by_id, find_user_location, update_user_profile, upsert_user_by_phone,
    upsert_user_location, User, UserLocation,
};
