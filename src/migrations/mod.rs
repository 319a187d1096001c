pub mod diesel;

pub use diesel::run_migrations;
