pub mod api_error;
pub mod extract;
pub mod validation;

pub use api_error::{ApiError, ValidationIssue};
pub use extract::{Json, Query};
pub use validation::{collect_validation_issues, trim_optional_field};
