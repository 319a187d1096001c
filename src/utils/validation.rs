// Validation helpers shared by request DTOs

use validator::{ValidationErrors, ValidationErrorsKind};

use super::api_error::{ApiError, ValidationIssue};

/// Flatten `validator` errors into the field-level issue list returned to
/// the client.
pub fn collect_validation_issues(errors: &ValidationErrors) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    collect_into(errors, "", &mut issues);
    issues
}

fn collect_into(errors: &ValidationErrors, prefix: &str, issues: &mut Vec<ValidationIssue>) {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{}.{}", prefix, field)
        };

        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                for error in field_errors {
                    let message = error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("invalid value for {}", path));
                    issues.push(ValidationIssue {
                        path: path.clone(),
                        message,
                    });
                }
            },
            ValidationErrorsKind::Struct(nested) => collect_into(nested, &path, issues),
            ValidationErrorsKind::List(map) => {
                for (index, nested) in map {
                    collect_into(nested, &format!("{}[{}]", path, index), issues);
                }
            },
        }
    }
}

/// Map a failed validation straight to the 400 response shape
pub fn invalid_payload(errors: &ValidationErrors) -> ApiError {
    ApiError::validation("Invalid payload", collect_validation_issues(errors))
}

/// Trim an optional string field, dropping it entirely when blank
pub fn trim_optional_field(field: Option<&String>) -> Option<String> {
    field.and_then(|s| {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}
