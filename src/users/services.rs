use thiserror::Error;

use crate::users::{dto::UserRequest, repo_types::UserDraft};

/// Every problem found in a candidate user, in field order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", .problems.join("; "))]
pub struct ValidationError {
    problems: Vec<String>,
}

/// Checks `name` and `email`. Whitespace-only values count as empty.
pub fn validate(name: &str, email: &str) -> Result<(), ValidationError> {
    let mut problems = Vec::new();

    if name.trim().is_empty() {
        problems.push("name is required".to_string());
    }

    if email.trim().is_empty() {
        problems.push("email is required".to_string());
    } else if !email.contains('@') {
        problems.push("email must contain '@'".to_string());
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(ValidationError { problems })
    }
}

/// Validates a request body and turns it into a store draft.
pub fn into_draft(req: UserRequest) -> Result<UserDraft, ValidationError> {
    validate(&req.name, &req.email)?;
    Ok(UserDraft {
        name: req.name,
        email: req.email,
    })
}
