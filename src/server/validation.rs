use crate::server::response::ApiError;

const MAX_SPACE_NAME_LEN: usize = 64;
const MAX_PROJECT_NAME_LEN: usize = 100;
const MAX_APPLY_NAME_LEN: usize = 100;
const MAX_DESCRIPTION_LEN: usize = 2000;

fn validate_name(name: &str, entity: &str, max_len: usize) -> Result<(), String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(format!("{entity} name can not be empty"));
    }
    if trimmed.chars().count() > max_len {
        return Err(format!("{entity} name cannot exceed {max_len} characters"));
    }
    if trimmed.chars().any(char::is_control) {
        return Err(format!("{entity} name cannot contain control characters"));
    }
    Ok(())
}

pub fn validate_space_name(name: &str) -> Result<(), ApiError> {
    validate_name(name, "space", MAX_SPACE_NAME_LEN).map_err(ApiError::bad_request)
}

pub fn validate_project_name(name: &str) -> Result<(), ApiError> {
    validate_name(name, "project", MAX_PROJECT_NAME_LEN).map_err(ApiError::bad_request)
}

pub fn validate_apply_name(name: &str) -> Result<(), ApiError> {
    validate_name(name, "apply", MAX_APPLY_NAME_LEN).map_err(ApiError::bad_request)
}

pub fn validate_description(description: &str) -> Result<(), ApiError> {
    if description.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(ApiError::bad_request(format!(
            "description cannot exceed {MAX_DESCRIPTION_LEN} characters"
        )));
    }
    Ok(())
}

pub fn require_id(id: i64) -> Result<i64, ApiError> {
    if id <= 0 {
        return Err(ApiError::bad_request("id can not be empty"));
    }
    Ok(id)
}
