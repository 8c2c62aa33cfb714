//! Room rules for the keys a marker's `data` may carry.

use serde_json::{Map, Value};

use crate::{db::Room, AppError, AppResult};

/// Every mandatory field must be present; unknown keys are refused unless the room allows extras.
pub fn check_marker_data(room: &Room, data: &Map<String, Value>) -> AppResult<()> {
    let missing: Vec<&str> = room
        .mandatory_fields
        .iter()
        .filter(|field| !data.contains_key(field.as_str()))
        .map(String::as_str)
        .collect();
    if !missing.is_empty() {
        return Err(AppError::BadRequest(format!(
            "missing mandatory field(s): {}",
            missing.join(", ")
        )));
    }

    if !room.extra_fields_allowed {
        let extra: Vec<&str> = data
            .keys()
            .filter(|key| !room.predefined_fields.contains(key))
            .map(String::as_str)
            .collect();
        if !extra.is_empty() {
            return Err(AppError::BadRequest(format!(
                "field(s) not allowed in room {}: {}",
                room.id,
                extra.join(", ")
            )));
        }
    }

    Ok(())
}

/// Rejects a room whose mandatory fields are not all predefined.
pub fn check_room_fields(room: &Room) -> AppResult<()> {
    if let Some(field) = room
        .mandatory_fields
        .iter()
        .find(|field| !room.predefined_fields.contains(field))
    {
        return Err(AppError::BadRequest(format!(
            "mandatory field {field} is not among predefinedFields"
        )));
    }
    Ok(())
}
