//! Common validation rules shared across request payloads.

use validator::ValidationError;

/// Longest device tag accepted from clients.
pub const MAX_DEVICE_ID_LEN: usize = 255;

/// Validates a client-supplied device tag.
///
/// Requirements:
/// - At most 255 characters
/// - No control characters
pub fn validate_device_id(device_id: &str) -> Result<(), ValidationError> {
    if device_id.chars().count() > MAX_DEVICE_ID_LEN {
        return Err(ValidationError::new("device_id_too_long"));
    }

    if device_id.chars().any(char::is_control) {
        return Err(ValidationError::new("device_id_invalid_characters"));
    }

    Ok(())
}
