//! Message validation rules.

use broker_core::error::AppError;

/// Validates a raw inbound frame before parsing.
pub fn validate_inbound(raw: &str, max_size: usize) -> Result<(), AppError> {
    if raw.len() > max_size {
        return Err(AppError::protocol(format!(
            "Message exceeds maximum size of {max_size} bytes"
        )));
    }

    if raw.trim().is_empty() {
        return Err(AppError::protocol("Empty message"));
    }

    Ok(())
}
