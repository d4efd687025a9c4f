//! Form field checks.

use crate::{Result, WorkflowError};

/// Requires a non-blank name.
pub fn required(label: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(WorkflowError::validation(format!("{label} is required.")));
    }
    Ok(())
}

/// Requires a finite number greater than zero.
pub fn positive(label: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(WorkflowError::validation(format!(
            "{label} must be a positive number."
        )));
    }
    Ok(())
}

/// Requires a finite number of zero or more.
pub fn non_negative(label: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(WorkflowError::validation(format!(
            "{label} must be zero or more."
        )));
    }
    Ok(())
}

/// Requires a finite number within `min..=max`.
pub fn within(label: &str, value: f64, min: f64, max: f64) -> Result<()> {
    if !value.is_finite() || value < min || value > max {
        return Err(WorkflowError::validation(format!(
            "{label} must be between {min} and {max}."
        )));
    }
    Ok(())
}

/// Requires at least one entry.
pub fn not_empty<T>(label: &str, values: &[T]) -> Result<()> {
    if values.is_empty() {
        return Err(WorkflowError::validation(format!(
            "At least one {label} is required."
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_field() {
        assert_eq!(
            required("Crop", "  ").unwrap_err().to_string(),
            "Invalid form: Crop is required."
        );
        assert_eq!(
            positive("Trays", 0.0).unwrap_err().to_string(),
            "Invalid form: Trays must be a positive number."
        );
        assert_eq!(
            within("Area", 120.0, 0.0, 100.0).unwrap_err().to_string(),
            "Invalid form: Area must be between 0 and 100."
        );
    }

    #[test]
    fn rejects_non_finite_numbers() {
        assert!(positive("Trays", f64::NAN).is_err());
        assert!(non_negative("Depth", f64::INFINITY).is_err());
        assert!(non_negative("Depth", 0.0).is_ok());
    }
}
