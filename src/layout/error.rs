use serde::Serialize;
use thiserror::Error;

use crate::validate::ValidationError;

/// Why a layout call returned the input nodes unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
pub enum LayoutError {
    #[error("Layout validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
    #[error("No valid nodes to layout")]
    NoNodes,
    #[error("No root node found for family tree")]
    NoRoot,
    #[error("Layout produced invalid node positions")]
    InvalidPositions,
    #[error("Layout calculation failed: {0}")]
    Algorithm(String),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Best effort text for a caught panic payload.
pub(super) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "Unknown error".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_match_result_contract() {
        let err = LayoutError::Validation(vec![
            ValidationError::EmptyGraph,
            ValidationError::DuplicateIds(vec!["a".into(), "b".into()]),
        ]);
        assert_eq!(
            err.to_string(),
            "Layout validation failed: No nodes provided for layout, Duplicate node IDs found: a, b"
        );
        assert_eq!(LayoutError::NoRoot.to_string(), "No root node found for family tree");
    }

    #[test]
    fn panic_payloads_become_text() {
        let caught = std::panic::catch_unwind(|| panic!("boom {}", 7)).unwrap_err();
        assert_eq!(panic_message(caught.as_ref()), "boom 7");
        let caught = std::panic::catch_unwind(|| std::panic::panic_any(5_u8)).unwrap_err();
        assert_eq!(panic_message(caught.as_ref()), "Unknown error");
    }
}
