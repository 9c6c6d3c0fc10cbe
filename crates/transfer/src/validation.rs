use std::path::{Component, Path};

use crate::TransferError;

/// Validates a client supplied file name before it becomes part of a
/// fragment path.
///
/// Rejects:
/// - Empty names
/// - Path separators (`/` and `\`)
/// - `.` and `..`
/// - Control characters
pub fn validate_file_name(name: &str) -> Result<(), TransferError> {
    if name.trim().is_empty() {
        return Err(TransferError::InvalidFileName("empty file name".into()));
    }

    if name.contains(['/', '\\']) {
        return Err(TransferError::InvalidFileName(format!(
            "path separators not allowed: {name}"
        )));
    }

    if name.chars().any(char::is_control) {
        return Err(TransferError::InvalidFileName(format!(
            "control characters not allowed: {}",
            name.escape_default()
        )));
    }

    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        (Some(Component::ParentDir), _) | (Some(Component::CurDir), _) => Err(
            TransferError::InvalidFileName(format!("relative path not allowed: {name}")),
        ),
        _ => Err(TransferError::InvalidFileName(format!(
            "not a plain file name: {name}"
        ))),
    }
}
