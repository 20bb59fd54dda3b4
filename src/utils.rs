// ABOUTME: Utility functions for identifier handling
// ABOUTME: Display sanitizing and path safety checks for layer names

use anyhow::{bail, Result};

/// Sanitize an identifier (table name, schema name, etc.) for display
///
/// Removes control characters and limits length to prevent log injection attacks
/// and ensure readable error messages.
///
/// **Note**: This is for display purposes only. It does not make a name safe
/// to use as a path component; see [`ensure_path_safe_name`].
///
/// # Examples
///
/// ```
/// # use postgis_shp_exporter::utils::sanitize_identifier;
/// assert_eq!(sanitize_identifier("roads"), "roads");
/// assert_eq!(sanitize_identifier("roads\x00"), "roads");
/// assert_eq!(sanitize_identifier("public.\nroads"), "public.roads");
/// ```
pub fn sanitize_identifier(identifier: &str) -> String {
    identifier
        .chars()
        .filter(|c| !c.is_control())
        .take(100)
        .collect()
}

/// Check that a table name can be used as a single directory name
///
/// Layer folders and archives are named after the table, so a name that
/// is empty, `.`/`..`, or contains a path separator would escape the
/// export folder.
///
/// # Errors
///
/// Returns an error naming the offending table.
pub fn ensure_path_safe_name(name: &str) -> Result<()> {
    if name.is_empty() || name == "." || name == ".." {
        bail!(
            "Table name '{}' cannot be used as a folder name",
            sanitize_identifier(name)
        );
    }

    if name.contains('/') || name.contains('\\') || name.contains('\0') {
        bail!(
            "Table name '{}' contains a path separator and cannot be used as a folder name",
            sanitize_identifier(name)
        );
    }

    Ok(())
}
