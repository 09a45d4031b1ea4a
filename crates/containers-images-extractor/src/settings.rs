//! `.env` settings files

use std::collections::BTreeMap;

/// File name of settings files picked up during discovery
pub const ENV_FILE_NAME: &str = ".env";

/// Parses a `.env` file into a key/value map
///
/// Follows dotenv syntax: comments (whole-line and after a value), `export`
/// prefixes and quoting are handled by the `dotenv` parser. Malformed lines
/// are skipped with a warning. Later keys win.
pub fn parse_env_file(content: &str) -> BTreeMap<String, String> {
    let mut values = BTreeMap::new();

    for item in dotenv::from_read_iter(content.as_bytes()) {
        match item {
            Ok((key, value)) => {
                values.insert(key, value);
            }
            Err(e) => tracing::warn!(error = %e, "Skipping malformed .env line"),
        }
    }

    values
}
