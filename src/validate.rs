use regex::Regex;

/// Name validation for `spawn_named`/`spawn_prefix` (spec §4.3: spawn
/// fails if `name` already exists as a child). Grounded on the teacher's
/// `validate_name`/`validate_path` (`src/validate.rs`); collapsed to a
/// single function returning a plain reason string, consumed through
/// `AsysError::InvalidSpawn` rather than the teacher's dedicated
/// `InvalidName`/`InvalidPath` error types, since this crate already has
/// one error enum for every kind spec.md names.
pub fn validate_name(name: &str) -> Result<(), String> {
    let rgx = Regex::new(r"^[a-zA-Z0-9_-]+$").unwrap();
    if rgx.is_match(name) {
        Ok(())
    } else {
        Err(format!(
            "\"{}\" is not a valid actor name: must contain only a-z, A-Z, 0-9, _ or -",
            name
        ))
    }
}
