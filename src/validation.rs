// 🛡️ Request Validation - Identifier + Parameter Whitelist
// Nothing reaches the registry (or the logs) unless it is ASCII alphanumeric.

use crate::error::BadgeError;
use std::fmt;

/// Parameter name the path segment is bound to
pub const IDENTIFIER_PARAMETER: &str = "codice_istat";

/// Municipalities with a well-known code, usable by name from the CLI
pub const KNOWN_MUNICIPALITIES: &[(&str, &str)] = &[
    ("latina", "059011"),
    ("bergamo", "016024"),
    ("sezze", "059028"),
];

// ============================================================================
// ENTITY IDENTIFIER
// ============================================================================

/// Registry-assigned municipality code (codice ISTAT).
///
/// Invariant: non-empty, ASCII, alphanumeric. The only way to build one is
/// through [`EntityIdentifier::parse`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntityIdentifier(String);

impl EntityIdentifier {
    pub fn parse(value: &str) -> Result<Self, BadgeError> {
        if !is_ascii_alphanumeric(value) {
            return Err(BadgeError::Validation(format!(
                "Only alphanumeric ascii characters are allowed for: {}",
                IDENTIFIER_PARAMETER
            )));
        }
        Ok(EntityIdentifier(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn is_ascii_alphanumeric(value: &str) -> bool {
    !value.is_empty() && value.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Resolve a CLI argument: either a code or a well-known municipality name
pub fn known_municipality(name_or_code: &str) -> &str {
    let lower = name_or_code.to_lowercase();
    KNOWN_MUNICIPALITIES
        .iter()
        .find(|(name, _)| *name == lower)
        .map(|(_, code)| *code)
        .unwrap_or(name_or_code)
}

// ============================================================================
// PATH PARSING
// ============================================================================

/// Last non-empty segment of a (percent-decoded) request path.
///
/// Returns `None` for the root, which is answered with the usage map.
pub fn identifier_from_path(path: &str) -> Option<String> {
    let decoded = urlencoding::decode(path)
        .map(|p| p.into_owned())
        .unwrap_or_else(|_| path.to_string());

    let trimmed = decoded.trim_matches(|c| c == '/' || c == ' ');
    if trimmed.is_empty() {
        return None;
    }

    trimmed
        .rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty())
        .map(|segment| segment.to_string())
}

// ============================================================================
// PARAMETER WHITELIST
// ============================================================================

/// Whitelist-and-reject-unknown check over request parameters.
///
/// * at least one of `mandatory_or` must be present
/// * every name must be in `mandatory_or` or `available`
/// * no name may repeat
/// * every value must be ASCII alphanumeric
pub fn validate_parameters(
    args: &[(String, String)],
    mandatory_or: &[&str],
    available: &[&str],
) -> Result<(), BadgeError> {
    if !args
        .iter()
        .any(|(name, _)| mandatory_or.contains(&name.as_str()))
    {
        return Err(BadgeError::Validation(format!(
            "At least one of the following parameter is required: {:?}",
            mandatory_or
        )));
    }

    for (i, (name, value)) in args.iter().enumerate() {
        if !mandatory_or.contains(&name.as_str()) && !available.contains(&name.as_str()) {
            return Err(BadgeError::Validation(format!(
                "Parameter not supported: {}",
                sanitize_name(name)
            )));
        }
        if args[..i].iter().any(|(seen, _)| seen == name) {
            return Err(BadgeError::Validation(format!(
                "Parameter supplied more than once: {}",
                name
            )));
        }
        if !is_ascii_alphanumeric(value) {
            return Err(BadgeError::Validation(format!(
                "Only alphanumeric ascii characters are allowed for: {}",
                name
            )));
        }
    }

    Ok(())
}

/// Unknown names are attacker-controlled; only echo the safe characters
fn sanitize_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect()
}

/// Validate a badge request: path segment first, then the decoded query pairs.
///
/// `None` means the root was requested and no badge is wanted.
pub fn validate_badge_request(
    path: &str,
    query: &[(String, String)],
) -> Result<Option<EntityIdentifier>, BadgeError> {
    let Some(segment) = identifier_from_path(path) else {
        return Ok(None);
    };

    let mut args = vec![(IDENTIFIER_PARAMETER.to_string(), segment)];
    args.extend_from_slice(query);

    validate_parameters(&args, &[IDENTIFIER_PARAMETER], &[])?;

    EntityIdentifier::parse(&args[0].1).map(Some)
}

// ============================================================================
// TESTS
// ============================================================================
