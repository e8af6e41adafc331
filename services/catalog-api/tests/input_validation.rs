//! Input validation tests
//!
//! Tests for security-critical input validation in catalog-api.

/// Maximum length for device ids (must match handler constant)
const MAX_DEVICE_ID_LENGTH: usize = 128;

/// Validate a device id (mirrors the handler logic for testing)
fn validate_device_id(device_id: &str) -> Result<(), &'static str> {
    if device_id.trim().is_empty() {
        return Err("Device id cannot be empty");
    }
    if device_id.len() > MAX_DEVICE_ID_LENGTH {
        return Err("Device id too long");
    }
    if device_id
        .chars()
        .any(|c| c == ':' || c.is_whitespace() || c.is_control())
    {
        return Err("Invalid characters in device id");
    }
    Ok(())
}

// ============================================================================
// Valid Device IDs
// ============================================================================

#[test]
fn test_valid_simple_device_id() {
    assert!(validate_device_id("tv-livingroom").is_ok());
}

#[test]
fn test_valid_uuid_device_id() {
    assert!(validate_device_id("550e8400-e29b-41d4-a716-446655440000").is_ok());
}

#[test]
fn test_valid_mixed_case_device_id() {
    assert!(validate_device_id("iPhone15Pro").is_ok());
}

#[test]
fn test_valid_dotted_device_id() {
    assert!(validate_device_id("browser.chrome.v120").is_ok());
}

#[test]
fn test_valid_underscored_device_id() {
    assert!(validate_device_id("android_pixel_8").is_ok());
}

#[test]
fn test_valid_max_length_device_id() {
    assert!(validate_device_id(&"x".repeat(MAX_DEVICE_ID_LENGTH)).is_ok());
}

// ============================================================================
// Invalid Device IDs
// ============================================================================

#[test]
fn test_empty_device_id_rejected() {
    assert!(validate_device_id("").is_err());
}

#[test]
fn test_whitespace_only_device_id_rejected() {
    assert!(validate_device_id("   ").is_err());
}

#[test]
fn test_oversized_device_id_rejected() {
    assert!(validate_device_id(&"x".repeat(MAX_DEVICE_ID_LENGTH + 1)).is_err());
}

// Colons are the session key separator, so they can never appear in an id
#[test]
fn test_colon_in_device_id_rejected() {
    assert!(validate_device_id("tv:livingroom").is_err());
}

#[test]
fn test_key_injection_shaped_device_id_rejected() {
    assert!(validate_device_id("x:stream:devices:other-user").is_err());
}

#[test]
fn test_embedded_whitespace_rejected() {
    assert!(validate_device_id("living room tv").is_err());
}

#[test]
fn test_newline_rejected() {
    assert!(validate_device_id("device\nid").is_err());
}

#[test]
fn test_tab_rejected() {
    assert!(validate_device_id("device\tid").is_err());
}

#[test]
fn test_control_character_rejected() {
    assert!(validate_device_id("device\u{0000}id").is_err());
}

#[test]
fn test_unicode_device_id_allowed() {
    // Non-ASCII is fine as long as it is printable and colon-free
    assert!(validate_device_id("télé-salon").is_ok());
}
