use std::time::Duration;

/// Parse a boolean flag from an (optional) environment value. Unrecognised values fall back to `default`.
pub fn parse_boolean_flag(value: Option<String>, default: bool) -> bool {
    let Some(value) = value else {
        return default;
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}

/// Parse a whole number of seconds into a [`Duration`]. Zero is rejected, since every interval and timeout in the
/// system must be strictly positive.
pub fn parse_duration_secs(value: &str) -> Result<Duration, String> {
    let secs = value.trim().parse::<u64>().map_err(|e| format!("'{value}' is not a number of seconds. {e}"))?;
    if secs == 0 {
        return Err("a duration of zero seconds is not allowed".to_string());
    }
    Ok(Duration::from_secs(secs))
}
