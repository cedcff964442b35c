//! Line-level decoding of sensor output

/// Parse one serial line as a signed integer reading.
///
/// Surrounding whitespace (including `\r`) is ignored. Anything else that
/// is not a plain integer yields `None`.
pub fn parse_sample_line(line: &str) -> Option<i64> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse().ok()
}

/// Decode raw bytes from the link, replacing invalid UTF-8
pub fn decode_line(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}
