//! Locating a JSON object inside a raw reply buffer.
//!
//! Trapper replies place a JSON status object behind protocol framing bytes
//! that are not themselves valid JSON, so the object has to be dug out of the
//! surrounding bytes. A greedy pattern match over `{...}` mis-extracts as soon
//! as the buffer holds nested braces or more than one object; this scanner
//! tracks brace depth and skips braces inside quoted strings instead.

/// Extract the first complete `{...}` JSON object from `buf`.
///
/// Bytes before the object (framing, garbage) and after it are ignored.
/// Returns `None` when no object has completed yet, which callers use to keep
/// reading: a later call on the grown buffer picks up where the text left off.
///
/// The returned slice is syntactically balanced but not validated as JSON;
/// callers parse it and treat a parse failure as a malformed reply.
pub fn extract_json_object(buf: &[u8]) -> Option<&[u8]> {
    let mut depth: usize = 0;
    let mut start = 0;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &byte) in buf.iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if byte == b'\\' {
                escaped = true;
            } else if byte == b'"' {
                in_string = false;
            }
            continue;
        }

        match byte {
            // Quotes only matter once an object is open; raw framing bytes may
            // contain 0x22 without starting a string.
            b'"' if depth > 0 => in_string = true,
            b'{' => {
                if depth == 0 {
                    start = i;
                }
                depth += 1;
            }
            b'}' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    return Some(&buf[start..=i]);
                }
            }
            _ => {}
        }
    }

    None
}
