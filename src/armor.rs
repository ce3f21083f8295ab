//! PEM-style armor: `-----BEGIN REOP <LABEL>-----` / `-----END REOP <LABEL>-----`
//! blocks carrying one `ident:` line and a base64 body wrapped at 76
//! columns.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::InvalidFormat;

/// Maximum length of an identifier, in bytes, not counting its terminator.
pub const IDENT_MAX_LEN: usize = 63;

const WRAP_COLS: usize = 76;

/// Wraps base64 text at 76 columns, one newline-terminated line at a time.
#[must_use]
pub fn wrap_base64(data: &[u8]) -> String {
    let encoded = STANDARD.encode(data);
    let mut out = String::with_capacity(encoded.len() + encoded.len() / WRAP_COLS + 1);
    for chunk in encoded.as_bytes().chunks(WRAP_COLS) {
        out.push_str(std::str::from_utf8(chunk).expect("base64 output is ASCII"));
        out.push('\n');
    }
    out
}

/// Encodes a single armor block: `-----BEGIN REOP <label>-----\nident:<ident>\n<body, wrapped>\n-----END REOP <label>-----\n`.
#[must_use]
pub fn encode_block(label: &str, ident: &str, body: &[u8]) -> String {
    let mut out = String::new();
    out.push_str("-----BEGIN REOP ");
    out.push_str(label);
    out.push_str("-----\n");
    out.push_str("ident:");
    out.push_str(ident);
    out.push('\n');
    out.push_str(&wrap_base64(body));
    out.push_str("-----END REOP ");
    out.push_str(label);
    out.push_str("-----\n");
    out
}

/// Decodes a single armor block, returning `(ident, body)`. Fails if the
/// begin marker doesn't match `expected_label`, the `ident:` line is
/// missing, or the end marker is absent.
pub fn decode_block(text: &str, expected_label: &str) -> Result<(String, Vec<u8>), InvalidFormat> {
    let begin_marker = format!("-----BEGIN REOP {expected_label}-----");
    let end_marker = format!("-----END REOP {expected_label}-----");

    let mut lines = text.lines();
    let begin_line = lines.next().ok_or(InvalidFormat)?;
    if begin_line.trim_end() != begin_marker {
        return Err(InvalidFormat);
    }

    let ident_line = lines.next().ok_or(InvalidFormat)?;
    let ident = parse_ident_line(ident_line)?;

    let mut body_b64 = String::new();
    let mut found_end = false;
    for line in lines {
        if line.trim_end() == end_marker {
            found_end = true;
            break;
        }
        body_b64.push_str(line.trim_end());
    }
    if !found_end {
        return Err(InvalidFormat);
    }

    let body = STANDARD.decode(body_b64.as_bytes()).map_err(|_| InvalidFormat)?;
    Ok((ident, body))
}

/// Parses an `ident:<value>` line. The identifier stops at whitespace and
/// must be at most [`IDENT_MAX_LEN`] printable bytes.
pub fn parse_ident_line(line: &str) -> Result<String, InvalidFormat> {
    let rest = line.strip_prefix("ident:").ok_or(InvalidFormat)?;
    let ident = rest.split_whitespace().next().unwrap_or("");
    if ident.len() > IDENT_MAX_LEN || !ident.bytes().all(|b| b.is_ascii_graphic()) {
        return Err(InvalidFormat);
    }
    Ok(ident.to_string())
}
