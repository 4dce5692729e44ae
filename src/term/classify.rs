// SPDX-License-Identifier: MIT

//! Byte classifier (C2): predicates and transforms applied to raw bytes
//! arriving from the WebSocket before they reach the line editor or are
//! forwarded to the container's stdin.

const UP_ARROW: [u8; 3] = [0x1b, b'[', b'A'];
const DOWN_ARROW: [u8; 3] = [0x1b, b'[', b'B'];
const ASCII_BEL: u8 = 7;
const ASCII_CR: u8 = 13;
const ASCII_HT: u8 = 9;

/// Length of the longest valid-UTF-8 prefix of `data`, scanning backward
/// from the end for the start of the last (possibly incomplete) rune.
///
/// If that trailing rune is complete and the whole slice is valid UTF-8,
/// the full length is returned. Otherwise the length up to (but excluding)
/// the incomplete rune's start byte is returned, so the caller can buffer
/// the remainder and retry once more bytes arrive. Returns 0 if no rune
/// start byte is found at all (the whole slice is continuation bytes).
pub fn valid_utf8_prefix_len(data: &[u8]) -> usize {
    for i in (0..data.len()).rev() {
        if is_utf8_rune_start(data[i]) {
            if std::str::from_utf8(&data[i..]).is_ok() {
                return data.len();
            }
            return i;
        }
    }
    0
}

fn is_utf8_rune_start(b: u8) -> bool {
    // Continuation bytes have the form 10xxxxxx; everything else starts a rune.
    b & 0b1100_0000 != 0b1000_0000
}

/// Parse a `"<width> <height>"` resize payload. Returns `(-1, -1)` on any
/// malformed input, matching the original's permissive-but-total parser.
pub fn get_width_and_height(data: &[u8]) -> (i32, i32) {
    let Ok(text) = std::str::from_utf8(data) else {
        return (-1, -1);
    };
    let parts: Vec<&str> = text.split(' ').collect();
    if parts.len() != 2 {
        return (-1, -1);
    }
    let (Ok(width), Ok(height)) = (parts[0].parse::<i32>(), parts[1].parse::<i32>()) else {
        return (-1, -1);
    };
    (width, height)
}

/// A lone BEL byte (0x07): the terminal's "no match" beep.
pub fn is_bell(bs: &[u8]) -> bool {
    bs.len() == 1 && bs[0] == ASCII_BEL
}

/// A lone CR byte (0x0d).
pub fn is_cr(input: &[u8]) -> bool {
    input.len() == 1 && input[0] == ASCII_CR
}

/// A lone HT/Tab byte (0x09).
pub fn is_tab(input: &[u8]) -> bool {
    input.len() == 1 && input[0] == ASCII_HT
}

/// `src` ends with the up-arrow escape sequence `ESC [ A`.
pub fn has_up_arrow_suffix(input: &[u8]) -> bool {
    has_suffix(input, &UP_ARROW)
}

/// `src` ends with the down-arrow escape sequence `ESC [ B`.
pub fn has_down_arrow_suffix(input: &[u8]) -> bool {
    has_suffix(input, &DOWN_ARROW)
}

fn has_suffix(input: &[u8], suffix: &[u8; 3]) -> bool {
    if input.len() < 3 {
        return false;
    }
    input.ends_with(suffix)
}

/// Sanitize a tab-completion echo: a bell is treated as "nothing to show",
/// and any echo containing an interior space (i.e. more than one completion
/// candidate) is suppressed rather than fed back into the client's line.
pub fn escape_tab_completion(src: &[u8]) -> Vec<u8> {
    if is_bell(src) {
        return Vec::new();
    }

    for (i, &b) in src.iter().enumerate() {
        if b == b' ' && i != src.len() - 1 {
            return Vec::new();
        }
    }

    src.to_vec()
}

/// Sanitize a history-recall echo: a bell (no history entry) becomes empty.
pub fn escape_history_command(input: &[u8]) -> Vec<u8> {
    if is_bell(input) {
        return Vec::new();
    }
    input.to_vec()
}

#[cfg(test)]
#[path = "classify_tests.rs"]
mod tests;
