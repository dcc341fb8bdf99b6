// Copyright 2026 the Veneer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Sender identity formatting for avatars.
//!
//! Pure, stateless derivation of the initials and background color shown in
//! an injected avatar circle. Addresses are reduced to their local part
//! before splitting; the color hash runs over UTF-16 code units with
//! wrapping 32-bit arithmetic so the same sender keeps the same color the
//! host's previous scripting assigned.

use alloc::string::String;

/// Fixed avatar background palette; a sender's name hashes to one entry.
pub const AVATAR_PALETTE: [&str; 12] = [
    "#0a4da3", "#2ec27e", "#e67e22", "#9b59b6", "#1abc9c", "#e74c3c", "#3498db", "#f39c12",
    "#16a085", "#8e44ad", "#27ae60", "#2980b9",
];

/// Derives 1–2 character initials from a display name or address.
///
/// The domain is stripped from addresses; the remainder splits on
/// whitespace, `.`, `_`, and `-`. Two or more parts yield the first
/// character of the first and last parts; a single bare token yields its
/// first two characters. Everything is uppercased. Empty or unknown names
/// yield `"?"`.
#[must_use]
pub fn initials(name: &str) -> String {
    let name = name.trim();
    if name.is_empty() || name == "?" {
        return String::from("?");
    }
    let name = match name.split_once('@') {
        Some((local, _domain)) => local,
        None => name,
    };
    let mut parts = name
        .split(|c: char| c.is_whitespace() || matches!(c, '.' | '_' | '-'))
        .filter(|part| !part.is_empty());
    let first = parts.next();
    let last = parts.next_back();
    match (first, last) {
        (Some(first), Some(last)) => {
            let mut out = String::new();
            out.extend(first.chars().take(1).flat_map(char::to_uppercase));
            out.extend(last.chars().take(1).flat_map(char::to_uppercase));
            out
        }
        // One part (or none, for separator-only input): take the leading
        // characters of the stripped name as-is.
        _ => name.chars().take(2).flat_map(char::to_uppercase).collect(),
    }
}

/// Picks a stable palette color for a name.
#[must_use]
pub fn color(name: &str) -> &'static str {
    let mut hash: i32 = 0;
    for unit in name.encode_utf16() {
        hash = i32::from(unit).wrapping_add(hash.wrapping_shl(5).wrapping_sub(hash));
    }
    AVATAR_PALETTE[hash.unsigned_abs() as usize % AVATAR_PALETTE.len()]
}
