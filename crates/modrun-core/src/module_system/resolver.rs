// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Module identifier resolution

/// Returns true for identifiers resolved against the requesting module.
pub fn is_relative(id: &str) -> bool {
    id.starts_with("./") || id.starts_with("../")
}

/// Resolves `requested` against `base`, the canonical id of the requesting
/// module.
///
/// Top-level ids are returned unchanged. Relative ids walk the segments of
/// `base` with a cursor that starts on the last segment:
///
/// - `.` removes the segment under the cursor and moves the cursor left
/// - `..` moves the cursor left, then removes up to two segments there
/// - anything else overwrites an empty segment under the cursor, or is
///   appended and becomes the new cursor position
///
/// A trailing slash on `base` matters: `/usr/share/` is a directory while
/// `/usr/share` names a file inside `/usr`.
pub fn resolve(requested: &str, base: &str) -> String {
    if !is_relative(requested) {
        return requested.to_string();
    }

    let mut segments: Vec<&str> = base.split('/').collect();
    let mut cursor = segments.len().saturating_sub(1);

    for segment in requested.split('/') {
        match segment {
            "." => {
                if cursor < segments.len() {
                    segments.remove(cursor);
                }
                cursor = cursor.saturating_sub(1);
            }
            ".." => {
                cursor = cursor.saturating_sub(1);
                for _ in 0..2 {
                    if cursor < segments.len() {
                        segments.remove(cursor);
                    }
                }
            }
            name => {
                if segments.get(cursor).is_some_and(|s| s.is_empty()) {
                    segments[cursor] = name;
                } else {
                    segments.push(name);
                    cursor = segments.len() - 1;
                }
            }
        }
    }

    segments.join("/")
}
