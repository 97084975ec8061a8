// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Conversion between JSON and script values

use std::rc::Rc;

use modrun_script::Value;
use serde_json::{Map, Number};

/// Convert a JSON value into a script value
pub fn from_json(json: &serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Boolean(*b),
        serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
        serde_json::Value::String(s) => Value::from(s.as_str()),
        serde_json::Value::Array(items) => Value::array(items.iter().map(from_json).collect()),
        serde_json::Value::Object(map) => {
            Value::object_from(map.iter().map(|(k, v)| (k.as_str(), from_json(v))))
        }
    }
}

/// Convert a script value into JSON
///
/// Follows `JSON.stringify` where it matters for results: functions and
/// `undefined` properties are skipped, non-finite numbers become `null`,
/// and a reference cycle is cut with `null`.
pub fn to_json(value: &Value) -> serde_json::Value {
    let mut seen = Vec::new();
    convert(value, &mut seen).unwrap_or(serde_json::Value::Null)
}

/// Identity of a reference value, for cycle detection
fn identity(value: &Value) -> Option<*const ()> {
    match value {
        Value::Object(object) => Some(Rc::as_ptr(object) as *const ()),
        Value::Array(items) => Some(Rc::as_ptr(items) as *const ()),
        _ => None,
    }
}

fn convert(value: &Value, seen: &mut Vec<*const ()>) -> Option<serde_json::Value> {
    if identity(value).is_some_and(|p| seen.contains(&p)) {
        return Some(serde_json::Value::Null);
    }
    let json = match value {
        Value::Undefined | Value::Function(_) => return None,
        Value::Null => serde_json::Value::Null,
        Value::Boolean(b) => serde_json::Value::Bool(*b),
        Value::Number(n) => number(*n),
        Value::String(s) => serde_json::Value::String(s.to_string()),
        Value::Array(items) => {
            seen.extend(identity(value));
            let items = items.borrow().clone();
            let converted = items
                .iter()
                .map(|item| convert(item, seen).unwrap_or(serde_json::Value::Null))
                .collect();
            seen.pop();
            serde_json::Value::Array(converted)
        }
        Value::Object(object) => {
            seen.extend(identity(value));
            let entries: Vec<(String, Value)> = object
                .borrow()
                .entries()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect();
            let mut map = Map::new();
            for (key, item) in entries {
                if let Some(json) = convert(&item, seen) {
                    map.insert(key, json);
                }
            }
            seen.pop();
            serde_json::Value::Object(map)
        }
    };
    Some(json)
}

fn number(n: f64) -> serde_json::Value {
    if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
        serde_json::Value::Number(Number::from(n as i64))
    } else {
        Number::from_f64(n).map_or(serde_json::Value::Null, serde_json::Value::Number)
    }
}
