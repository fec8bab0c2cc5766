// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nbtrail-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Nbtrail and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use base64::Engine as _;
use serde_json::Value;

use crate::error::Result;
use crate::history::History;
use crate::model::Nodey;

/// Turns one version into displayable text. Hosts with richer displays plug in their own.
pub trait Renderer {
    fn render(&self, history: &History, node: &Nodey) -> Result<String>;
}

/// Plain-text rendering: code is sliced from its cell, markdown is left as written and
/// outputs show their `text/plain` (or a size tag for binary payloads).
#[derive(Debug, Default, Clone, Copy)]
pub struct TextRenderer;

impl Renderer for TextRenderer {
    fn render(&self, history: &History, node: &Nodey) -> Result<String> {
        history.text_of(&node.name())
    }
}

const TEXT_MIME_TYPES: &[&str] = &["text/plain", "text/markdown", "text/html", "application/json"];

/// Best-effort text of an nbformat output payload.
pub fn output_text(raw: &Value) -> String {
    match raw.get("output_type").and_then(Value::as_str) {
        Some("stream") => raw.get("text").map(multiline).unwrap_or_default(),
        Some("error") => {
            let field = |key: &str| raw.get(key).and_then(Value::as_str).unwrap_or_default();
            format!("{}: {}", field("ename"), field("evalue"))
        }
        _ => match raw.get("data").and_then(Value::as_object) {
            Some(data) => {
                if let Some(text) = TEXT_MIME_TYPES.iter().find_map(|mime| data.get(*mime)) {
                    return multiline(text);
                }
                data.iter()
                    .next()
                    .map(|(mime, payload)| binary_tag(mime, payload))
                    .unwrap_or_default()
            }
            None => match raw.get("text") {
                Some(text) => multiline(text),
                None => raw.to_string(),
            },
        },
    }
}

// nbformat stores multiline strings either whole or as a list of lines.
fn multiline(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Array(lines) => lines.iter().filter_map(Value::as_str).collect(),
        other => other.to_string(),
    }
}

fn binary_tag(mime: &str, payload: &Value) -> String {
    let encoded = multiline(payload);
    let compact = encoded.split_whitespace().collect::<String>();
    match base64::engine::general_purpose::STANDARD.decode(compact.as_bytes()) {
        Ok(bytes) => format!("[{mime} {}]", format_size(bytes.len())),
        Err(_) => format!("[{mime}]"),
    }
}

pub(crate) fn format_size(bytes: usize) -> String {
    const KB: f64 = 1024.0;
    let size = bytes as f64;
    if size < KB {
        format!("{bytes} B")
    } else if size < KB * KB {
        format!("{:.1} KB", size / KB)
    } else {
        format!("{:.1} MB", size / (KB * KB))
    }
}

pub(crate) fn truncate_with_ellipsis(text: &str, max_len: usize) -> String {
    if max_len == 0 {
        return String::new();
    }
    if text.chars().count() <= max_len {
        return text.to_owned();
    }
    let mut out: String = text.chars().take(max_len - 1).collect();
    out.push('…');
    out
}
