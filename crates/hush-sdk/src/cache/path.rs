// Copyright 2026 abhirupbanerjee
// Licensed under the Apache License, Version 2.0

//! The subset of RedisJSON paths the forum uses: `$` (or `.`) root,
//! `.field` members and `[index]` array positions (negative from the end).

use anyhow::{bail, Result};
use serde_json::Value;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Segment {
    Field(String),
    Index(i64),
}

pub fn parse(path: &str) -> Result<Vec<Segment>> {
    let rest = path
        .strip_prefix('$')
        .or_else(|| path.starts_with('.').then_some(path))
        .ok_or_else(|| anyhow::anyhow!("path must start with '$' or '.': {path}"))?;

    let mut segments = Vec::new();
    let mut chars = rest.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '.' => {
                let mut name = String::new();
                while let Some(&n) = chars.peek() {
                    if n == '.' || n == '[' {
                        break;
                    }
                    name.push(n);
                    chars.next();
                }
                if name.is_empty() {
                    // lone "." is the legacy root
                    if segments.is_empty() && chars.peek().is_none() {
                        break;
                    }
                    bail!("empty field name in {path}");
                }
                segments.push(Segment::Field(name));
            }
            '[' => {
                let mut digits = String::new();
                loop {
                    match chars.next() {
                        Some(']') => break,
                        Some(d) => digits.push(d),
                        None => bail!("unterminated index in {path}"),
                    }
                }
                let idx: i64 = digits
                    .trim()
                    .parse()
                    .map_err(|_| anyhow::anyhow!("bad index {digits:?} in {path}"))?;
                segments.push(Segment::Index(idx));
            }
            other => bail!("unexpected {other:?} in {path}"),
        }
    }
    Ok(segments)
}

/// Resolve a possibly negative index against `len`.
pub fn normalize_index(idx: i64, len: usize) -> Option<usize> {
    let resolved = if idx < 0 { len as i64 + idx } else { idx };
    (0..len as i64).contains(&resolved).then_some(resolved as usize)
}

pub fn resolve<'a>(mut value: &'a Value, segments: &[Segment]) -> Option<&'a Value> {
    for seg in segments {
        value = match seg {
            Segment::Field(name) => value.as_object()?.get(name)?,
            Segment::Index(i) => {
                let arr = value.as_array()?;
                &arr[normalize_index(*i, arr.len())?]
            }
        };
    }
    Some(value)
}

pub fn resolve_mut<'a>(mut value: &'a mut Value, segments: &[Segment]) -> Option<&'a mut Value> {
    for seg in segments {
        value = match seg {
            Segment::Field(name) => value.as_object_mut()?.get_mut(name)?,
            Segment::Index(i) => {
                let arr = value.as_array_mut()?;
                let idx = normalize_index(*i, arr.len())?;
                &mut arr[idx]
            }
        };
    }
    Some(value)
}
