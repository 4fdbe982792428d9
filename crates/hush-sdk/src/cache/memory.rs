// Copyright 2026 abhirupbanerjee
// Licensed under the Apache License, Version 2.0

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{anyhow, bail, Result};
use serde_json::Value;
use tokio::sync::RwLock;

use super::path::{self, Segment};
use super::JsonStore;

/// In-process JSON store with the same path semantics as RedisJSON.
/// Clones share the same map.
#[derive(Clone, Default)]
pub struct MemoryStore {
    docs: Arc<RwLock<HashMap<String, Value>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.docs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.docs.read().await.is_empty()
    }

    pub async fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.docs.read().await.keys().cloned().collect();
        keys.sort();
        keys
    }
}

fn split_last(segments: &[Segment]) -> Option<(&[Segment], &Segment)> {
    segments.split_last().map(|(last, parent)| (parent, last))
}

fn array_at<'a>(doc: &'a mut Value, segments: &[Segment], path: &str) -> Result<&'a mut Vec<Value>> {
    path::resolve_mut(doc, segments)
        .ok_or_else(|| anyhow!("path {path} does not exist"))?
        .as_array_mut()
        .ok_or_else(|| anyhow!("path {path} is not an array"))
}

impl JsonStore for MemoryStore {
    async fn json_get(&self, key: &str, path: &str) -> Result<Option<Value>> {
        let segments = path::parse(path)?;
        let docs = self.docs.read().await;
        Ok(docs
            .get(key)
            .and_then(|doc| path::resolve(doc, &segments))
            .cloned())
    }

    async fn json_mget(&self, keys: &[String], path: &str) -> Result<Vec<Option<Value>>> {
        let segments = path::parse(path)?;
        let docs = self.docs.read().await;
        Ok(keys
            .iter()
            .map(|k| docs.get(k).and_then(|doc| path::resolve(doc, &segments)).cloned())
            .collect())
    }

    async fn json_set(&self, key: &str, path: &str, value: &Value) -> Result<()> {
        let segments = path::parse(path)?;
        let mut docs = self.docs.write().await;
        let Some((parent, last)) = split_last(&segments) else {
            docs.insert(key.to_string(), value.clone());
            return Ok(());
        };
        let doc = docs
            .get_mut(key)
            .ok_or_else(|| anyhow!("new objects must be created at the root ({key})"))?;
        let target = path::resolve_mut(doc, parent)
            .ok_or_else(|| anyhow!("parent of {path} does not exist"))?;
        match last {
            Segment::Field(name) => {
                target
                    .as_object_mut()
                    .ok_or_else(|| anyhow!("parent of {path} is not an object"))?
                    .insert(name.clone(), value.clone());
            }
            Segment::Index(i) => {
                let arr = target
                    .as_array_mut()
                    .ok_or_else(|| anyhow!("parent of {path} is not an array"))?;
                let idx = path::normalize_index(*i, arr.len())
                    .ok_or_else(|| anyhow!("index out of range in {path}"))?;
                arr[idx] = value.clone();
            }
        }
        Ok(())
    }

    async fn json_del(&self, key: &str, path: &str) -> Result<()> {
        let segments = path::parse(path)?;
        let mut docs = self.docs.write().await;
        let Some((parent, last)) = split_last(&segments) else {
            docs.remove(key);
            return Ok(());
        };
        let Some(target) = docs.get_mut(key).and_then(|doc| path::resolve_mut(doc, parent)) else {
            return Ok(());
        };
        match (last, target) {
            (Segment::Field(name), Value::Object(map)) => {
                map.remove(name);
            }
            (Segment::Index(i), Value::Array(arr)) => {
                if let Some(idx) = path::normalize_index(*i, arr.len()) {
                    arr.remove(idx);
                }
            }
            _ => {}
        }
        Ok(())
    }

    async fn json_arr_append(&self, key: &str, path: &str, value: &Value) -> Result<()> {
        let segments = path::parse(path)?;
        let mut docs = self.docs.write().await;
        let doc = docs
            .get_mut(key)
            .ok_or_else(|| anyhow!("key {key} does not exist"))?;
        array_at(doc, &segments, path)?.push(value.clone());
        Ok(())
    }

    async fn json_arr_insert(&self, key: &str, path: &str, index: i64, value: &Value) -> Result<()> {
        let segments = path::parse(path)?;
        let mut docs = self.docs.write().await;
        let doc = docs
            .get_mut(key)
            .ok_or_else(|| anyhow!("key {key} does not exist"))?;
        let arr = array_at(doc, &segments, path)?;
        let len = arr.len() as i64;
        let idx = if index < 0 { len + index } else { index };
        if !(0..=len).contains(&idx) {
            bail!("index {index} out of range for {path}");
        }
        arr.insert(idx as usize, value.clone());
        Ok(())
    }
}
