//! Parsed-template cache keyed by a SHA-256 of the template source.
//!
//! Parsing is deterministic, so two identical sources always share one
//! entry. Parse failures are returned to the caller and never cached.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use mdc_core::{parse, ParseError, Template};
use sha2::{Digest, Sha256};

#[derive(Debug, Default)]
pub struct TemplateCache {
    entries: RwLock<HashMap<String, Arc<Template>>>,
}

impl TemplateCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `src`, or return the template parsed from an identical source.
    pub fn get_or_parse(&self, src: &str) -> Result<Arc<Template>, ParseError> {
        self.lookup(cache_key(None, src), src)
    }

    /// Same as [`get_or_parse`](Self::get_or_parse), with entries namespaced
    /// by generator id.
    pub fn get_or_parse_for(&self, id: &str, src: &str) -> Result<Arc<Template>, ParseError> {
        self.lookup(cache_key(Some(id), src), src)
    }

    fn lookup(&self, key: String, src: &str) -> Result<Arc<Template>, ParseError> {
        {
            let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(hit) = entries.get(&key) {
                tracing::debug!(key = %key, "template cache hit");
                return Ok(Arc::clone(hit));
            }
        }

        tracing::debug!(key = %key, "template cache miss");
        let template = Arc::new(parse(src)?);
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let entry = entries.entry(key).or_insert(template);
        Ok(Arc::clone(entry))
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

fn cache_key(id: Option<&str>, src: &str) -> String {
    let digest = Sha256::digest(src.as_bytes());
    let hex: String = digest.iter().map(|b| format!("{:02x}", b)).collect();
    match id {
        Some(id) => format!("{}:{}", id, hex),
        None => hex,
    }
}
