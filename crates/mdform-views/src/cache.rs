//! Content-keyed cache of compiled forms.
//!
//! Entries are keyed by a SHA-256 digest of the markdown source together with
//! every option that changes the compiled result, so two sources or two
//! read-only settings never share an entry. Compiling is pure: when two
//! requests miss on the same key at once both compile, and the last insert wins.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use mdform_core::MdFormResult;
use sha2::{Digest, Sha256};

use crate::compile::CompiledForm;

/// Identity of one compiled form.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey([u8; 32]);

impl CacheKey {
    /// Derives the key for compiling `source` with the given options.
    pub fn new(
        source: &str,
        read_only: bool,
        formatter_id: &str,
        class_name: &str,
        extends: Option<&str>,
        block: Option<&str>,
    ) -> Self {
        let mut hasher = Sha256::new();
        let mut part = |bytes: &[u8]| {
            hasher.update((bytes.len() as u64).to_le_bytes());
            hasher.update(bytes);
        };
        part(source.as_bytes());
        part(&[u8::from(read_only)]);
        part(formatter_id.as_bytes());
        part(class_name.as_bytes());
        for opt in [extends, block] {
            match opt {
                Some(value) => {
                    part(&[1]);
                    part(value.as_bytes());
                }
                None => part(&[0]),
            }
        }
        Self(hasher.finalize().into())
    }
}

impl fmt::Debug for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CacheKey(")?;
        for byte in &self.0[..8] {
            write!(f, "{byte:02x}")?;
        }
        write!(f, ")")
    }
}

/// A read-through cache of compiled forms, safe to share between requests.
#[derive(Debug, Default)]
pub struct FormCache {
    entries: RwLock<HashMap<CacheKey, Arc<CompiledForm>>>,
}

impl FormCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the entry for `key`, compiling and storing it on a miss.
    pub fn get_or_compile<F>(&self, key: CacheKey, compile: F) -> MdFormResult<Arc<CompiledForm>>
    where
        F: FnOnce() -> MdFormResult<CompiledForm>,
    {
        if let Some(hit) = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            tracing::debug!(key = ?key, "Compiled form cache hit");
            return Ok(Arc::clone(hit));
        }

        tracing::debug!(key = ?key, "Compiled form cache miss");
        let compiled = Arc::new(compile()?);
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, Arc::clone(&compiled));
        Ok(compiled)
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Returns `true` if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every entry.
    pub fn clear(&self) {
        self.entries.write().unwrap_or_else(PoisonError::into_inner).clear();
    }
}
