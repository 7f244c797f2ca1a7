//! Shared test scaffolding: a fresh cache/pool pair plus a one-call parse
//! helper, so individual test modules don't repeat the same boilerplate.

use crate::parse::{self, Parse};
use std::sync::Arc;
use talus_pool::Pool;
use talus_text::Source;
use talus_tree::ElementCache;

/// Owns the cache and pool a parse needs to live; tests hold one of these
/// for as long as they hold onto the resulting tree.
pub struct Fixture {
    cache: ElementCache,
    pool: Pool,
}

impl Default for Fixture {
    fn default() -> Self {
        Self::new()
    }
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            cache: ElementCache::new(),
            pool: Pool::new(),
        }
    }

    pub fn parse(&self, text: &str) -> Parse<'_> {
        parse::parse_root(&self.cache, &self.pool, Arc::new(Source::new("t.tal", text)))
    }
}
