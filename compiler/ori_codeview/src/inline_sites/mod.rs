//! Per-function tree of inlined call sites.
//!
//! A site is keyed by the call-site location a body was inlined at. Sites
//! whose key location is itself inlined hang off the site one level up;
//! the rest are direct children of the function.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::error::CodeViewError;
use crate::metadata::{DebugLoc, DebugMetadata, LocRef, SubprogramRef};

/// One inlined call site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineSite {
    /// Function ID used by line-table entries inside this site.
    pub site_func_id: u32,
    /// The subprogram whose body was inlined here.
    pub inlinee: SubprogramRef,
    /// Call sites nested directly inside this one, in discovery order.
    pub children: SmallVec<[LocRef; 4]>,
}

/// Sites of one function, in discovery order.
#[derive(Debug, Default)]
pub struct InlineSiteMap {
    sites: Vec<(LocRef, InlineSite)>,
    index: FxHashMap<LocRef, usize>,
}

impl InlineSiteMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    pub fn get(&self, call_site: LocRef) -> Option<&InlineSite> {
        self.index.get(&call_site).map(|&i| &self.sites[i].1)
    }

    /// All sites with their call-site keys, in discovery order.
    pub fn iter(&self) -> impl Iterator<Item = (LocRef, &InlineSite)> {
        self.sites.iter().map(|(key, site)| (*key, site))
    }

    /// Sites inlined directly into the function body.
    pub fn top_level<'a>(
        &'a self,
        metadata: &'a DebugMetadata,
    ) -> impl Iterator<Item = (LocRef, &'a InlineSite)> + 'a {
        self.iter()
            .filter(move |(key, _)| metadata.location(*key).inlined_at.is_none())
    }

    /// Site for the call that `loc` was inlined at, created on first use.
    ///
    /// A new site takes the next module-wide function ID and records the
    /// subprogram of `loc`'s scope as its inlinee.
    fn get_or_create(
        &mut self,
        loc: &DebugLoc,
        metadata: &DebugMetadata,
        next_func_id: &mut u32,
    ) -> Result<&mut InlineSite, CodeViewError> {
        let call_site = loc.inlined_at.ok_or(CodeViewError::NotInlined)?;
        let slot = match self.index.get(&call_site) {
            Some(&slot) => slot,
            None => {
                let scope = loc.scope.ok_or(CodeViewError::NotInlined)?;
                let site = InlineSite {
                    site_func_id: *next_func_id,
                    inlinee: metadata.scope_subprogram(scope),
                    children: SmallVec::new(),
                };
                *next_func_id += 1;
                tracing::trace!(
                    ?call_site,
                    site_func_id = site.site_func_id,
                    inlinee = ?site.inlinee,
                    "new inline site"
                );
                let slot = self.sites.len();
                self.sites.push((call_site, site));
                self.index.insert(call_site, slot);
                slot
            }
        };
        Ok(&mut self.sites[slot].1)
    }

    /// Make sure every call-site level above `loc` has a site and is linked
    /// to its parent, and return the function ID of `loc`'s own site.
    ///
    /// Walking stops early once a link already exists: everything above it
    /// was linked when that link was made.
    pub fn record(
        &mut self,
        loc: &DebugLoc,
        metadata: &DebugMetadata,
        next_func_id: &mut u32,
    ) -> Result<u32, CodeViewError> {
        let site_func_id = self.get_or_create(loc, metadata, next_func_id)?.site_func_id;

        let mut child = loc.inlined_at.ok_or(CodeViewError::NotInlined)?;
        loop {
            let call = *metadata.location(child);
            let Some(parent_key) = call.inlined_at else {
                break;
            };
            let parent = self.get_or_create(&call, metadata, next_func_id)?;
            if parent.children.contains(&child) {
                break;
            }
            parent.children.push(child);
            child = parent_key;
        }

        Ok(site_func_id)
    }
}
