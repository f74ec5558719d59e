//! In-memory repository host and run helpers shared by the integration tests.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tm_catalog::catalog::{CatalogRunner, ItemAnalyzer, RunOptions};
use tm_catalog::paths::CatalogPaths;
use tm_catalog::remote::{FetchError, FetchResult, RemoteFile, RemoteItem, RepositoryHost};
use tm_catalog::text::{LineCountMode, TextEncoding};
use tm_catalog::titles::{TitleMapping, TitlePipeline};

pub const ORG: &str = "MonlamAI";

/// Tibetan text whose first two lines are ornamental.
pub const BO_TEXT: &str = "༄༅། །\n\nབཅོམ་ལྡན་འདས་ཆེན་པོ་ཞིག་བཞུགས་སོ\nའདི་སྐད་བདག་གིས་ཐོས་པ་དུས་གཅིག་ན།\n";
/// English text aligned with [`BO_TEXT`].
pub const EN_TEXT: &str = "\n\nThe Blessed One\nThus did I hear at one time.\nEnd.";

/// Repository host backed by maps; records every listing request.
#[derive(Default)]
pub struct FakeHost {
    items: Vec<RemoteItem>,
    listings: HashMap<String, Vec<RemoteFile>>,
    contents: HashMap<String, Vec<u8>>,
    broken: HashSet<String>,
    listed: RefCell<Vec<String>>,
    interrupt: RefCell<Option<(usize, Arc<AtomicBool>)>>,
    snapshot_at: RefCell<Option<(usize, PathBuf)>>,
    snapshot: RefCell<Option<String>>,
}

impl FakeHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn item(id: u64, name: &str) -> RemoteItem {
        RemoteItem {
            id,
            name: name.to_string(),
            url: format!("https://github.com/{ORG}/{name}"),
            full_name: format!("{ORG}/{name}"),
        }
    }

    /// Add an item whose root holds the given files.
    pub fn add_item(&mut self, id: u64, name: &str, files: &[(&str, &[u8])]) -> RemoteItem {
        let item = Self::item(id, name);
        self.add_listing(&item.full_name, files);
        self.items.push(item.clone());
        item
    }

    /// Add an item with aligned `bo.txt` and `en.txt`.
    pub fn add_aligned_item(&mut self, id: u64, name: &str) -> RemoteItem {
        self.add_item(
            id,
            name,
            &[("bo.txt", BO_TEXT.as_bytes()), ("en.txt", EN_TEXT.as_bytes())],
        )
    }

    /// Register a root listing without making it a discoverable item.
    pub fn add_listing(&mut self, full_name: &str, files: &[(&str, &[u8])]) {
        let mut listing = Vec::new();
        for (name, bytes) in files {
            let url = format!("mem://{full_name}/{name}");
            self.contents.insert(url.clone(), bytes.to_vec());
            listing.push(RemoteFile::file(*name, url));
        }
        self.listings.insert(full_name.to_string(), listing);
    }

    /// Make the root listing of `name` fail until [`repair`](Self::repair).
    pub fn break_item(&mut self, name: &str) {
        self.broken.insert(format!("{ORG}/{name}"));
    }

    pub fn repair(&mut self, name: &str) {
        self.broken.remove(&format!("{ORG}/{name}"));
    }

    /// Set `flag` while serving the `n`-th listing request.
    pub fn interrupt_after(&self, n: usize, flag: Arc<AtomicBool>) {
        *self.interrupt.borrow_mut() = Some((n, flag));
    }

    /// Copy the file at `path` while serving the `n`-th listing request, as
    /// a hard kill at that moment would leave it.
    pub fn snapshot_file_at(&self, n: usize, path: PathBuf) {
        *self.snapshot_at.borrow_mut() = Some((n, path));
    }

    pub fn snapshot(&self) -> Option<String> {
        self.snapshot.borrow().clone()
    }

    pub fn items(&self) -> Vec<RemoteItem> {
        self.items.clone()
    }

    /// Short names of every item listed so far, in order.
    pub fn listed(&self) -> Vec<String> {
        self.listed
            .borrow()
            .iter()
            .map(|full| full.trim_start_matches(&format!("{ORG}/")).to_string())
            .collect()
    }

    pub fn clear_listed(&self) {
        self.listed.borrow_mut().clear();
    }
}

impl RepositoryHost for FakeHost {
    fn search_by_name_prefix(&self, pattern: &str) -> FetchResult<Vec<RemoteItem>> {
        let pattern = pattern.to_lowercase();
        Ok(self
            .items
            .iter()
            .filter(|i| i.name.to_lowercase().contains(&pattern))
            .cloned()
            .collect())
    }

    fn list_root_files(&self, full_name: &str) -> FetchResult<Vec<RemoteFile>> {
        self.listed.borrow_mut().push(full_name.to_string());
        if let Some((n, flag)) = self.interrupt.borrow().as_ref() {
            if self.listed.borrow().len() == *n {
                flag.store(true, Ordering::SeqCst);
            }
        }
        if let Some((n, path)) = self.snapshot_at.borrow().as_ref() {
            if self.listed.borrow().len() == *n {
                *self.snapshot.borrow_mut() = std::fs::read_to_string(path).ok();
            }
        }
        if self.broken.contains(full_name) {
            return Err(FetchError::Status {
                url: format!("mem://{full_name}"),
                status: 502,
            });
        }
        self.listings
            .get(full_name)
            .cloned()
            .ok_or_else(|| FetchError::NotFound {
                what: full_name.to_string(),
            })
    }

    fn fetch_content(&self, download_ref: &str) -> FetchResult<Vec<u8>> {
        self.contents
            .get(download_ref)
            .cloned()
            .ok_or_else(|| FetchError::NotFound {
                what: download_ref.to_string(),
            })
    }
}

pub fn options(batch_size: usize) -> RunOptions {
    RunOptions {
        batch_size,
        item_pause: Duration::ZERO,
        ..RunOptions::default()
    }
}

/// Runner over `host` with no title mapping and no AI tier.
pub fn runner<'a>(host: &'a FakeHost, paths: &CatalogPaths, options: RunOptions) -> CatalogRunner<'a> {
    let analyzer = ItemAnalyzer::new(
        host,
        TextEncoding::DEFAULT_ORDER.to_vec(),
        LineCountMode::NonEmpty,
    );
    let pipeline = TitlePipeline::new(TitleMapping::default(), None);
    CatalogRunner::new(analyzer, pipeline, paths, options).unwrap()
}
