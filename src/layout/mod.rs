//! # Page Packer
//!
//! Report pages are packed, not measured. Every block carries a weight (an
//! estimate of the vertical space it takes on a printed sheet) and every
//! page a capacity. The packer walks the blocks in source order:
//!
//! 1. Open a page with the section's first-page capacity
//! 2. Before placing each block, ask [`page_break::decide_break`]
//! 3. If it fits: place it, add its weight
//! 4. If it doesn't (or it is a photo continuation, or the page is at its
//!    block cap): close the page, open a continuation page, place it there
//! 5. A block heavier than a whole page still goes alone on a page. The
//!    packer never splits blocks; chunking happened in [`blocks`]
//!
//! Nothing is ever reordered to fill gaps. The concatenation of all pages
//! is exactly the input.

pub mod blocks;
pub mod page_break;

use std::fmt::Write as _;

use serde::Serialize;

use crate::error::Result;
use crate::model::{Report, ReportKind};
use crate::profile::PaginationProfile;

use blocks::{build_section_blocks, ContentBlock};
use page_break::{decide_break, BreakDecision, PageFill};

/// Anything the packer can place on a page.
pub trait Packable {
    fn weight(&self) -> f64;

    /// Continuations always open a fresh page.
    fn is_continuation(&self) -> bool {
        false
    }
}

impl Packable for ContentBlock {
    fn weight(&self) -> f64 {
        self.weight
    }

    fn is_continuation(&self) -> bool {
        self.is_continuation
    }
}

/// Capacities for one packing run (one section).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PackConfig {
    pub first_page_capacity: f64,
    pub continuation_capacity: f64,
    pub max_blocks_per_page: Option<usize>,
}

impl PackConfig {
    pub fn new(first_page_capacity: f64, continuation_capacity: f64) -> Self {
        Self {
            first_page_capacity,
            continuation_capacity,
            max_blocks_per_page: None,
        }
    }

    pub fn with_max_blocks(mut self, max: usize) -> Self {
        self.max_blocks_per_page = Some(max);
        self
    }
}

/// A page closed by the packer.
#[derive(Debug, Clone, PartialEq)]
pub struct PackedPage<B> {
    pub blocks: Vec<B>,
    pub weight: f64,
    pub capacity: f64,
    pub is_first_page_of_section: bool,
}

/// Tracks the page being filled.
struct PageCursor<B> {
    blocks: Vec<B>,
    weight: f64,
    capacity: f64,
    is_first: bool,
}

impl<B> PageCursor<B> {
    fn first(capacity: f64) -> Self {
        Self {
            blocks: Vec::new(),
            weight: 0.0,
            capacity,
            is_first: true,
        }
    }

    fn fill(&self) -> PageFill {
        PageFill {
            blocks: self.blocks.len(),
            weight: self.weight,
        }
    }

    fn place(&mut self, block: B, weight: f64) {
        self.blocks.push(block);
        self.weight += weight;
    }

    /// Close this page and return it with a fresh continuation cursor.
    fn finalize(self, continuation_capacity: f64) -> (PackedPage<B>, Self) {
        let page = PackedPage {
            blocks: self.blocks,
            weight: self.weight,
            capacity: self.capacity,
            is_first_page_of_section: self.is_first,
        };
        let next = Self {
            blocks: Vec::new(),
            weight: 0.0,
            capacity: continuation_capacity,
            is_first: false,
        };
        (page, next)
    }
}

/// Greedily distribute `blocks` into capacity-bounded pages.
pub fn pack<B: Packable>(blocks: Vec<B>, config: &PackConfig) -> Vec<PackedPage<B>> {
    let mut pages = Vec::new();
    let mut cursor = PageCursor::first(config.first_page_capacity);

    for block in blocks {
        let weight = block.weight();
        let decision = decide_break(
            cursor.fill(),
            weight,
            block.is_continuation(),
            cursor.capacity,
            config.max_blocks_per_page,
        );
        if decision == BreakDecision::StartNewPage {
            let (page, next) = cursor.finalize(config.continuation_capacity);
            pages.push(page);
            cursor = next;
        }
        cursor.place(block, weight);
    }

    if !cursor.blocks.is_empty() {
        let (page, _) = cursor.finalize(config.continuation_capacity);
        pages.push(page);
    }

    pages
}

// ── Report pagination ───────────────────────────────────────────────

/// A numbered page of a paginated report.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    /// 1-based, counted across the whole document.
    pub number: usize,
    pub is_first_page_of_section: bool,
    pub capacity: f64,
    pub weight: f64,
    pub blocks: Vec<ContentBlock>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionLayout {
    pub index: usize,
    pub name: String,
    pub pages: Vec<Page>,
}

/// The page plan of a whole report, handed to the renderer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportLayout {
    pub title: String,
    pub kind: ReportKind,
    pub total_pages: usize,
    pub sections: Vec<SectionLayout>,
}

impl ReportLayout {
    pub fn pages(&self) -> impl Iterator<Item = &Page> {
        self.sections.iter().flat_map(|s| s.pages.iter())
    }

    /// Plain-text page plan, one line per page.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "{} [{}]: {} page(s)",
            if self.title.is_empty() { "(untitled)" } else { self.title.as_str() },
            self.kind,
            self.total_pages
        );
        for section in &self.sections {
            for page in &section.pages {
                let _ = writeln!(
                    out,
                    "  p{:<3} {:<24} {}{} block(s), weight {:.1}/{:.1}",
                    page.number,
                    section.name,
                    if page.is_first_page_of_section { "* " } else { "  " },
                    page.blocks.len(),
                    page.weight,
                    page.capacity
                );
            }
        }
        out
    }
}

/// Paginates reports with one profile.
#[derive(Debug, Clone)]
pub struct Paginator {
    profile: PaginationProfile,
}

impl Paginator {
    pub fn new(profile: PaginationProfile) -> Result<Self> {
        profile.validate()?;
        Ok(Self { profile })
    }

    /// A paginator with the built-in profile for `kind`.
    pub fn for_kind(kind: ReportKind) -> Self {
        Self {
            profile: PaginationProfile::for_kind(kind),
        }
    }

    pub fn profile(&self) -> &PaginationProfile {
        &self.profile
    }

    /// Main entry point: lay out a report into numbered pages.
    pub fn paginate(&self, report: &Report) -> ReportLayout {
        let profile = &self.profile;
        let mut sections = Vec::with_capacity(report.sections.len());
        let mut number = 0;
        let mut document_header_pending = true;

        for (index, section) in report.sections.iter().enumerate() {
            let blocks = build_section_blocks(index, section, profile);
            if blocks.is_empty() {
                log::debug!("Section {} ({:?}) is empty, no pages", index, section.name);
                sections.push(SectionLayout {
                    index,
                    name: section.name.clone(),
                    pages: Vec::new(),
                });
                continue;
            }

            let mut config = PackConfig {
                first_page_capacity: profile.first_page_capacity,
                continuation_capacity: profile.continuation_capacity,
                max_blocks_per_page: profile.max_blocks_per_page,
            };
            if document_header_pending {
                config.first_page_capacity -= profile.document_header_reserve;
                document_header_pending = false;
            }

            let packed = pack(blocks, &config);
            let pages: Vec<Page> = packed
                .into_iter()
                .map(|p| {
                    number += 1;
                    if p.blocks.len() == 1 && p.weight > p.capacity {
                        log::warn!(
                            "Page {} holds a single block of weight {:.1} over capacity {:.1}",
                            number,
                            p.weight,
                            p.capacity
                        );
                    }
                    Page {
                        number,
                        is_first_page_of_section: p.is_first_page_of_section,
                        capacity: p.capacity,
                        weight: p.weight,
                        blocks: p.blocks,
                    }
                })
                .collect();

            log::debug!(
                "Section {} ({:?}): {} block(s) on {} page(s)",
                index,
                section.name,
                pages.iter().map(|p| p.blocks.len()).sum::<usize>(),
                pages.len()
            );

            sections.push(SectionLayout {
                index,
                name: section.name.clone(),
                pages,
            });
        }

        log::info!(
            "Paginated {} report {:?}: {} section(s), {} item(s), {} photo(s) on {} page(s)",
            report.kind,
            report.title,
            report.sections.len(),
            report.item_count(),
            report.photo_count(),
            number
        );

        ReportLayout {
            title: report.title.clone(),
            kind: report.kind,
            total_pages: number,
            sections,
        }
    }
}
