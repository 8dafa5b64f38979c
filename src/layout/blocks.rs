//! # Content Blocks
//!
//! Flattens one section of a report into the ordered block list the
//! packer consumes. Items keep their source order; an item with too many
//! photos is split into consecutive chunks right after itself; the
//! section's general comment goes last.

use serde::Serialize;

use crate::model::{CheckStatus, Item, Photo, Section};
use crate::profile::PaginationProfile;

/// Prefix on the description of every photo chunk after the first.
pub const CONTINUATION_PREFIX: &str = "(Continuação) ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BlockKind {
    /// An item row: description, OK/NA box, observation, maybe photos.
    DataRow,
    /// Free-text commentary.
    CommentBlock,
    /// Photos of an item whose first chunk is on an earlier page.
    PhotoGroup,
}

/// Back-reference to where a block came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockSource {
    pub section: usize,
    /// `None` for the section's general comment.
    pub item: Option<usize>,
}

/// Position of a photo chunk within its item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChunkPosition {
    /// Zero-based.
    pub index: usize,
    pub count: usize,
}

/// One unit of content, weighed and ready for packing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentBlock {
    pub kind: BlockKind,
    pub weight: f64,
    pub source: BlockSource,
    pub description: String,
    pub status: CheckStatus,
    pub observation: String,
    pub photos: Vec<Photo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunk: Option<ChunkPosition>,
    pub is_continuation: bool,
    /// Render the photos only, without repeating the item row.
    pub show_only_photos: bool,
    pub is_general_comment: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// Split `photos` into slices of at most `max` photos, in order, with no
/// photo in two slices. `max` of zero is treated as one.
pub fn chunk_photos(photos: &[Photo], max: usize) -> Vec<&[Photo]> {
    photos.chunks(max.max(1)).collect()
}

/// Build the block list for one section.
///
/// `profile` is expected to have passed `PaginationProfile::validate`.
/// Zero limits in an unvalidated profile are read as one.
pub fn build_section_blocks(
    section_index: usize,
    section: &Section,
    profile: &PaginationProfile,
) -> Vec<ContentBlock> {
    let mut blocks = Vec::with_capacity(section.items.len() + 1);

    for (item_index, item) in section.items.iter().enumerate() {
        let source = BlockSource {
            section: section_index,
            item: Some(item_index),
        };
        push_item_blocks(&mut blocks, source, item, profile);
    }

    if let Some(text) = section.comments.as_deref().filter(|t| !t.trim().is_empty()) {
        blocks.push(ContentBlock {
            kind: BlockKind::CommentBlock,
            weight: profile.weights.comment_weight(text),
            source: BlockSource {
                section: section_index,
                item: None,
            },
            description: String::new(),
            status: CheckStatus::Unchecked,
            observation: String::new(),
            photos: Vec::new(),
            chunk: None,
            is_continuation: false,
            show_only_photos: false,
            is_general_comment: true,
            text: Some(text.to_string()),
        });
    }

    blocks
}

fn push_item_blocks(
    blocks: &mut Vec<ContentBlock>,
    source: BlockSource,
    item: &Item,
    profile: &PaginationProfile,
) {
    let weights = &profile.weights;

    if item.photos.len() <= profile.max_photos_per_block {
        blocks.push(ContentBlock {
            kind: BlockKind::DataRow,
            weight: weights.row_weight(&item.observation, item.photos.len()),
            source,
            description: item.description.clone(),
            status: item.status,
            observation: item.observation.clone(),
            photos: item.photos.clone(),
            chunk: None,
            is_continuation: false,
            show_only_photos: false,
            is_general_comment: false,
            text: None,
        });
        return;
    }

    let chunks = chunk_photos(&item.photos, profile.max_photos_per_block);
    let count = chunks.len();
    for (index, photos) in chunks.into_iter().enumerate() {
        let chunk = Some(ChunkPosition { index, count });
        if index == 0 {
            blocks.push(ContentBlock {
                kind: BlockKind::DataRow,
                weight: weights.row_weight(&item.observation, photos.len()),
                source,
                description: item.description.clone(),
                status: item.status,
                observation: item.observation.clone(),
                photos: photos.to_vec(),
                chunk,
                is_continuation: false,
                show_only_photos: false,
                is_general_comment: false,
                text: None,
            });
        } else {
            blocks.push(ContentBlock {
                kind: BlockKind::PhotoGroup,
                weight: weights.row_weight("", photos.len()),
                source,
                description: format!("{}{}", CONTINUATION_PREFIX, item.description),
                status: item.status,
                observation: String::new(),
                photos: photos.to_vec(),
                chunk,
                is_continuation: true,
                show_only_photos: true,
                is_general_comment: false,
                text: None,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::CommentWeight;

    fn photos(n: usize) -> Vec<Photo> {
        (0..n).map(|i| Photo::new(format!("foto-{}.jpg", i))).collect()
    }

    fn item(description: &str, n_photos: usize) -> Item {
        Item {
            description: description.to_string(),
            status: CheckStatus::Ok,
            observation: String::new(),
            photos: photos(n_photos),
        }
    }

    #[test]
    fn chunks_have_no_overlap() {
        let all = photos(14);
        let chunks = chunk_photos(&all, 6);
        assert_eq!(chunks.iter().map(|c| c.len()).collect::<Vec<_>>(), vec![6, 6, 2]);
        let rejoined: Vec<Photo> = chunks.concat();
        assert_eq!(rejoined, all);
    }

    #[test]
    fn chunking_empty_list() {
        assert!(chunk_photos(&[], 6).is_empty());
    }

    #[test]
    fn oversized_item_is_split() {
        let section = Section {
            name: "Cobertura".to_string(),
            items: vec![item("Câmera 01", 14)],
            comments: None,
        };
        let profile = PaginationProfile::default();
        let blocks = build_section_blocks(0, &section, &profile);

        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[0].kind, BlockKind::DataRow);
        assert!(!blocks[0].is_continuation);
        assert_eq!(blocks[0].description, "Câmera 01");
        assert_eq!(blocks[0].photos.len(), 6);

        assert_eq!(blocks[1].kind, BlockKind::PhotoGroup);
        assert!(blocks[1].is_continuation && blocks[1].show_only_photos);
        assert_eq!(blocks[1].description, "(Continuação) Câmera 01");
        assert_eq!(blocks[1].chunk, Some(ChunkPosition { index: 1, count: 3 }));
        assert_eq!(blocks[2].photos.len(), 2);
        assert_eq!(blocks[2].photos[0].url, "foto-12.jpg");
        // 1 + ceil(2/3) * 2.5
        assert_eq!(blocks[2].weight, 3.5);
    }

    #[test]
    fn item_at_limit_is_not_split() {
        let section = Section {
            items: vec![item("Hidrante 02", 6)],
            ..Default::default()
        };
        let blocks = build_section_blocks(0, &section, &PaginationProfile::default());
        assert_eq!(blocks.len(), 1);
        assert!(blocks[0].chunk.is_none());
        assert_eq!(blocks[0].weight, 6.0);
    }

    #[test]
    fn comment_goes_last() {
        let section = Section {
            name: "Térreo".to_string(),
            items: vec![item("A", 0), item("B", 8)],
            comments: Some("Verificar novamente em 30 dias".to_string()),
        };
        let blocks = build_section_blocks(2, &section, &PaginationProfile::default());
        let kinds: Vec<BlockKind> = blocks.iter().map(|b| b.kind).collect();
        assert_eq!(
            kinds,
            vec![
                BlockKind::DataRow,
                BlockKind::DataRow,
                BlockKind::PhotoGroup,
                BlockKind::CommentBlock
            ]
        );
        let comment = blocks.last().unwrap();
        assert!(comment.is_general_comment);
        assert_eq!(comment.source, BlockSource { section: 2, item: None });
        assert_eq!(comment.weight, 1.0);
        assert_eq!(blocks[2].source.item, Some(1));
    }

    #[test]
    fn blank_comment_is_skipped() {
        let section = Section {
            items: vec![item("A", 0)],
            comments: Some("  ".to_string()),
            ..Default::default()
        };
        let blocks = build_section_blocks(0, &section, &PaginationProfile::default());
        assert_eq!(blocks.len(), 1);
    }

    #[test]
    fn unvalidated_zero_limits_are_read_as_one() {
        let mut profile = PaginationProfile::default();
        profile.max_photos_per_block = 0;
        profile.weights.photos_per_row = 0;
        profile.weights.comment = CommentWeight::LineScaled {
            chars_per_line: 0,
            damping: 1.0,
        };
        let section = Section {
            items: vec![item("Câmera 07", 2)],
            comments: Some("ok".to_string()),
            ..Default::default()
        };
        let blocks = build_section_blocks(0, &section, &profile);
        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[0].weight, 3.5);
        assert_eq!(blocks[1].weight, 3.5);
        assert!(blocks[1].is_continuation);
        assert_eq!(blocks[2].weight, 2.0);
    }
}
