//! # Page Break Decisions
//!
//! Logic for deciding whether the next block joins the page being filled
//! or closes it. The packer asks this once per block, in source order.

/// What to do with the next block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakDecision {
    /// Add the block to the current page.
    Place,
    /// Close the current page and put the block on a fresh one.
    StartNewPage,
}

/// The page being filled.
#[derive(Debug, Clone, Copy, Default)]
pub struct PageFill {
    /// Blocks already on the page.
    pub blocks: usize,
    /// Sum of their weights.
    pub weight: f64,
}

/// Decide where the next block goes.
///
/// An empty page accepts anything, including a block heavier than the
/// page itself. Otherwise the page is closed when the block is a photo
/// continuation, when its weight would overflow `capacity`, or when the
/// page already holds `max_blocks` blocks.
pub fn decide_break(
    fill: PageFill,
    block_weight: f64,
    is_continuation: bool,
    capacity: f64,
    max_blocks: Option<usize>,
) -> BreakDecision {
    if fill.blocks == 0 {
        return BreakDecision::Place;
    }

    // Continuations never share a page with what precedes them.
    if is_continuation {
        return BreakDecision::StartNewPage;
    }

    if fill.weight + block_weight > capacity {
        return BreakDecision::StartNewPage;
    }

    if max_blocks.is_some_and(|max| fill.blocks >= max) {
        return BreakDecision::StartNewPage;
    }

    BreakDecision::Place
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill(blocks: usize, weight: f64) -> PageFill {
        PageFill { blocks, weight }
    }

    #[test]
    fn block_fits() {
        let decision = decide_break(fill(2, 3.0), 2.0, false, 6.0, None);
        assert_eq!(decision, BreakDecision::Place);
    }

    #[test]
    fn exact_fit_is_placed() {
        let decision = decide_break(fill(5, 5.0), 1.0, false, 6.0, None);
        assert_eq!(decision, BreakDecision::Place);
    }

    #[test]
    fn overflow_breaks() {
        let decision = decide_break(fill(5, 5.0), 1.5, false, 6.0, None);
        assert_eq!(decision, BreakDecision::StartNewPage);
    }

    #[test]
    fn empty_page_takes_oversized_block() {
        let decision = decide_break(PageFill::default(), 40.0, false, 6.0, None);
        assert_eq!(decision, BreakDecision::Place);
    }

    #[test]
    fn continuation_breaks_despite_headroom() {
        let decision = decide_break(fill(1, 1.0), 1.0, true, 14.0, None);
        assert_eq!(decision, BreakDecision::StartNewPage);
    }

    #[test]
    fn continuation_on_empty_page_is_placed() {
        let decision = decide_break(PageFill::default(), 6.0, true, 14.0, None);
        assert_eq!(decision, BreakDecision::Place);
    }

    #[test]
    fn block_cap() {
        let decision = decide_break(fill(3, 3.0), 0.5, false, 40.0, Some(3));
        assert_eq!(decision, BreakDecision::StartNewPage);
        let decision = decide_break(fill(2, 3.0), 0.5, false, 40.0, Some(3));
        assert_eq!(decision, BreakDecision::Place);
    }
}
