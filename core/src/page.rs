//! `PageResult`: the ordered Block → Row → Word structure and its iterator.
//!
//! Reference upstream implementation: `PAGE_RES`/`BLOCK_RES`/`ROW_RES`/
//! `WERD_RES` (forward-declared in `src/ccmain/tesseractclass.h`, walked
//! throughout `src/ccmain/control.cpp` via `PAGE_RES_IT`'s `forward`/
//! `backward`/`restart_page` family). The cyclic pointer network is
//! replaced here by a `(block, row, word)` index cursor into owned `Vec`s.

use crate::ids::WordId;
use crate::word::WordResult;

/// One row of words sharing a baseline.
#[derive(Debug, Clone, Default)]
pub struct Row {
    pub words: Vec<WordResult>,
    /// Right-to-left scripts invert word order within the row; this does
    /// not reorder storage, only how the iterator walks it.
    pub right_to_left: bool,
}

/// One layout block (column/paragraph), containing ordered rows.
#[derive(Debug, Clone, Default)]
pub struct Block {
    pub rows: Vec<Row>,
}

/// The whole page: an ordered sequence of blocks.
#[derive(Debug, Clone, Default)]
pub struct PageResult {
    pub blocks: Vec<Block>,
}

impl PageResult {
    pub fn new() -> Self {
        PageResult { blocks: Vec::new() }
    }

    pub fn word(&self, id: WordId) -> Option<&WordResult> {
        self.blocks
            .get(id.block)?
            .rows
            .get(id.row)?
            .words
            .get(id.word)
    }

    pub fn word_mut(&mut self, id: WordId) -> Option<&mut WordResult> {
        self.blocks
            .get_mut(id.block)?
            .rows
            .get_mut(id.row)?
            .words
            .get_mut(id.word)
    }

    pub fn total_words(&self) -> usize {
        self.blocks
            .iter()
            .flat_map(|b| b.rows.iter())
            .map(|r| r.words.len())
            .sum()
    }

    /// Reading-order iterator: block-major, row-major, word-major
    /// left-to-right, inverted within a right-to-left row.
    pub fn iter(&self) -> PageIter<'_> {
        PageIter::new(self)
    }
}

/// A cursor into a `PageResult`. After every mutation the iterator is
/// either valid at a Word or at end-of-page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCursor {
    pub block: usize,
    pub row: usize,
    /// Position within the row's reading-order sequence (not necessarily
    /// storage order when `right_to_left` is set).
    pub slot: usize,
}

pub struct PageIterator<'a> {
    page: &'a mut PageResult,
    cursor: Option<PageCursor>,
}

impl<'a> PageIterator<'a> {
    pub fn new(page: &'a mut PageResult) -> Self {
        let cursor = Self::first_cursor(page);
        PageIterator { page, cursor }
    }

    fn first_cursor(page: &PageResult) -> Option<PageCursor> {
        for (bi, block) in page.blocks.iter().enumerate() {
            for (ri, row) in block.rows.iter().enumerate() {
                if !row.words.is_empty() {
                    return Some(PageCursor {
                        block: bi,
                        row: ri,
                        slot: 0,
                    });
                }
            }
        }
        None
    }

    fn row_word_index(row: &Row, slot: usize) -> usize {
        if row.right_to_left {
            row.words.len() - 1 - slot
        } else {
            slot
        }
    }

    pub fn at_end(&self) -> bool {
        self.cursor.is_none()
    }

    pub fn word_id(&self) -> Option<WordId> {
        let c = self.cursor?;
        let row = &self.page.blocks[c.block].rows[c.row];
        let wi = Self::row_word_index(row, c.slot);
        Some(WordId::new(c.block, c.row, wi))
    }

    pub fn word(&self) -> Option<&WordResult> {
        let id = self.word_id()?;
        self.page.word(id)
    }

    pub fn word_mut(&mut self) -> Option<&mut WordResult> {
        let id = self.word_id()?;
        self.page.word_mut(id)
    }

    pub fn block(&self) -> Option<&Block> {
        self.cursor.map(|c| &self.page.blocks[c.block])
    }

    pub fn row(&self) -> Option<&Row> {
        self.cursor
            .map(|c| &self.page.blocks[c.block].rows[c.row])
    }

    /// Advance to the next block, first word.
    pub fn next_block(&mut self) -> bool {
        let Some(c) = self.cursor else { return false };
        for bi in (c.block + 1)..self.page.blocks.len() {
            for (ri, row) in self.page.blocks[bi].rows.iter().enumerate() {
                if !row.words.is_empty() {
                    self.cursor = Some(PageCursor {
                        block: bi,
                        row: ri,
                        slot: 0,
                    });
                    return true;
                }
            }
        }
        self.cursor = None;
        false
    }

    pub fn next_row(&mut self) -> bool {
        let Some(c) = self.cursor else { return false };
        let block = &self.page.blocks[c.block];
        for ri in (c.row + 1)..block.rows.len() {
            if !block.rows[ri].words.is_empty() {
                self.cursor = Some(PageCursor {
                    block: c.block,
                    row: ri,
                    slot: 0,
                });
                return true;
            }
        }
        self.next_block()
    }

    /// Move to the first word of the previous block. Returns false, leaving
    /// the cursor untouched, when already in the first block.
    pub fn prev_block(&mut self) -> bool {
        let Some(c) = self.cursor else { return false };
        for bi in (0..c.block).rev() {
            for (ri, row) in self.page.blocks[bi].rows.iter().enumerate() {
                if !row.words.is_empty() {
                    self.cursor = Some(PageCursor {
                        block: bi,
                        row: ri,
                        slot: 0,
                    });
                    return true;
                }
            }
        }
        false
    }

    /// Move to the first word of the previous non-empty row, crossing into
    /// the previous block if the current block has none before this row
    ///. Returns false, leaving the cursor
    /// untouched, when already at the page's first row.
    pub fn prev_row(&mut self) -> bool {
        let Some(c) = self.cursor else { return false };
        let block = &self.page.blocks[c.block];
        for ri in (0..c.row).rev() {
            if !block.rows[ri].words.is_empty() {
                self.cursor = Some(PageCursor {
                    block: c.block,
                    row: ri,
                    slot: 0,
                });
                return true;
            }
        }
        self.prev_block()
    }

    /// Advance to the next word in reading order, crossing row/block
    /// boundaries as needed. Returns false (and sets end-of-page) when no
    /// more words remain.
    pub fn next_word(&mut self) -> bool {
        let Some(c) = self.cursor else { return false };
        let row_len = self.page.blocks[c.block].rows[c.row].words.len();
        if c.slot + 1 < row_len {
            self.cursor = Some(PageCursor {
                slot: c.slot + 1,
                ..c
            });
            return true;
        }
        self.next_row()
    }

    /// Alias matching upstream `PAGE_RES_IT::forward()`.
    pub fn forward(&mut self) -> bool {
        self.next_word()
    }

    pub fn restart_page(&mut self) {
        self.cursor = Self::first_cursor(self.page);
    }

    /// Re-sync the cursor to a specific word (used when the pass
    /// orchestrator's logical pointer lags the iterator due to combo
    /// insertions).
    pub fn seek(&mut self, id: WordId) {
        let row = &self.page.blocks[id.block].rows[id.row];
        let slot = if row.right_to_left {
            row.words.len() - 1 - id.word
        } else {
            id.word
        };
        self.cursor = Some(PageCursor {
            block: id.block,
            row: id.row,
            slot,
        });
    }

    pub fn make_current_word_fuzzy(&mut self) {
        if let Some(w) = self.word_mut() {
            w.flags.fuzzy_space_right = true;
        }
    }

    /// Remove the current word from the page, advancing the cursor to what
    /// was the next word.
    pub fn delete_current_word(&mut self) {
        let Some(id) = self.word_id() else { return };
        let row = &mut self.page.blocks[id.block].rows[id.row];
        row.words.remove(id.word);
        if row.words.is_empty() {
            self.next_row();
        } else {
            // Words after the removed one shifted down by one; slot stays,
            // unless we deleted the last slot in the row.
            let Some(c) = self.cursor else { return };
            if c.slot >= row.words.len() {
                self.next_row();
            }
        }
    }

    /// Replace the current word with a sequence of words, used when the
    /// sequence engine emits multiple words for one input word, or a
    /// fuzzy-space split.
    pub fn replace_current_word(&mut self, sequence: Vec<WordResult>) {
        let Some(id) = self.word_id() else { return };
        let row = &mut self.page.blocks[id.block].rows[id.row];
        let at = id.word;
        row.words.splice(at..at + 1, sequence);
        self.cursor = Some(PageCursor {
            block: id.block,
            row: id.row,
            slot: at,
        });
    }
}

/// Read-only counterpart of `PageIterator`, used where mutation is not
/// needed (e.g. scoring passes that only read).
pub struct PageIter<'a> {
    page: &'a PageResult,
    cursor: Option<PageCursor>,
}

impl<'a> PageIter<'a> {
    fn new(page: &'a PageResult) -> Self {
        let cursor = PageIterator::first_cursor(page);
        PageIter { page, cursor }
    }
}

impl<'a> Iterator for PageIter<'a> {
    type Item = &'a WordResult;

    fn next(&mut self) -> Option<Self::Item> {
        let c = self.cursor?;
        let row = &self.page.blocks[c.block].rows[c.row];
        let wi = PageIterator::row_word_index(row, c.slot);
        let word = &row.words[wi];

        // Advance cursor for the following call.
        if c.slot + 1 < row.words.len() {
            self.cursor = Some(PageCursor {
                slot: c.slot + 1,
                ..c
            });
        } else {
            self.cursor = None;
            'outer: for bi in c.block..self.page.blocks.len() {
                let row_start = if bi == c.block { c.row + 1 } else { 0 };
                for (ri, row) in self.page.blocks[bi].rows.iter().enumerate().skip(row_start) {
                    if !row.words.is_empty() {
                        self.cursor = Some(PageCursor {
                            block: bi,
                            row: ri,
                            slot: 0,
                        });
                        break 'outer;
                    }
                }
            }
        }
        Some(word)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::word::Blob;

    fn word(text_len: usize) -> WordResult {
        WordResult::new(
            Blob {
                x0: 0.0,
                x1: 10.0,
                y0: 0.0,
                y1: 10.0,
            },
            0.0,
            10.0,
            vec![
                Blob {
                    x0: 0.0,
                    x1: 1.0,
                    y0: 0.0,
                    y1: 1.0,
                };
                text_len
            ],
        )
    }

    fn sample_page() -> PageResult {
        PageResult {
            blocks: vec![Block {
                rows: vec![Row {
                    words: vec![word(1), word(2), word(3)],
                    right_to_left: false,
                }],
            }],
        }
    }

    #[test]
    fn empty_page_iterates_nothing() {
        let page = PageResult::new();
        assert_eq!(page.iter().count(), 0);
    }

    #[test]
    fn reading_order_left_to_right() {
        let page = sample_page();
        let lens: Vec<_> = page.iter().map(|w| w.chopped_blobs.len()).collect();
        assert_eq!(lens, vec![1, 2, 3]);
    }

    #[test]
    fn reading_order_right_to_left_inverts_row() {
        let mut page = sample_page();
        page.blocks[0].rows[0].right_to_left = true;
        let lens: Vec<_> = page.iter().map(|w| w.chopped_blobs.len()).collect();
        assert_eq!(lens, vec![3, 2, 1]);
    }

    #[test]
    fn iterator_forward_and_end_of_page() {
        let mut page = sample_page();
        let mut it = PageIterator::new(&mut page);
        assert!(!it.at_end());
        assert!(it.forward());
        assert!(it.forward());
        assert!(!it.forward());
        assert!(it.at_end());
    }

    #[test]
    fn delete_current_word_advances_cursor() {
        let mut page = sample_page();
        let mut it = PageIterator::new(&mut page);
        it.delete_current_word();
        assert_eq!(it.word().unwrap().chopped_blobs.len(), 2);
        assert_eq!(page.total_words(), 2);
    }

    #[test]
    fn prev_row_and_prev_block_retrace_next() {
        let mut page = PageResult {
            blocks: vec![
                Block {
                    rows: vec![Row {
                        words: vec![word(1)],
                        right_to_left: false,
                    }],
                },
                Block {
                    rows: vec![
                        Row {
                            words: vec![word(2)],
                            right_to_left: false,
                        },
                        Row {
                            words: vec![word(3)],
                            right_to_left: false,
                        },
                    ],
                },
            ],
        };
        let mut it = PageIterator::new(&mut page);
        assert!(it.next_block());
        assert!(it.next_row());
        assert_eq!(it.word().unwrap().chopped_blobs.len(), 3);

        assert!(it.prev_row());
        assert_eq!(it.word().unwrap().chopped_blobs.len(), 2);

        assert!(it.prev_block());
        assert_eq!(it.word().unwrap().chopped_blobs.len(), 1);
        assert!(!it.prev_block());
    }

    #[test]
    fn replace_current_word_with_sequence() {
        let mut page = sample_page();
        let mut it = PageIterator::new(&mut page);
        it.replace_current_word(vec![word(5), word(6)]);
        assert_eq!(page.total_words(), 4);
        assert_eq!(it.word().unwrap().chopped_blobs.len(), 5);
    }
}
