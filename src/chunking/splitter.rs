//! Recursive character splitter for source code.
//!
//! The input is partitioned into contiguous regions no longer than the
//! chunk size: each separator occurrence starts a candidate piece, adjacent
//! small pieces merge greedily up to the budget, and a piece still over
//! budget is re-split with the next separator in the list. Regions cover
//! the input exactly, so no characters are lost. Emitted chunks then extend
//! backwards over the previous region by the overlap length.

use super::{CHUNK_OVERLAP, CHUNK_SIZE, CODE_SEPARATORS};

pub struct CodeSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: &'static [&'static str],
}

impl Default for CodeSplitter {
    fn default() -> Self {
        Self::new(CHUNK_SIZE, CHUNK_OVERLAP)
    }
}

impl CodeSplitter {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            chunk_overlap,
            separators: CODE_SEPARATORS,
        }
    }

    /// Split `text` into overlapping fragments. A text shorter than the
    /// chunk size yields exactly one fragment equal to the input; an empty
    /// text yields none.
    pub fn split(&self, text: &str) -> Vec<String> {
        if text.is_empty() {
            return Vec::new();
        }

        let mut regions = Vec::new();
        self.split_region(text, 0, text.len(), 0, &mut regions);

        let mut chunks = Vec::with_capacity(regions.len());
        let mut prev_start = 0usize;
        for (i, &(start, end)) in regions.iter().enumerate() {
            let from = if i == 0 {
                start
            } else {
                // Reach back over the previous region, but not past it.
                back_up_chars(text, start, self.chunk_overlap).max(prev_start)
            };
            chunks.push(text[from..end].to_string());
            prev_start = start;
        }
        chunks
    }

    /// Partition `text[start..end]` into regions of at most `chunk_size`
    /// characters, appended to `out` in order.
    fn split_region(
        &self,
        text: &str,
        start: usize,
        end: usize,
        sep_idx: usize,
        out: &mut Vec<(usize, usize)>,
    ) {
        if char_len(&text[start..end]) <= self.chunk_size {
            out.push((start, end));
            return;
        }

        // Advance to the first remaining separator that actually splits
        // this region; the empty separator falls through to a hard split.
        let mut idx = sep_idx;
        let cuts = loop {
            if idx >= self.separators.len() || self.separators[idx].is_empty() {
                break Vec::new();
            }
            let cuts = find_cuts(&text[start..end], self.separators[idx], start);
            if !cuts.is_empty() {
                break cuts;
            }
            idx += 1;
        };

        if cuts.is_empty() {
            self.hard_split(text, start, end, out);
            return;
        }

        let mut bounds = Vec::with_capacity(cuts.len() + 2);
        bounds.push(start);
        bounds.extend(cuts);
        bounds.push(end);

        let mut acc_start = start;
        let mut acc_len = 0usize;
        for window in bounds.windows(2) {
            let (piece_start, piece_end) = (window[0], window[1]);
            let piece_len = char_len(&text[piece_start..piece_end]);

            if piece_len > self.chunk_size {
                if acc_len > 0 {
                    out.push((acc_start, piece_start));
                }
                self.split_region(text, piece_start, piece_end, idx + 1, out);
                acc_start = piece_end;
                acc_len = 0;
            } else if acc_len > 0 && acc_len + piece_len > self.chunk_size {
                out.push((acc_start, piece_start));
                acc_start = piece_start;
                acc_len = piece_len;
            } else {
                if acc_len == 0 {
                    acc_start = piece_start;
                }
                acc_len += piece_len;
            }
        }
        if acc_len > 0 {
            out.push((acc_start, end));
        }
    }

    /// Last resort: split at character boundaries every `chunk_size` chars.
    fn hard_split(&self, text: &str, start: usize, end: usize, out: &mut Vec<(usize, usize)>) {
        let mut from = start;
        let mut count = 0usize;
        for (offset, _) in text[start..end].char_indices() {
            if count == self.chunk_size {
                out.push((from, start + offset));
                from = start + offset;
                count = 0;
            }
            count += 1;
        }
        if from < end {
            out.push((from, end));
        }
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Byte positions where `sep` occurs inside `region`, excluding position
/// zero, shifted by `offset` into the full text.
fn find_cuts(region: &str, sep: &str, offset: usize) -> Vec<usize> {
    let mut cuts = Vec::new();
    let mut from = 0usize;
    while let Some(pos) = region[from..].find(sep) {
        let abs = from + pos;
        if abs > 0 {
            cuts.push(offset + abs);
        }
        from = abs + sep.len();
    }
    cuts
}

/// Move `pos` backwards by up to `chars` characters, staying on a char
/// boundary.
fn back_up_chars(text: &str, pos: usize, chars: usize) -> usize {
    let mut p = pos;
    for _ in 0..chars {
        if p == 0 {
            break;
        }
        p -= 1;
        while p > 0 && !text.is_char_boundary(p) {
            p -= 1;
        }
    }
    p
}
