// Segment Merge Engine
// Normalizes raw AI-likely spans into render-ready runs

use crate::models::Segment;

/// A normalized span: clamped to the text, non-overlapping with its
/// neighbors, carrying the maximum probability of the raw segments it
/// subsumes. Produced only by [`merge_segments`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MergedSegment {
    pub start: usize,
    pub end: usize,
    pub prob_ai: f64,
}

/// One run of a partitioned text, either plain or flagged as AI-likely.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TextRun<'a> {
    Plain { text: &'a str },
    Flagged { text: &'a str, prob_ai: f64 },
}

impl<'a> TextRun<'a> {
    pub fn text(&self) -> &'a str {
        match self {
            TextRun::Plain { text } => text,
            TextRun::Flagged { text, .. } => text,
        }
    }

    pub fn is_flagged(&self) -> bool {
        matches!(self, TextRun::Flagged { .. })
    }
}

/// Merge raw spans into a sorted, non-overlapping partition of `[0, text_len]`.
///
/// Offsets are clamped independently into `[0, text_len]`; spans that are
/// zero-width or inverted after clamping are dropped. Overlapping or touching
/// spans collapse into one, keeping the maximum `prob_ai` of the
/// contributors. Deterministic and idempotent.
pub fn merge_segments(segments: &[Segment], text_len: usize) -> Vec<MergedSegment> {
    let limit = text_len.min(i64::MAX as usize) as i64;

    let mut normalized: Vec<MergedSegment> = segments
        .iter()
        .filter_map(|seg| {
            let start = (seg.start as i64).clamp(0, limit) as usize;
            let end = (seg.end as i64).clamp(0, limit) as usize;
            (end > start).then_some(MergedSegment {
                start,
                end,
                prob_ai: seg.prob_ai,
            })
        })
        .collect();
    // Stable sort keeps input order for equal starts.
    normalized.sort_by_key(|seg| seg.start);

    let mut merged: Vec<MergedSegment> = Vec::with_capacity(normalized.len());
    for seg in normalized {
        match merged.last_mut() {
            Some(last) if seg.start <= last.end => {
                last.end = last.end.max(seg.end);
                last.prob_ai = last.prob_ai.max(seg.prob_ai);
            }
            _ => merged.push(seg),
        }
    }
    merged
}

/// Split `text` into alternating plain/flagged runs covering the whole
/// string exactly once, with no empty runs.
///
/// `merged` must come from [`merge_segments`] called with `text.len()`.
/// Offsets are UTF-8 byte offsets and must lie on char boundaries.
pub fn partition_text<'a>(text: &'a str, merged: &[MergedSegment]) -> Vec<TextRun<'a>> {
    let mut runs: Vec<TextRun<'a>> = Vec::with_capacity(merged.len() * 2 + 1);
    let mut cursor = 0usize;

    for seg in merged {
        if cursor < seg.start {
            runs.push(TextRun::Plain {
                text: &text[cursor..seg.start],
            });
        }
        runs.push(TextRun::Flagged {
            text: &text[seg.start..seg.end],
            prob_ai: seg.prob_ai,
        });
        cursor = seg.end;
    }
    if cursor < text.len() {
        runs.push(TextRun::Plain {
            text: &text[cursor..],
        });
    }
    runs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(start: i32, end: i32, prob_ai: f64) -> Segment {
        Segment { start, end, prob_ai }
    }

    fn assert_invariants(merged: &[MergedSegment], text_len: usize) {
        for seg in merged {
            assert!(seg.start < seg.end, "start < end violated: {:?}", seg);
            assert!(seg.end <= text_len, "end within bounds violated: {:?}", seg);
        }
        for pair in merged.windows(2) {
            assert!(
                pair[1].start > pair[0].end,
                "ordering/overlap violated: {:?}",
                pair
            );
        }
    }

    #[test]
    fn test_merge_overlapping_keeps_max_prob() {
        let merged = merge_segments(&[seg(0, 5, 0.9), seg(3, 8, 0.4), seg(20, 25, 0.7)], 25);
        assert_eq!(
            merged,
            vec![
                MergedSegment { start: 0, end: 8, prob_ai: 0.9 },
                MergedSegment { start: 20, end: 25, prob_ai: 0.7 },
            ]
        );
        assert_invariants(&merged, 25);
    }

    #[test]
    fn test_merge_clamps_out_of_bounds() {
        let merged = merge_segments(&[seg(-3, 10, 0.6)], 5);
        assert_eq!(merged, vec![MergedSegment { start: 0, end: 5, prob_ai: 0.6 }]);
    }

    #[test]
    fn test_merge_drops_zero_width() {
        assert!(merge_segments(&[seg(10, 10, 0.8)], 20).is_empty());
        // Inverted after clamping is dropped too.
        assert!(merge_segments(&[seg(9, 3, 0.8)], 20).is_empty());
        assert!(merge_segments(&[seg(25, 30, 0.8)], 20).is_empty());
    }

    #[test]
    fn test_merge_unsorted_input() {
        let merged = merge_segments(&[seg(20, 25, 0.7), seg(3, 8, 0.4), seg(0, 5, 0.9)], 25);
        assert_eq!(
            merged,
            vec![
                MergedSegment { start: 0, end: 8, prob_ai: 0.9 },
                MergedSegment { start: 20, end: 25, prob_ai: 0.7 },
            ]
        );
    }

    #[test]
    fn test_merge_touching_spans_collapse() {
        let merged = merge_segments(&[seg(0, 5, 0.3), seg(5, 9, 0.8)], 20);
        assert_eq!(merged, vec![MergedSegment { start: 0, end: 9, prob_ai: 0.8 }]);
    }

    #[test]
    fn test_merge_preserves_union_of_ranges() {
        let merged = merge_segments(
            &[seg(1, 4, 0.5), seg(2, 6, 0.2), seg(8, 12, 0.9), seg(-2, 1, 0.1)],
            10,
        );
        // Union of clamped inputs: [0,6) and [8,10).
        assert_eq!(
            merged,
            vec![
                MergedSegment { start: 0, end: 6, prob_ai: 0.5 },
                MergedSegment { start: 8, end: 10, prob_ai: 0.9 },
            ]
        );
        assert_invariants(&merged, 10);
    }

    #[test]
    fn test_merge_is_idempotent() {
        let input = [seg(7, 30, 0.2), seg(0, 5, 0.9), seg(3, 8, 0.4), seg(20, 25, 0.7)];
        let once = merge_segments(&input, 25);
        let back: Vec<Segment> = once
            .iter()
            .map(|m| seg(m.start as i32, m.end as i32, m.prob_ai))
            .collect();
        let twice = merge_segments(&back, 25);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_merge_empty_input() {
        assert!(merge_segments(&[], 100).is_empty());
        assert!(merge_segments(&[seg(0, 5, 0.9)], 0).is_empty());
    }

    #[test]
    fn test_partition_covers_text_exactly_once() {
        let text = "0123456789abcdefghijklmno";
        let merged = merge_segments(&[seg(0, 5, 0.9), seg(3, 8, 0.4), seg(20, 25, 0.7)], text.len());
        let runs = partition_text(text, &merged);

        assert_eq!(
            runs,
            vec![
                TextRun::Flagged { text: "01234567", prob_ai: 0.9 },
                TextRun::Plain { text: "89abcdefghij" },
                TextRun::Flagged { text: "klmno", prob_ai: 0.7 },
            ]
        );
        let rebuilt: String = runs.iter().map(|r| r.text()).collect();
        assert_eq!(rebuilt, text);
        assert!(runs.iter().all(|r| !r.text().is_empty()));
    }

    #[test]
    fn test_partition_no_segments() {
        let runs = partition_text("plain text", &[]);
        assert_eq!(runs, vec![TextRun::Plain { text: "plain text" }]);
    }

    #[test]
    fn test_partition_full_cover() {
        let merged = merge_segments(&[seg(0, 5, 0.8)], 5);
        let runs = partition_text("abcde", &merged);
        assert_eq!(runs, vec![TextRun::Flagged { text: "abcde", prob_ai: 0.8 }]);
    }

    #[test]
    fn test_partition_leading_plain() {
        let merged = merge_segments(&[seg(3, 5, 0.8)], 5);
        let runs = partition_text("abcde", &merged);
        assert_eq!(
            runs,
            vec![
                TextRun::Plain { text: "abc" },
                TextRun::Flagged { text: "de", prob_ai: 0.8 },
            ]
        );
    }
}
