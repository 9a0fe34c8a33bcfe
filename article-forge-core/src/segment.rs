//! Splits long article text into display-sized segments.
//!
//! Lengths and cut positions are measured on a "plain" view of the text where
//! `**bold**` runs are collapsed to their inner text. The segments themselves keep
//! the original markup, and a cut never separates a `**` marker from its content.

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use crate::config::SegmentConfig;

/// One display chunk of the original text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Segment {
    pub text: String,
    /// Visible characters, emphasis markers excluded.
    pub plain_length: usize,
}

impl Segment {
    fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            plain_length: PlainView::new(text).len(),
        }
    }
}

/// Segments `text` with the default thresholds.
pub fn segment(text: &str) -> Vec<Segment> {
    segment_with(text, &SegmentConfig::default())
}

/// Segments `text` with explicit thresholds.
///
/// Text whose plain length is at or below `config.short_threshold` comes back as a
/// single, untouched segment. Whitespace-only input yields no segments.
pub fn segment_with(text: &str, config: &SegmentConfig) -> Vec<Segment> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    let connectives: Vec<Vec<char>> = config
        .connectives
        .iter()
        .filter(|c| !c.is_empty())
        .map(|c| c.chars().collect())
        .collect();

    let mut segments = Vec::new();
    let mut rest: &str = text;
    loop {
        let view = PlainView::new(rest);
        if view.len() <= config.short_threshold {
            segments.push(Segment::new(rest));
            break;
        }

        let plain_cut = find_cut(&view.chars, config, &connectives);
        let cut = view.to_original(plain_cut, config.min_cut);
        let (head, tail) = rest.split_at(cut);
        let head = head.trim();
        if !head.is_empty() {
            segments.push(Segment::new(head));
        }
        let tail = tail.trim();
        if tail.is_empty() {
            break;
        }
        rest = tail;
    }
    segments
}

/// Plain length of `text`: visible characters with `**` emphasis markers removed.
pub fn plain_length(text: &str) -> usize {
    PlainView::new(text).len()
}

/// Returns the plain-coordinate cut position, always at least 1 so the loop advances.
/// Caller guarantees `chars.len() > short_threshold`.
fn find_cut(chars: &[char], config: &SegmentConfig, connectives: &[Vec<char>]) -> usize {
    let len = chars.len();
    let last = len - 1;
    let lower = config.min_cut;

    let sentence_upper = config.extended_max_cut.min(last);
    if let Some(i) = (lower..=sentence_upper).find(|&i| chars[i] == '.') {
        return i + 1;
    }

    let upper = config.max_cut.min(last);
    if let Some(i) = (lower..=upper).find(|&i| chars[i] == ',') {
        return i + 1;
    }

    if let Some(i) = (lower..=upper).find(|&i| {
        connectives
            .iter()
            .any(|word| chars[i..].starts_with(word.as_slice()))
    }) {
        return i.max(1);
    }

    let from = config.space_scan_from.min(last);
    if from >= config.space_scan_to {
        if let Some(i) = (config.space_scan_to..=from)
            .rev()
            .find(|&i| chars[i].is_whitespace())
        {
            return i.max(1);
        }
    }

    config.forced_cut.min(last).max(1)
}

fn emphasis_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?s)\*\*(.+?)\*\*").expect("emphasis pattern is valid"))
}

/// Markdown-stripped view of a string with a mapping back to byte offsets.
struct PlainView<'a> {
    source: &'a str,
    chars: Vec<char>,
    /// Byte offset in `source` of each plain character.
    offsets: Vec<usize>,
    /// Byte ranges of whole `**…**` runs, markers included.
    runs: Vec<(usize, usize)>,
}

impl<'a> PlainView<'a> {
    fn new(source: &'a str) -> Self {
        let mut view = PlainView {
            source,
            chars: Vec::new(),
            offsets: Vec::new(),
            runs: Vec::new(),
        };
        let mut pos = 0;
        for caps in emphasis_pattern().captures_iter(source) {
            let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            view.push_range(pos, whole.start());
            view.push_range(inner.start(), inner.end());
            view.runs.push((whole.start(), whole.end()));
            pos = whole.end();
        }
        view.push_range(pos, source.len());
        view
    }

    fn push_range(&mut self, start: usize, end: usize) {
        for (offset, c) in self.source[start..end].char_indices() {
            self.chars.push(c);
            self.offsets.push(start + offset);
        }
    }

    fn len(&self) -> usize {
        self.chars.len()
    }

    /// Byte offset in the source for a cut before plain character `plain_cut`.
    ///
    /// A cut falling inside an emphasis run moves past its closing marker. When the
    /// run closes the text the cut moves in front of its opening marker, provided
    /// the head keeps at least `min_head` plain characters; otherwise the whole
    /// text is kept together and `source.len()` is returned.
    fn to_original(&self, plain_cut: usize, min_head: usize) -> usize {
        let candidate = match self.offsets.get(plain_cut) {
            Some(&offset) => offset,
            None => return self.source.len(),
        };
        match self
            .runs
            .iter()
            .find(|&&(start, end)| start < candidate && candidate < end)
        {
            None => candidate,
            Some(&(_, end)) if end < self.source.len() => end,
            Some(&(start, _)) if plain_length(self.source[..start].trim_end()) >= min_head.max(1) => {
                start
            }
            Some(_) => self.source.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_view_strips_emphasis_markers() {
        let view = PlainView::new("a **bold** word");
        assert_eq!(view.chars.iter().collect::<String>(), "a bold word");
        assert_eq!(view.runs, vec![(2, 10)]);
    }

    #[test]
    fn unpaired_markers_stay_visible() {
        assert_eq!(plain_length("5 ** 3"), 6);
    }

    #[test]
    fn cut_inside_run_moves_past_closing_marker() {
        let view = PlainView::new("ab **cdef** gh");
        // plain "ab cdef gh": index 5 is 'e', inside the run
        assert_eq!(view.to_original(5, 0), "ab **cdef**".len());
    }

    #[test]
    fn cut_in_trailing_run_moves_before_opening_marker() {
        let view = PlainView::new("ab **cdef**");
        assert_eq!(view.to_original(4, 2), 3);
    }

    #[test]
    fn short_head_before_trailing_run_keeps_text_together() {
        let view = PlainView::new("ab **cdef**");
        assert_eq!(view.to_original(4, 3), "ab **cdef**".len());
    }

    #[test]
    fn find_cut_never_returns_zero() {
        let config = SegmentConfig {
            min_cut: 0,
            short_threshold: 0,
            space_scan_to: 0,
            ..SegmentConfig::default()
        };
        let connectives = vec!["그리고".chars().collect::<Vec<_>>()];
        let chars: Vec<char> = "그리고 가나다".chars().collect();
        assert_eq!(find_cut(&chars, &config, &connectives), 1);
        assert_eq!(find_cut(&['a'], &config, &connectives), 1);
    }

    #[test]
    fn cut_at_first_inner_character_keeps_run_whole() {
        let view = PlainView::new("ab **cd** ef");
        // plain index 3 is 'c': the first inner character
        assert_eq!(view.to_original(3, 0), "ab **cd**".len());
    }

    #[test]
    fn multibyte_offsets_are_char_boundaries() {
        let view = PlainView::new("가나**다라**마");
        assert_eq!(view.len(), 5);
        assert_eq!(view.to_original(1, 0), "가".len());
        assert_eq!(view.to_original(4, 0), "가나**다라**".len());
    }
}
