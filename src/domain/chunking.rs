//! Overlapping fixed-size text windows.
//!
//! Each window is at most `chunk_size` characters. It ends after the
//! largest separator found in it (paragraph, line, sentence, word), or is
//! cut hard when the window holds none. The next window starts
//! `chunk_overlap` characters before the previous end, moved forward to the
//! next word start where one exists, so neighbours always share text.

use crate::domain::{Document, DocumentChunk, DomainError, Result};

pub const DEFAULT_CHUNK_SIZE: usize = 500;
pub const DEFAULT_CHUNK_OVERLAP: usize = 50;
pub const DEFAULT_SEPARATORS: [&str; 4] = ["\n\n", "\n", ". ", " "];

#[derive(Debug, Clone)]
pub struct TextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<String>,
}

impl TextSplitter {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(DomainError::validation("chunk_size must be greater than 0"));
        }
        if chunk_overlap >= chunk_size {
            return Err(DomainError::validation(format!(
                "chunk_overlap ({chunk_overlap}) must be smaller than chunk_size ({chunk_size})"
            )));
        }

        Ok(Self {
            chunk_size,
            chunk_overlap,
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    pub fn split_documents(&self, documents: &[Document]) -> Vec<DocumentChunk> {
        documents
            .iter()
            .flat_map(|doc| self.split_document(doc))
            .collect()
    }

    pub fn split_document(&self, document: &Document) -> Vec<DocumentChunk> {
        let source = document.source.to_string_lossy().into_owned();
        self.split_text(&document.text)
            .into_iter()
            .enumerate()
            .map(|(index, content)| DocumentChunk::new(source.clone(), content, index))
            .collect()
    }

    pub fn split_text(&self, text: &str) -> Vec<String> {
        if text.is_empty() {
            return Vec::new();
        }

        let chars: Vec<char> = text.chars().collect();
        if chars.len() <= self.chunk_size {
            return vec![text.to_string()];
        }

        // Byte offset of every char index, including one past the end.
        let offsets: Vec<usize> = text
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(text.len()))
            .collect();

        let total = chars.len();
        let mut chunks = Vec::new();
        let mut start = 0;

        loop {
            if total - start <= self.chunk_size {
                chunks.push(text[offsets[start]..].to_string());
                break;
            }

            let end = self.find_break(text, &offsets, start);
            chunks.push(text[offsets[start]..offsets[end]].to_string());
            start = self.next_start(&chars, start, end);
        }

        chunks
    }

    /// Char index where the window starting at `start` ends. Always leaves
    /// more than `chunk_overlap` characters so the next window advances.
    fn find_break(&self, text: &str, offsets: &[usize], start: usize) -> usize {
        let limit = start + self.chunk_size;
        let min_end = start + self.chunk_overlap + 1;
        let window = &text[offsets[start]..offsets[limit]];

        for separator in &self.separators {
            if let Some(pos) = window.rfind(separator.as_str()) {
                let end_byte = offsets[start] + pos + separator.len();
                let end = offsets.binary_search(&end_byte).unwrap_or_else(|i| i);
                if end >= min_end {
                    return end;
                }
            }
        }

        limit
    }

    fn next_start(&self, chars: &[char], start: usize, end: usize) -> usize {
        if self.chunk_overlap == 0 {
            return end;
        }

        let candidate = end.saturating_sub(self.chunk_overlap).max(start + 1);
        let at_word_start =
            !chars[candidate].is_whitespace() && chars[candidate - 1].is_whitespace();
        if at_word_start {
            return candidate;
        }

        (candidate..end.saturating_sub(1))
            .find(|&i| chars[i].is_whitespace() && !chars[i + 1].is_whitespace())
            .map(|i| i + 1)
            .unwrap_or(candidate)
    }
}

impl Default for TextSplitter {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy_text(sentences: usize) -> String {
        let mut text = String::new();
        for i in 0..sentences {
            text.push_str(&format!(
                "Employees in team {i} receive {} vacation days per calendar year.",
                20 + i % 7
            ));
            if i % 12 == 11 {
                text.push_str("\n\n");
            } else if i % 5 == 4 {
                text.push('\n');
            } else {
                text.push(' ');
            }
        }
        text
    }

    fn char_len(s: &str) -> usize {
        s.chars().count()
    }

    /// Longest suffix of `a` that is also a prefix of `b`, up to `max` chars.
    fn shared_overlap(a: &str, b: &str, max: usize) -> usize {
        let a: Vec<char> = a.chars().collect();
        let b: Vec<char> = b.chars().collect();
        (1..=max.min(a.len()).min(b.len()))
            .rev()
            .find(|&k| a[a.len() - k..] == b[..k])
            .unwrap_or(0)
    }

    #[test]
    fn test_short_text_single_chunk() {
        let splitter = TextSplitter::default();
        let text = "Remote work is allowed two days per week.\n\nAsk your manager.";
        assert_eq!(splitter.split_text(text), vec![text.to_string()]);
    }

    #[test]
    fn test_text_of_exact_size_single_chunk() {
        let splitter = TextSplitter::new(10, 2).unwrap();
        assert_eq!(splitter.split_text("abcdefghij"), vec!["abcdefghij".to_string()]);
    }

    #[test]
    fn test_empty_text_no_chunks() {
        assert!(TextSplitter::default().split_text("").is_empty());
    }

    #[test]
    fn test_chunks_bounded_and_overlapping() {
        let splitter = TextSplitter::default();
        let text = policy_text(80);
        let chunks = splitter.split_text(&text);

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(char_len(chunk) <= DEFAULT_CHUNK_SIZE);
            assert!(text.contains(chunk.as_str()));
        }
        for pair in chunks.windows(2) {
            let shared = shared_overlap(&pair[0], &pair[1], DEFAULT_CHUNK_OVERLAP);
            assert!(shared > 0, "no overlap between {:?} and {:?}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_prefers_paragraph_break() {
        let splitter = TextSplitter::default();
        let first = "Laptops are replaced every three years. ".repeat(7);
        let second = "Phones are replaced every two years. ".repeat(10);
        let text = format!("{}\n\n{}", first.trim_end(), second.trim_end());

        let chunks = splitter.split_text(&text);
        assert_eq!(chunks[0], format!("{}\n\n", first.trim_end()));
    }

    #[test]
    fn test_prefers_sentence_over_word() {
        let splitter = TextSplitter::new(60, 10).unwrap();
        let text = "Badges must be worn at all times. Visitors sign in at the front desk and wait.";
        let chunks = splitter.split_text(text);
        assert_eq!(chunks[0], "Badges must be worn at all times. ");
    }

    #[test]
    fn test_hard_cut_without_separators() {
        let splitter = TextSplitter::default();
        let text = "x".repeat(1200);
        let chunks = splitter.split_text(&text);

        assert_eq!(chunks.len(), 3);
        assert_eq!(char_len(&chunks[0]), 500);
        assert_eq!(char_len(&chunks[1]), 500);
        assert_eq!(char_len(&chunks[2]), 300);
    }

    #[test]
    fn test_overlap_starts_on_word() {
        let splitter = TextSplitter::new(40, 12).unwrap();
        let text = "alpha beta gamma delta epsilon zeta eta theta iota kappa lambda mu";
        let chunks = splitter.split_text(text);

        for chunk in chunks.iter().skip(1) {
            let first_word = chunk.split_whitespace().next().unwrap();
            assert!(text.split_whitespace().any(|w| w == first_word));
        }
    }

    #[test]
    fn test_multibyte_text_counts_characters() {
        let splitter = TextSplitter::new(50, 5).unwrap();
        let text = "Ferientage für Mitarbeitende: fünfundzwanzig Tage. ".repeat(12);
        let chunks = splitter.split_text(&text);

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(char_len(chunk) <= 50);
        }
        for pair in chunks.windows(2) {
            assert!(shared_overlap(&pair[0], &pair[1], 5) > 0);
        }
    }

    #[test]
    fn test_zero_overlap_partitions_text() {
        let splitter = TextSplitter::new(30, 0).unwrap();
        let text = policy_text(6);
        let chunks = splitter.split_text(&text);
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(TextSplitter::new(0, 0).is_err());
        assert!(TextSplitter::new(100, 100).is_err());
        assert!(TextSplitter::new(100, 150).is_err());
        assert!(TextSplitter::new(100, 99).is_ok());
    }

    #[test]
    fn test_split_documents_keeps_sources_apart() {
        let splitter = TextSplitter::new(80, 10).unwrap();
        let docs = vec![
            Document::new("docs/it.txt", policy_text(4)),
            Document::new("docs/hr.txt", "Short HR note."),
        ];

        let chunks = splitter.split_documents(&docs);
        let it_chunks: Vec<_> = chunks.iter().filter(|c| c.source == "docs/it.txt").collect();
        let hr_chunks: Vec<_> = chunks.iter().filter(|c| c.source == "docs/hr.txt").collect();

        assert!(it_chunks.len() > 1);
        for (i, chunk) in it_chunks.iter().enumerate() {
            assert_eq!(chunk.chunk_index, i);
            assert!(docs[0].text.contains(chunk.content.as_str()));
        }
        assert_eq!(hr_chunks.len(), 1);
        assert_eq!(hr_chunks[0].content, "Short HR note.");
        assert_eq!(chunks.len(), it_chunks.len() + 1);
    }
}
