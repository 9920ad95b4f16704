//! Word-bounded, overlapping text chunking

/// Default chunk budget in characters
pub const CHUNK_SIZE: usize = 5000;

/// Default number of words carried over from the previous chunk
pub const CHUNK_OVERLAP: usize = 200;

/// Splits text into overlapping, word-bounded chunks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunker {
    /// Max joined length of a chunk, in characters
    chunk_size: usize,

    /// Words repeated at the start of the next chunk
    overlap: usize,
}

impl Default for Chunker {
    fn default() -> Self {
        Self::new(CHUNK_SIZE, CHUNK_OVERLAP)
    }
}

impl Chunker {
    /// Create chunker with a character budget and a word overlap
    pub fn new(chunk_size: usize, overlap: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            overlap,
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Split text into chunks
    ///
    /// Words are joined with single spaces. A chunk is sealed when the next word
    /// would push its joined length past the budget, and the next chunk opens with
    /// the sealed chunk's last `overlap` words. A single word longer than the
    /// budget is never split and forms an oversized chunk of its own.
    pub fn chunk(&self, text: &str) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut current: Vec<&str> = Vec::new();
        let mut current_len = 0;

        for word in text.split_whitespace() {
            let word_len = word.chars().count();

            if !current.is_empty() && current_len + 1 + word_len > self.chunk_size {
                chunks.push(current.join(" "));

                let keep_from = current.len().saturating_sub(self.overlap);
                current.drain(..keep_from);
                current_len = joined_len(&current);

                // Shrink the carried overlap if it leaves no room for the word
                while !current.is_empty() && current_len + 1 + word_len > self.chunk_size {
                    let dropped = current.remove(0).chars().count();
                    current_len = if current.is_empty() {
                        0
                    } else {
                        current_len - dropped - 1
                    };
                }
            }

            current_len = if current.is_empty() {
                word_len
            } else {
                current_len + 1 + word_len
            };
            current.push(word);
        }

        if !current.is_empty() {
            chunks.push(current.join(" "));
        }

        chunks
    }
}

fn joined_len(words: &[&str]) -> usize {
    if words.is_empty() {
        return 0;
    }
    words.iter().map(|w| w.chars().count()).sum::<usize>() + words.len() - 1
}

/// Split text using the default budget and overlap
pub fn chunk_text(text: &str) -> Vec<String> {
    Chunker::default().chunk(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered_words(count: usize) -> String {
        (0..count)
            .map(|i| format!("{:04}", i))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn words(text: &str) -> Vec<&str> {
        text.split_whitespace().collect()
    }

    #[test]
    fn test_chunk_empty_text() {
        assert!(chunk_text("").is_empty());
        assert!(chunk_text("  \n\t ").is_empty());
    }

    #[test]
    fn test_chunk_short_text() {
        let text = "  This is\na short   text.\t";
        let chunks = chunk_text(text);
        assert_eq!(chunks, vec!["This is a short text.".to_string()]);
    }

    #[test]
    fn test_chunk_exactly_at_budget() {
        // 1000 four-digit words joined by spaces = 4999 chars
        let text = numbered_words(1000);
        let chunks = chunk_text(&text);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0], text);
    }

    #[test]
    fn test_chunk_long_text_scenario() {
        let text = numbered_words(2400);
        assert_eq!(text.len(), 11_999);

        let chunks = chunk_text(&text);
        assert_eq!(chunks.len(), 3);

        for chunk in &chunks {
            assert!(chunk.chars().count() <= CHUNK_SIZE);
        }
        assert_eq!(chunks[0].len(), 4999);
        assert!(chunks[2].len() < chunks[1].len());

        for pair in chunks.windows(2) {
            let prev = words(&pair[0]);
            let next = words(&pair[1]);
            let tail = &prev[prev.len() - CHUNK_OVERLAP..];
            assert_eq!(&next[..CHUNK_OVERLAP], tail);
        }

        // Last chunk ends with the last word of the document
        assert!(chunks[2].ends_with("2399"));
    }

    #[test]
    fn test_chunk_covers_every_word_in_order() {
        let text = numbered_words(300);
        let chunker = Chunker::new(200, 5);
        let chunks = chunker.chunk(&text);
        assert!(chunks.len() > 1);

        let mut rebuilt: Vec<&str> = words(&chunks[0]);
        for chunk in &chunks[1..] {
            rebuilt.extend(words(chunk).into_iter().skip(5));
        }
        assert_eq!(rebuilt, words(&text));
    }

    #[test]
    fn test_chunk_overlap_shrinks_to_fit() {
        // Overlap of 3 long words cannot fit next to another long word
        let chunker = Chunker::new(20, 3);
        let chunks = chunker.chunk("aaaaaaaaa bbbbbbbbb ccccccccc ddddddddd");
        assert_eq!(
            chunks,
            vec![
                "aaaaaaaaa bbbbbbbbb".to_string(),
                "bbbbbbbbb ccccccccc".to_string(),
                "ccccccccc ddddddddd".to_string(),
            ]
        );
        for chunk in &chunks {
            assert!(chunk.len() <= 20);
        }
    }

    #[test]
    fn test_chunk_oversized_word() {
        let chunker = Chunker::new(5, 1);
        let chunks = chunker.chunk("ab abcdefghij cd");
        assert_eq!(chunks, vec!["ab", "abcdefghij", "cd"]);
    }

    #[test]
    fn test_chunk_zero_overlap() {
        let chunker = Chunker::new(9, 0);
        let chunks = chunker.chunk("one two three four");
        assert_eq!(chunks, vec!["one two", "three", "four"]);
    }

    #[test]
    fn test_chunk_is_deterministic() {
        let text = numbered_words(1500);
        let chunker = Chunker::new(1000, 20);
        assert_eq!(chunker.chunk(&text), chunker.chunk(&text));
    }
}
