use crate::chunk::{Chunk, ChunkMetadata, Chunker, FixedSizeChunker};

/// Paragraph chunker - packs whole paragraphs up to a size limit
///
/// Good for: match reports, season reviews, player profiles
///
/// - `max_size`: upper bound in characters; paragraphs longer than this are
///   cut into fixed windows
/// - `overlap`: a trailing paragraph no longer than this is repeated at the
///   start of the next chunk
///
/// Chunk position is the index of the chunk's first paragraph.
#[derive(Debug, Clone)]
pub struct ParagraphChunker {
    pub max_size: usize,
    pub overlap: usize,
}

impl Default for ParagraphChunker {
    fn default() -> Self {
        Self {
            max_size: 1024,
            overlap: 200,
        }
    }
}

/// Paragraphs accumulated for the chunk being built.
struct Pending<'a> {
    start: usize,
    parts: Vec<&'a str>,
    len: usize,
    // number of leading parts carried over from the previous chunk
    carried: usize,
}

impl<'a> Pending<'a> {
    fn new() -> Self {
        Self {
            start: 0,
            parts: Vec::new(),
            len: 0,
            carried: 0,
        }
    }

    fn joined_len_with(&self, next: usize) -> usize {
        if self.parts.is_empty() {
            next
        } else {
            self.len + 2 + next
        }
    }

    fn push(&mut self, index: usize, paragraph: &'a str, size: usize) {
        if self.parts.is_empty() {
            self.start = index;
        }
        self.len = self.joined_len_with(size);
        self.parts.push(paragraph);
    }

    fn has_new_content(&self) -> bool {
        self.parts.len() > self.carried
    }
}

impl Chunker for ParagraphChunker {
    fn name(&self) -> &str {
        "paragraph"
    }

    fn chunk(&self, content: &str, mut metadata: ChunkMetadata) -> Vec<Chunk> {
        let max_size = self.max_size.max(1);
        let mut pieces: Vec<(usize, String)> = Vec::new();
        let mut pending = Pending::new();

        for (index, paragraph) in Paragraphs::from(content).enumerate() {
            let size = paragraph.chars().count();

            if size > max_size {
                flush(&mut pending, &mut pieces, 0);
                let splitter = FixedSizeChunker {
                    chunk_size: max_size,
                    overlap: self.overlap,
                };
                for (_, window) in splitter.windows(paragraph) {
                    pieces.push((index, window.to_string()));
                }
                continue;
            }

            if pending.joined_len_with(size) > max_size {
                if pending.has_new_content() {
                    flush(&mut pending, &mut pieces, self.overlap);
                } else {
                    // only carried overlap is buffered; drop it rather than emit a duplicate
                    pending = Pending::new();
                }
                if pending.joined_len_with(size) > max_size {
                    pending = Pending::new();
                }
            }
            pending.push(index, paragraph, size);
        }
        if pending.has_new_content() {
            flush(&mut pending, &mut pieces, 0);
        }

        metadata.total_chunks = Some(pieces.len());
        pieces
            .into_iter()
            .enumerate()
            .map(|(ordinal, (position, text))| {
                let mut m = metadata.clone();
                m.position = position;
                Chunk::new(ordinal, text, m)
            })
            .collect()
    }
}

/// Emit the pending paragraphs as one chunk, keeping the last paragraph as
/// overlap when it fits in `overlap` characters.
fn flush<'a>(pending: &mut Pending<'a>, pieces: &mut Vec<(usize, String)>, overlap: usize) {
    if !pending.has_new_content() {
        *pending = Pending::new();
        return;
    }

    pieces.push((pending.start, pending.parts.join("\n\n")));

    let last_index = pending.start + pending.parts.len() - 1;
    let carry = pending
        .parts
        .last()
        .copied()
        .filter(|p| pending.parts.len() > 1 && p.chars().count() <= overlap);

    *pending = Pending::new();
    if let Some(paragraph) = carry {
        pending.push(last_index, paragraph, paragraph.chars().count());
        pending.carried = 1;
    }
}

/// Iterator over the paragraphs of a text: runs of non-blank lines separated
/// by one or more blank lines. Trailing whitespace is trimmed.
struct Paragraphs<'a> {
    rest: &'a str,
}

impl<'a> Paragraphs<'a> {
    fn from(s: &'a str) -> Self {
        Self { rest: s }
    }
}

impl<'a> Iterator for Paragraphs<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        // skip blank lines
        loop {
            if self.rest.is_empty() {
                return None;
            }
            let (line, rest) = split_first_line(self.rest);
            if !line.trim().is_empty() {
                break;
            }
            self.rest = rest;
        }

        let s = self.rest;
        let mut len = 0;
        while len < s.len() {
            let (line, _) = split_first_line(&s[len..]);
            if line.trim().is_empty() {
                break;
            }
            len += line.len();
        }

        self.rest = &s[len..];
        Some(s[..len].trim_end())
    }
}

fn split_first_line(s: &str) -> (&str, &str) {
    let len = match s.find('\n') {
        Some(i) => i + 1,
        None => s.len(),
    };
    s.split_at(len)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta() -> ChunkMetadata {
        ChunkMetadata::default()
    }

    fn chunker(max_size: usize, overlap: usize) -> ParagraphChunker {
        ParagraphChunker { max_size, overlap }
    }

    #[test]
    fn test_single_paragraph() {
        let chunks = chunker(1000, 0).chunk("This is a single paragraph.", meta());

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, "This is a single paragraph.");
    }

    #[test]
    fn test_small_paragraphs_packed_together() {
        let content = "First paragraph.\n\nSecond paragraph.\n\nThird paragraph.";
        let chunks = chunker(1000, 0).chunk(content, meta());

        assert_eq!(chunks.len(), 1);
        assert_eq!(
            chunks[0].content,
            "First paragraph.\n\nSecond paragraph.\n\nThird paragraph."
        );
    }

    #[test]
    fn test_max_size_splits_between_paragraphs() {
        // each paragraph is 16 chars; two joined are 34
        let content = "First paragraph.\n\nSecond paragrap.\n\nThird paragraph.";
        let chunks = chunker(20, 0).chunk(content, meta());

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].content, "First paragraph.");
        assert_eq!(chunks[1].content, "Second paragrap.");
        assert_eq!(chunks[2].content, "Third paragraph.");
        assert_eq!(chunks[2].metadata.position, 2);
    }

    #[test]
    fn test_overlap_carried_when_it_fits() {
        let content = "Half time.\n\nGoal.\n\nFull time.";
        let chunks = chunker(20, 10).chunk(content, meta());

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].content, "Half time.\n\nGoal.");
        assert_eq!(chunks[1].content, "Goal.\n\nFull time.");
        assert_eq!(chunks[1].metadata.position, 1);
    }

    #[test]
    fn test_oversized_paragraph_is_windowed() {
        let long = "x".repeat(25);
        let content = format!("Intro.\n\n{long}\n\nOutro.");
        let chunks = chunker(10, 0).chunk(&content, meta());

        let contents: Vec<_> = chunks.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(contents, vec!["Intro.", "xxxxxxxxxx", "xxxxxxxxxx", "xxxxx", "Outro."]);
        assert!(chunks.iter().all(|c| c.metadata.total_chunks == Some(5)));
        // identical windows from one paragraph still get distinct ids
        assert_ne!(chunks[1].id, chunks[2].id);
    }

    #[test]
    fn test_empty_content() {
        assert!(chunker(100, 0).chunk("", meta()).is_empty());
    }

    #[test]
    fn test_whitespace_only() {
        assert!(chunker(100, 0).chunk("\n\n\n   \n\n", meta()).is_empty());
    }

    #[test]
    fn test_paragraphs_iterator() {
        let content = "\n\nPara one.\nStill one.\n\n\nPara two.  \n   \nPara three.";
        let paras: Vec<_> = Paragraphs::from(content).collect();

        assert_eq!(paras, vec!["Para one.\nStill one.", "Para two.", "Para three."]);
    }

    #[test]
    fn test_unique_ids() {
        let content = "First unique paragraph.\n\nSecond unique paragraph.";
        let chunks = chunker(25, 0).chunk(content, meta());

        assert_eq!(chunks.len(), 2);
        assert_ne!(chunks[0].id, chunks[1].id);
    }
}
