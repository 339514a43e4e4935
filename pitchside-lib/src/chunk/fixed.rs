use crate::chunk::{Chunk, ChunkMetadata, Chunker};

/// Fixed-size chunker - splits by character count
///
/// Good for: stat tables, CSV exports, anything without paragraph structure
///
/// Windows advance by `chunk_size - overlap` characters and stop at the
/// first window that reaches the end of the content.
#[derive(Debug, Clone)]
pub struct FixedSizeChunker {
    pub chunk_size: usize,
    pub overlap: usize,
}

impl FixedSizeChunker {
    /// Split `content` into `(char_offset, window)` pairs.
    pub(crate) fn windows<'a>(&self, content: &'a str) -> Vec<(usize, &'a str)> {
        let offsets: Vec<usize> = content.char_indices().map(|(i, _)| i).collect();
        let n = offsets.len();
        let byte_at = |i: usize| offsets.get(i).copied().unwrap_or(content.len());

        let size = self.chunk_size.max(1);
        let stride = size.saturating_sub(self.overlap).max(1);

        let mut windows = Vec::with_capacity(n.div_ceil(stride));
        let mut start = 0;
        while start < n {
            let end = (start + size).min(n);
            windows.push((start, &content[byte_at(start)..byte_at(end)]));
            if end == n {
                break;
            }
            start += stride;
        }
        windows
    }
}

impl Chunker for FixedSizeChunker {
    fn name(&self) -> &str {
        "fixed"
    }

    fn chunk(&self, content: &str, mut metadata: ChunkMetadata) -> Vec<Chunk> {
        if content.trim().is_empty() {
            return Vec::new();
        }

        let windows = self.windows(content);
        metadata.total_chunks = Some(windows.len());

        windows
            .into_iter()
            .enumerate()
            .map(|(ordinal, (offset, text))| {
                let mut m = metadata.clone();
                m.position = offset;
                Chunk::new(ordinal, text, m)
            })
            .collect()
    }
}
