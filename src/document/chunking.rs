use super::pdf::Page;
use crate::config::ChunkingParams;

const SEPARATOR: &str = "\n\n";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub text: String,
    /// Page of the first paragraph that opened this chunk.
    pub page: usize,
    pub index: usize,
}

/// Packs paragraphs into chunks of at most `chunk_size` characters. Each chunk
/// after the first is seeded with the tail of its predecessor, shortened when
/// the full overlap would not fit next to the incoming paragraph.
#[derive(Debug, Clone, Copy)]
pub struct DocumentChunking {
    chunk_size: usize,
    overlap: usize,
}

struct Piece<'a> {
    text: &'a str,
    page: usize,
}

impl DocumentChunking {
    pub fn new(params: ChunkingParams) -> Self {
        let chunk_size = params.chunk_size.max(1);
        Self {
            chunk_size,
            overlap: params.overlap.min(chunk_size - 1),
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    pub fn chunk(&self, pages: &[Page]) -> Vec<Chunk> {
        let paragraphs: Vec<(String, usize)> = pages
            .iter()
            .flat_map(|page| {
                page.text
                    .split(SEPARATOR)
                    .map(normalize)
                    .filter(|p| !p.is_empty())
                    .map(move |p| (p, page.number))
            })
            .collect();

        let pieces: Vec<Piece<'_>> = paragraphs
            .iter()
            .flat_map(|(text, page)| {
                split_chars(text, self.chunk_size)
                    .into_iter()
                    .map(move |text| Piece { text, page: *page })
            })
            .collect();

        let mut chunks = Vec::new();
        let mut current = String::new();
        let mut current_page = 0;
        let mut has_new_content = false;

        for piece in pieces {
            let piece_len = piece.text.chars().count();

            if has_new_content
                && char_len(&current) + SEPARATOR.len() + piece_len > self.chunk_size
            {
                let tail = tail_chars(&current, self.overlap).to_string();
                chunks.push(Chunk {
                    text: std::mem::take(&mut current),
                    page: current_page,
                    index: chunks.len(),
                });

                let room = self.chunk_size.saturating_sub(piece_len + SEPARATOR.len());
                current = tail_chars(&tail, room.min(self.overlap)).to_string();
                has_new_content = false;
            }

            if !has_new_content {
                current_page = piece.page;
            }
            if !current.is_empty() {
                current.push_str(SEPARATOR);
            }
            current.push_str(piece.text);
            has_new_content = true;
        }

        if has_new_content {
            chunks.push(Chunk {
                text: current,
                page: current_page,
                index: chunks.len(),
            });
        }

        chunks
    }
}

fn normalize(paragraph: &str) -> String {
    paragraph.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn split_chars(text: &str, size: usize) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut count = 0;
    for (i, _) in text.char_indices() {
        if count == size {
            parts.push(&text[start..i]);
            start = i;
            count = 0;
        }
        count += 1;
    }
    if start < text.len() {
        parts.push(&text[start..]);
    }
    parts
}

fn tail_chars(s: &str, n: usize) -> &str {
    if n == 0 {
        return "";
    }
    match s.char_indices().rev().nth(n - 1) {
        Some((i, _)) => &s[i..],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunker(chunk_size: usize, overlap: usize) -> DocumentChunking {
        DocumentChunking::new(ChunkingParams { chunk_size, overlap })
    }

    fn page(number: usize, text: &str) -> Page {
        Page { number, text: text.to_string() }
    }

    #[test]
    fn test_small_document_is_one_chunk() {
        let chunks = chunker(1000, 200).chunk(&[page(1, "Clause 1.\n\nClause 2.")]);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "Clause 1.\n\nClause 2.");
        assert_eq!(chunks[0].page, 1);
        assert_eq!(chunks[0].index, 0);
    }

    #[test]
    fn test_empty_document_has_no_chunks() {
        assert!(chunker(100, 10).chunk(&[page(1, "  \n\n \n")]).is_empty());
        assert!(chunker(100, 10).chunk(&[]).is_empty());
    }

    #[test]
    fn test_chunks_carry_overlap() {
        let text = "aaaaaaaaaa\n\nbbbbbbbbbb\n\ncccccccccc";
        let chunks = chunker(24, 4).chunk(&[page(1, text)]);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].text, "aaaaaaaaaa\n\nbbbbbbbbbb");
        assert_eq!(chunks[1].text, "bbbb\n\ncccccccccc");
        assert_eq!(chunks[1].index, 1);
        assert!(chunks.iter().all(|c| c.text.chars().count() <= 24));
    }

    #[test]
    fn test_long_paragraph_is_hard_split() {
        let text = "x".repeat(25);
        let chunks = chunker(10, 3).chunk(&[page(2, &text)]);
        assert!(chunks.iter().all(|c| c.text.chars().count() <= 10));
        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c.page == 2));
    }

    #[test]
    fn test_page_numbers_follow_paragraphs() {
        let chunks = chunker(12, 1).chunk(&[page(1, "first page"), page(2, "second page")]);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].page, 1);
        assert_eq!(chunks[1].page, 2);
    }

    #[test]
    fn test_overlap_clamped_below_chunk_size() {
        let chunking = chunker(5, 200);
        assert_eq!(chunking.overlap(), 4);
        assert_eq!(chunker(1, 1).overlap(), 0);
    }

    #[test]
    fn test_multibyte_text() {
        let text = "§§§§§§\n\nüüüüüü";
        let chunks = chunker(8, 2).chunk(&[page(1, text)]);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].text, "§§§§§§");
        assert!(chunks.iter().all(|c| c.text.chars().count() <= 8));
    }

    #[test]
    fn test_helpers() {
        assert_eq!(tail_chars("abcdef", 2), "ef");
        assert_eq!(tail_chars("ab", 5), "ab");
        assert_eq!(tail_chars("ab", 0), "");
        assert_eq!(split_chars("abcde", 2), vec!["ab", "cd", "e"]);
        assert_eq!(normalize("  a \n b  "), "a b");
    }
}
