mod chunking;
mod pdf;

pub use chunking::{Chunk, DocumentChunking};
pub use pdf::{extract_pdf_pages, split_pages, validate_upload, DocumentError, Page};
