//! Text normalization: URL/punctuation stripping, word segmentation, stopwords

pub mod normalizer;
pub mod segmenter;
pub mod stopwords;

pub use normalizer::Normalizer;
pub use segmenter::WordSegmenter;
pub use stopwords::{is_stopword, STOPWORDS};
