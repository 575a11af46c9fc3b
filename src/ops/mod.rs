pub mod chroma_key;
pub mod pose;
