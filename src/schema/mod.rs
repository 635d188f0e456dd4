pub mod element;
pub mod lexicon;
pub mod phonetic;
pub mod request;
pub mod result;
