pub mod deduplicator;
pub mod entities;
pub mod errors;
pub mod markup;
pub mod url_normalizer;
pub mod value_objects;
