pub mod cache;

pub use cache::ResultCache;
