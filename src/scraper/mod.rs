pub mod fetcher;
pub mod patchnotes;
pub mod traits;

pub use fetcher::{FetchClient, FetchOptions};
pub use patchnotes::PatchNoteScraper;
pub use traits::Fetcher;
