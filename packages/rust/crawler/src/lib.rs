//! Site link discovery.
//!
//! This crate provides:
//! - [`SitemapCrawler`]: recursive, depth-bounded sitemap crawling
//! - [`extract_links`]: hyperlink scanning over page content
//! - [`title_from_url`]: readable titles for bare URLs

pub mod links;
pub mod sitemap;
pub mod title;

pub use links::extract_links;
pub use sitemap::{SitemapCrawler, extract_locs, looks_like_sitemap};
pub use title::{last_segment, title_from_url};
