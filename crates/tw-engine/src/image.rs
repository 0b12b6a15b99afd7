//! Image resolution collaborator.
//!
//! The engine does not read files or talk to the network. Hosts implement
//! [`ImageLoader`]: remote locators go through `fetch`, everything else is a
//! bundled asset name resolved by `named`.

use std::collections::HashMap;
use tw_core::{ImageContent, NodeIndex};

/// Trait for resolving image sources.
///
/// - Apps: network/disk fetch plus the asset catalog
/// - Tests: a `HashMap` of canned images
pub trait ImageLoader {
    /// Fetch a remote locator (`http://`, `https://`, `file://`).
    fn fetch(&self, locator: &str) -> Result<ImageContent, String>;

    /// Resolve a bundled asset by name.
    fn named(&self, name: &str) -> Option<ImageContent>;
}

/// Loader that resolves nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoImages;

impl ImageLoader for NoImages {
    fn fetch(&self, locator: &str) -> Result<ImageContent, String> {
        Err(format!("no image loader configured for {locator}"))
    }

    fn named(&self, _name: &str) -> Option<ImageContent> {
        None
    }
}

/// In-memory loader keyed by locator or asset name.
#[derive(Debug, Default, Clone)]
pub struct MemoryImages {
    images: HashMap<String, Vec<u8>>,
}

impl MemoryImages {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, src: &str, data: &[u8]) -> Self {
        self.images.insert(src.to_string(), data.to_vec());
        self
    }

    fn get(&self, src: &str) -> Option<ImageContent> {
        self.images.get(src).map(|data| ImageContent {
            src: src.to_string(),
            data: data.clone(),
        })
    }
}

impl ImageLoader for MemoryImages {
    fn fetch(&self, locator: &str) -> Result<ImageContent, String> {
        self.get(locator).ok_or_else(|| format!("404 {locator}"))
    }

    fn named(&self, name: &str) -> Option<ImageContent> {
        self.get(name)
    }
}

/// Which image attribute of an image view a source applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSlot {
    Image,
    HighlightedImage,
}

impl ImageSlot {
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "image" => Some(ImageSlot::Image),
            "highlightedImage" => Some(ImageSlot::HighlightedImage),
            _ => None,
        }
    }
}

/// A remote fetch the engine handed off without waiting for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingImage {
    pub node: NodeIndex,
    pub slot: ImageSlot,
    pub src: String,
}

/// True for locators that must be fetched rather than looked up by name.
pub fn is_remote(src: &str) -> bool {
    ["http://", "https://", "file://"]
        .iter()
        .any(|scheme| src.starts_with(scheme))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_schemes() {
        assert!(is_remote("https://cdn.example/a.png"));
        assert!(is_remote("file:///tmp/a.png"));
        assert!(!is_remote("avatar_placeholder"));
    }

    #[test]
    fn memory_loader_serves_both_paths() {
        let images = MemoryImages::new().with("logo", b"PNG").with("https://x/y.png", b"JPG");
        assert_eq!(images.named("logo").unwrap().data, b"PNG");
        assert_eq!(images.fetch("https://x/y.png").unwrap().src, "https://x/y.png");
        assert!(images.fetch("https://x/missing.png").is_err());
        assert!(NoImages.named("logo").is_none());
    }
}
