//! Static bundle serving.

pub mod resolver;

pub use resolver::{AssetError, AssetResolver, StaticAssetResolver};
