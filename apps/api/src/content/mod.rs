// Markdown-lite block classification for the analysis text and the problem description.

pub mod classifier;

pub use classifier::{classify, classify_plain, ContentBlock, TitleLevel};
