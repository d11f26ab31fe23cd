// Layout: width estimation, line wrapping and the pagination rules.
// Everything here is pure and CPU-bound; render passes run inside tokio::task::spawn_blocking.

pub mod font_metrics;
pub mod pagination;
pub mod settings;
pub mod wrap;

// Re-export the public API consumed by the composer and handlers.
pub use font_metrics::{get_metrics, FontFace};
pub use pagination::{BlockKind, LayoutCursor, PageGeometry};
pub use settings::DocumentSettings;
