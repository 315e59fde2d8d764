/// Data layer: core types, loading and persisting.
///
/// Architecture:
/// ```text
///  root/<group>/<name>.txt
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  walk tree, parse CSV → Dataset
///   └──────────┘
///        │            (classify)
///        ▼
///   ┌──────────┐
///   │  writer   │  BreakSet → <group>/res/<name>.jen
///   └──────────┘
///
///  confusion_matrix.txt ──► confusion ──► ConfusionMatrix
/// ```

pub mod confusion;
pub mod loader;
pub mod model;
pub mod writer;
