pub mod analyze;
pub mod model;

// Re-export commonly used types/functions for consumers
pub use analyze::{analyze_entries, Analysis, Edge, EdgeKind, EdgeOut, Report, Unresolved};
pub use model::{labels_by_line, load_source, render_listing, symbol_rows, SymbolRow};
