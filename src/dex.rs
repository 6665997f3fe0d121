use crate::moves::MoveCatalog;
use crate::types::TypeChart;
use once_cell::sync::Lazy;
use std::sync::Arc;

static STANDARD: Lazy<Arc<Dex>> = Lazy::new(|| Arc::new(Dex::standard()));

/// Move catalog and type chart, loaded once and shared read-only by every battle.
#[derive(Debug, Clone)]
pub struct Dex {
    pub moves: MoveCatalog,
    pub types: TypeChart,
}

impl Dex {
    pub fn new(moves: MoveCatalog, types: TypeChart) -> Self {
        Dex { moves, types }
    }

    pub fn standard() -> Self {
        Dex::new(MoveCatalog::standard(), TypeChart::standard())
    }

    /// Process-wide instance of the built-in data.
    pub fn shared() -> Arc<Dex> {
        Arc::clone(&STANDARD)
    }
}

impl Default for Dex {
    fn default() -> Self {
        Dex::standard()
    }
}
