mod canvas;
mod color;
pub mod config;
mod meta;
pub mod qrstandard;

pub use canvas::{Module, ModuleGrid};
pub use color::{Color, ColorError, NamedColor};
pub use config::{CompositionOptions, ConfigError, GeneratorConfig, LogoOptions, SymbolSpec};
pub use meta::{Ecl, Meta, Version};

/// An encoded QR symbol.
#[derive(Debug, Clone)]
pub struct Symbol {
    grid: ModuleGrid,
    meta: Meta,
}

impl Symbol {
    /// Construct a new [Symbol]. Returns `None` if the grid is incompatible with `meta` (e.g.: the
    /// [Version] and, thus, the grid size).
    pub fn new(grid: ModuleGrid, meta: Meta) -> Option<Self> {
        if grid.size() == meta.canvas_size() {
            Some(Self { grid, meta })
        } else {
            None
        }
    }

    /// Get the underlying module grid.
    pub fn grid(&self) -> &ModuleGrid {
        &self.grid
    }

    /// Get the metadata.
    pub fn meta(&self) -> &Meta {
        &self.meta
    }
}

impl AsRef<ModuleGrid> for Symbol {
    fn as_ref(&self) -> &ModuleGrid {
        self.grid()
    }
}

impl From<Symbol> for ModuleGrid {
    fn from(value: Symbol) -> Self {
        value.grid
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_symbol_rejects_mismatched_grid() {
        let meta = Meta {
            version: Version::V01,
            ecl: Ecl::M,
        };
        assert!(Symbol::new(ModuleGrid::filled(21, Module::Light), meta).is_some());
        assert!(Symbol::new(ModuleGrid::filled(25, Module::Light), meta).is_none());
    }
}
