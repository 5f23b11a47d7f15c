use bitvec::{slice::BitSlice, vec::BitVec};

/// Module (aka, a pixel) of a QR code.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Module {
    Light,
    Dark,
}

impl Module {
    /// Get the inverted module.
    /// # Example
    /// ```
    /// use qrstamp_core::Module;
    /// assert_eq!(Module::Dark.inverted(), Module::Light);
    /// assert_eq!(Module::Light.inverted(), Module::Dark);
    /// ```
    pub fn inverted(&self) -> Self {
        match self {
            Module::Dark => Module::Light,
            Module::Light => Module::Dark,
        }
    }
}

impl From<bool> for Module {
    fn from(value: bool) -> Self {
        match value {
            true => Module::Dark,
            false => Module::Light,
        }
    }
}

impl From<Module> for bool {
    fn from(value: Module) -> Self {
        match value {
            Module::Dark => true,
            Module::Light => false,
        }
    }
}

/// A square matrix of bits.
#[derive(Clone, PartialEq, Eq)]
struct BitMatrix {
    data: BitVec,
    size: usize,
}

impl BitMatrix {
    /// Return a matrix of size `size` filled with `value`.
    fn filled(size: usize, value: bool) -> Self {
        Self {
            data: BitVec::repeat(value, size * size),
            size,
        }
    }

    /// Get the 1D index of the data array corresponding to position `(i, j)`, checking for validity.
    #[inline]
    fn linearized_index(&self, i: usize, j: usize) -> Option<usize> {
        if i < self.size && j < self.size {
            Some(self.size * i + j)
        } else {
            None
        }
    }

    #[inline]
    fn get(&self, i: usize, j: usize) -> Option<bool> {
        self.data.get(self.linearized_index(i, j)?).map(|bit| *bit)
    }

    /// Get the `i`th row of the matrix.
    fn row(&self, i: usize) -> Option<&BitSlice> {
        if i < self.size {
            Some(&self.data[i * self.size..(i + 1) * self.size])
        } else {
            None
        }
    }

    fn row_mut(&mut self, i: usize) -> Option<&mut BitSlice> {
        if i < self.size {
            Some(&mut self.data[i * self.size..(i + 1) * self.size])
        } else {
            None
        }
    }
}

/// A square grid of modules, as produced by the symbol encoder.
///
/// Positions are `(i, j)` with `i` the row and `j` the column. A grid cannot be modified once built.
#[derive(Clone, PartialEq, Eq)]
pub struct ModuleGrid {
    matrix: BitMatrix,
}

impl ModuleGrid {
    /// Return a grid of size `size` filled with `module`.
    #[inline]
    pub fn filled(size: usize, module: Module) -> Self {
        Self {
            matrix: BitMatrix::filled(size, module.into()),
        }
    }

    /// Build a grid of size `size` from row-major modules, `true` being dark. Returns `None` if
    /// `modules` does not yield exactly `size * size` items.
    /// # Example
    /// ```
    /// use qrstamp_core::{Module, ModuleGrid};
    /// let grid = ModuleGrid::from_row_major(2, [true, false, false, true]).unwrap();
    /// assert_eq!(grid.get(0, 1), Some(Module::Light));
    /// assert_eq!(grid.get(1, 1), Some(Module::Dark));
    /// assert!(ModuleGrid::from_row_major(2, [true]).is_none());
    /// ```
    pub fn from_row_major<I>(size: usize, modules: I) -> Option<Self>
    where
        I: IntoIterator,
        I::Item: Into<bool>,
    {
        let data: BitVec = modules.into_iter().map(Into::into).collect();
        if data.len() != size * size {
            return None;
        }
        Some(Self {
            matrix: BitMatrix { data, size },
        })
    }

    /// Build a grid of size `size` where the module at `(i, j)` is `rule(i, j)`.
    pub fn from_fn<F>(size: usize, mut rule: F) -> Self
    where
        F: FnMut(usize, usize) -> Module,
    {
        let mut matrix = BitMatrix::filled(size, false);
        for i in 0..size {
            // Rows are always in range here.
            if let Some(row) = matrix.row_mut(i) {
                for j in 0..size {
                    row.set(j, rule(i, j).into());
                }
            }
        }
        Self { matrix }
    }

    /// Get the size of the grid, in modules.
    #[inline]
    pub fn size(&self) -> usize {
        self.matrix.size
    }

    /// Get the module at position `(i, j)`.
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> Option<Module> {
        self.matrix.get(i, j).map(Module::from)
    }

    /// Check whether the module at `(i, j)` is dark. Out of bounds positions are light, which
    /// matches the quiet zone around a symbol.
    #[inline]
    pub fn is_dark(&self, i: usize, j: usize) -> bool {
        self.matrix.get(i, j).unwrap_or(false)
    }

    /// Get the `i`th row of the grid, `true` being dark.
    pub fn row(&self, i: usize) -> Option<&BitSlice> {
        self.matrix.row(i)
    }

    /// Iterate over the rows of the grid.
    pub fn rows(&self) -> impl Iterator<Item = &BitSlice> + '_ {
        self.matrix.data.chunks(self.matrix.size.max(1))
    }

    /// Count the dark modules.
    pub fn dark_count(&self) -> usize {
        self.matrix.data.count_ones()
    }
}

impl AsRef<ModuleGrid> for ModuleGrid {
    fn as_ref(&self) -> &ModuleGrid {
        self
    }
}

impl std::fmt::Debug for ModuleGrid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "ModuleGrid({0}x{0}) {{", self.size())?;
        for row in self.rows() {
            let line: String = row.iter().map(|bit| if *bit { '#' } else { '.' }).collect();
            writeln!(f, "    {}", line)?;
        }
        write!(f, "}}")
    }
}
