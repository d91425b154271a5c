//! CARDIAC memory subsystem.
//!
//! The original cardboard CARDIAC had 100 cells, addressed 00-99. Cell 00
//! is hard-wired to `001` (INP 01), which is what makes the bootstrap
//! loader possible.
//!
//! Address checks accept `0..=size`, one past the last conventional index.
//! The extra cell is real storage, so an access at `size` behaves like any
//! other address.

use crate::decimal::{Word, WordError};
use serde::{Serialize, Deserialize};
use thiserror::Error;

/// The number of memory cells on a stock CARDIAC.
pub const DEFAULT_MEMORY_SIZE: usize = 100;

/// Largest memory size a machine can be built with.
pub const MAX_MEMORY_SIZE: usize = 10_000;

/// CARDIAC memory: a fixed number of word-or-empty cells.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "MemoryImage")]
pub struct Memory {
    size: usize,
    cells: Vec<Option<Word>>,
}

/// Serialized memory, checked before it becomes a [`Memory`].
#[derive(Deserialize)]
struct MemoryImage {
    size: usize,
    cells: Vec<Option<Word>>,
}

impl TryFrom<MemoryImage> for Memory {
    type Error = MemoryError;

    fn try_from(image: MemoryImage) -> Result<Self, Self::Error> {
        let MemoryImage { size, cells } = image;
        if size == 0 || cells.len() != size + 1 || cells[0].is_none() {
            return Err(MemoryError::Layout { size, cells: cells.len() });
        }
        Ok(Self { size, cells })
    }
}

impl Memory {
    /// Create a 100-cell memory with cell 0 set to the bootstrap word.
    pub fn new() -> Self {
        Self::with_size(DEFAULT_MEMORY_SIZE)
    }

    /// Create a memory of `size` cells with cell 0 set to the bootstrap word.
    ///
    /// `size` is clamped to `1..=MAX_MEMORY_SIZE`; use [`Memory::check_size`]
    /// to reject bad sizes instead.
    pub fn with_size(size: usize) -> Self {
        let size = size.clamp(1, MAX_MEMORY_SIZE);
        let mut cells = vec![None; size + 1];
        cells[0] = Some(Word::BOOTSTRAP);
        Self { size, cells }
    }

    /// Check that a machine can be built with `size` cells.
    pub fn check_size(size: usize) -> Result<usize, MemoryError> {
        if (1..=MAX_MEMORY_SIZE).contains(&size) {
            Ok(size)
        } else {
            Err(MemoryError::InvalidSize(size))
        }
    }

    /// The configured memory size.
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// All cells, including the one at index `size`.
    pub fn cells(&self) -> &[Option<Word>] {
        &self.cells
    }

    /// Parse a textual address.
    ///
    /// Only checks that the text is an integer; range is checked on access.
    pub fn parse_address(text: &str) -> Result<i64, MemoryError> {
        text.trim()
            .parse::<i64>()
            .map_err(|_| MemoryError::InvalidAddress(text.to_string()))
    }

    /// Validate an address and convert it to a cell index.
    fn index(&self, address: i64) -> Result<usize, MemoryError> {
        usize::try_from(address)
            .ok()
            .filter(|&index| index <= self.size)
            .ok_or(MemoryError::OutOfRange { address, size: self.size })
    }

    /// Read a cell. Empty cells read as `None`.
    pub fn get(&self, address: i64) -> Result<Option<Word>, MemoryError> {
        let index = self.index(address)?;
        Ok(self.cells[index])
    }

    /// Read a cell as an integer.
    ///
    /// Fails with [`MemoryError::EmptyCell`] if nothing was ever written there.
    pub fn get_int(&self, address: i64) -> Result<i64, MemoryError> {
        let index = self.index(address)?;
        self.cells[index]
            .map(Word::to_i64)
            .ok_or(MemoryError::EmptyCell(index))
    }

    /// Read a cell in its raw card form. Empty cells give an empty string.
    pub fn get_text(&self, address: i64) -> Result<String, MemoryError> {
        Ok(self.get(address)?.map(|w| w.to_string()).unwrap_or_default())
    }

    /// Write a word to a cell.
    pub fn set(&mut self, address: i64, value: Word) -> Result<(), MemoryError> {
        let index = self.index(address)?;
        self.cells[index] = Some(value);
        Ok(())
    }

    /// Write an integer to a cell, checking the word range.
    pub fn set_int(&mut self, address: i64, value: i64) -> Result<(), MemoryError> {
        let index = self.index(address)?;
        self.cells[index] = Some(Word::new(value)?);
        Ok(())
    }

    /// Write a card token to a cell.
    pub fn set_text(&mut self, address: i64, text: &str) -> Result<(), MemoryError> {
        let index = self.index(address)?;
        self.cells[index] = Some(Word::parse(text)?);
        Ok(())
    }

    /// Dump cell contents (for debugging).
    pub fn dump(&self, start: usize, count: usize) -> Vec<(usize, Option<Word>)> {
        let end = start.saturating_add(count).min(self.cells.len());
        (start.min(end)..end)
            .map(|i| (i, self.cells[i]))
            .collect()
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let used = self.cells.iter().filter(|cell| cell.is_some()).count();

        f.debug_struct("Memory")
            .field("used_cells", &used)
            .field("size", &self.size)
            .finish()
    }
}

/// Errors that can occur during memory operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemoryError {
    /// The address is not an integer.
    #[error("invalid address: {0:?}")]
    InvalidAddress(String),

    /// The address is outside `0..=size`.
    #[error("memory address {address} out of range (0-{size})")]
    OutOfRange { address: i64, size: usize },

    /// The value could not be stored as a word.
    #[error(transparent)]
    Data(#[from] WordError),

    /// The cell has never been written.
    #[error("memory cell {0} is empty")]
    EmptyCell(usize),

    /// A stored memory image whose cell count does not match its size,
    /// or whose bootstrap cell is empty.
    #[error("memory image has {cells} cells for size {size}")]
    Layout { size: usize, cells: usize },

    /// The requested size is zero or above [`MAX_MEMORY_SIZE`].
    #[error("memory size {0} not supported (1-{max})", max = MAX_MEMORY_SIZE)]
    InvalidSize(usize),
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_fresh_memory_bootstrap() {
        for size in [1, 10, 100, 250] {
            let mem = Memory::with_size(size);
            assert_eq!(mem.get_text(0).unwrap(), "001");
        }
    }

    #[test]
    fn test_memory_read_write() {
        let mut mem = Memory::new();

        mem.set_int(10, 42).unwrap();
        assert_eq!(mem.get_int(10).unwrap(), 42);
        assert_eq!(mem.get_text(10).unwrap(), "042");

        mem.set_text(11, "-178").unwrap();
        assert_eq!(mem.get_int(11).unwrap(), -178);
    }

    #[test]
    fn test_memory_bounds() {
        let mut mem = Memory::new();

        assert!(mem.get(0).is_ok());
        assert!(mem.get(99).is_ok());
        assert!(mem.set_int(100, 5).is_ok());
        assert_eq!(mem.get_int(100).unwrap(), 5);

        assert_eq!(mem.get(-1), Err(MemoryError::OutOfRange { address: -1, size: 100 }));
        assert_eq!(mem.get(101), Err(MemoryError::OutOfRange { address: 101, size: 100 }));
        assert!(mem.set_int(101, 5).is_err());
    }

    #[test]
    fn test_empty_cells() {
        let mem = Memory::new();

        assert_eq!(mem.get(5).unwrap(), None);
        assert_eq!(mem.get_text(5).unwrap(), "");
        assert_eq!(mem.get_int(5), Err(MemoryError::EmptyCell(5)));
    }

    #[test]
    fn test_invalid_data() {
        let mut mem = Memory::new();

        assert!(matches!(
            mem.set_text(5, "x12"),
            Err(MemoryError::Data(WordError::InvalidData(_)))
        ));
        assert_eq!(mem.get(5).unwrap(), None);
    }

    #[test]
    fn test_address_checked_before_data() {
        let mut mem = Memory::new();

        assert!(matches!(mem.set_text(500, "bogus"), Err(MemoryError::OutOfRange { .. })));
    }

    #[test]
    fn test_parse_address() {
        assert_eq!(Memory::parse_address(" 42 ").unwrap(), 42);
        assert_eq!(Memory::parse_address("-3").unwrap(), -3);
        assert_eq!(
            Memory::parse_address("4a"),
            Err(MemoryError::InvalidAddress("4a".to_string()))
        );
    }

    #[test]
    fn test_dump() {
        let mut mem = Memory::new();
        mem.set_int(1, 2).unwrap();

        let dump = mem.dump(0, 3);
        assert_eq!(dump.len(), 3);
        assert_eq!(dump[1], (1, Some(Word::new(2).unwrap())));
        assert_eq!(dump[2], (2, None));
        assert!(mem.dump(200, 5).is_empty());
    }

    #[test]
    fn test_serde_roundtrip() {
        let mut mem = Memory::with_size(20);
        mem.set_int(7, -45).unwrap();

        let json = serde_json::to_string(&mem).unwrap();
        let back: Memory = serde_json::from_str(&json).unwrap();
        assert_eq!(back, mem);
    }

    #[test]
    fn test_deserialize_rejects_short_cells() {
        let result = serde_json::from_str::<Memory>(r#"{"size":100,"cells":[1]}"#);
        assert!(result.is_err());

        let empty_bootstrap = serde_json::from_str::<Memory>(r#"{"size":1,"cells":[null,null]}"#);
        assert!(empty_bootstrap.is_err());

        let ok: Memory = serde_json::from_str(r#"{"size":1,"cells":[1,null]}"#).unwrap();
        assert_eq!(ok.get(1), Ok(None));
    }

    #[test]
    fn test_memory_size_limits() {
        assert_eq!(Memory::check_size(100), Ok(100));
        assert_eq!(Memory::check_size(0), Err(MemoryError::InvalidSize(0)));
        assert_eq!(Memory::check_size(usize::MAX), Err(MemoryError::InvalidSize(usize::MAX)));

        assert_eq!(Memory::with_size(usize::MAX).size(), MAX_MEMORY_SIZE);
        assert_eq!(Memory::with_size(0).size(), 1);
    }

    proptest! {
        #[test]
        fn prop_write_read_roundtrip(addr in 0i64..=100, v in -999i64..=999) {
            let mut mem = Memory::new();
            mem.set_int(addr, v).unwrap();
            prop_assert_eq!(mem.get_int(addr).unwrap(), v);
        }

        #[test]
        fn prop_overflow_leaves_memory_unchanged(
            addr in 0i64..=100,
            v in prop_oneof![-100_000i64..-999, 1000i64..100_000],
        ) {
            let mut mem = Memory::new();
            let before = mem.clone();
            prop_assert_eq!(
                mem.set_int(addr, v),
                Err(MemoryError::Data(WordError::DataValueOverflow(v)))
            );
            prop_assert_eq!(mem, before);
        }

        #[test]
        fn prop_out_of_range_rejected(addr in prop_oneof![-1000i64..0, 101i64..1000]) {
            let mut mem = Memory::new();
            let out_of_range: Result<Option<Word>, MemoryError> =
                Err(MemoryError::OutOfRange { address: addr, size: 100 });
            prop_assert_eq!(mem.get(addr), out_of_range.clone());
            prop_assert_eq!(mem.set_int(addr, 1), out_of_range.map(|_| ()));
        }
    }
}
