//! Label allocation.
//!
//! Labels are `{prefix}_{index}` strings. Every label handed out in one
//! allocation call shares the same index, so the start/end labels of a loop
//! can be recognised as one group when reading the lowered program.
//!
//! The counter lives in a [`LabelManager`] value owned by the driver rather
//! than in global state. One manager is shared by all functions of a
//! compilation run and reset before the next run; concurrent compilations
//! each need their own manager.

use qlane_ir::Label;

use crate::error::LabelError;

/// Issues globally unique, co-indexed labels for one compilation run.
#[derive(Debug, Default)]
pub struct LabelManager {
    next_index: u32,
}

impl LabelManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a fresh index. Indices increase monotonically until [`reset`](Self::reset).
    pub fn allocate_index(&mut self) -> u32 {
        let index = self.next_index;
        self.next_index += 1;
        index
    }

    /// Allocate one label per prefix, all sharing a single fresh index.
    ///
    /// # Errors
    ///
    /// Returns [`LabelError::DuplicatePrefix`] if two prefixes are equal, since
    /// the resulting labels would collide.
    pub fn allocate_labels<const N: usize>(
        &mut self,
        prefixes: [&str; N],
    ) -> Result<[Label; N], LabelError> {
        for (i, prefix) in prefixes.iter().enumerate() {
            if prefixes[..i].contains(prefix) {
                return Err(LabelError::DuplicatePrefix((*prefix).to_string()));
            }
        }
        let index = self.allocate_index();
        Ok(prefixes.map(|prefix| Label::new(format!("{prefix}_{index}"))))
    }

    /// Number of indices handed out since the last reset.
    pub fn allocated(&self) -> u32 {
        self.next_index
    }

    /// Start a new compilation run.
    pub fn reset(&mut self) {
        self.next_index = 0;
    }
}
