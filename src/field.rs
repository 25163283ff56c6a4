use crate::error::{Error, Result};
use rand::Rng;
use std::sync::atomic::{fence, AtomicBool, AtomicU64, Ordering};
use std::thread;

/// Validate grid dimensions and return the number of cells.
///
/// Coordinates are `i32` on the read side, so each dimension must fit in it.
pub fn cell_count(width: usize, height: usize) -> Result<usize> {
    if width == 0 || height == 0 {
        return Err(Error::InvalidDimensions { width, height });
    }
    if width > i32::MAX as usize || height > i32::MAX as usize {
        return Err(Error::DimensionsTooLarge { width, height });
    }
    width
        .checked_mul(height)
        .ok_or(Error::DimensionsTooLarge { width, height })
}

fn alloc_cells(what: &'static str, len: usize) -> Result<Box<[AtomicBool]>> {
    let mut cells = Vec::new();
    cells
        .try_reserve_exact(len)
        .map_err(|_| Error::Allocation { what, cells: len })?;
    cells.extend((0..len).map(|_| AtomicBool::new(false)));
    Ok(cells.into_boxed_slice())
}

/// Two toroidal cell buffers and the epoch that selects the published one.
///
/// The epoch counts publishes; its parity is the index of the current buffer,
/// so a reader gets the selector and the generation count from one load.
/// Exactly one writer may touch the back buffer at a time; the engine
/// enforces that with its writer claim.
///
/// Readers never lock. A published buffer becomes the back buffer again one
/// publish later, so a reader that is still copying it could see cells of
/// the next generation. Reads are therefore validated like a seqlock: the
/// writer fences before each back-buffer pass, and the reader re-checks the
/// epoch after copying and retries if it moved.
pub struct FieldStore {
    width: usize,
    height: usize,
    buffers: [Box<[AtomicBool]>; 2],
    epoch: AtomicU64,
}

impl FieldStore {
    pub fn new(width: usize, height: usize) -> Result<Self> {
        let len = cell_count(width, height)?;
        Ok(Self {
            width,
            height,
            buffers: [alloc_cells("field", len)?, alloc_cells("field", len)?],
            epoch: AtomicU64::new(0),
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Map toroidal coordinates to a flat offset; negative inputs wrap.
    pub fn index(&self, x: i64, y: i64) -> usize {
        let w = self.width as i64;
        let h = self.height as i64;
        (x.rem_euclid(w) + y.rem_euclid(h) * w) as usize
    }

    /// True when `(x, y)` lies in `[0, W) x [0, H)`.
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    /// Number of buffers published so far (seeds, randomizations and steps).
    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::Acquire)
    }

    /// Copy one complete published generation.
    ///
    /// Retries while a publish lands mid-copy, so the result is never a mix
    /// of two generations.
    pub fn view(&self) -> FieldView {
        let mut attempts = 0u32;
        loop {
            let published = self.published();
            let cells = published.load_all();
            if published.is_intact() {
                return FieldView {
                    epoch: published.epoch,
                    width: self.width,
                    height: self.height,
                    cells,
                };
            }
            attempts += 1;
            if attempts % 4 == 0 {
                thread::yield_now();
            }
        }
    }

    /// Read one cell of the published generation, `None` when out of range.
    pub fn at(&self, x: i32, y: i32) -> Option<bool> {
        if !self.contains(x, y) {
            return None;
        }
        let index = self.index(x as i64, y as i64);
        loop {
            let published = self.published();
            let alive = published.get(index);
            if published.is_intact() {
                return Some(alive);
            }
        }
    }

    /// Borrow the current buffer without copying. Only the writer may rely
    /// on it staying put.
    pub(crate) fn published(&self) -> Published<'_> {
        Published {
            store: self,
            epoch: self.epoch(),
        }
    }

    /// Start a write pass over the back buffer.
    pub(crate) fn back_buffer(&self) -> BackBuffer<'_> {
        let epoch = self.epoch.load(Ordering::Acquire);
        // Orders the last publish before every cell store of this pass, so
        // a reader that sees one of those stores also sees the new epoch.
        fence(Ordering::Release);
        BackBuffer {
            store: self,
            cells: &self.buffers[((epoch + 1) & 1) as usize],
        }
    }

    /// Force a cell alive in the published buffer. Writer only.
    pub(crate) fn set_bit(&self, x: i64, y: i64) {
        let epoch = self.epoch.load(Ordering::Acquire);
        self.buffers[(epoch & 1) as usize][self.index(x, y)].store(true, Ordering::Relaxed);
    }

    /// Make the back buffer current. Every back write must be done by now.
    pub(crate) fn publish(&self) -> u64 {
        self.epoch.fetch_add(1, Ordering::Release) + 1
    }

    /// Fill the back buffer with random bits and publish it.
    pub(crate) fn randomize<R: Rng + ?Sized>(&self, rng: &mut R) -> u64 {
        let back = self.back_buffer();
        for index in 0..back.cells.len() {
            back.set(index, rng.gen::<bool>());
        }
        self.publish()
    }
}

/// The published buffer as seen at one epoch, read in place.
#[derive(Clone, Copy)]
pub(crate) struct Published<'a> {
    store: &'a FieldStore,
    epoch: u64,
}

impl<'a> Published<'a> {
    pub(crate) fn epoch(&self) -> u64 {
        self.epoch
    }

    fn cells(&self) -> &'a [AtomicBool] {
        &self.store.buffers[(self.epoch & 1) as usize]
    }

    pub(crate) fn get(&self, index: usize) -> bool {
        self.cells()[index].load(Ordering::Relaxed)
    }

    fn load_all(&self) -> Vec<bool> {
        self.cells()
            .iter()
            .map(|cell| cell.load(Ordering::Relaxed))
            .collect()
    }

    /// True if no publish happened since this epoch was loaded, so nothing
    /// read through it can belong to a later generation.
    fn is_intact(&self) -> bool {
        fence(Ordering::Acquire);
        self.store.epoch.load(Ordering::Relaxed) == self.epoch
    }
}

/// Writer access to the back buffer for one pass.
pub(crate) struct BackBuffer<'a> {
    store: &'a FieldStore,
    cells: &'a [AtomicBool],
}

impl BackBuffer<'_> {
    pub(crate) fn set(&self, index: usize, alive: bool) {
        self.cells[index].store(alive, Ordering::Relaxed);
    }

    /// Force a cell alive by toroidal coordinates.
    pub(crate) fn set_alive(&self, x: i64, y: i64) {
        self.set(self.store.index(x, y), true);
    }

    pub(crate) fn clear(&self) {
        for cell in self.cells {
            cell.store(false, Ordering::Relaxed);
        }
    }
}

/// A copy of one complete published generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldView {
    epoch: u64,
    width: usize,
    height: usize,
    cells: Vec<bool>,
}

impl FieldView {
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn at(&self, x: i32, y: i32) -> Option<bool> {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return None;
        }
        Some(self.cells[y as usize * self.width + x as usize])
    }

    /// Read by flat offset `y * W + x`.
    pub fn get(&self, index: usize) -> bool {
        self.cells[index]
    }

    pub fn population(&self) -> usize {
        self.cells.iter().filter(|&&alive| alive).count()
    }

    pub fn cells(&self) -> &[bool] {
        &self.cells
    }

    pub fn to_vec(&self) -> Vec<bool> {
        self.cells.clone()
    }
}
