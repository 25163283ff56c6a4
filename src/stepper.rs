use crate::error::Result;
use crate::field::{FieldStore, Published};
use crate::kernel::SpectralKernel;
use crate::transform::{alloc_complex, Direction, Transform2d};
use num_complex::Complex64;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

/// B3/S23: born on three neighbours, survives on two or three.
pub fn next_state(alive: bool, neighbors: u32) -> bool {
    matches!((alive, neighbors), (true, 2) | (_, 3))
}

/// Result of one call to [`Stepper::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// A complete generation was written and published at this epoch.
    Published(u64),
    /// Abort was observed mid-step; nothing was published.
    Aborted,
}

/// Owns the transform plans, the spectral kernel and the scratch spectrum.
///
/// A stepper is used by exactly one writer at a time: the engine keeps it
/// while idle and moves it into the loop thread while running.
pub struct Stepper {
    transform: Transform2d,
    kernel: SpectralKernel,
    scratch: Vec<Complex64>,
}

impl Stepper {
    pub fn new(width: usize, height: usize) -> Result<Self> {
        let mut transform = Transform2d::new(width, height)?;
        let kernel = SpectralKernel::build(&mut transform)?;
        let scratch = alloc_complex("scratch", width * height)?;
        Ok(Self {
            transform,
            kernel,
            scratch,
        })
    }

    pub fn kernel(&self) -> &SpectralKernel {
        &self.kernel
    }

    fn cell_count(&self) -> i64 {
        (self.kernel.width() * self.kernel.height()) as i64
    }

    /// Load `view` into the scratch buffer and convolve it with the kernel.
    ///
    /// Returns false if `abort` was raised during the spectral multiply.
    fn convolve(&mut self, view: &Published<'_>, abort: &AtomicBool) -> bool {
        for (index, slot) in self.scratch.iter_mut().enumerate() {
            *slot = Complex64::new(if view.get(index) { 1.0 } else { 0.0 }, 0.0);
        }

        self.transform.process(&mut self.scratch, Direction::Forward);

        for (slot, k) in self.scratch.iter_mut().zip(self.kernel.as_slice()) {
            if abort.load(Ordering::Relaxed) {
                return false;
            }
            *slot *= *k;
        }

        self.transform.process(&mut self.scratch, Direction::Inverse);
        true
    }

    /// Round first, then divide: rounding absorbs the transform error before
    /// the exact `W * H` scale is removed.
    fn neighbors_at(&self, index: usize) -> u32 {
        let raw = self.scratch[index].re.round() as i64;
        (raw / self.cell_count()) as u32
    }

    /// Spectral neighbour counts of the published generation, row-major.
    pub fn neighbor_counts(&mut self, field: &FieldStore) -> Vec<u32> {
        let view = field.published();
        let never = AtomicBool::new(false);
        self.convolve(&view, &never);
        (0..self.scratch.len()).map(|i| self.neighbors_at(i)).collect()
    }

    /// Advance the field by one generation.
    ///
    /// Reads the published buffer, writes every next state into the back
    /// buffer and publishes only once all cells are written. If `abort` is
    /// seen first, returns early and leaves the published generation as is.
    pub fn step(&mut self, field: &FieldStore, abort: &AtomicBool) -> StepOutcome {
        let view = field.published();

        if !self.convolve(&view, abort) {
            debug!(epoch = view.epoch(), "step aborted during spectral multiply");
            return StepOutcome::Aborted;
        }

        let back = field.back_buffer();
        for index in 0..self.scratch.len() {
            if abort.load(Ordering::Relaxed) {
                debug!(epoch = view.epoch(), "step aborted during rule pass");
                return StepOutcome::Aborted;
            }
            let alive = next_state(view.get(index), self.neighbors_at(index));
            back.set(index, alive);
        }

        StepOutcome::Published(field.publish())
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn field_with(width: usize, height: usize, live: &[(i64, i64)]) -> FieldStore {
        let field = FieldStore::new(width, height).unwrap();
        for &(x, y) in live {
            field.set_bit(x, y);
        }
        field
    }

    fn run(stepper: &mut Stepper, field: &FieldStore, generations: usize) {
        let abort = AtomicBool::new(false);
        for _ in 0..generations {
            assert!(matches!(stepper.step(field, &abort), StepOutcome::Published(_)));
        }
    }

    #[test]
    fn test_rule_table() {
        for n in 0..=8 {
            assert_eq!(next_state(true, n), n == 2 || n == 3, "alive with {n}");
            assert_eq!(next_state(false, n), n == 3, "dead with {n}");
        }
    }

    #[test]
    fn test_spectral_counts_match_direct_sum() {
        let mut rng = StdRng::seed_from_u64(42);
        for &(w, h) in &[(3, 3), (7, 5), (16, 16), (31, 17), (64, 48), (100, 90)] {
            let field = FieldStore::new(w, h).unwrap();
            field.randomize(&mut rng);
            let cells = field.view().to_vec();

            let mut stepper = Stepper::new(w, h).unwrap();
            let spectral = stepper.neighbor_counts(&field);
            let direct = reference::neighbor_counts(w, h, &cells);
            assert_eq!(spectral, direct, "grid {w}x{h}");
        }
    }

    #[test]
    fn test_counts_on_degenerate_torus() {
        // On a 2-wide torus left and right neighbours are the same cell.
        let field = field_with(2, 5, &[(1, 2)]);
        let cells = field.view().to_vec();
        let mut stepper = Stepper::new(2, 5).unwrap();
        assert_eq!(
            stepper.neighbor_counts(&field),
            reference::neighbor_counts(2, 5, &cells)
        );
    }

    #[test]
    fn test_corner_cells_are_neighbours() {
        let (w, h) = (10, 8);
        let field = field_with(w, h, &[(0, 0)]);
        let mut stepper = Stepper::new(w, h).unwrap();
        let counts = stepper.neighbor_counts(&field);
        assert_eq!(counts[field.index(w as i64 - 1, h as i64 - 1)], 1);

        let field = field_with(w, h, &[(w as i64 - 1, h as i64 - 1)]);
        let counts = stepper.neighbor_counts(&field);
        assert_eq!(counts[field.index(0, 0)], 1);
    }

    #[test]
    fn test_block_is_still_life() {
        let field = field_with(12, 12, &[(5, 5), (6, 5), (5, 6), (6, 6)]);
        let before = field.view().to_vec();
        let mut stepper = Stepper::new(12, 12).unwrap();
        for _ in 0..10 {
            run(&mut stepper, &field, 1);
            assert_eq!(field.view().to_vec(), before);
        }
    }

    #[test]
    fn test_block_straddling_the_seam_is_still_life() {
        let field = field_with(9, 9, &[(-1, -1), (0, -1), (-1, 0), (0, 0)]);
        let before = field.view().to_vec();
        let mut stepper = Stepper::new(9, 9).unwrap();
        run(&mut stepper, &field, 7);
        assert_eq!(field.view().to_vec(), before);
    }

    #[test]
    fn test_blinker_has_period_two() {
        let field = field_with(11, 11, &[(4, 5), (5, 5), (6, 5)]);
        let start = field.view().to_vec();
        let mut stepper = Stepper::new(11, 11).unwrap();

        run(&mut stepper, &field, 1);
        let middle = field.view();
        assert_ne!(middle.to_vec(), start);
        assert_eq!(middle.at(5, 4), Some(true));
        assert_eq!(middle.at(5, 6), Some(true));
        assert_eq!(middle.at(4, 5), Some(false));

        run(&mut stepper, &field, 1);
        assert_eq!(field.view().to_vec(), start);
    }

    #[test]
    fn test_random_fields_follow_reference() {
        let mut rng = StdRng::seed_from_u64(99);
        let (w, h) = (40, 25);
        let field = FieldStore::new(w, h).unwrap();
        field.randomize(&mut rng);
        let mut expected = field.view().to_vec();
        let mut stepper = Stepper::new(w, h).unwrap();

        for _ in 0..20 {
            expected = reference::step(w, h, &expected);
            run(&mut stepper, &field, 1);
            assert_eq!(field.view().to_vec(), expected);
        }
    }

    #[test]
    fn test_step_publishes_next_epoch() {
        let field = field_with(8, 8, &[(1, 1)]);
        let mut stepper = Stepper::new(8, 8).unwrap();
        let abort = AtomicBool::new(false);
        assert_eq!(stepper.step(&field, &abort), StepOutcome::Published(1));
        assert_eq!(stepper.step(&field, &abort), StepOutcome::Published(2));
        assert_eq!(field.view().population(), 0);
    }

    #[test]
    fn test_abort_keeps_last_generation() {
        let field = field_with(16, 16, &[(4, 5), (5, 5), (6, 5)]);
        let before = field.view().to_vec();
        let mut stepper = Stepper::new(16, 16).unwrap();

        let abort = AtomicBool::new(true);
        assert_eq!(stepper.step(&field, &abort), StepOutcome::Aborted);
        assert_eq!(field.epoch(), 0);
        assert_eq!(field.view().to_vec(), before);
    }
}
