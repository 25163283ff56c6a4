use crate::error::{Error, Result};
use num_complex::Complex64;
use rustfft::num_traits::Zero;
use rustfft::{Fft, FftPlanner};
use std::sync::Arc;

/// Direction of a 2D transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Inverse,
}

/// Unnormalized 2D DFT over a row-major `width x height` buffer.
///
/// Plans are built once for the grid size. A forward pass followed by an
/// inverse pass scales every value by `width * height`.
pub struct Transform2d {
    width: usize,
    height: usize,
    row_forward: Arc<dyn Fft<f64>>,
    row_inverse: Arc<dyn Fft<f64>>,
    col_forward: Arc<dyn Fft<f64>>,
    col_inverse: Arc<dyn Fft<f64>>,
    column: Vec<Complex64>,
    scratch: Vec<Complex64>,
}

pub(crate) fn alloc_complex(what: &'static str, len: usize) -> Result<Vec<Complex64>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len)
        .map_err(|_| Error::Allocation { what, cells: len })?;
    buf.resize(len, Complex64::zero());
    Ok(buf)
}

impl Transform2d {
    pub fn new(width: usize, height: usize) -> Result<Self> {
        crate::field::cell_count(width, height)?;

        let mut planner = FftPlanner::<f64>::new();
        let row_forward = planner.plan_fft_forward(width);
        let row_inverse = planner.plan_fft_inverse(width);
        let col_forward = planner.plan_fft_forward(height);
        let col_inverse = planner.plan_fft_inverse(height);

        let scratch_len = [&row_forward, &row_inverse, &col_forward, &col_inverse]
            .iter()
            .map(|fft| fft.get_inplace_scratch_len())
            .max()
            .unwrap_or(0);

        Ok(Self {
            width,
            height,
            row_forward,
            row_inverse,
            col_forward,
            col_inverse,
            column: alloc_complex("transform column", height)?,
            scratch: alloc_complex("transform scratch", scratch_len)?,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn forward(&mut self, data: &mut [Complex64]) -> Result<()> {
        self.checked(data, Direction::Forward)
    }

    pub fn inverse(&mut self, data: &mut [Complex64]) -> Result<()> {
        self.checked(data, Direction::Inverse)
    }

    fn checked(&mut self, data: &mut [Complex64], direction: Direction) -> Result<()> {
        let expected = self.width * self.height;
        if data.len() != expected {
            return Err(Error::BufferSize {
                expected,
                actual: data.len(),
            });
        }
        self.process(data, direction);
        Ok(())
    }

    /// Transform `data` in place: rows first, then columns. The caller
    /// guarantees `data` holds exactly `width * height` values.
    pub(crate) fn process(&mut self, data: &mut [Complex64], direction: Direction) {
        debug_assert_eq!(data.len(), self.width * self.height);

        let (rows, cols) = match direction {
            Direction::Forward => (&self.row_forward, &self.col_forward),
            Direction::Inverse => (&self.row_inverse, &self.col_inverse),
        };

        // rustfft treats a longer buffer as consecutive transforms of the plan length
        rows.process_with_scratch(data, &mut self.scratch);

        for x in 0..self.width {
            for (y, slot) in self.column.iter_mut().enumerate() {
                *slot = data[y * self.width + x];
            }
            cols.process_with_scratch(&mut self.column, &mut self.scratch);
            for (y, value) in self.column.iter().enumerate() {
                data[y * self.width + x] = *value;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn impulse(width: usize, height: usize, x: usize, y: usize) -> Vec<Complex64> {
        let mut data = vec![Complex64::zero(); width * height];
        data[y * width + x] = Complex64::new(1.0, 0.0);
        data
    }

    #[test]
    fn test_forward_of_origin_impulse_is_flat() {
        let mut transform = Transform2d::new(6, 5).unwrap();
        let mut data = impulse(6, 5, 0, 0);
        transform.forward(&mut data).unwrap();
        for value in &data {
            assert!((value.re - 1.0).abs() < 1e-12);
            assert!(value.im.abs() < 1e-12);
        }
    }

    #[test]
    fn test_round_trip_scales_by_cell_count() {
        // Non power-of-two sizes
        let (w, h) = (12, 7);
        let mut transform = Transform2d::new(w, h).unwrap();
        let original: Vec<Complex64> = (0..w * h)
            .map(|i| Complex64::new((i % 3) as f64, 0.0))
            .collect();

        let mut data = original.clone();
        transform.forward(&mut data).unwrap();
        transform.inverse(&mut data).unwrap();

        let scale = (w * h) as f64;
        for (got, want) in data.iter().zip(&original) {
            assert!((got.re - want.re * scale).abs() < 1e-9);
            assert!(got.im.abs() < 1e-9);
        }
    }

    #[test]
    fn test_shifted_impulse_has_unit_magnitude() {
        let mut transform = Transform2d::new(8, 8).unwrap();
        let mut data = impulse(8, 8, 3, 5);
        transform.process(&mut data, Direction::Forward);
        for value in &data {
            assert!((value.norm() - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_mismatched_buffer_is_an_error() {
        let mut transform = Transform2d::new(4, 3).unwrap();
        let mut data = vec![Complex64::zero(); 11];
        assert!(matches!(
            transform.forward(&mut data),
            Err(Error::BufferSize { expected: 12, actual: 11 })
        ));
        assert!(transform.inverse(&mut data).is_err());
        assert!(data.iter().all(|v| v.is_zero()));
    }

    #[test]
    fn test_rejects_zero_dimensions() {
        assert!(Transform2d::new(0, 4).is_err());
    }
}
