use crate::error::Result;
use crate::transform::{alloc_complex, Transform2d};
use num_complex::Complex64;

/// The eight Moore-neighbour offsets; the origin itself is excluded.
pub const MOORE_OFFSETS: [(i64, i64); 8] = [
    (-1, -1), (0, -1), (1, -1),
    (-1, 0),           (1, 0),
    (-1, 1),  (0, 1),  (1, 1),
];

/// Frequency-domain image of the Moore neighbourhood on a torus.
///
/// Multiplying a transformed field by this kernel and inverse-transforming
/// yields `W * H` times the live-neighbour count of every cell. The stepper
/// divides the scale out after rounding.
pub struct SpectralKernel {
    width: usize,
    height: usize,
    spectrum: Vec<Complex64>,
}

impl SpectralKernel {
    pub fn build(transform: &mut Transform2d) -> Result<Self> {
        let width = transform.width();
        let height = transform.height();
        let mut spectrum = alloc_complex("kernel", width * height)?;

        let (w, h) = (width as i64, height as i64);
        for (dx, dy) in MOORE_OFFSETS {
            let index = dx.rem_euclid(w) + dy.rem_euclid(h) * w;
            // On grids narrower than 3 cells two offsets land on the same cell.
            spectrum[index as usize].re += 1.0;
        }

        transform.forward(&mut spectrum)?;
        Ok(Self {
            width,
            height,
            spectrum,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn as_slice(&self) -> &[Complex64] {
        &self.spectrum
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rebuild_is_bit_identical() {
        let mut transform = Transform2d::new(30, 18).unwrap();
        let first = SpectralKernel::build(&mut transform).unwrap();

        // Run the plans on unrelated data in between.
        let mut noise: Vec<Complex64> = (0..30 * 18)
            .map(|i| Complex64::new(i as f64, -(i as f64)))
            .collect();
        transform.forward(&mut noise).unwrap();

        let second = SpectralKernel::build(&mut transform).unwrap();
        let mut fresh = Transform2d::new(30, 18).unwrap();
        let third = SpectralKernel::build(&mut fresh).unwrap();

        for ((a, b), c) in first
            .as_slice()
            .iter()
            .zip(second.as_slice())
            .zip(third.as_slice())
        {
            assert_eq!(a.re.to_bits(), b.re.to_bits());
            assert_eq!(a.im.to_bits(), b.im.to_bits());
            assert_eq!(a.re.to_bits(), c.re.to_bits());
            assert_eq!(a.im.to_bits(), c.im.to_bits());
        }
    }

    #[test]
    fn test_dc_term_counts_eight_neighbours() {
        let mut transform = Transform2d::new(16, 16).unwrap();
        let kernel = SpectralKernel::build(&mut transform).unwrap();
        let dc = kernel.as_slice()[0];
        assert!((dc.re - 8.0).abs() < 1e-12);
        assert!(dc.im.abs() < 1e-12);
    }

    #[test]
    fn test_inverse_recovers_spatial_kernel() {
        let (w, h) = (9, 7);
        let mut transform = Transform2d::new(w, h).unwrap();
        let kernel = SpectralKernel::build(&mut transform).unwrap();

        let mut spatial = kernel.as_slice().to_vec();
        transform.inverse(&mut spatial).unwrap();

        let scale = (w * h) as f64;
        let live: Vec<usize> = spatial
            .iter()
            .enumerate()
            .filter(|(_, v)| (v.re / scale).round() == 1.0)
            .map(|(i, _)| i)
            .collect();

        let mut expected: Vec<usize> = MOORE_OFFSETS
            .iter()
            .map(|&(dx, dy)| (dx.rem_euclid(w as i64) + dy.rem_euclid(h as i64) * w as i64) as usize)
            .collect();
        expected.sort_unstable();
        assert_eq!(live, expected);
        assert!((spatial[0].re / scale).abs() < 1e-9, "origin must be excluded");
    }
}
