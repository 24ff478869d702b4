use hybrid_array::ArraySize;

use crate::algebra::{FieldElement, Integer, Polynomial, PolynomialVector};

// Multiplier for computing the rounded quotient (2^d x + q/2) / q without a division.  With a
// shift of 36, the approximation M = ceil(2^36 / 2q) is exact for every x < q and every d <= 11.
const COMPRESS_SHIFT: u32 = 36;
const COMPRESS_MULTIPLIER: u64 = 10_321_340;

/// Lossy compression of coefficients to `d` bits, as in FIPS 203 section 4.2.1
pub(crate) trait Compress {
    fn compress(&mut self, d: usize) -> &Self;
    fn decompress(&mut self, d: usize) -> &Self;
}

impl Compress for FieldElement {
    // Equation 4.7: Compress_d(x) = round((2^d / q) x) mod 2^d
    #[allow(clippy::cast_possible_truncation)]
    #[allow(clippy::as_conversions)]
    fn compress(&mut self, d: usize) -> &Self {
        let x = u64::from(self.0);
        let scaled = ((x << (d + 1)) + FieldElement::Q64) * COMPRESS_MULTIPLIER;
        let mask = (1u64 << d) - 1;
        self.0 = ((scaled >> COMPRESS_SHIFT) & mask) as Integer;
        self
    }

    // Equation 4.8: Decompress_d(y) = round((q / 2^d) y)
    #[allow(clippy::cast_possible_truncation)]
    #[allow(clippy::as_conversions)]
    fn decompress(&mut self, d: usize) -> &Self {
        let y = u32::from(self.0);
        let rounded = y * FieldElement::Q32 + (1 << (d - 1));
        self.0 = (rounded >> d) as Integer;
        self
    }
}

impl Compress for Polynomial {
    fn compress(&mut self, d: usize) -> &Self {
        for x in &mut self.0 {
            x.compress(d);
        }

        self
    }

    fn decompress(&mut self, d: usize) -> &Self {
        for x in &mut self.0 {
            x.decompress(d);
        }

        self
    }
}

impl<K: ArraySize> Compress for PolynomialVector<K> {
    fn compress(&mut self, d: usize) -> &Self {
        for x in &mut self.0 {
            x.compress(d);
        }

        self
    }

    fn decompress(&mut self, d: usize) -> &Self {
        for x in &mut self.0 {
            x.decompress(d);
        }

        self
    }
}
