use hybrid_array::{Array, ArraySize};
use sha3::digest::XofReader;

use crate::algebra::{
    FieldElement, Integer, NttMatrix, NttPolynomial, NttVector, Polynomial, PolynomialVector,
};
use crate::crypto::{PRF, XOF, XofStream};
use crate::util::B32;

#[cfg(feature = "zeroize")]
use zeroize::Zeroize;

// SHAKE128 rate; reading whole blocks avoids re-entering the sponge for every three bytes.
const XOF_BLOCK_SIZE: usize = 168;

// Splits three bytes into two 12-bit candidates, as in steps 5-7 of SampleNTT
fn from_three_bytes(b: &[u8]) -> (Integer, Integer) {
    let c0 = Integer::from(b[0]);
    let c1 = Integer::from(b[1]);
    let c2 = Integer::from(b[2]);

    let d1 = c0 + ((c1 & 0x0f) << 8);
    let d2 = (c1 >> 4) + (c2 << 4);
    (d1, d2)
}

// Algorithm 7 SampleNTT
//
// Rejection sampling is applied to public data only (the matrix A), so the number of loop
// iterations may vary.
impl NttPolynomial {
    pub(crate) fn sample_uniform(xof: &mut XofStream) -> Self {
        let mut out = Self::default();
        let mut block = [0u8; XOF_BLOCK_SIZE];
        let mut j = 0;

        while j < 256 {
            xof.read(&mut block);
            for chunk in block.chunks_exact(3) {
                let (d1, d2) = from_three_bytes(chunk);

                if d1 < FieldElement::Q {
                    out.0[j] = FieldElement::new(d1);
                    j += 1;
                }

                if j == 256 {
                    break;
                }

                if d2 < FieldElement::Q {
                    out.0[j] = FieldElement::new(d2);
                    j += 1;
                }

                if j == 256 {
                    break;
                }
            }
        }

        out
    }
}

// Algorithm 8 SamplePolyCBD_eta
//
// Each coefficient is the difference of two sums of `eta` bits each.  Bits are read
// least-significant first within each byte.
impl Polynomial {
    pub(crate) fn sample_cbd(eta: usize, bytes: &[u8]) -> Self {
        debug_assert_eq!(bytes.len(), 64 * eta);

        let bit = |k: usize| Integer::from((bytes[k >> 3] >> (k & 7)) & 1);

        Self(Array::from_fn(|i| {
            let base = 2 * i * eta;
            let mut x = 0;
            let mut y = 0;
            for j in 0..eta {
                x += bit(base + j);
                y += bit(base + eta + j);
            }
            FieldElement::new(x) - FieldElement::new(y)
        }))
    }

    /// Sample a noise polynomial from CBD_eta over the output of PRF_eta(sigma, n)
    pub(crate) fn sample_noise(eta: usize, sigma: &B32, n: u8) -> Self {
        let mut buf = [0u8; 64 * 3];
        let prf_output = &mut buf[..64 * eta];
        PRF(sigma, n, prf_output);
        let poly = Self::sample_cbd(eta, prf_output);

        #[cfg(feature = "zeroize")]
        buf.zeroize();

        poly
    }
}

impl<K: ArraySize> PolynomialVector<K> {
    /// Sample K noise polynomials with PRF counters `start`, `start + 1`, ...
    #[allow(clippy::cast_possible_truncation)]
    #[allow(clippy::as_conversions)]
    pub(crate) fn sample_noise(eta: usize, sigma: &B32, start: u8) -> Self {
        Self(Array::from_fn(|i| {
            Polynomial::sample_noise(eta, sigma, start + i as u8)
        }))
    }
}

impl<K: ArraySize> NttMatrix<K> {
    /// Expand the seed `rho` into the matrix A, or its transpose.  Entry (i, j) of A is sampled
    /// from `XOF(rho, j, i)`; the transpose swaps the two index bytes.
    #[allow(clippy::cast_possible_truncation)]
    #[allow(clippy::as_conversions)]
    pub(crate) fn sample_uniform(rho: &B32, transpose: bool) -> Self {
        Self(Array::from_fn(|i| {
            NttVector::new(Array::from_fn(|j| {
                let (x, y) = if transpose { (i, j) } else { (j, i) };
                let mut xof = XOF(rho, x as u8, y as u8);
                NttPolynomial::sample_uniform(&mut xof)
            }))
        }))
    }
}
