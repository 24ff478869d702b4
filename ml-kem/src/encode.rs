use hybrid_array::{Array, ArraySize, typenum::U256};
use subtle::{Choice, ConstantTimeLess};

use crate::algebra::{
    FieldElement, Integer, NttPolynomial, NttVector, Polynomial, PolynomialVector,
};

/// Number of bytes taken by one polynomial encoded with `d` bits per coefficient
pub(crate) const fn encoded_polynomial_len(d: usize) -> usize {
    32 * d
}

// Algorithm 5 ByteEncode_d
//
// Coefficients are packed least-significant bit first.  The caller provides an output buffer of
// exactly `32 * d` bytes; `d` is always a parameter-set constant, so the loop structure does not
// depend on secret data.
#[allow(clippy::cast_possible_truncation)]
#[allow(clippy::as_conversions)]
fn byte_encode(d: usize, vals: &Array<FieldElement, U256>, out: &mut [u8]) {
    debug_assert_eq!(out.len(), encoded_polynomial_len(d));

    let mask = (1u32 << d) - 1;
    let mut acc = 0u32;
    let mut acc_bits = 0;
    let mut pos = 0;
    for x in vals {
        acc |= (u32::from(x.0) & mask) << acc_bits;
        acc_bits += d;
        while acc_bits >= 8 {
            out[pos] = acc as u8;
            acc >>= 8;
            acc_bits -= 8;
            pos += 1;
        }
    }
}

// Algorithm 6 ByteDecode_d
//
// For d = 12, the decoded values are reduced modulo q, so that any input decodes to some element
// of the field.  Key imports reject non-canonical inputs with `is_reduced_12` before decoding.
#[allow(clippy::cast_possible_truncation)]
#[allow(clippy::as_conversions)]
fn byte_decode(d: usize, enc: &[u8]) -> Array<FieldElement, U256> {
    debug_assert_eq!(enc.len(), encoded_polynomial_len(d));

    let mask = (1u32 << d) - 1;
    let mut acc = 0u32;
    let mut acc_bits = 0;
    let mut bytes = enc.iter();
    Array::from_fn(|_| {
        while acc_bits < d {
            let b = bytes.next().copied().unwrap_or_default();
            acc |= u32::from(b) << acc_bits;
            acc_bits += 8;
        }

        let val = (acc & mask) as Integer;
        acc >>= d;
        acc_bits -= d;

        if d == 12 {
            FieldElement::new(FieldElement::small_reduce(val))
        } else {
            FieldElement::new(val)
        }
    })
}

/// Modulus check (FIPS 203 section 7.2): every 12-bit value packed in `enc` is below q, which is
/// equivalent to ByteEncode_12(ByteDecode_12(enc)) == enc.  Runs in constant time, so it may be
/// applied to secret vectors.
pub(crate) fn is_reduced_12(enc: &[u8]) -> Choice {
    enc.chunks_exact(3).fold(Choice::from(1), |ok, b| {
        let x = u16::from(b[0]) | (u16::from(b[1] & 0x0f) << 8);
        let y = u16::from(b[1] >> 4) | (u16::from(b[2]) << 4);
        ok & x.ct_lt(&FieldElement::Q) & y.ct_lt(&FieldElement::Q)
    })
}

/// Bit-packing of polynomials and vectors of polynomials with `d` bits per coefficient
pub(crate) trait Encode: Sized {
    fn encode(&self, d: usize, out: &mut [u8]);
    fn decode(d: usize, enc: &[u8]) -> Self;
}

impl Encode for Polynomial {
    fn encode(&self, d: usize, out: &mut [u8]) {
        byte_encode(d, &self.0, out);
    }

    fn decode(d: usize, enc: &[u8]) -> Self {
        Self(byte_decode(d, enc))
    }
}

impl Encode for NttPolynomial {
    fn encode(&self, d: usize, out: &mut [u8]) {
        byte_encode(d, &self.0, out);
    }

    fn decode(d: usize, enc: &[u8]) -> Self {
        Self(byte_decode(d, enc))
    }
}

impl<K: ArraySize> Encode for PolynomialVector<K> {
    fn encode(&self, d: usize, out: &mut [u8]) {
        for (poly, chunk) in self.0.iter().zip(out.chunks_mut(encoded_polynomial_len(d))) {
            poly.encode(d, chunk);
        }
    }

    fn decode(d: usize, enc: &[u8]) -> Self {
        Self(
            enc.chunks(encoded_polynomial_len(d))
                .map(|chunk| Polynomial::decode(d, chunk))
                .collect(),
        )
    }
}

impl<K: ArraySize> Encode for NttVector<K> {
    fn encode(&self, d: usize, out: &mut [u8]) {
        for (poly, chunk) in self.0.iter().zip(out.chunks_mut(encoded_polynomial_len(d))) {
            poly.encode(d, chunk);
        }
    }

    fn decode(d: usize, enc: &[u8]) -> Self {
        Self(
            enc.chunks(encoded_polynomial_len(d))
                .map(|chunk| NttPolynomial::decode(d, chunk))
                .collect(),
        )
    }
}
