use core::ops::Mul;
use hybrid_array::ArraySize;

use crate::algebra::{
    FieldElement, Integer, NttPolynomial, NttVector, Polynomial, PolynomialVector,
};

// Since the powers of zeta used in the NTT and MultiplyNTTs are fixed, we use pre-computed tables
// to avoid the need to compute the exponentiations at runtime.
//
//   ZETA_POW_BITREV[i] = zeta^{BitRev_7(i)}
//   GAMMA[i] = zeta^{2 BitRev_7(i) + 1}
//
// Because operator overloading can't be const, the reductions here are done manually.  Because
// `for` loops are forbidden in `const` functions, we do them with `while` loops.
//
// The values computed here match those provided in Appendix A of FIPS 203.
#[allow(clippy::cast_possible_truncation)]
#[allow(clippy::as_conversions)]
#[allow(clippy::integer_division_remainder_used)]
const fn zeta_pow_table() -> [u32; 256] {
    const ZETA: u32 = 17;

    let mut pow = [0u32; 256];
    let mut i = 0;
    let mut curr = 1u32;
    while i < 256 {
        pow[i] = curr;
        i += 1;
        curr = (curr * ZETA) % FieldElement::Q32;
    }
    pow
}

#[allow(clippy::cast_possible_truncation)]
#[allow(clippy::as_conversions)]
const fn bitrev7(x: usize) -> usize {
    ((x as u8).reverse_bits() >> 1) as usize
}

#[allow(clippy::cast_possible_truncation)]
#[allow(clippy::as_conversions)]
const ZETA_POW_BITREV: [FieldElement; 128] = {
    let pow = zeta_pow_table();
    let mut table = [FieldElement::new(0); 128];
    let mut i = 0;
    while i < 128 {
        table[i] = FieldElement::new(pow[bitrev7(i)] as Integer);
        i += 1;
    }
    table
};

#[allow(clippy::cast_possible_truncation)]
#[allow(clippy::as_conversions)]
const GAMMA: [FieldElement; 128] = {
    let pow = zeta_pow_table();
    let mut table = [FieldElement::new(0); 128];
    let mut i = 0;
    while i < 128 {
        table[i] = FieldElement::new(pow[2 * bitrev7(i) + 1] as Integer);
        i += 1;
    }
    table
};

// Algorithm 11 MultiplyNTTs
impl Mul<&NttPolynomial> for &NttPolynomial {
    type Output = NttPolynomial;

    fn mul(self, rhs: &NttPolynomial) -> NttPolynomial {
        let mut out = NttPolynomial::default();

        for i in 0..128 {
            let (c0, c1) = base_case_multiply(
                self.0[2 * i],
                self.0[2 * i + 1],
                rhs.0[2 * i],
                rhs.0[2 * i + 1],
                GAMMA[i],
            );

            out.0[2 * i] = c0;
            out.0[2 * i + 1] = c1;
        }

        out
    }
}

// Algorithm 12 BaseCaseMultiply
#[inline]
fn base_case_multiply(
    a0: FieldElement,
    a1: FieldElement,
    b0: FieldElement,
    b1: FieldElement,
    gamma: FieldElement,
) -> (FieldElement, FieldElement) {
    let c0 = a0 * b0 + a1 * b1 * gamma;
    let c1 = a0 * b1 + a1 * b0;
    (c0, c1)
}

pub(crate) trait Ntt {
    type Output;
    fn ntt(&self) -> Self::Output;
}

/// Constant-time NTT butterfly layer.
///
/// Uses const generics to ensure loop bounds are compile-time constants,
/// avoiding UDIV instructions from runtime `step_by` calculations.
#[allow(clippy::inline_always)] // Required for constant-time guarantees in crypto code
#[inline(always)]
fn ntt_layer<const LEN: usize, const ITERATIONS: usize>(
    w: &mut [FieldElement; 256],
    m: &mut usize,
) {
    for i in 0..ITERATIONS {
        let start = i * 2 * LEN;
        *m += 1;
        let z = ZETA_POW_BITREV[*m];
        for j in start..(start + LEN) {
            let t = z * w[j + LEN];
            w[j + LEN] = w[j] - t;
            w[j] = w[j] + t;
        }
    }
}

impl Ntt for Polynomial {
    type Output = NttPolynomial;

    // Algorithm 9 NTT
    fn ntt(&self) -> Self::Output {
        let mut w: [FieldElement; 256] = self.0.clone().into();
        let mut m = 0;

        ntt_layer::<128, 1>(&mut w, &mut m);
        ntt_layer::<64, 2>(&mut w, &mut m);
        ntt_layer::<32, 4>(&mut w, &mut m);
        ntt_layer::<16, 8>(&mut w, &mut m);
        ntt_layer::<8, 16>(&mut w, &mut m);
        ntt_layer::<4, 32>(&mut w, &mut m);
        ntt_layer::<2, 64>(&mut w, &mut m);

        NttPolynomial::new(w.into())
    }
}

impl<K: ArraySize> Ntt for PolynomialVector<K> {
    type Output = NttVector<K>;

    fn ntt(&self) -> Self::Output {
        NttVector::new(self.0.iter().map(Polynomial::ntt).collect())
    }
}

#[allow(clippy::module_name_repetitions)]
pub(crate) trait NttInverse {
    type Output;
    fn ntt_inverse(&self) -> Self::Output;
}

/// Constant-time inverse NTT butterfly layer.
#[allow(clippy::inline_always)] // Required for constant-time guarantees in crypto code
#[inline(always)]
fn ntt_inverse_layer<const LEN: usize, const ITERATIONS: usize>(
    w: &mut [FieldElement; 256],
    m: &mut usize,
) {
    for i in 0..ITERATIONS {
        let start = i * 2 * LEN;
        *m -= 1;
        let z = ZETA_POW_BITREV[*m];
        for j in start..(start + LEN) {
            let t = w[j];
            w[j] = t + w[j + LEN];
            w[j + LEN] = z * (w[j + LEN] - t);
        }
    }
}

impl NttInverse for NttPolynomial {
    type Output = Polynomial;

    // Algorithm 10 NTT^{-1}
    fn ntt_inverse(&self) -> Self::Output {
        // 128^{-1} mod q
        const INVERSE_128: FieldElement = FieldElement::new(3303);

        let mut w: [FieldElement; 256] = self.0.clone().into();
        let mut m = 128;

        ntt_inverse_layer::<2, 64>(&mut w, &mut m);
        ntt_inverse_layer::<4, 32>(&mut w, &mut m);
        ntt_inverse_layer::<8, 16>(&mut w, &mut m);
        ntt_inverse_layer::<16, 8>(&mut w, &mut m);
        ntt_inverse_layer::<32, 4>(&mut w, &mut m);
        ntt_inverse_layer::<64, 2>(&mut w, &mut m);
        ntt_inverse_layer::<128, 1>(&mut w, &mut m);

        INVERSE_128 * &Polynomial::new(w.into())
    }
}

impl<K: ArraySize> NttInverse for NttVector<K> {
    type Output = PolynomialVector<K>;

    fn ntt_inverse(&self) -> Self::Output {
        PolynomialVector::new(self.0.iter().map(NttPolynomial::ntt_inverse).collect())
    }
}
