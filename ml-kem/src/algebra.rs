use core::fmt::{self, Debug};
use core::ops::{Add, Mul, Neg, Sub};
use hybrid_array::{Array, ArraySize, typenum::U256};

#[cfg(feature = "zeroize")]
use zeroize::Zeroize;

pub(crate) type Integer = u16;
type DoubleInteger = u32;

/// An element of GF(q), always held in its canonical representative `[0, q)`
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct FieldElement(pub Integer);

#[cfg(feature = "zeroize")]
impl Zeroize for FieldElement {
    fn zeroize(&mut self) {
        self.0.zeroize();
    }
}

impl FieldElement {
    pub const Q: Integer = 3329;
    pub const Q32: DoubleInteger = Self::Q as DoubleInteger;
    pub const Q64: u64 = Self::Q as u64;

    const BARRETT_SHIFT: usize = 24;
    #[allow(clippy::integer_division_remainder_used)]
    const BARRETT_MULTIPLIER: u64 = (1 << Self::BARRETT_SHIFT) / Self::Q64;

    pub(crate) const fn new(x: Integer) -> Self {
        Self(x)
    }

    // Maps [0, 2q) to [0, q) without branching on the value.  If `x < q`, the wrapping
    // subtraction sets the top bit, which is then spread into a mask that adds `q` back.
    #[inline]
    pub(crate) const fn small_reduce(x: Integer) -> Integer {
        let r = x.wrapping_sub(Self::Q);
        let mask = 0u16.wrapping_sub(r >> 15);
        r.wrapping_add(Self::Q & mask)
    }

    // Barrett reduction for products of two canonical elements.  For x < q^2 the estimated
    // quotient is off by at most one, so the remainder lies in [0, 2q).
    #[inline]
    #[allow(clippy::cast_possible_truncation)]
    #[allow(clippy::as_conversions)]
    pub(crate) const fn barrett_reduce(x: DoubleInteger) -> Integer {
        let product = (x as u64) * Self::BARRETT_MULTIPLIER;
        let quotient = (product >> Self::BARRETT_SHIFT) as DoubleInteger;
        let remainder = x - quotient * Self::Q32;
        Self::small_reduce(remainder as Integer)
    }
}

impl Neg for FieldElement {
    type Output = Self;

    fn neg(self) -> Self {
        Self(Self::small_reduce(Self::Q - self.0))
    }
}

impl Add<FieldElement> for FieldElement {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(Self::small_reduce(self.0 + rhs.0))
    }
}

impl Sub<FieldElement> for FieldElement {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        // Guard against underflow if `rhs` is too large
        Self(Self::small_reduce(self.0 + Self::Q - rhs.0))
    }
}

impl Mul<FieldElement> for FieldElement {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        let x = DoubleInteger::from(self.0);
        let y = DoubleInteger::from(rhs.0);
        Self(Self::barrett_reduce(x * y))
    }
}

/// An element of the ring `R_q`, i.e., a polynomial over `Z_q` of degree 255
#[derive(Clone, Default, Debug, PartialEq, Eq)]
pub(crate) struct Polynomial(pub Array<FieldElement, U256>);

impl Polynomial {
    pub(crate) const fn new(x: Array<FieldElement, U256>) -> Self {
        Self(x)
    }
}

#[cfg(feature = "zeroize")]
impl Zeroize for Polynomial {
    fn zeroize(&mut self) {
        self.0.zeroize();
    }
}

impl Add<&Polynomial> for &Polynomial {
    type Output = Polynomial;

    fn add(self, rhs: &Polynomial) -> Polynomial {
        Polynomial(
            self.0
                .iter()
                .zip(rhs.0.iter())
                .map(|(&x, &y)| x + y)
                .collect(),
        )
    }
}

impl Sub<&Polynomial> for &Polynomial {
    type Output = Polynomial;

    fn sub(self, rhs: &Polynomial) -> Polynomial {
        Polynomial(
            self.0
                .iter()
                .zip(rhs.0.iter())
                .map(|(&x, &y)| x - y)
                .collect(),
        )
    }
}

impl Mul<&Polynomial> for FieldElement {
    type Output = Polynomial;

    fn mul(self, rhs: &Polynomial) -> Polynomial {
        Polynomial(rhs.0.iter().map(|&x| self * x).collect())
    }
}

/// A vector of polynomials of length `K`
#[derive(Clone, Default)]
pub(crate) struct PolynomialVector<K: ArraySize>(pub Array<Polynomial, K>);

impl<K: ArraySize> PolynomialVector<K> {
    pub(crate) const fn new(x: Array<Polynomial, K>) -> Self {
        Self(x)
    }
}

// Comparisons and formatting are implemented by hand so that they only require `K: ArraySize`
impl<K: ArraySize> PartialEq for PolynomialVector<K> {
    fn eq(&self, other: &Self) -> bool {
        self.0.as_slice() == other.0.as_slice()
    }
}

impl<K: ArraySize> Eq for PolynomialVector<K> {}

impl<K: ArraySize> Debug for PolynomialVector<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PolynomialVector")
            .field(&self.0.as_slice())
            .finish()
    }
}

#[cfg(feature = "zeroize")]
impl<K: ArraySize> Zeroize for PolynomialVector<K> {
    fn zeroize(&mut self) {
        for poly in self.0.iter_mut() {
            poly.zeroize();
        }
    }
}

impl<K: ArraySize> Add<&PolynomialVector<K>> for &PolynomialVector<K> {
    type Output = PolynomialVector<K>;

    fn add(self, rhs: &PolynomialVector<K>) -> PolynomialVector<K> {
        PolynomialVector(
            self.0
                .iter()
                .zip(rhs.0.iter())
                .map(|(x, y)| x + y)
                .collect(),
        )
    }
}

/// An element of the NTT algebra `T_q`, i.e., 128 degree-one polynomials.  These values live in
/// a different domain from [`Polynomial`]; the only way between the two is through the NTT.
#[derive(Clone, Default, Debug, PartialEq, Eq)]
pub(crate) struct NttPolynomial(pub Array<FieldElement, U256>);

impl NttPolynomial {
    pub(crate) const fn new(x: Array<FieldElement, U256>) -> Self {
        Self(x)
    }
}

#[cfg(feature = "zeroize")]
impl Zeroize for NttPolynomial {
    fn zeroize(&mut self) {
        self.0.zeroize();
    }
}

impl Add<&NttPolynomial> for &NttPolynomial {
    type Output = NttPolynomial;

    fn add(self, rhs: &NttPolynomial) -> NttPolynomial {
        NttPolynomial(
            self.0
                .iter()
                .zip(rhs.0.iter())
                .map(|(&x, &y)| x + y)
                .collect(),
        )
    }
}

/// A vector of K NTT-domain polynomials.  NTT vectors can be added and "multiplied" with each
/// other to produce a dot product.
#[derive(Clone, Default)]
pub(crate) struct NttVector<K: ArraySize>(pub Array<NttPolynomial, K>);

impl<K: ArraySize> NttVector<K> {
    pub(crate) const fn new(x: Array<NttPolynomial, K>) -> Self {
        Self(x)
    }
}

impl<K: ArraySize> PartialEq for NttVector<K> {
    fn eq(&self, other: &Self) -> bool {
        self.0.as_slice() == other.0.as_slice()
    }
}

impl<K: ArraySize> Eq for NttVector<K> {}

impl<K: ArraySize> Debug for NttVector<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("NttVector").field(&self.0.as_slice()).finish()
    }
}

#[cfg(feature = "zeroize")]
impl<K: ArraySize> Zeroize for NttVector<K> {
    fn zeroize(&mut self) {
        for poly in self.0.iter_mut() {
            poly.zeroize();
        }
    }
}

impl<K: ArraySize> Add<&NttVector<K>> for &NttVector<K> {
    type Output = NttVector<K>;

    fn add(self, rhs: &NttVector<K>) -> NttVector<K> {
        NttVector(
            self.0
                .iter()
                .zip(rhs.0.iter())
                .map(|(x, y)| x + y)
                .collect(),
        )
    }
}

impl<K: ArraySize> Mul<&NttVector<K>> for &NttVector<K> {
    type Output = NttPolynomial;

    fn mul(self, rhs: &NttVector<K>) -> NttPolynomial {
        self.0
            .iter()
            .zip(rhs.0.iter())
            .map(|(x, y)| x * y)
            .fold(NttPolynomial::default(), |x, y| &x + &y)
    }
}

/// A K x K matrix of NTT-domain polynomials.  Each vector represents a row of the matrix, so that
/// multiplying on the right just requires iteration.
#[derive(Clone, Default)]
pub(crate) struct NttMatrix<K: ArraySize>(pub Array<NttVector<K>, K>);

#[cfg(test)]
impl<K: ArraySize> NttMatrix<K> {
    pub(crate) const fn new(x: Array<NttVector<K>, K>) -> Self {
        Self(x)
    }
}

impl<K: ArraySize> PartialEq for NttMatrix<K> {
    fn eq(&self, other: &Self) -> bool {
        self.0.as_slice() == other.0.as_slice()
    }
}

impl<K: ArraySize> Debug for NttMatrix<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("NttMatrix").field(&self.0.as_slice()).finish()
    }
}

impl<K: ArraySize> Mul<&NttVector<K>> for &NttMatrix<K> {
    type Output = NttVector<K>;

    fn mul(self, rhs: &NttVector<K>) -> NttVector<K> {
        NttVector(self.0.iter().map(|x| x * rhs).collect())
    }
}
