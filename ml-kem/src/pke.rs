use core::marker::PhantomData;
use hybrid_array::typenum::Unsigned;
use subtle::{Choice, ConstantTimeEq};

use crate::algebra::{NttMatrix, NttVector, Polynomial, PolynomialVector};
use crate::compress::Compress;
use crate::encode::Encode;
use crate::ntt::{Ntt, NttInverse};
use crate::param::ParameterSet;
use crate::util::B32;

#[cfg(feature = "zeroize")]
use zeroize::Zeroize;

/// A K-PKE decryption key: the secret vector s in the NTT domain
#[derive(Clone)]
pub(crate) struct DecryptionKey<P: ParameterSet> {
    s_hat: NttVector<P::K>,
}

impl<P: ParameterSet> ConstantTimeEq for DecryptionKey<P> {
    fn ct_eq(&self, other: &Self) -> Choice {
        let lhs = self.s_hat.0.iter().flat_map(|p| p.0.iter());
        let rhs = other.s_hat.0.iter().flat_map(|p| p.0.iter());
        lhs.zip(rhs)
            .fold(Choice::from(1), |acc, (x, y)| acc & x.0.ct_eq(&y.0))
    }
}

impl<P: ParameterSet> PartialEq for DecryptionKey<P> {
    fn eq(&self, other: &Self) -> bool {
        self.ct_eq(other).into()
    }
}

#[cfg(feature = "zeroize")]
impl<P: ParameterSet> Zeroize for DecryptionKey<P> {
    fn zeroize(&mut self) {
        self.s_hat.zeroize();
    }
}

/// A K-PKE encryption key: the vector t in the NTT domain and the matrix seed rho
#[derive(Clone)]
pub(crate) struct EncryptionKey<P: ParameterSet> {
    t_hat: NttVector<P::K>,
    rho: B32,
    _params: PhantomData<P>,
}

impl<P: ParameterSet> PartialEq for EncryptionKey<P> {
    fn eq(&self, other: &Self) -> bool {
        self.t_hat == other.t_hat && self.rho == other.rho
    }
}

impl<P: ParameterSet> DecryptionKey<P> {
    // Algorithm 13 K-PKE.KeyGen, from step 3 onward.  The seeds (rho, sigma) are derived by the
    // caller, since the derivation differs between ML-KEM and Kyber round 3.
    pub(crate) fn generate(rho: &B32, sigma: &B32) -> (Self, EncryptionKey<P>) {
        let k = P::K::U8;

        // Sample pseudo-random matrix and vectors
        let A_hat = NttMatrix::<P::K>::sample_uniform(rho, false);
        let s = PolynomialVector::<P::K>::sample_noise(P::ETA1, sigma, 0);
        let e = PolynomialVector::<P::K>::sample_noise(P::ETA1, sigma, k);

        // Compute the public value
        let s_hat = s.ntt();
        let e_hat = e.ntt();
        let t_hat = &(&A_hat * &s_hat) + &e_hat;

        #[cfg(feature = "zeroize")]
        {
            let (mut s, mut e, mut e_hat) = (s, e, e_hat);
            s.zeroize();
            e.zeroize();
            e_hat.zeroize();
        }

        let dk = Self { s_hat };
        let ek = EncryptionKey {
            t_hat,
            rho: rho.clone(),
            _params: PhantomData,
        };
        (dk, ek)
    }

    // Algorithm 15 K-PKE.Decrypt
    pub(crate) fn decrypt(&self, ciphertext: &[u8]) -> B32 {
        let (c1, c2) = ciphertext.split_at(P::C1_LEN);

        let mut u = PolynomialVector::<P::K>::decode(P::DU, c1);
        u.decompress(P::DU);

        let mut v = Polynomial::decode(P::DV, c2);
        v.decompress(P::DV);

        let sTu = (&self.s_hat * &u.ntt()).ntt_inverse();
        let mut w = &v - &sTu;
        w.compress(1);

        let mut m = B32::default();
        w.encode(1, &mut m);

        #[cfg(feature = "zeroize")]
        w.zeroize();

        m
    }

    pub(crate) fn encode(&self, out: &mut [u8]) {
        self.s_hat.encode(12, out);
    }

    pub(crate) fn decode(enc: &[u8]) -> Self {
        Self {
            s_hat: NttVector::decode(12, enc),
        }
    }
}

impl<P: ParameterSet> EncryptionKey<P> {
    // Algorithm 14 K-PKE.Encrypt
    pub(crate) fn encrypt(&self, message: &B32, randomness: &B32, out: &mut [u8]) {
        let k = P::K::U8;

        // Generate the random matrix and noise values
        let AT_hat = NttMatrix::<P::K>::sample_uniform(&self.rho, true);
        let y = PolynomialVector::<P::K>::sample_noise(P::ETA1, randomness, 0);
        let e1 = PolynomialVector::<P::K>::sample_noise(P::ETA2, randomness, k);
        let e2 = Polynomial::sample_noise(P::ETA2, randomness, 2 * k);

        let y_hat = y.ntt();

        // u = NTT^-1(A^T y) + e1
        let mut u = &(&AT_hat * &y_hat).ntt_inverse() + &e1;

        // v = NTT^-1(t^T y) + e2 + Decompress_1(m)
        let mut mu = Polynomial::decode(1, message);
        mu.decompress(1);
        let tTy = (&self.t_hat * &y_hat).ntt_inverse();
        let mut v = &(&tTy + &e2) + &mu;

        let (c1, c2) = out.split_at_mut(P::C1_LEN);
        u.compress(P::DU);
        u.encode(P::DU, c1);
        v.compress(P::DV);
        v.encode(P::DV, c2);

        #[cfg(feature = "zeroize")]
        {
            let (mut y, mut y_hat, mut e1, mut e2, mut mu) = (y, y_hat, e1, e2, mu);
            y.zeroize();
            y_hat.zeroize();
            e1.zeroize();
            e2.zeroize();
            mu.zeroize();
        }
    }

    pub(crate) fn encode(&self, out: &mut [u8]) {
        let (t_hat, rho) = out.split_at_mut(P::POLYVEC_12_LEN);
        self.t_hat.encode(12, t_hat);
        rho.copy_from_slice(&self.rho);
    }

    pub(crate) fn decode(enc: &[u8]) -> Self {
        let (t_hat, rho) = enc.split_at(P::POLYVEC_12_LEN);

        let mut seed = B32::default();
        seed.copy_from_slice(rho);
        Self {
            t_hat: NttVector::decode(12, t_hat),
            rho: seed,
            _params: PhantomData,
        }
    }
}
