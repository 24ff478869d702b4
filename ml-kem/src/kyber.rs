//! The Kyber round-3 key encapsulation mechanism, as submitted to the third round of the NIST
//! post-quantum standardization process.
//!
//! Kyber shares its key formats, its ciphertext format, and the underlying K-PKE scheme with
//! ML-KEM.  It differs in three places:
//!
//! * Key generation derives `(rho, sigma)` as `G(d)`, without binding the module dimension.
//! * Encapsulation hashes its randomness before use, `m = H(m)`.
//! * The shared secret is an arbitrary-length SHAKE256 stream over the pre-key and `H(c)`.  On
//!   implicit rejection the pre-key is the secret seed `z`.
//!
//! Keys generated by one scheme are not interchangeable with the other.

use core::fmt;
use core::marker::PhantomData;
use sha3::digest::XofReader;
use subtle::{Choice, ConstantTimeEq};

use crate::crypto::{G, H, ShakeStream, shake256};
use crate::error::Error;
use crate::kem::{self, Ciphertext};
use crate::param::ParameterSet;
use crate::pke::DecryptionKey;
use crate::util::{B32, ct_select};

#[cfg(feature = "rand_core")]
use rand_core::CryptoRng;

#[cfg(feature = "zeroize")]
use zeroize::Zeroize;

/// The shared secret produced by Kyber, as an unbounded SHAKE256 output stream.  With the
/// `zeroize` feature the sponge state is wiped on drop.
pub struct Kdf(ShakeStream);

impl Kdf {
    fn new(pre_key: &B32, ct: &[u8]) -> Self {
        Self(shake256(&[pre_key, &H(ct)]))
    }

    /// Fill `out` with the next bytes of the shared secret
    pub fn squeeze(&mut self, out: &mut [u8]) {
        self.0.read(out);
    }

    /// The first 32 bytes of the shared secret
    pub fn into_shared_key(mut self) -> kem::SharedKey {
        let mut out = kem::SharedKey::default();
        self.squeeze(&mut out);
        out
    }
}

impl fmt::Debug for Kdf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Kdf").finish_non_exhaustive()
    }
}

/// A Kyber encapsulation key
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncapsulationKey<P: ParameterSet>(kem::EncapsulationKey<P>);

impl<P: ParameterSet> EncapsulationKey<P> {
    /// Parse an encoded encapsulation key, rejecting coefficients that are not reduced modulo q
    pub fn from_bytes(bytes: &P::EncapsulationKeyBytes) -> Result<Self, Error> {
        kem::EncapsulationKey::from_bytes(bytes).map(Self)
    }

    /// The encoded encapsulation key
    pub fn as_bytes(&self) -> &P::EncapsulationKeyBytes {
        self.0.as_bytes()
    }

    /// Deterministically encapsulate a shared secret, using `m` as the encapsulation randomness
    pub fn encapsulate_deterministic(&self, m: &B32) -> (Ciphertext<P>, Kdf) {
        #[allow(unused_mut)]
        let mut m = H(m);
        #[allow(unused_mut)]
        let (mut K_bar, mut r) = G(&[&m, self.0.hash()]);
        let c = self.0.encrypt(&m, &r);
        let kdf = Kdf::new(&K_bar, c.as_ref());

        #[cfg(feature = "zeroize")]
        {
            m.zeroize();
            K_bar.zeroize();
            r.zeroize();
        }

        (c, kdf)
    }

    /// Encapsulate a shared secret under this key
    #[cfg(feature = "rand_core")]
    pub fn encapsulate<R: CryptoRng + ?Sized>(&self, rng: &mut R) -> (Ciphertext<P>, Kdf) {
        let mut m = B32::default();
        rng.fill_bytes(&mut m);
        let out = self.encapsulate_deterministic(&m);

        #[cfg(feature = "zeroize")]
        m.zeroize();

        out
    }
}

impl<P: ParameterSet> TryFrom<&[u8]> for EncapsulationKey<P> {
    type Error = Error;

    fn try_from(bytes: &[u8]) -> Result<Self, Error> {
        kem::EncapsulationKey::try_from(bytes).map(Self)
    }
}

/// A Kyber decapsulation key.  Its encoding is the same as an ML-KEM decapsulation key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecapsulationKey<P: ParameterSet>(kem::DecapsulationKey<P>);

impl<P: ParameterSet> DecapsulationKey<P> {
    /// Parse an encoded decapsulation key, with the same checks as ML-KEM decapsulation keys
    pub fn from_bytes(bytes: &P::DecapsulationKeyBytes) -> Result<Self, Error> {
        kem::DecapsulationKey::from_bytes(bytes).map(Self)
    }

    /// Encode this key as dk_PKE || ek || H(ek) || z
    pub fn to_bytes(&self) -> P::DecapsulationKeyBytes {
        self.0.to_bytes()
    }

    /// The encapsulation key embedded in this decapsulation key
    pub fn encapsulation_key(&self) -> EncapsulationKey<P> {
        EncapsulationKey(self.0.encapsulation_key().clone())
    }

    /// Decapsulate the shared secret from a ciphertext.  A ciphertext that does not re-encrypt
    /// to itself yields a stream keyed by the secret seed `z` instead, selected in constant time.
    pub fn decapsulate(&self, ct: &Ciphertext<P>) -> Kdf {
        #[allow(unused_mut)]
        let (mut K_bar, matches) = self.0.decrypt_and_check(ct);
        #[allow(unused_mut)]
        let mut pre_key = ct_select(self.0.implicit_rejection_seed(), &K_bar, matches);
        let kdf = Kdf::new(&pre_key, ct.as_ref());

        #[cfg(feature = "zeroize")]
        {
            K_bar.zeroize();
            pre_key.zeroize();
        }

        kdf
    }
}

impl<P: ParameterSet> ConstantTimeEq for DecapsulationKey<P> {
    fn ct_eq(&self, other: &Self) -> Choice {
        self.0.ct_eq(&other.0)
    }
}

impl<P: ParameterSet> TryFrom<&[u8]> for DecapsulationKey<P> {
    type Error = Error;

    fn try_from(bytes: &[u8]) -> Result<Self, Error> {
        kem::DecapsulationKey::try_from(bytes).map(Self)
    }
}

/// Kyber round-3 key generation for the parameter set `P`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Kyber<P: ParameterSet>(PhantomData<P>);

impl<P: ParameterSet> Kyber<P> {
    /// Deterministically generate a key pair from the seeds `d` and `z`
    pub fn generate_deterministic(d: &B32, z: &B32) -> (DecapsulationKey<P>, EncapsulationKey<P>) {
        #[allow(unused_mut)]
        let (rho, mut sigma) = G(&[d]);
        let (dk_pke, ek_pke) = DecryptionKey::generate(&rho, &sigma);

        #[cfg(feature = "zeroize")]
        sigma.zeroize();

        let dk = kem::DecapsulationKey::from_pke(dk_pke, ek_pke, z);
        let ek = EncapsulationKey(dk.encapsulation_key().clone());
        (DecapsulationKey(dk), ek)
    }

    /// Generate a key pair with seeds drawn from `rng`
    #[cfg(feature = "rand_core")]
    pub fn generate<R: CryptoRng + ?Sized>(
        rng: &mut R,
    ) -> (DecapsulationKey<P>, EncapsulationKey<P>) {
        let mut d = B32::default();
        let mut z = B32::default();
        rng.fill_bytes(&mut d);
        rng.fill_bytes(&mut z);
        let out = Self::generate_deterministic(&d, &z);

        #[cfg(feature = "zeroize")]
        {
            d.zeroize();
            z.zeroize();
        }

        out
    }
}
