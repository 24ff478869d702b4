use core::fmt;
use core::marker::PhantomData;
use hybrid_array::typenum::Unsigned;
use subtle::{Choice, ConstantTimeEq};

use crate::crypto::{G, H, J};
use crate::encode::is_reduced_12;
use crate::error::{Error, check_length};
use crate::param::{EncodedBytes, ParameterSet};
use crate::pke::{DecryptionKey, EncryptionKey};
use crate::util::{B32, ct_select};

#[cfg(feature = "rand_core")]
use rand_core::CryptoRng;

#[cfg(feature = "zeroize")]
use zeroize::{Zeroize, ZeroizeOnDrop};

/// A shared key produced by ML-KEM encapsulation and decapsulation
pub type SharedKey = B32;

/// An ML-KEM ciphertext
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Ciphertext<P: ParameterSet>(P::CiphertextBytes);

impl<P: ParameterSet> Ciphertext<P> {
    /// Wrap an encoded ciphertext.  Every byte string of the right length is a ciphertext.
    pub fn from_bytes(bytes: &P::CiphertextBytes) -> Self {
        Self(*bytes)
    }

    /// The encoded ciphertext
    pub fn as_bytes(&self) -> &P::CiphertextBytes {
        &self.0
    }
}

impl<P: ParameterSet> AsRef<[u8]> for Ciphertext<P> {
    fn as_ref(&self) -> &[u8] {
        self.0.as_ref()
    }
}

impl<P: ParameterSet> ConstantTimeEq for Ciphertext<P> {
    fn ct_eq(&self, other: &Self) -> Choice {
        self.0.as_ref().ct_eq(other.0.as_ref())
    }
}

impl<P: ParameterSet> TryFrom<&[u8]> for Ciphertext<P> {
    type Error = Error;

    fn try_from(bytes: &[u8]) -> Result<Self, Error> {
        check_length(bytes, P::CIPHERTEXT_LEN)?;

        let mut enc = P::CiphertextBytes::zeroed();
        enc.as_mut().copy_from_slice(bytes);
        Ok(Self(enc))
    }
}

/// An ML-KEM encapsulation key, which is public
#[derive(Clone)]
pub struct EncapsulationKey<P: ParameterSet> {
    ek_pke: EncryptionKey<P>,
    bytes: P::EncapsulationKeyBytes,
    h: B32,
}

impl<P: ParameterSet> EncapsulationKey<P> {
    fn from_pke(ek_pke: EncryptionKey<P>) -> Self {
        let mut bytes = P::EncapsulationKeyBytes::zeroed();
        ek_pke.encode(bytes.as_mut());
        let h = H(bytes);
        Self { ek_pke, bytes, h }
    }

    /// Parse an encoded encapsulation key.  Keys that fail [`EncapsulationKey::check`] are
    /// rejected with [`Error::InvalidEncapsulationKey`].
    pub fn from_bytes(bytes: &P::EncapsulationKeyBytes) -> Result<Self, Error> {
        if !Self::check(bytes.as_ref()) {
            return Err(Error::InvalidEncapsulationKey);
        }

        Ok(Self {
            ek_pke: EncryptionKey::decode(bytes.as_ref()),
            bytes: *bytes,
            h: H(bytes),
        })
    }

    /// The encoded encapsulation key
    pub fn as_bytes(&self) -> &P::EncapsulationKeyBytes {
        &self.bytes
    }

    /// The hash H(ek) that is bound into every shared key
    pub(crate) fn hash(&self) -> &B32 {
        &self.h
    }

    /// Encapsulation key check (FIPS 203 section 7.2): the input has the right length and
    /// ByteEncode_12(ByteDecode_12(t_hat)) reproduces it.
    pub fn check(bytes: &[u8]) -> bool {
        if bytes.len() != P::ENCAPSULATION_KEY_LEN {
            return false;
        }

        is_reduced_12(&bytes[..P::POLYVEC_12_LEN]).into()
    }

    // Algorithm 17 ML-KEM.Encaps_internal
    /// Deterministically encapsulate a fresh shared key under this key, using `m` as the
    /// encapsulation randomness
    pub fn encapsulate_deterministic(&self, m: &B32) -> (Ciphertext<P>, SharedKey) {
        let (K, r) = G(&[m, &self.h]);
        let c = self.encrypt(m, &r);
        (c, K)
    }

    /// Encapsulate a fresh shared key under this key
    #[cfg(feature = "rand_core")]
    pub fn encapsulate<R: CryptoRng + ?Sized>(&self, rng: &mut R) -> (Ciphertext<P>, SharedKey) {
        let mut m = B32::default();
        rng.fill_bytes(&mut m);
        let out = self.encapsulate_deterministic(&m);

        #[cfg(feature = "zeroize")]
        m.zeroize();

        out
    }

    pub(crate) fn encrypt(&self, m: &B32, r: &B32) -> Ciphertext<P> {
        let mut c = P::CiphertextBytes::zeroed();
        self.ek_pke.encrypt(m, r, c.as_mut());
        Ciphertext(c)
    }
}

impl<P: ParameterSet> PartialEq for EncapsulationKey<P> {
    fn eq(&self, other: &Self) -> bool {
        self.bytes == other.bytes
    }
}

impl<P: ParameterSet> Eq for EncapsulationKey<P> {}

impl<P: ParameterSet> fmt::Debug for EncapsulationKey<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncapsulationKey")
            .field("bytes", &self.bytes)
            .finish_non_exhaustive()
    }
}

impl<P: ParameterSet> TryFrom<&[u8]> for EncapsulationKey<P> {
    type Error = Error;

    fn try_from(bytes: &[u8]) -> Result<Self, Error> {
        check_length(bytes, P::ENCAPSULATION_KEY_LEN)?;

        let mut enc = P::EncapsulationKeyBytes::zeroed();
        enc.as_mut().copy_from_slice(bytes);
        Self::from_bytes(&enc)
    }
}

/// An ML-KEM decapsulation key, which is secret.  Its `Debug` output does not include any key
/// material, and equality is tested in constant time.
#[derive(Clone)]
pub struct DecapsulationKey<P: ParameterSet> {
    dk_pke: DecryptionKey<P>,
    ek: EncapsulationKey<P>,
    z: B32,
}

impl<P: ParameterSet> DecapsulationKey<P> {
    pub(crate) fn from_pke(dk_pke: DecryptionKey<P>, ek_pke: EncryptionKey<P>, z: &B32) -> Self {
        Self {
            dk_pke,
            ek: EncapsulationKey::from_pke(ek_pke),
            z: z.clone(),
        }
    }

    /// Parse an encoded decapsulation key.  Keys that fail [`DecapsulationKey::check`] are
    /// rejected with [`Error::InvalidDecapsulationKey`], so an accepted key always encodes back
    /// to `bytes`.
    pub fn from_bytes(bytes: &P::DecapsulationKeyBytes) -> Result<Self, Error> {
        if !Self::check(bytes.as_ref()) {
            return Err(Error::InvalidDecapsulationKey);
        }

        let (dk_pke, rest) = bytes.as_ref().split_at(P::POLYVEC_12_LEN);
        let (ek, rest) = rest.split_at(P::ENCAPSULATION_KEY_LEN);
        let (h, z) = rest.split_at(32);

        let mut ek_bytes = P::EncapsulationKeyBytes::zeroed();
        ek_bytes.as_mut().copy_from_slice(ek);

        let mut ek_hash = B32::default();
        ek_hash.copy_from_slice(h);

        let mut seed = B32::default();
        seed.copy_from_slice(z);

        Ok(Self {
            dk_pke: DecryptionKey::decode(dk_pke),
            ek: EncapsulationKey {
                ek_pke: EncryptionKey::decode(ek),
                bytes: ek_bytes,
                h: ek_hash,
            },
            z: seed,
        })
    }

    /// Encode this key as dk_PKE || ek || H(ek) || z
    pub fn to_bytes(&self) -> P::DecapsulationKeyBytes {
        let mut out = P::DecapsulationKeyBytes::zeroed();

        let (dk_pke, rest) = out.as_mut().split_at_mut(P::POLYVEC_12_LEN);
        let (ek, rest) = rest.split_at_mut(P::ENCAPSULATION_KEY_LEN);
        let (h, z) = rest.split_at_mut(32);

        self.dk_pke.encode(dk_pke);
        ek.copy_from_slice(self.ek.bytes.as_ref());
        h.copy_from_slice(&self.ek.h);
        z.copy_from_slice(&self.z);
        out
    }

    /// The encapsulation key embedded in this decapsulation key
    pub fn encapsulation_key(&self) -> &EncapsulationKey<P> {
        &self.ek
    }

    pub(crate) fn implicit_rejection_seed(&self) -> &B32 {
        &self.z
    }

    /// Decapsulation key check (FIPS 203 section 7.3): the input has the right length and the
    /// hash of the embedded encapsulation key matches the stored hash.  In addition, the secret
    /// vector and the embedded encapsulation key must pass the modulus check, since their
    /// coefficients would otherwise be reduced on import.
    pub fn check(bytes: &[u8]) -> bool {
        if bytes.len() != P::DECAPSULATION_KEY_LEN {
            return false;
        }

        let ek_start = P::POLYVEC_12_LEN;
        let h_start = ek_start + P::ENCAPSULATION_KEY_LEN;
        let dk_pke = &bytes[..ek_start];
        let ek = &bytes[ek_start..h_start];
        let h = &bytes[h_start..h_start + 32];

        let reduced = is_reduced_12(dk_pke) & is_reduced_12(&ek[..P::POLYVEC_12_LEN]);
        (reduced & H(ek).as_slice().ct_eq(h)).into()
    }

    // Algorithm 18 ML-KEM.Decaps_internal
    /// Decapsulate the shared key from a ciphertext.  This never fails: a ciphertext that does
    /// not re-encrypt to itself yields a pseudo-random key derived from the secret seed `z`,
    /// selected in constant time.
    pub fn decapsulate(&self, ct: &Ciphertext<P>) -> SharedKey {
        #[allow(unused_mut)]
        let (mut K_prime, matches) = self.decrypt_and_check(ct);
        #[allow(unused_mut)]
        let mut K_bar = J(&[&self.z, ct.as_ref()]);
        let K = ct_select(&K_bar, &K_prime, matches);

        #[cfg(feature = "zeroize")]
        {
            K_prime.zeroize();
            K_bar.zeroize();
        }

        K
    }

    /// Decrypt the ciphertext, re-derive the key and randomness from the recovered message, and
    /// check in constant time that re-encryption reproduces the ciphertext.  Returns the derived
    /// key together with the outcome of the check.
    pub(crate) fn decrypt_and_check(&self, ct: &Ciphertext<P>) -> (B32, Choice) {
        #[allow(unused_mut)]
        let mut m_prime = self.dk_pke.decrypt(ct.as_ref());
        #[allow(unused_mut)]
        let (K_prime, mut r_prime) = G(&[&m_prime, self.ek.hash()]);
        let c_prime = self.ek.encrypt(&m_prime, &r_prime);
        let matches = ct.ct_eq(&c_prime);

        #[cfg(feature = "zeroize")]
        {
            m_prime.zeroize();
            r_prime.zeroize();
        }

        (K_prime, matches)
    }
}

impl<P: ParameterSet> ConstantTimeEq for DecapsulationKey<P> {
    fn ct_eq(&self, other: &Self) -> Choice {
        self.dk_pke.ct_eq(&other.dk_pke)
            & self.ek.bytes.as_ref().ct_eq(other.ek.bytes.as_ref())
            & self.ek.h.as_slice().ct_eq(other.ek.h.as_slice())
            & self.z.as_slice().ct_eq(other.z.as_slice())
    }
}

impl<P: ParameterSet> PartialEq for DecapsulationKey<P> {
    fn eq(&self, other: &Self) -> bool {
        self.ct_eq(other).into()
    }
}

impl<P: ParameterSet> Eq for DecapsulationKey<P> {}

impl<P: ParameterSet> fmt::Debug for DecapsulationKey<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecapsulationKey")
            .field("encapsulation_key", &self.ek)
            .finish_non_exhaustive()
    }
}

impl<P: ParameterSet> TryFrom<&[u8]> for DecapsulationKey<P> {
    type Error = Error;

    fn try_from(bytes: &[u8]) -> Result<Self, Error> {
        check_length(bytes, P::DECAPSULATION_KEY_LEN)?;

        let mut enc = P::DecapsulationKeyBytes::zeroed();
        enc.as_mut().copy_from_slice(bytes);
        let dk = Self::from_bytes(&enc);

        #[cfg(feature = "zeroize")]
        enc.as_mut().zeroize();

        dk
    }
}

#[cfg(feature = "zeroize")]
impl<P: ParameterSet> Drop for DecapsulationKey<P> {
    fn drop(&mut self) {
        self.dk_pke.zeroize();
        self.z.zeroize();
    }
}

#[cfg(feature = "zeroize")]
impl<P: ParameterSet> ZeroizeOnDrop for DecapsulationKey<P> {}

/// ML-KEM key generation for the parameter set `P`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Kem<P: ParameterSet>(PhantomData<P>);

impl<P: ParameterSet> Kem<P> {
    // Algorithm 16 ML-KEM.KeyGen_internal
    /// Deterministically generate a key pair from the seeds `d` and `z`
    pub fn generate_deterministic(d: &B32, z: &B32) -> (DecapsulationKey<P>, EncapsulationKey<P>) {
        #[allow(unused_mut)]
        let (rho, mut sigma) = G(&[d, &[P::K::U8]]);
        let (dk_pke, ek_pke) = DecryptionKey::generate(&rho, &sigma);

        #[cfg(feature = "zeroize")]
        sigma.zeroize();

        let dk = DecapsulationKey::from_pke(dk_pke, ek_pke, z);
        let ek = dk.encapsulation_key().clone();
        (dk, ek)
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

#[cfg(test)]
mod test {
    use super::*;
    use crate::{MlKem512Params, MlKem768Params, MlKem1024Params};
    use hybrid_array::Array;

    fn seeds() -> (B32, B32, B32) {
        let d = Array::from_fn(|i| u8::try_from(i).unwrap_or_default());
        let z = Array::from_fn(|i| u8::try_from(i + 32).unwrap_or_default());
        let m = Array::from_fn(|i| u8::try_from(i + 64).unwrap_or_default());
        (d, z, m)
    }

    fn round_trip_test<P: ParameterSet>() {
        let (d, z, m) = seeds();
        let (dk, ek) = Kem::<P>::generate_deterministic(&d, &z);

        let (ct, k_send) = ek.encapsulate_deterministic(&m);
        let k_recv = dk.decapsulate(&ct);
        assert_eq!(k_send, k_recv);

        // Sizes
        assert_eq!(ek.as_bytes().as_ref().len(), P::ENCAPSULATION_KEY_LEN);
        assert_eq!(dk.to_bytes().as_ref().len(), P::DECAPSULATION_KEY_LEN);
        assert_eq!(ct.as_ref().len(), P::CIPHERTEXT_LEN);

        // Key encodings
        let dk_bytes = dk.to_bytes();
        let dk2 = DecapsulationKey::<P>::from_bytes(&dk_bytes).unwrap();
        assert!(dk == dk2);
        assert!(dk2.to_bytes() == dk_bytes);
        assert!(EncapsulationKey::<P>::from_bytes(ek.as_bytes()).unwrap() == ek);
        assert!(dk2.encapsulation_key() == &ek);
        assert!(EncapsulationKey::<P>::check(ek.as_bytes().as_ref()));
        assert!(DecapsulationKey::<P>::check(dk_bytes.as_ref()));

        // Decapsulation key layout: dk_PKE || ek || H(ek) || z
        let dk_ref = dk_bytes.as_ref();
        let ek_start = P::POLYVEC_12_LEN;
        let h_start = ek_start + P::ENCAPSULATION_KEY_LEN;
        assert_eq!(&dk_ref[ek_start..h_start], ek.as_bytes().as_ref());
        assert_eq!(&dk_ref[h_start..h_start + 32], H(ek.as_bytes()).as_slice());
        assert_eq!(&dk_ref[h_start + 32..], z.as_slice());
    }

    fn implicit_rejection_test<P: ParameterSet>() {
        let (d, z, m) = seeds();
        let (dk, ek) = Kem::<P>::generate_deterministic(&d, &z);
        let (ct, k_send) = ek.encapsulate_deterministic(&m);

        let mut tampered = *ct.as_bytes();
        tampered.as_mut()[0] ^= 0xff;
        let tampered = Ciphertext::<P>::from_bytes(&tampered);

        let k_reject = dk.decapsulate(&tampered);
        assert_ne!(k_reject, k_send);
        assert_eq!(k_reject, J(&[&z, tampered.as_ref()]));

        // Rejection is deterministic
        assert_eq!(dk.decapsulate(&tampered), k_reject);
    }

    fn key_check_test<P: ParameterSet>() {
        let (d, z, _) = seeds();
        let (dk, ek) = Kem::<P>::generate_deterministic(&d, &z);

        // Wrong lengths
        let ek_bytes = ek.as_bytes().as_ref();
        assert!(!EncapsulationKey::<P>::check(&ek_bytes[1..]));
        assert_eq!(
            EncapsulationKey::<P>::try_from(&ek_bytes[1..]),
            Err(Error::InvalidLength {
                expected: P::ENCAPSULATION_KEY_LEN,
                actual: P::ENCAPSULATION_KEY_LEN - 1
            })
        );

        // A coefficient equal to q (0xd01) is not reduced
        let mut bad_ek = *ek.as_bytes();
        bad_ek.as_mut()[0] = 0x01;
        bad_ek.as_mut()[1] = (bad_ek.as_ref()[1] & 0xf0) | 0x0d;
        assert!(!EncapsulationKey::<P>::check(bad_ek.as_ref()));
        assert_eq!(
            EncapsulationKey::<P>::try_from(bad_ek.as_ref()),
            Err(Error::InvalidEncapsulationKey)
        );
        assert_eq!(EncapsulationKey::<P>::try_from(ek_bytes), Ok(ek.clone()));

        // A modified hash is detected
        let mut bad_dk = dk.to_bytes();
        let h_start = P::POLYVEC_12_LEN + P::ENCAPSULATION_KEY_LEN;
        bad_dk.as_mut()[h_start] ^= 1;
        assert!(!DecapsulationKey::<P>::check(bad_dk.as_ref()));
        assert!(matches!(
            DecapsulationKey::<P>::try_from(bad_dk.as_ref()),
            Err(Error::InvalidDecapsulationKey)
        ));
        assert!(DecapsulationKey::<P>::try_from(dk.to_bytes().as_ref()).is_ok_and(|k| k == dk));
    }

    fn non_canonical_key_test<P: ParameterSet>() {
        let (d, z, _) = seeds();
        let (dk, ek) = Kem::<P>::generate_deterministic(&d, &z);

        // An encapsulation key whose first coefficient is 0xfff cannot be imported, so it never
        // reaches encapsulation
        let mut bad_ek = *ek.as_bytes();
        bad_ek.as_mut()[0] = 0xff;
        bad_ek.as_mut()[1] |= 0x0f;
        assert!(!EncapsulationKey::<P>::check(bad_ek.as_ref()));
        assert!(matches!(
            EncapsulationKey::<P>::from_bytes(&bad_ek),
            Err(Error::InvalidEncapsulationKey)
        ));

        // The same for the secret vector, even though the embedded hash still matches
        let mut bad_dk = dk.to_bytes();
        bad_dk.as_mut()[0] = 0xff;
        bad_dk.as_mut()[1] |= 0x0f;
        assert!(!DecapsulationKey::<P>::check(bad_dk.as_ref()));
        assert!(matches!(
            DecapsulationKey::<P>::from_bytes(&bad_dk),
            Err(Error::InvalidDecapsulationKey)
        ));
        assert!(matches!(
            DecapsulationKey::<P>::try_from(bad_dk.as_ref()),
            Err(Error::InvalidDecapsulationKey)
        ));

        // And for the embedded encapsulation key, with its hash recomputed
        let mut bad_dk = dk.to_bytes();
        let ek_start = P::POLYVEC_12_LEN;
        let h_start = ek_start + P::ENCAPSULATION_KEY_LEN;
        bad_dk.as_mut()[ek_start] = 0xff;
        bad_dk.as_mut()[ek_start + 1] |= 0x0f;
        let h = H(&bad_dk.as_ref()[ek_start..h_start]);
        bad_dk.as_mut()[h_start..h_start + 32].copy_from_slice(&h);
        assert!(!DecapsulationKey::<P>::check(bad_dk.as_ref()));
        assert!(DecapsulationKey::<P>::from_bytes(&bad_dk).is_err());

        // Accepted keys encode back to exactly the imported bytes
        let dk_bytes = dk.to_bytes();
        let imported = DecapsulationKey::<P>::from_bytes(&dk_bytes).unwrap();
        assert!(imported.to_bytes() == dk_bytes);
    }

    fn constant_time_eq_test<P: ParameterSet>() {
        let (d, z, _) = seeds();
        let (dk, _) = Kem::<P>::generate_deterministic(&d, &z);
        assert!(bool::from(dk.ct_eq(&dk.clone())));

        // Keys that differ only in z
        let mut other_z = z;
        other_z[31] ^= 1;
        let (dk_z, _) = Kem::<P>::generate_deterministic(&d, &other_z);
        assert!(!bool::from(dk.ct_eq(&dk_z)));

        // Keys that differ only in the secret vector
        let mut bytes = dk.to_bytes();
        let first = bytes.as_ref()[0] | (bytes.as_ref()[1] & 0x0f);
        bytes.as_mut()[0] = u8::from(first == 0);
        bytes.as_mut()[1] &= 0xf0;
        let dk_s = DecapsulationKey::<P>::from_bytes(&bytes).unwrap();
        assert!(!bool::from(dk.ct_eq(&dk_s)));
        assert!(dk != dk_s);
    }

    fn debug_redaction_test<P: ParameterSet>() {
        use std::format;

        let (d, z, _) = seeds();
        let (dk, _) = Kem::<P>::generate_deterministic(&d, &z);
        let out = format!("{dk:?}");
        assert!(out.starts_with("DecapsulationKey"));
        assert!(!out.contains("dk_pke"));
        assert!(!out.contains("z:"));
    }

    #[test]
    fn round_trip() {
        round_trip_test::<MlKem512Params>();
        round_trip_test::<MlKem768Params>();
        round_trip_test::<MlKem1024Params>();
    }

    #[test]
    fn implicit_rejection() {
        implicit_rejection_test::<MlKem512Params>();
        implicit_rejection_test::<MlKem768Params>();
        implicit_rejection_test::<MlKem1024Params>();
    }

    #[test]
    fn key_check() {
        key_check_test::<MlKem512Params>();
        key_check_test::<MlKem768Params>();
        key_check_test::<MlKem1024Params>();
    }

    #[test]
    fn non_canonical_keys() {
        non_canonical_key_test::<MlKem512Params>();
        non_canonical_key_test::<MlKem768Params>();
        non_canonical_key_test::<MlKem1024Params>();
    }

    #[test]
    fn constant_time_eq() {
        constant_time_eq_test::<MlKem512Params>();
        constant_time_eq_test::<MlKem768Params>();
        constant_time_eq_test::<MlKem1024Params>();
    }

    #[test]
    fn debug_redaction() {
        debug_redaction_test::<MlKem512Params>();
        debug_redaction_test::<MlKem768Params>();
        debug_redaction_test::<MlKem1024Params>();
    }
}
