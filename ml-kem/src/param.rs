//! This module encapsulates all of the compile-time logic related to parameter-set dependent sizes
//! of objects.  `ParameterSet` captures the parameters in the form described by FIPS 203.  The
//! encoded sizes of keys and ciphertexts follow from these parameters; each concrete parameter set
//! names fixed-size byte arrays for them, and the crate checks at compile time that those arrays
//! have the derived lengths.

use core::fmt::Debug;
use hybrid_array::{ArraySize, typenum::Unsigned};

/// A fixed-size byte string, used as the encoded form of keys and ciphertexts
pub trait EncodedBytes:
    AsRef<[u8]> + AsMut<[u8]> + Copy + Debug + Eq + Send + Sync + 'static
{
    /// Length of the encoding in bytes
    const LEN: usize;

    /// An all-zero value, to be filled in by an encoder
    fn zeroed() -> Self;
}

impl<const N: usize> EncodedBytes for [u8; N] {
    const LEN: usize = N;

    fn zeroed() -> Self {
        [0u8; N]
    }
}

/// An ML-KEM parameter set.  The constants follow FIPS 203 section 8.
pub trait ParameterSet: Default + Clone + Debug + PartialEq + Eq + Send + Sync + 'static {
    /// Dimension of the module, i.e., the number of polynomials in the vectors `s`, `e`, `t`
    type K: ArraySize;

    /// Noise parameter for the secret and the key-generation error
    const ETA1: usize;

    /// Noise parameter for the encryption error
    const ETA2: usize;

    /// Number of bits per coefficient of the compressed `u` vector
    const DU: usize;

    /// Number of bits per coefficient of the compressed `v` polynomial
    const DV: usize;

    /// Encoded encapsulation key
    type EncapsulationKeyBytes: EncodedBytes;

    /// Encoded decapsulation key
    type DecapsulationKeyBytes: EncodedBytes;

    /// Encoded ciphertext
    type CiphertextBytes: EncodedBytes;

    /// Size of a vector of K polynomials encoded with 12 bits per coefficient
    const POLYVEC_12_LEN: usize = 384 * Self::K::USIZE;

    /// Size of an encoded encapsulation key: t_hat || rho
    const ENCAPSULATION_KEY_LEN: usize = Self::POLYVEC_12_LEN + 32;

    /// Size of an encoded decapsulation key: s_hat || ek || H(ek) || z
    const DECAPSULATION_KEY_LEN: usize =
        Self::POLYVEC_12_LEN + Self::ENCAPSULATION_KEY_LEN + 32 + 32;

    /// Size of the first ciphertext component, the compressed `u`
    const C1_LEN: usize = 32 * Self::DU * Self::K::USIZE;

    /// Size of the second ciphertext component, the compressed `v`
    const C2_LEN: usize = 32 * Self::DV;

    /// Size of an encoded ciphertext
    const CIPHERTEXT_LEN: usize = Self::C1_LEN + Self::C2_LEN;
}

/// Declare a marker type for a parameter set and check at compile time that its byte-array
/// types agree with the lengths derived from `k`, `du`, and `dv`.
macro_rules! define_parameter_set {
    (
        $(#[$meta:meta])*
        $name:ident {
            k: $k:ty,
            eta1: $eta1:literal,
            eta2: $eta2:literal,
            du: $du:literal,
            dv: $dv:literal,
            ek: $ek:literal,
            dk: $dk:literal,
            ct: $ct:literal $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Default, Clone, Copy, Debug, PartialEq, Eq)]
        pub struct $name;

        impl $crate::param::ParameterSet for $name {
            type K = $k;

            const ETA1: usize = $eta1;
            const ETA2: usize = $eta2;
            const DU: usize = $du;
            const DV: usize = $dv;

            type EncapsulationKeyBytes = [u8; $ek];
            type DecapsulationKeyBytes = [u8; $dk];
            type CiphertextBytes = [u8; $ct];
        }

        static_assertions::const_assert_eq!(
            <$name as $crate::param::ParameterSet>::ENCAPSULATION_KEY_LEN,
            $ek
        );
        static_assertions::const_assert_eq!(
            <$name as $crate::param::ParameterSet>::DECAPSULATION_KEY_LEN,
            $dk
        );
        static_assertions::const_assert_eq!(
            <$name as $crate::param::ParameterSet>::CIPHERTEXT_LEN,
            $ct
        );
    };
}

pub(crate) use define_parameter_set;
