#![no_std]
#![doc = include_str!("../README.md")]
#![doc(
    html_logo_url = "https://raw.githubusercontent.com/RustCrypto/meta/master/logo.svg",
    html_favicon_url = "https://raw.githubusercontent.com/RustCrypto/meta/master/logo.svg"
)]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![warn(clippy::pedantic)] // Be pedantic by default
#![warn(clippy::integer_division_remainder_used)] // Be judicious about using `/` and `%`
#![allow(non_snake_case)] // Allow notation matching FIPS 203
#![allow(clippy::clone_on_copy)] // Be explicit about moving data
#![deny(missing_docs)] // Require all public interfaces to be documented

//! # Usage
//!
//! ```
//! use ml_kem::{B32, MlKem768};
//!
//! let d = B32::default();
//! let z = B32::default();
//! let m = B32::default();
//!
//! // Generate a (decapsulation key, encapsulation key) pair
//! let (dk, ek) = MlKem768::generate_deterministic(&d, &z);
//!
//! // Encapsulate a shared key to the holder of the decapsulation key
//! let (ct, k_send) = ek.encapsulate_deterministic(&m);
//!
//! // Decapsulate the shared key
//! let k_recv = dk.decapsulate(&ct);
//! assert_eq!(k_send, k_recv);
//! ```
//!
//! Real applications should draw the seeds from a cryptographically secure random number
//! generator, using [`Kem::generate`] and [`EncapsulationKey::encapsulate`].

#[cfg(test)]
extern crate std;

mod algebra;
mod compress;
mod crypto;
mod encode;
mod error;
mod kem;
pub mod kyber;
mod ntt;
mod param;
mod pke;
mod sampling;
mod util;

use hybrid_array::typenum::{U2, U3, U4};

use crate::param::define_parameter_set;

pub use crate::error::Error;
pub use crate::kem::{Ciphertext, DecapsulationKey, EncapsulationKey, Kem, SharedKey};
pub use crate::param::{EncodedBytes, ParameterSet};
pub use crate::util::B32;
pub use hybrid_array as array;

#[cfg(feature = "rand_core")]
pub use rand_core;

define_parameter_set! {
    /// `MlKem512` is the parameter set for security category 1, corresponding to key search on
    /// a block cipher with a 128-bit key.
    MlKem512Params {
        k: U2,
        eta1: 3,
        eta2: 2,
        du: 10,
        dv: 4,
        ek: 800,
        dk: 1632,
        ct: 768,
    }
}

define_parameter_set! {
    /// `MlKem768` is the parameter set for security category 3, corresponding to key search on
    /// a block cipher with a 192-bit key.
    MlKem768Params {
        k: U3,
        eta1: 2,
        eta2: 2,
        du: 10,
        dv: 4,
        ek: 1184,
        dk: 2400,
        ct: 1088,
    }
}

define_parameter_set! {
    /// `MlKem1024` is the parameter set for security category 5, corresponding to key search on
    /// a block cipher with a 256-bit key.
    MlKem1024Params {
        k: U4,
        eta1: 2,
        eta2: 2,
        du: 11,
        dv: 5,
        ek: 1568,
        dk: 3168,
        ct: 1568,
    }
}

/// ML-KEM with the parameter set for security category 1
pub type MlKem512 = Kem<MlKem512Params>;

/// ML-KEM with the parameter set for security category 3
pub type MlKem768 = Kem<MlKem768Params>;

/// ML-KEM with the parameter set for security category 5
pub type MlKem1024 = Kem<MlKem1024Params>;

/// Kyber round 3 with the parameters of `MlKem512`
pub type Kyber512 = kyber::Kyber<MlKem512Params>;

/// Kyber round 3 with the parameters of `MlKem768`
pub type Kyber768 = kyber::Kyber<MlKem768Params>;

/// Kyber round 3 with the parameters of `MlKem1024`
pub type Kyber1024 = kyber::Kyber<MlKem1024Params>;
