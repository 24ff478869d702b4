use sha3::{
    Digest, Sha3_256, Sha3_512, Shake128, Shake256,
    digest::{ExtendableOutput, Update, XofReader},
};

use crate::util::B32;

pub(crate) type XofStream = <Shake128 as ExtendableOutput>::Reader;
pub(crate) type ShakeStream = <Shake256 as ExtendableOutput>::Reader;

/// G(c) = SHA3-512(c), split into two 32-byte halves
pub(crate) fn G(inputs: &[&[u8]]) -> (B32, B32) {
    let mut hasher = Sha3_512::new();
    for input in inputs {
        Digest::update(&mut hasher, input);
    }
    let digest = hasher.finalize();

    let mut a = B32::default();
    let mut b = B32::default();
    a.copy_from_slice(&digest[..32]);
    b.copy_from_slice(&digest[32..]);
    (a, b)
}

/// H(s) = SHA3-256(s)
pub(crate) fn H(input: impl AsRef<[u8]>) -> B32 {
    let mut out = B32::default();
    out.copy_from_slice(&Sha3_256::digest(input));
    out
}

/// J(s) = SHAKE256(s, 8 * 32)
pub(crate) fn J(inputs: &[&[u8]]) -> B32 {
    let mut out = B32::default();
    shake256(inputs).read(&mut out);
    out
}

/// PRF_eta(s, b) = SHAKE256(s || b, 8 * 64 * eta).  The caller sizes `out` to `64 * eta` bytes.
pub(crate) fn PRF(s: &B32, b: u8, out: &mut [u8]) {
    shake256(&[s.as_slice(), &[b]]).read(out);
}

/// XOF(rho, i, j): the SHAKE128 stream used to sample one entry of the matrix A
pub(crate) fn XOF(rho: &B32, i: u8, j: u8) -> XofStream {
    Shake128::default()
        .chain(rho)
        .chain([i, j])
        .finalize_xof()
}

/// An unbounded SHAKE256 output stream over the concatenation of `inputs`
pub(crate) fn shake256(inputs: &[&[u8]]) -> ShakeStream {
    let mut sponge = Shake256::default();
    for input in inputs {
        Update::update(&mut sponge, input);
    }
    sponge.finalize_xof()
}
