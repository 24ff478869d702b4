/// Errors produced when importing keys and ciphertexts from untyped byte slices.
///
/// Decapsulation never fails: an invalid ciphertext yields the implicit-rejection secret instead
/// of an error.
#[derive(Clone, Copy, Debug, Eq, PartialEq, thiserror::Error)]
pub enum Error {
    /// The byte string does not have the length required by the parameter set.
    #[error("invalid length: expected {expected} bytes, got {actual}")]
    InvalidLength {
        /// Length required by the parameter set.
        expected: usize,
        /// Length of the provided input.
        actual: usize,
    },
    /// The encapsulation key contains a coefficient that is not reduced modulo q.
    #[error("invalid encapsulation key: non-canonical coefficient encoding")]
    InvalidEncapsulationKey,
    /// The hash of the embedded encapsulation key does not match the one stored in the
    /// decapsulation key, or a coefficient of the key is not reduced modulo q.
    #[error("invalid decapsulation key: hash mismatch or non-canonical coefficient encoding")]
    InvalidDecapsulationKey,
}

/// Check that `bytes` has exactly `expected` bytes.
pub(crate) fn check_length(bytes: &[u8], expected: usize) -> Result<(), Error> {
    if bytes.len() == expected {
        Ok(())
    } else {
        Err(Error::InvalidLength {
            expected,
            actual: bytes.len(),
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn length_check() {
        assert_eq!(check_length(&[0u8; 32], 32), Ok(()));
        assert_eq!(
            check_length(&[0u8; 31], 32),
            Err(Error::InvalidLength {
                expected: 32,
                actual: 31
            })
        );
    }

    #[test]
    fn display() {
        use std::string::ToString;

        let err = Error::InvalidLength {
            expected: 800,
            actual: 799,
        };
        assert_eq!(
            err.to_string(),
            "invalid length: expected 800 bytes, got 799"
        );
    }
}
