use hybrid_array::{Array, typenum::U32};
use subtle::{Choice, ConditionallySelectable};

/// A 32-byte array, defined here for brevity because it is used several times
pub type B32 = Array<u8, U32>;

/// Constant-time selection between two 32-byte strings: `a` if `choice` is 0, `b` if it is 1
pub(crate) fn ct_select(a: &B32, b: &B32, choice: Choice) -> B32 {
    Array::from_fn(|i| u8::conditional_select(&a[i], &b[i], choice))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn select() {
        let a = B32::from_fn(|_| 0xaa);
        let b = B32::from_fn(|_| 0x55);
        assert_eq!(ct_select(&a, &b, Choice::from(0)), a);
        assert_eq!(ct_select(&a, &b, Choice::from(1)), b);
    }
}
