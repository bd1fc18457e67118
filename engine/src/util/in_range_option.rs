//! No space overhead `Option`s for types with sentinels

use std::fmt::Debug;

/// Trait to define sentinel values for types used with `InRangeOption`.
pub trait Sentinel: PartialEq + Copy {
    const SENTINEL: Self;
}

impl Sentinel for u32 {
    const SENTINEL: u32 = u32::MAX;
}

impl Sentinel for usize {
    const SENTINEL: usize = usize::MAX;
}

/// A struct to get `Option`s without space overhead.
///
/// This is conceptually similar to the `NonNull` types rust provides.
/// The witness search keeps several of these in flat arrays indexed by edge key,
/// where the sentinel marks undiscovered entries.
///
/// `InRangeOptions` are constructed from real `Options`.
/// To work with the encapsulated data, the type has to be converted back into an actual `Option` through the `value` method.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InRangeOption<T: Sentinel + Debug>(T);

impl<T: Sentinel + Debug> InRangeOption<T> {
    pub const NONE: Self = InRangeOption(T::SENTINEL);

    #[inline]
    pub fn new(value: Option<T>) -> InRangeOption<T> {
        match value {
            Some(value) => InRangeOption::some(value),
            None => Self::NONE,
        }
    }

    #[inline]
    pub fn some(value: T) -> InRangeOption<T> {
        assert_ne!(value, T::SENTINEL, "InRangeOption::some: Got sentinel as a value");
        InRangeOption(value)
    }

    #[inline]
    pub fn value(&self) -> Option<T> {
        let &InRangeOption(value) = self;
        if value != T::SENTINEL {
            Some(value)
        } else {
            None
        }
    }

    #[inline]
    pub fn is_some(&self) -> bool {
        self.0 != T::SENTINEL
    }
}

impl<T: Sentinel + Debug> Default for InRangeOption<T> {
    fn default() -> Self {
        Self::NONE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_through_sentinel() {
        assert_eq!(InRangeOption::<u32>::new(None).value(), None);
        assert_eq!(InRangeOption::<u32>::new(Some(7)).value(), Some(7));
        assert!(!InRangeOption::<usize>::default().is_some());
    }

    #[test]
    #[should_panic]
    fn sentinel_is_not_a_value() {
        InRangeOption::some(u32::MAX);
    }
}
