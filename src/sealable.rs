//! Copyright (c) 2023 Mike Tsao. All rights reserved.
//!
//! Sealable configuration model (spec §4.8, component C9): immutable-after-
//! seal objects and collections, plus a deep-clone protocol. Grounded in the
//! teacher's preset-freezing conventions, collapsed per spec §9's allowance
//! ("implementations without inheritance may collapse the two-step
//! `create_new_instance`/`copy_properties_to` protocol into a single virtual
//! clone") into one `Sealable::deep_clone` method, since this crate has no
//! settings inheritance hierarchy to walk level by level.

use crate::error::{codes, DspError, DspResult};

/// `is_sealed` starts false; `seal()` is one-way; mutators must call
/// `throw_if_sealed()` first (spec §4.8).
pub trait Sealable {
    fn is_sealed(&self) -> bool;

    /// Marks this object (and, for implementors with owned children, those
    /// children too) as sealed. One-way: there is no `unseal`.
    fn seal(&mut self);

    fn throw_if_sealed(&self) -> DspResult<()> {
        if self.is_sealed() {
            return Err(DspError::state(
                codes::INVALID_OPERATION,
                "object is sealed and cannot be mutated",
            ));
        }
        Ok(())
    }

    /// Deep, unsealed copy (spec §4.8's collapsed single-clone variant).
    fn deep_clone(&self) -> Self
    where
        Self: Sized;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Default)]
    struct Toy {
        value: i32,
        sealed: bool,
    }

    impl Sealable for Toy {
        fn is_sealed(&self) -> bool {
            self.sealed
        }

        fn seal(&mut self) {
            self.sealed = true;
        }

        fn deep_clone(&self) -> Self {
            Toy {
                value: self.value,
                sealed: false,
            }
        }
    }

    impl Toy {
        fn set_value(&mut self, value: i32) -> DspResult<()> {
            self.throw_if_sealed()?;
            self.value = value;
            Ok(())
        }
    }

    #[test]
    fn mutation_fails_after_seal() {
        let mut t = Toy::default();
        t.set_value(1).unwrap();
        t.seal();
        assert!(t.set_value(2).is_err());
    }

    #[test]
    fn deep_clone_is_unsealed() {
        let mut t = Toy::default();
        t.set_value(5).unwrap();
        t.seal();
        let cloned = t.deep_clone();
        assert!(!cloned.is_sealed());
        assert_eq!(cloned.value, 5);
    }
}
