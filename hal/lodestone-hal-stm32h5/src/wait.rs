//! Busy-wait on hardware flags
//!
//! All blocking in this crate goes through [`await_ready`]. Production code
//! keeps the default [`SpinBudget::Unbounded`]: a flag that never rises is a
//! hardware fault the HAL has no policy for, so it stops forward progress
//! instead of returning a half-initialised peripheral. Tests and cautious
//! callers pick [`SpinBudget::Iterations`] to get an error instead.

/// How long to spin on a hardware flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SpinBudget {
    /// Poll until the flag rises, however long that takes
    #[default]
    Unbounded,
    /// Give up after this many unsuccessful polls
    Iterations(u32),
}

/// The spin budget ran out before the flag rose
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Exhausted;

/// Poll `ready` until it returns `true` or `budget` runs out
///
/// The predicate is checked before the first spin, so a flag that is
/// already up costs one read.
pub fn await_ready<F>(budget: SpinBudget, mut ready: F) -> Result<(), Exhausted>
where
    F: FnMut() -> bool,
{
    match budget {
        SpinBudget::Unbounded => {
            while !ready() {
                core::hint::spin_loop();
            }
            Ok(())
        }
        SpinBudget::Iterations(limit) => {
            for _ in 0..limit {
                if ready() {
                    return Ok(());
                }
                core::hint::spin_loop();
            }
            if ready() {
                Ok(())
            } else {
                Err(Exhausted)
            }
        }
    }
}
