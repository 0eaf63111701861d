//! Stack safety utilities for deep recursion.
//!
//! Patterns nest arbitrarily deep (`((((...))))`), so both the parser and
//! anything that walks a finished tree recurse to pattern depth. Two tools
//! keep that safe:
//!
//! - [`ensure_sufficient_stack`] grows the stack on demand. Tree walkers
//!   use it: a tree that was successfully built can always be traversed.
//! - [`is_stack_near_exhaustion`] only *probes*. The parser uses it to
//!   refuse inputs past its depth budget instead of growing without bound,
//!   which is the difference between "this pattern is too deep" and an
//!   allocator-driven death on hostile input.
//!
//! # Platform Support
//!
//! - **Native targets**: backed by the `stacker` crate.
//! - **WASM targets**: no-op passthrough (WASM has its own stack
//!   management); the probe always reports headroom.

/// Minimum stack space to keep available (100KB red zone).
const RED_ZONE: usize = 100 * 1024;

/// Stack space to allocate when growing (1MB).
const STACK_PER_RECURSION: usize = 1024 * 1024;

/// Ensure sufficient stack space is available before executing `f`.
///
/// If the remaining stack is below the red zone threshold, this allocates
/// additional stack space before calling `f`.
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}

/// WASM version - just call directly.
#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}

/// Check whether the current thread's remaining stack is inside the red
/// zone.
///
/// Returns `false` when the remaining stack cannot be determined; callers
/// pair this probe with their own depth counter rather than relying on it
/// alone.
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn is_stack_near_exhaustion() -> bool {
    stacker::remaining_stack().is_some_and(|remaining| remaining < RED_ZONE)
}

/// WASM version - always reports headroom.
#[inline]
#[cfg(target_arch = "wasm32")]
pub fn is_stack_near_exhaustion() -> bool {
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deep_recursion() {
        // This would overflow without stack growth.
        fn deep_recurse(n: u64) -> u64 {
            ensure_sufficient_stack(|| if n == 0 { 0 } else { deep_recurse(n - 1) + 1 })
        }

        assert_eq!(deep_recurse(100_000), 100_000);
    }

    #[test]
    fn test_returns_closure_result() {
        let result = ensure_sufficient_stack(|| 42);
        assert_eq!(result, 42);
    }

    #[test]
    fn test_probe_reports_headroom_at_top_of_stack() {
        // A fresh test thread has megabytes of headroom.
        assert!(!is_stack_near_exhaustion());
    }
}
