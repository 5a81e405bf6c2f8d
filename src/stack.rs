//! Stack growth for the recursive passes.
//!
//! Parsing, resolution and evaluation all recurse once per level of
//! syntactic nesting, and evaluation also recurses once per Lox call. Each
//! of those entry points runs through [`ensure_sufficient_stack`], which
//! moves onto a fresh stack segment when the current one runs low.

/// Grow when less than this much stack remains.
const RED_ZONE: usize = 128 * 1024;

/// Size of each newly allocated segment.
const STACK_PER_RECURSION: usize = 1024 * 1024;

/// Run `f`, first growing the stack if fewer than `RED_ZONE` bytes remain.
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}

/// WASM manages its own stack; call straight through.
#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deep_recursion_does_not_overflow() {
        fn depth(n: u64) -> u64 {
            ensure_sufficient_stack(|| if n == 0 { 0 } else { depth(n - 1) + 1 })
        }

        assert_eq!(depth(100_000), 100_000);
    }

    #[test]
    fn passes_the_result_through() {
        let result: Result<i32, &str> = ensure_sufficient_stack(|| Ok(7));
        assert_eq!(result, Ok(7));
    }
}
