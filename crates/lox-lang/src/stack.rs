//! Host stack headroom for the recursive parser and evaluator.

/// Free stack below which the next recursive step moves to a new segment.
const RED_ZONE: usize = 128 * 1024;

/// Size of each heap-allocated segment.
const SEGMENT: usize = 1024 * 1024;

/// Runs `f`, first switching to a fresh stack segment if the current one is
/// nearly exhausted. Wrap every step that can recurse without bound.
pub(crate) fn guard<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, SEGMENT, f)
}
