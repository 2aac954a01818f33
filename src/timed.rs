//! Timing of computations.

use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq)]
pub struct Timed<V> {
    pub value: V,
    pub elapsed: Duration,
}
impl<V> Timed<V> {
    /// Runs a fallible computation, timing it on success.
    pub fn result<E>(f: impl FnOnce() -> Result<V, E>) -> Result<Timed<V>, E> {
        let start_time = Instant::now();
        f().map(|value| Timed {
            value,
            elapsed: start_time.elapsed(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn captures_the_value_on_success() {
        let timed = Timed::result(|| Ok::<_, ()>(42)).unwrap();
        assert_eq!(42, timed.value);
    }

    #[test]
    fn propagates_the_error() {
        let result = Timed::result(|| Err::<u32, _>("boom"));
        assert_eq!(Err("boom"), result);
    }
}
