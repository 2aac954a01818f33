//! Log-factorials. Match scores in this sport run well past the point where
//! `n!` overflows an integer, so factorials are carried as `ln n!`.

pub trait LnFactorial {
    fn ln_get(&self, n: usize) -> f64;
}

#[derive(Default)]
pub struct Calculator;

impl LnFactorial for Calculator {
    #[inline]
    fn ln_get(&self, n: usize) -> f64 {
        let mut sum = 0.0;
        for i in 2..=n {
            sum += (i as f64).ln();
        }
        sum
    }
}

const MAX_ENTRIES: usize = 512;

pub struct Lookup {
    entries: [f64; MAX_ENTRIES],
}
impl LnFactorial for Lookup {
    #[inline]
    fn ln_get(&self, n: usize) -> f64 {
        self.entries[n]
    }
}

impl Default for Lookup {
    fn default() -> Self {
        let mut entries = [0.0; MAX_ENTRIES];
        for i in 2..MAX_ENTRIES {
            entries[i] = entries[i - 1] + (i as f64).ln();
        }
        Self { entries }
    }
}
