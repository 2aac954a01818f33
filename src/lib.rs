//! A Poisson regression tipper. Fits a log-linear scoring-rate model over
//! historical results and prices win/draw/loss outcomes for upcoming fixtures
//! by convolving each side's truncated score distribution.

pub mod csv;
pub mod data;
pub mod factorial;
pub mod file;
pub mod forecast;
pub mod linear;
pub mod poisson;
pub mod print;
pub mod probs;
pub mod regression;
pub mod scoregrid;
pub mod timed;

#[cfg(test)]
pub(crate) mod testing;
