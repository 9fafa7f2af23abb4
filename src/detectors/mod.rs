//! Candlestick pattern detectors
//!
//! Each detector reproduces one TA-Lib `CDL*` function and reports its
//! result with the same signal codes: `100` bullish, `-100` bearish, and
//! `80`/`-80` for the weaker (non-strict) engulfing and harami forms.
//!
//! # Pattern Categories
//!
//! - **Single-bar (17)**: Doji variants, Hammer family, Marubozu, High Wave, etc.
//! - **Two-bar (15)**: Engulfing, Harami, Piercing, neck lines, etc.
//! - **Three-bar (21)**: Morning/Evening Star, Three Soldiers/Crows, gap patterns, etc.
//! - **Multi-bar (8)**: Three-Line Strike, Three Methods, Mat Hold, Breakaway, Hikkake

pub mod helpers;

/// Generate `with_defaults()` -> `Self::default()` for multiple detector types.
macro_rules! impl_with_defaults {
  ($($detector:ty),* $(,)?) => {
    $(impl $detector {
      pub fn with_defaults() -> Self { Self::default() }
    })*
  };
}

pub mod multi_bar;
pub mod single_bar;
pub mod three_bar;
pub mod two_bar;

pub use multi_bar::*;
pub use single_bar::*;
pub use three_bar::*;
pub use two_bar::*;

/// Bullish signal code
pub const BULLISH: i32 = 100;
/// Bearish signal code
pub const BEARISH: i32 = -100;
/// Weaker confirmation (non-strict engulfing / harami)
pub const WEAK: i32 = 80;
