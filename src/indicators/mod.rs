// =============================================================================
// Technical Indicators Module
// =============================================================================
//
// Pure, side-effect-free implementations of the derived series the scanner
// computes. Every public function returns `Option<T>` (or an `Option`-aligned
// vec) so callers are forced to handle insufficient-data and numerical
// edge cases.

pub mod atr;
pub mod hull;
pub mod pivots;
pub mod volatility;
