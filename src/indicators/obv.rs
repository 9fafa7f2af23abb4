//! On-Balance Volume (OBV), the volume accumulation indicator.
//!
//! Running sum of signed volume: added on an up close, subtracted on a down
//! close, unchanged on an equal close. The sum starts at 0 and is defined
//! from the second bar.

use super::{require_len, IndicatorSeries};
use crate::{Error, Result};

pub fn volume_accumulation(closes: &[f64], volumes: &[f64]) -> Result<IndicatorSeries> {
    if closes.len() != volumes.len() {
        return Err(Error::InvalidValue("closes and volumes must have equal length"));
    }
    require_len(closes.len(), 2)?;

    let mut out = IndicatorSeries::undefined(closes.len());
    let mut obv = 0.0;
    for i in 1..closes.len() {
        if closes[i] > closes[i - 1] {
            obv += volumes[i];
        } else if closes[i] < closes[i - 1] {
            obv -= volumes[i];
        }
        out.set(i, obv);
    }

    Ok(out)
}
