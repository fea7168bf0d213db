//! Word-level alignment of recognized speech against target verse words.
//!
//! A minimum-cost edit path is computed over a `(|R|+1) x (|T|+1)` table.
//! Costs are kept in tenths so that ties compare exactly:
//!
//! | transition   | cost |
//! |--------------|------|
//! | identical    | 0    |
//! | near spelling (word ratio >= 85) | 0.3 |
//! | substitution | 1.0  |
//! | insertion (recognized word only) | 1.0 |
//! | deletion (target word only) | 1.0 |
//!
//! On equal cost the preferred transition is substitution, then insertion,
//! then deletion.

use serde::Serialize;

use crate::core::corpus::TargetWord;
use crate::core::matcher::word_ratio;

/// Default upper bound on DP cells per alignment.
pub const DEFAULT_MAX_CELLS: usize = 4_000_000;

/// Word ratio at or above which two different words count as a near match.
pub const NEAR_MATCH_RATIO: f64 = 85.0;

const COST_EXACT: u32 = 0;
const COST_NEAR: u32 = 3;
const COST_UNIT: u32 = 10;

/// A recognized word on the global session timeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecognizedWord {
    /// Normalized text
    pub text: String,
    /// Text as returned by the recognizer
    pub raw: String,
    pub start_ms: f64,
    pub end_ms: f64,
}

/// One step of an alignment. At least one side is present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AlignmentPair {
    pub recognized: Option<usize>,
    pub target: Option<usize>,
}

impl AlignmentPair {
    #[inline]
    pub fn matched(recognized: usize, target: usize) -> Self {
        Self {
            recognized: Some(recognized),
            target: Some(target),
        }
    }

    #[inline]
    pub fn inserted(recognized: usize) -> Self {
        Self {
            recognized: Some(recognized),
            target: None,
        }
    }

    #[inline]
    pub fn deleted(target: usize) -> Self {
        Self {
            recognized: None,
            target: Some(target),
        }
    }

    /// Both sides present.
    #[inline]
    pub fn is_match(&self) -> bool {
        self.recognized.is_some() && self.target.is_some()
    }
}

/// Ordered alignment pairs with their total edit cost.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Alignment {
    pub pairs: Vec<AlignmentPair>,
    pub cost: f64,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum AlignmentError {
    #[error("Alignment table too large: {cells} cells (max: {max})")]
    TooLarge { cells: usize, max: usize },
}

/// Transition recorded per DP cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
enum Step {
    Origin = 0,
    Sub = 1,
    Ins = 2,
    Del = 3,
}

/// Alignment with a bound on table size.
#[derive(Debug, Clone, Copy)]
pub struct AlignmentEngine {
    max_cells: usize,
}

impl Default for AlignmentEngine {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CELLS)
    }
}

impl AlignmentEngine {
    pub fn new(max_cells: usize) -> Self {
        Self { max_cells }
    }

    pub fn max_cells(&self) -> usize {
        self.max_cells
    }

    /// Align recognized words against target words.
    ///
    /// Fails with [`AlignmentError::TooLarge`] when the table would exceed the
    /// configured cell budget.
    pub fn align(
        &self,
        recognized: &[RecognizedWord],
        target: &[TargetWord],
    ) -> Result<Alignment, AlignmentError> {
        let cells = (recognized.len() + 1).saturating_mul(target.len() + 1);
        if cells > self.max_cells {
            return Err(AlignmentError::TooLarge {
                cells,
                max: self.max_cells,
            });
        }
        Ok(align_words(recognized, target))
    }
}

/// Align without a table size bound.
pub fn align_words(recognized: &[RecognizedWord], target: &[TargetWord]) -> Alignment {
    let rec: Vec<&str> = recognized.iter().map(|w| w.text.as_str()).collect();
    let tgt: Vec<&str> = target.iter().map(|w| w.text.as_str()).collect();
    align_tokens(&rec, &tgt)
}

fn substitution_cost(a: &str, b: &str) -> u32 {
    if a == b {
        COST_EXACT
    } else if word_ratio(a, b) >= NEAR_MATCH_RATIO {
        COST_NEAR
    } else {
        COST_UNIT
    }
}

fn align_tokens(rec: &[&str], tgt: &[&str]) -> Alignment {
    let n = rec.len();
    let m = tgt.len();
    if n == 0 && m == 0 {
        return Alignment::default();
    }

    let width = m + 1;
    let mut cost = vec![0u32; (n + 1) * width];
    let mut steps = vec![Step::Origin; (n + 1) * width];

    for j in 1..=m {
        cost[j] = cost[j - 1] + COST_UNIT;
        steps[j] = Step::Del;
    }
    for i in 1..=n {
        cost[i * width] = cost[(i - 1) * width] + COST_UNIT;
        steps[i * width] = Step::Ins;
    }

    for i in 1..=n {
        for j in 1..=m {
            let sub = cost[(i - 1) * width + j - 1] + substitution_cost(rec[i - 1], tgt[j - 1]);
            let ins = cost[(i - 1) * width + j] + COST_UNIT;
            let del = cost[i * width + j - 1] + COST_UNIT;

            // strict comparisons keep the earlier choice on ties
            let (mut best, mut step) = (sub, Step::Sub);
            if ins < best {
                best = ins;
                step = Step::Ins;
            }
            if del < best {
                best = del;
                step = Step::Del;
            }

            cost[i * width + j] = best;
            steps[i * width + j] = step;
        }
    }

    let mut pairs = Vec::with_capacity(n + m);
    let (mut i, mut j) = (n, m);
    while i > 0 || j > 0 {
        match steps[i * width + j] {
            Step::Sub => {
                pairs.push(AlignmentPair::matched(i - 1, j - 1));
                i -= 1;
                j -= 1;
            }
            Step::Ins => {
                pairs.push(AlignmentPair::inserted(i - 1));
                i -= 1;
            }
            Step::Del => {
                pairs.push(AlignmentPair::deleted(j - 1));
                j -= 1;
            }
            Step::Origin => break,
        }
    }
    pairs.reverse();

    Alignment {
        pairs,
        cost: f64::from(cost[n * width + m]) / f64::from(COST_UNIT),
    }
}
