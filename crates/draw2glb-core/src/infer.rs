use crate::model::{Dims, Features, ParseResponse};
use crate::report::Warning;
use crate::tokens::{plausible_mm, MmRange};

#[derive(Debug, Clone)]
pub struct InferConfig {
    pub range: MmRange,
    /// Fewer plausible tokens than this and the page is treated as unreadable.
    pub min_tokens: usize,
    pub round_decimals: u32,
    pub chamfer_probe: f64,
    pub chamfer_tolerance: f64,
    pub default_dims: Dims,
    pub fallback_confidence: f64,
    pub pad_value: f64,
}

impl Default for InferConfig {
    fn default() -> Self {
        Self {
            range: MmRange::default(),
            min_tokens: 3,
            round_decimals: 1,
            chamfer_probe: 4.25,
            chamfer_tolerance: 0.2,
            default_dims: Dims::new(250.0, 250.0, 100.0),
            fallback_confidence: 0.1,
            pad_value: 100.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pick {
    pub dims: Dims,
    pub confidence: f64,
}

/// Picks width/depth/height from a bag of plausible millimeter values.
///
/// The three most frequent values (after rounding) win; ties go to the
/// smaller value. Sorted ascending they become height, width, depth.
/// Confidence is the share of all tokens covered by the winners.
pub fn pick_dims(nums: &[f64], cfg: &InferConfig) -> Pick {
    if nums.is_empty() {
        return Pick {
            dims: cfg.default_dims,
            confidence: 0.0,
        };
    }

    let mut rounded: Vec<f64> = nums
        .iter()
        .map(|n| round_half_even(*n, cfg.round_decimals))
        .collect();
    rounded.sort_by(|a, b| a.total_cmp(b));

    // (value, count), ascending by value.
    let mut tally: Vec<(f64, usize)> = Vec::new();
    for v in rounded {
        match tally.last_mut() {
            Some((last, count)) if *last == v => *count += 1,
            _ => tally.push((v, 1)),
        }
    }
    // Stable: equal counts keep ascending value order.
    tally.sort_by(|a, b| b.1.cmp(&a.1));

    let winners = &tally[..tally.len().min(3)];
    let mut top: Vec<f64> = winners.iter().map(|(v, _)| *v).collect();
    while top.len() < 3 {
        let pad = top.last().copied().unwrap_or(cfg.pad_value);
        top.push(pad);
    }
    top.sort_by(|a, b| a.total_cmp(b));

    let covered: usize = winners.iter().map(|(_, c)| c).sum();
    let confidence = (covered as f64 / nums.len().max(1) as f64).min(1.0);

    Pick {
        dims: Dims::new(top[1], top[2], top[0]),
        confidence: round_half_even(confidence, 2),
    }
}

/// Infers dimensions from every numeric token found on a page.
///
/// Returns `None` when too few tokens fall in the plausible window; callers
/// answer with [`fallback`] in that case.
pub fn infer_from_tokens(raw: &[f64], cfg: &InferConfig) -> Option<ParseResponse> {
    let nums = plausible_mm(raw, cfg.range);
    if nums.len() < cfg.min_tokens {
        return None;
    }

    let pick = pick_dims(&nums, cfg);
    // Only plausible values are probed: with the default window the probe
    // sits below the minimum and never fires.
    let chamfer_seen = nums
        .iter()
        .any(|n| (n - cfg.chamfer_probe).abs() < cfg.chamfer_tolerance);

    tracing::debug!(
        tokens = raw.len(),
        plausible = nums.len(),
        confidence = pick.confidence,
        "picked dimensions"
    );

    Some(ParseResponse {
        dims: pick.dims,
        features_proposed: Features {
            front_chamfer: chamfer_seen.then_some(cfg.chamfer_probe),
            ..Features::default()
        },
        confidence: pick.confidence,
        warnings: Vec::new(),
    })
}

pub fn fallback(cfg: &InferConfig, warning: Warning) -> ParseResponse {
    ParseResponse {
        dims: cfg.default_dims,
        features_proposed: Features::default(),
        confidence: cfg.fallback_confidence,
        warnings: vec![warning],
    }
}

/// Rounds to `decimals` places, halves to the even neighbour (`12.25` -> `12.2`).
pub fn round_half_even(v: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (v * factor).round_ties_even() / factor
}
