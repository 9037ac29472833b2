use regex::Regex;
use std::sync::OnceLock;

fn number_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[-+]?[0-9]*\.?[0-9]+").expect("static number pattern"))
}

/// Every signed decimal number in `text`, in order of appearance.
///
/// Matching is purely lexical: `M8x1.25` yields `8` and `1.25`, and a
/// dangling sign without digits is ignored.
pub fn scan_numbers(text: &str) -> Vec<f64> {
    number_re()
        .find_iter(text)
        .filter_map(|m| m.as_str().parse::<f64>().ok())
        .filter(|n| n.is_finite())
        .collect()
}

/// Inclusive millimeter window a drawing dimension can plausibly fall in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MmRange {
    pub min: f64,
    pub max: f64,
}

impl Default for MmRange {
    fn default() -> Self {
        Self {
            min: 5.0,
            max: 3000.0,
        }
    }
}

impl MmRange {
    pub fn contains(&self, n: f64) -> bool {
        n >= self.min && n <= self.max
    }
}

pub fn plausible_mm(nums: &[f64], range: MmRange) -> Vec<f64> {
    nums.iter().copied().filter(|&n| range.contains(n)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scans_signed_and_fractional_numbers() {
        let nums = scan_numbers("W=250 D -12.5 H+.75 M8x1.25");
        assert_eq!(nums, vec![250.0, -12.5, 0.75, 8.0, 1.25]);
    }

    #[test]
    fn trailing_dot_is_not_part_of_number() {
        assert_eq!(scan_numbers("120. mm"), vec![120.0]);
    }

    #[test]
    fn no_digits_no_numbers() {
        assert!(scan_numbers("SECTION A-A").is_empty());
        assert!(scan_numbers("").is_empty());
    }

    #[test]
    fn range_is_inclusive() {
        let kept = plausible_mm(&[4.99, 5.0, 3000.0, 3000.1, -10.0], MmRange::default());
        assert_eq!(kept, vec![5.0, 3000.0]);
    }
}
