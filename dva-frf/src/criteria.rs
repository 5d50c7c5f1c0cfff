//! Criterion Extractor (C4): peaks, bandwidths, slopes, and area from a
//! single mass's magnitude spectrum.

use std::collections::HashMap;

/// One detected local maximum: its position on the omega axis and its
/// magnitude value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Peak {
    pub position: f64,
    pub value: f64,
}

/// Keys of the flat criterion mapping. `Bandwidth` and `Slope` are distinct
/// variants (not interpolated strings sharing one keyspace) precisely so
/// `bandwidth_i_j` and `slope_i_j` can never collide regardless of indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CriterionKey {
    PeakPosition(usize),
    PeakValue(usize),
    /// 1-based, `i < j`.
    Bandwidth(usize, usize),
    /// 1-based, `i < j`.
    Slope(usize, usize),
    SlopeMax,
    AreaUnderCurve,
}

/// The full per-mass criterion dictionary produced once from one magnitude
/// spectrum.
#[derive(Debug, Clone)]
pub struct CriterionDict {
    pub values: HashMap<CriterionKey, f64>,
    pub peaks: Vec<Peak>,
    pub magnitude: Vec<f64>,
    /// Indices (1-based, within `peaks`) of the top two peaks by value, in
    /// original omega order, when more than two peaks exist.
    pub top_peak_indices: Vec<usize>,
}

impl CriterionDict {
    /// Look up a criterion by the prefixed or bare name the scalarizer
    /// (C5) understands: `peak_position_k`, `peak_value_k`,
    /// `bandwidth_i_j`, `slope_i_j`, `slope_max`, `area_under_curve`.
    pub fn get_named(&self, name: &str) -> Option<f64> {
        if let Some(k) = name.strip_prefix("peak_position_") {
            return self.values.get(&CriterionKey::PeakPosition(k.parse().ok()?)).copied();
        }
        if let Some(k) = name.strip_prefix("peak_value_") {
            return self.values.get(&CriterionKey::PeakValue(k.parse().ok()?)).copied();
        }
        if let Some(rest) = name.strip_prefix("bandwidth_") {
            let (i, j) = parse_pair(rest)?;
            return self.values.get(&CriterionKey::Bandwidth(i, j)).copied();
        }
        if let Some(rest) = name.strip_prefix("slope_") {
            if rest == "max" {
                return self.values.get(&CriterionKey::SlopeMax).copied();
            }
            let (i, j) = parse_pair(rest)?;
            return self.values.get(&CriterionKey::Slope(i, j)).copied();
        }
        if name == "area_under_curve" {
            return self.values.get(&CriterionKey::AreaUnderCurve).copied();
        }
        None
    }
}

fn parse_pair(rest: &str) -> Option<(usize, usize)> {
    let mut parts = rest.splitn(2, '_');
    let i = parts.next()?.parse().ok()?;
    let j = parts.next()?.parse().ok()?;
    Some((i, j))
}

/// Extract all criteria from a magnitude spectrum and its matching omega
/// grid. `magnitude.len() == omega.len()`, both non-empty.
pub fn extract(magnitude: &[f64], omega: &[f64]) -> CriterionDict {
    debug_assert_eq!(magnitude.len(), omega.len());

    let mut peaks = Vec::new();
    for i in 1..magnitude.len().saturating_sub(1) {
        if magnitude[i] > magnitude[i - 1] && magnitude[i] > magnitude[i + 1] {
            peaks.push(Peak {
                position: omega[i],
                value: magnitude[i],
            });
        }
    }

    let mut values = HashMap::new();
    for (k, peak) in peaks.iter().enumerate() {
        let one_based = k + 1;
        values.insert(CriterionKey::PeakPosition(one_based), peak.position);
        values.insert(CriterionKey::PeakValue(one_based), peak.value);
    }

    let mut slope_max: f64 = 0.0;
    let mut any_finite_slope = false;
    for i in 0..peaks.len() {
        for j in (i + 1)..peaks.len() {
            let one_i = i + 1;
            let one_j = j + 1;
            let delta_omega = peaks[j].position - peaks[i].position;
            values.insert(CriterionKey::Bandwidth(one_i, one_j), delta_omega);

            if delta_omega != 0.0 {
                let slope = (peaks[j].value - peaks[i].value) / delta_omega;
                values.insert(CriterionKey::Slope(one_i, one_j), slope);
                if slope.is_finite() {
                    any_finite_slope = true;
                    slope_max = slope_max.max(slope.abs());
                }
            }
        }
    }
    if any_finite_slope {
        values.insert(CriterionKey::SlopeMax, slope_max);
    }

    let area = trapezoidal_area(magnitude, omega);
    values.insert(CriterionKey::AreaUnderCurve, area);

    let top_peak_indices = top_two_by_value(&peaks);

    CriterionDict {
        values,
        peaks,
        magnitude: magnitude.to_vec(),
        top_peak_indices,
    }
}

fn trapezoidal_area(magnitude: &[f64], omega: &[f64]) -> f64 {
    let mut area = 0.0;
    for i in 1..magnitude.len() {
        let dw = omega[i] - omega[i - 1];
        area += 0.5 * (magnitude[i] + magnitude[i - 1]) * dw;
    }
    area
}

/// 1-based indices (into `peaks`) of the two largest-value peaks, returned
/// in original omega order. Empty if two or fewer peaks exist (the full
/// list already serves as the "top" set in that case).
fn top_two_by_value(peaks: &[Peak]) -> Vec<usize> {
    if peaks.len() <= 2 {
        return Vec::new();
    }
    let mut by_value: Vec<usize> = (0..peaks.len()).collect();
    by_value.sort_by(|&a, &b| peaks[b].value.partial_cmp(&peaks[a].value).unwrap());
    let mut top = vec![by_value[0] + 1, by_value[1] + 1];
    top.sort_unstable();
    top
}
