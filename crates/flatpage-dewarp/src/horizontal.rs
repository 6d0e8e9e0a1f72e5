//! Horizontal disparity estimation
//!
//! A heuristic: the change of vertical disparity from the top of the page to
//! the bottom is taken as a measure of how much each column is foreshortened,
//! and columns are shifted to compensate. It holds best when line curvature
//! does not vary much down the page.
//!
//! The margins are also measured here. The left and right endpoints of the
//! text lines are fit as x against y; the slopes and curvatures feed model
//! validation.

use crate::error::{DewarpError, DewarpResult};
use crate::textline::remove_short_lines;
use crate::types::{Dewarp, DewarpOptions, TextLine};
use flatpage_core::{FPix, Pta};

/// Slope (milli-units) and curvature (micro-units) of one margin.
fn fit_edge(points: &Pta) -> Option<(i32, i32)> {
    if points.len() < 3 {
        return None;
    }
    let (a, _) = points.get_linear_lsf().ok()?;
    let (c2, _, _) = points.get_quadratic_lsf().ok()?;
    Some(((1000.0 * a).round() as i32, (1.0e6 * c2).round() as i32))
}

/// Build the horizontal disparity model
///
/// Requires a vertical model. The margin statistics are measured on the
/// lines that survive the short line filter; if either margin cannot be
/// fit, `h_success` stays false and the page remains usable with vertical
/// correction only.
///
/// # Errors
///
/// Returns [`DewarpError::ModelNotBuilt`] if the vertical model is missing.
pub fn build_horizontal_disparity(
    dewarp: &mut Dewarp,
    lines: &[TextLine],
    options: &DewarpOptions,
) -> DewarpResult<()> {
    if !dewarp.v_success {
        return Err(DewarpError::ModelNotBuilt("horizontal needs a vertical model"));
    }
    dewarp.h_success = false;
    dewarp.sampled_h_disparity = None;
    dewarp.full_h_disparity = None;
    dewarp.extra_width = 0;

    let filtered = remove_short_lines(lines.to_vec(), options.line_fraction);
    let mut left = Pta::with_capacity(filtered.len());
    let mut right = Pta::with_capacity(filtered.len());
    for ((lx, ly), (rx, ry)) in filtered.iter().filter_map(TextLine::endpoints) {
        left.push(ly, lx);
        right.push(ry, rx);
    }

    let (Some((left_slope, left_curv)), Some((right_slope, right_curv))) =
        (fit_edge(&left), fit_edge(&right))
    else {
        tracing::debug!(
            page = dewarp.page_number,
            endpoints = left.len(),
            "margins could not be fit; no horizontal model"
        );
        return Ok(());
    };
    dewarp.left_slope = left_slope;
    dewarp.right_slope = right_slope;
    dewarp.left_curvature = left_curv;
    dewarp.right_curvature = right_curv;

    populate_horizontal_field(dewarp)?;
    dewarp.h_success = true;

    tracing::debug!(
        page = dewarp.page_number,
        left_slope,
        right_slope,
        left_curv,
        right_curv,
        extra_width = dewarp.extra_width,
        "horizontal disparity built"
    );
    Ok(())
}

/// Compute the full and sampled horizontal fields from the vertical field
///
/// The full vertical field is generated first if it is missing.
pub(crate) fn populate_horizontal_field(dewarp: &mut Dewarp) -> DewarpResult<()> {
    if dewarp.full_v_disparity.is_none() {
        let sampled = dewarp
            .sampled_v_disparity
            .as_ref()
            .ok_or(DewarpError::ModelNotBuilt("no sampled vertical disparity"))?;
        dewarp.full_v_disparity = Some(sampled.scale_by_integer(dewarp.sampling)?);
    }
    let full_v = dewarp
        .full_v_disparity
        .as_ref()
        .ok_or(DewarpError::ModelNotBuilt("no full vertical disparity"))?;

    let (fw, fh) = full_v.dimensions();
    let factor = dewarp.h_slope_factor;
    let top = full_v.row(0);
    let bottom = full_v.row(fh - 1);
    let slopes: Vec<f32> = top
        .iter()
        .zip(bottom)
        .map(|(t, b)| factor * (b - t) / fh as f32)
        .collect();
    let profile: Vec<f32> = slopes.iter().map(|s| slopes[0] - s).collect();

    let max = profile.iter().copied().fold(0f32, f32::max);
    let extra = max.round().max(0.0) as u32;
    let last = profile[fw as usize - 1];

    let width = fw + extra;
    let mut field = FPix::new(width, fh)?;
    for y in 0..fh {
        let row = field.row_mut(y);
        row[..fw as usize].copy_from_slice(&profile);
        row[fw as usize..].fill(last);
    }

    dewarp.sampled_h_disparity = Some(field.subsample(dewarp.sampling)?);
    dewarp.full_h_disparity = Some(field);
    dewarp.extra_width = extra;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{build_vertical_disparity, populate_full_resolution};

    /// Line from `x0` to `x0 + 600` sagging by `sag` at its middle.
    fn line(x0: f32, base: f32, sag: f32) -> TextLine {
        (0..=120)
            .map(|k| {
                let x = x0 + k as f32 * 5.0;
                let t = (x - x0 - 300.0) / 300.0;
                (x, base + sag * (1.0 - t * t))
            })
            .collect()
    }

    fn built(lines: &[TextLine]) -> (Dewarp, DewarpOptions) {
        let opts = DewarpOptions::new().with_min_lines(4);
        let mut dewarp = Dewarp::new(700, 700, 0, &opts);
        build_vertical_disparity(&mut dewarp, lines, &opts).unwrap();
        (dewarp, opts)
    }

    #[test]
    fn test_requires_vertical_model() {
        let opts = DewarpOptions::new();
        let mut dewarp = Dewarp::new(700, 700, 0, &opts);
        let lines = vec![line(0.0, 60.0, 5.0)];
        assert!(matches!(
            build_horizontal_disparity(&mut dewarp, &lines, &opts),
            Err(DewarpError::ModelNotBuilt(_))
        ));
    }

    #[test]
    fn test_field_shape() {
        let lines: Vec<TextLine> = (0..12)
            .map(|i| line(0.0, 60.0 + 50.0 * i as f32, 10.0 + i as f32))
            .collect();
        let (mut dewarp, opts) = built(&lines);
        build_horizontal_disparity(&mut dewarp, &lines, &opts).unwrap();
        assert!(dewarp.h_success());

        let (vw, vh) = dewarp.full_v_disparity().unwrap().dimensions();
        let h = dewarp.full_h_disparity().unwrap();
        assert_eq!(h.dimensions(), (vw + dewarp.extra_width(), vh));

        let first = h.row(0).to_vec();
        assert_eq!(first[0], 0.0);
        for y in 1..vh {
            assert_eq!(h.row(y), &first[..]);
        }
        for x in vw..h.width() {
            assert_eq!(first[x as usize], first[vw as usize - 1]);
        }
        let max = first.iter().copied().fold(0f32, f32::max);
        assert_eq!(dewarp.extra_width(), max.round() as u32);

        let sampled = dewarp.sampled_h_disparity().unwrap();
        assert_eq!(sampled, &h.subsample(dewarp.sampling()).unwrap());
    }

    #[test]
    fn test_edge_statistics() {
        // left margin moves right by 0.1 px per px of height
        let lines: Vec<TextLine> = (0..12)
            .map(|i| {
                let base = 60.0 + 50.0 * i as f32;
                line(0.1 * base, base, 0.0)
            })
            .collect();
        let (mut dewarp, opts) = built(&lines);
        build_horizontal_disparity(&mut dewarp, &lines, &opts).unwrap();
        assert!(dewarp.h_success());
        assert_eq!(dewarp.edge_slopes(), (100, 100));
        assert_eq!(dewarp.edge_curvatures(), (0, 0));
    }

    #[test]
    fn test_too_few_endpoints_is_not_an_error() {
        let lines: Vec<TextLine> = (0..6)
            .map(|i| line(0.0, 60.0 + 50.0 * i as f32, 8.0))
            .collect();
        let (mut dewarp, opts) = built(&lines);
        build_horizontal_disparity(&mut dewarp, &lines[..2], &opts).unwrap();
        assert!(!dewarp.h_success());
        assert!(dewarp.full_h_disparity().is_none());
        assert_eq!(dewarp.extra_width(), 0);
    }

    #[test]
    fn test_regenerated_after_minimize() {
        let lines: Vec<TextLine> = (0..8)
            .map(|i| line(0.0, 60.0 + 70.0 * i as f32, 6.0 + 2.0 * i as f32))
            .collect();
        let (mut dewarp, opts) = built(&lines);
        build_horizontal_disparity(&mut dewarp, &lines, &opts).unwrap();
        let before = dewarp.full_h_disparity().unwrap().clone();
        dewarp.minimize();
        assert!(dewarp.full_h_disparity().is_none());
        populate_full_resolution(&mut dewarp).unwrap();
        assert_eq!(dewarp.full_h_disparity().unwrap(), &before);
    }
}
