//! Vertical disparity model building
//!
//! Each text line is fit with a quadratic `y = c2 x² + c1 x + c0` and
//! sampled on the grid columns. A line's disparity at a column is the
//! distance from its flat point (the extreme of the fit, where the line is
//! assumed to be undistorted) to the fitted y. For every column the line
//! disparities are then fit against the flat point height, which extends
//! them smoothly over the whole page.

use crate::error::{DewarpError, DewarpResult};
use crate::textline::remove_short_lines;
use crate::types::{Dewarp, DewarpOptions, TextLine};
use flatpage_core::{FPix, Pta, apply_quadratic_fit};

/// One line's contribution to the model.
struct LineFit {
    c2: f32,
    flat_y: f32,
    disparity: Vec<f32>,
}

fn fit_line(line: &TextLine, nx: u32, sampling: u32) -> Option<LineFit> {
    let (c2, c1, c0) = line.points().get_quadratic_lsf().ok()?;
    let ys: Vec<f32> = (0..nx)
        .map(|j| apply_quadratic_fit(c2, c1, c0, (j * sampling) as f32))
        .collect();
    let flat_y = if c2 <= 0.0 {
        ys.iter().copied().fold(f32::MIN, f32::max)
    } else {
        ys.iter().copied().fold(f32::MAX, f32::min)
    };
    Some(LineFit {
        c2,
        flat_y,
        disparity: ys.iter().map(|y| flat_y - y).collect(),
    })
}

/// Build the sampled vertical disparity model
///
/// Lines shorter than `options.line_fraction` of the longest are dropped
/// first; lines whose quadratic fit fails are skipped. The model needs at
/// least `dewarp.min_lines()` lines after both steps.
///
/// On success the sampled field is `nx x ny`, `v_success` is set and the
/// curvature range is recorded.
///
/// # Errors
///
/// Returns [`DewarpError::InsufficientLines`] if too few lines remain. The
/// model is left untouched.
pub fn build_vertical_disparity(
    dewarp: &mut Dewarp,
    lines: &[TextLine],
    options: &DewarpOptions,
) -> DewarpResult<()> {
    let required = dewarp.min_lines as usize;
    let filtered = remove_short_lines(lines.to_vec(), options.line_fraction);
    tracing::debug!(
        page = dewarp.page_number,
        found = lines.len(),
        kept = filtered.len(),
        "short line filter"
    );
    if filtered.len() < required {
        return Err(DewarpError::InsufficientLines {
            found: filtered.len(),
            required,
        });
    }

    let (nx, ny, s) = (dewarp.nx, dewarp.ny, dewarp.sampling);
    let mut fits: Vec<LineFit> = filtered
        .iter()
        .filter_map(|line| fit_line(line, nx, s))
        .collect();
    if fits.len() < required {
        return Err(DewarpError::InsufficientLines {
            found: fits.len(),
            required,
        });
    }
    fits.sort_by(|a, b| a.flat_y.total_cmp(&b.flat_y));

    let mut field = FPix::new(nx, ny)?;
    for j in 0..nx {
        let pta: Pta = fits
            .iter()
            .map(|f| (f.flat_y, f.disparity[j as usize]))
            .collect();
        let (a, b, c) = pta.get_quadratic_lsf()?;
        for i in 0..ny {
            field.set_pixel_unchecked(j, i, apply_quadratic_fit(a, b, c, (i * s) as f32));
        }
    }

    let to_micro = |c2: f32| (1.0e6 * c2).round() as i32;
    let (min_c2, max_c2) = fits
        .iter()
        .fold((f32::MAX, f32::MIN), |(lo, hi), f| (lo.min(f.c2), hi.max(f.c2)));
    dewarp.min_curvature = to_micro(min_c2);
    dewarp.max_curvature = to_micro(max_c2);
    dewarp.n_lines = fits.len() as u32;
    dewarp.sampled_v_disparity = Some(field);
    dewarp.full_v_disparity = None;
    dewarp.v_success = true;

    tracing::debug!(
        page = dewarp.page_number,
        lines = dewarp.n_lines,
        min_curvature = dewarp.min_curvature,
        max_curvature = dewarp.max_curvature,
        "vertical disparity built"
    );
    Ok(())
}

/// Fill in the full resolution fields from the sampled ones
///
/// Fields already present are kept. The full vertical field is the sampled
/// field expanded by the sampling interval; the horizontal field, when the
/// model has one, is recomputed from the full vertical field.
///
/// # Errors
///
/// Returns [`DewarpError::ModelNotBuilt`] if there is no sampled vertical
/// field.
pub fn populate_full_resolution(dewarp: &mut Dewarp) -> DewarpResult<()> {
    if dewarp.full_v_disparity.is_none() {
        let sampled = dewarp
            .sampled_v_disparity
            .as_ref()
            .ok_or(DewarpError::ModelNotBuilt("no sampled vertical disparity"))?;
        dewarp.full_v_disparity = Some(sampled.scale_by_integer(dewarp.sampling)?);
    }
    if dewarp.h_success && dewarp.full_h_disparity.is_none() {
        crate::horizontal::populate_horizontal_field(dewarp)?;
    }
    Ok(())
}
