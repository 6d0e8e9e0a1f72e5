//! Dewarp application - resampling images through disparity fields
//!
//! Every output pixel copies one source pixel; there is no interpolation, so
//! the passes work for any supported depth. Source coordinates are clamped
//! to the image, so no disparity value can read outside it.

use crate::error::{DewarpError, DewarpResult};
use crate::model::populate_full_resolution;
use crate::types::{Dewarp, DewarpedPage, ModelSource};
use flatpage_core::{FPix, Pix, PixMut};
use std::borrow::Cow;

fn check_field(field: &FPix, width: u32, height: u32) -> DewarpResult<()> {
    if field.width() < width || field.height() < height {
        return Err(DewarpError::FieldTooSmall {
            field: field.dimensions(),
            image: (width, height),
        });
    }
    Ok(())
}

#[inline]
fn clamp_index(v: f32, max: u32) -> u32 {
    (v.round().max(0.0) as u32).min(max)
}

/// Apply vertical disparity in place
///
/// Pixel `(x, y)` takes the value of `(x, round(y - V(x, y)))`, with the
/// source row clamped to the image.
///
/// # Errors
///
/// Returns [`DewarpError::FieldTooSmall`] if the field does not cover the
/// image.
pub fn apply_vertical_disparity_in_place(pix: &mut PixMut, v_disparity: &FPix) -> DewarpResult<()> {
    let (w, h) = (pix.width(), pix.height());
    check_field(v_disparity, w, h)?;

    let mut column = vec![0u32; h as usize];
    for x in 0..w {
        for (y, val) in column.iter_mut().enumerate() {
            *val = pix.get_pixel_unchecked(x, y as u32);
        }
        for y in 0..h {
            let sy = clamp_index(y as f32 - v_disparity.get_pixel_unchecked(x, y), h - 1);
            pix.set_pixel_unchecked(x, y, column[sy as usize]);
        }
    }
    Ok(())
}

/// Apply vertical disparity to an image
///
/// # Errors
///
/// Returns [`DewarpError::FieldTooSmall`] if the field does not cover the
/// image.
pub fn apply_vertical_disparity(pix: &Pix, v_disparity: &FPix) -> DewarpResult<Pix> {
    let mut out = pix.to_mut();
    apply_vertical_disparity_in_place(&mut out, v_disparity)?;
    Ok(out.into())
}

/// Apply horizontal disparity to an image
///
/// The output is `extra_width` columns wider than the input. Pixel `(x, y)`
/// takes the value of `(round(x - H(x, y)), y)`, with the source column
/// clamped to the input.
///
/// # Errors
///
/// Returns [`DewarpError::FieldTooSmall`] if the field does not cover the
/// widened output.
pub fn apply_horizontal_disparity(
    pix: &Pix,
    h_disparity: &FPix,
    extra_width: u32,
) -> DewarpResult<Pix> {
    let (w, h) = pix.dimensions();
    let out_w = w + extra_width;
    check_field(h_disparity, out_w, h)?;

    let mut out = PixMut::new(out_w, h, pix.depth())?;
    for y in 0..h {
        for x in 0..out_w {
            let sx = clamp_index(x as f32 - h_disparity.get_pixel_unchecked(x, y), w - 1);
            out.set_pixel_unchecked(x, y, pix.get_pixel_unchecked(sx, y));
        }
    }
    Ok(out.into())
}

/// Apply a page model to an image
///
/// The vertical pass always runs; the horizontal pass follows when
/// `horizontal` is set and the model has a horizontal field. Missing full
/// resolution fields are generated on a copy of the model, leaving `dewarp`
/// untouched.
///
/// The image may differ in depth from the one the model was built on.
///
/// # Errors
///
/// Returns [`DewarpError::ModelNotBuilt`] without a vertical model and
/// [`DewarpError::FieldTooSmall`] if the image is larger than the model's
/// fields.
pub fn apply_disparity(pix: &Pix, dewarp: &Dewarp, horizontal: bool) -> DewarpResult<DewarpedPage> {
    if !dewarp.v_success {
        return Err(DewarpError::ModelNotBuilt("no vertical disparity"));
    }
    let want_h = horizontal && dewarp.h_success;
    let model: Cow<'_, Dewarp> =
        if dewarp.full_v_disparity.is_none() || (want_h && dewarp.full_h_disparity.is_none()) {
            let mut owned = dewarp.clone();
            populate_full_resolution(&mut owned)?;
            Cow::Owned(owned)
        } else {
            Cow::Borrowed(dewarp)
        };

    let v_field = model
        .full_v_disparity
        .as_ref()
        .ok_or(DewarpError::ModelNotBuilt("no full vertical disparity"))?;
    let mut out = apply_vertical_disparity(pix, v_field)?;

    let h_field = model.full_h_disparity.as_ref().filter(|_| want_h);
    if let Some(h_field) = h_field {
        out = apply_horizontal_disparity(&out, h_field, model.extra_width)?;
    }

    Ok(DewarpedPage {
        pix: out,
        source: ModelSource::Own,
        v_applied: true,
        h_applied: h_field.is_some(),
    })
}
