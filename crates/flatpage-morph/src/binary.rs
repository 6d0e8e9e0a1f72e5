//! Binary morphology with brick structuring elements
//!
//! A `w x h` brick is separable, so every operation runs as a horizontal
//! pass followed by a vertical pass. Each pass slides a window over a row
//! or column with a running count, which keeps the cost independent of the
//! brick size.
//!
//! # Boundary condition
//!
//! Pixels outside the image are treated as OFF for dilation and ON for
//! erosion. With this convention an opening never grows and a closing never
//! shrinks the image, and foreground touching the border is not eaten away
//! by erosion.
//!
//! The origin of a brick of size `n` sits at `n / 2`.

use crate::{MorphError, MorphResult};
use flatpage_core::{Pix, PixMut, PixelDepth};

#[derive(Clone, Copy, PartialEq, Eq)]
enum Pass {
    Dilate,
    Erode,
}

fn check_binary(pix: &Pix) -> MorphResult<()> {
    if pix.depth() != PixelDepth::Bit1 {
        return Err(MorphError::UnsupportedDepth {
            expected: "1-bpp binary",
            actual: pix.depth().bits(),
        });
    }
    Ok(())
}

fn check_size(width: u32, height: u32) -> MorphResult<()> {
    if width == 0 || height == 0 {
        return Err(MorphError::InvalidParameters(format!(
            "brick dimensions must be > 0, got {}x{}",
            width, height
        )));
    }
    Ok(())
}

/// Unpack a 1 bpp image to one byte per pixel.
fn unpack(pix: &Pix) -> Vec<u8> {
    let (w, h) = pix.dimensions();
    let mut out = Vec::with_capacity((w as usize) * (h as usize));
    for y in 0..h {
        let line = pix.row_data(y);
        out.extend((0..w).map(|x| flatpage_core::pix::get_data_bit(line, x) as u8));
    }
    out
}

fn pack(w: u32, h: u32, bits: &[u8]) -> MorphResult<Pix> {
    let mut pm = PixMut::new(w, h, PixelDepth::Bit1)?;
    for y in 0..h {
        let src = &bits[(y * w) as usize..((y + 1) * w) as usize];
        let line = pm.row_data_mut(y);
        for (x, &b) in src.iter().enumerate() {
            if b != 0 {
                flatpage_core::pix::set_data_bit(line, x as u32, 1);
            }
        }
    }
    Ok(pm.into())
}

/// Run a 1D brick of `size` along a lane of `len` pixels.
///
/// `get(i)` reads lane position `i`; the result is written through `put`.
fn run_lane(
    len: usize,
    size: usize,
    pass: Pass,
    get: impl Fn(usize) -> u8,
    mut put: impl FnMut(usize, u8),
) {
    let c = size / 2;
    // prefix[i] = number of ON pixels in [0, i)
    let mut prefix = Vec::with_capacity(len + 1);
    prefix.push(0usize);
    for i in 0..len {
        let last = prefix[i];
        prefix.push(last + get(i) as usize);
    }
    let count = |lo: isize, hi: isize| -> (usize, usize) {
        // inclusive window [lo, hi]; returns (on pixels inside, positions outside)
        let clo = lo.max(0) as usize;
        let chi = (hi + 1).min(len as isize).max(0) as usize;
        let inside = if chi > clo { prefix[chi] - prefix[clo] } else { 0 };
        let outside = size - chi.saturating_sub(clo);
        (inside, outside)
    };
    for i in 0..len {
        let x = i as isize;
        let val = match pass {
            Pass::Erode => {
                let lo = x - c as isize;
                let (on, outside) = count(lo, lo + size as isize - 1);
                u8::from(on + outside == size)
            }
            Pass::Dilate => {
                let hi = x + c as isize;
                let (on, _) = count(hi - size as isize + 1, hi);
                u8::from(on > 0)
            }
        };
        put(i, val);
    }
}

fn brick(pix: &Pix, width: u32, height: u32, pass: Pass) -> MorphResult<Pix> {
    check_binary(pix)?;
    check_size(width, height)?;
    if width == 1 && height == 1 {
        return Ok(pix.clone());
    }
    let (w, h) = pix.dimensions();
    let (wu, hu) = (w as usize, h as usize);
    let mut bits = unpack(pix);

    if width > 1 {
        let mut out = vec![0u8; bits.len()];
        for y in 0..hu {
            let row = &bits[y * wu..(y + 1) * wu];
            let dst = &mut out[y * wu..(y + 1) * wu];
            run_lane(wu, width as usize, pass, |i| row[i], |i, v| dst[i] = v);
        }
        bits = out;
    }
    if height > 1 {
        let mut out = vec![0u8; bits.len()];
        for x in 0..wu {
            run_lane(
                hu,
                height as usize,
                pass,
                |i| bits[i * wu + x],
                |i, v| out[i * wu + x] = v,
            );
        }
        bits = out;
    }
    pack(w, h, &bits)
}

/// Dilate with a `width x height` brick
///
/// # Errors
///
/// Returns an error if `pix` is not 1 bpp or a dimension is 0.
pub fn dilate_brick(pix: &Pix, width: u32, height: u32) -> MorphResult<Pix> {
    brick(pix, width, height, Pass::Dilate)
}

/// Erode with a `width x height` brick
///
/// # Errors
///
/// Returns an error if `pix` is not 1 bpp or a dimension is 0.
pub fn erode_brick(pix: &Pix, width: u32, height: u32) -> MorphResult<Pix> {
    brick(pix, width, height, Pass::Erode)
}

/// Open with a brick structuring element
///
/// Opening = erosion followed by dilation.
pub fn open_brick(pix: &Pix, width: u32, height: u32) -> MorphResult<Pix> {
    let eroded = erode_brick(pix, width, height)?;
    dilate_brick(&eroded, width, height)
}

/// Close with a brick structuring element
///
/// Closing = dilation followed by erosion.
pub fn close_brick(pix: &Pix, width: u32, height: u32) -> MorphResult<Pix> {
    let dilated = dilate_brick(pix, width, height)?;
    erode_brick(&dilated, width, height)
}
