//! Binary seed filling
//!
//! Morphological reconstruction of a binary seed under a binary mask: every
//! mask component that touches an ON seed pixel is filled in full.

use crate::conncomp::{ConnectivityType, check_binary};
use crate::error::{RegionError, RegionResult};
use flatpage_core::{Pix, PixMut, PixelDepth};
use std::collections::VecDeque;

/// Fill the mask components reached by the seed
///
/// The result holds every mask pixel connected (under `connectivity`) to a
/// pixel that is ON in both `seed` and `mask`. Seed pixels outside the mask
/// are ignored.
///
/// # Errors
///
/// Returns an error if either image is not 1 bpp or their sizes differ.
pub fn seedfill_binary(
    seed: &Pix,
    mask: &Pix,
    connectivity: ConnectivityType,
) -> RegionResult<Pix> {
    check_binary(seed)?;
    check_binary(mask)?;
    if seed.dimensions() != mask.dimensions() {
        return Err(RegionError::InvalidParameters(format!(
            "seed {}x{} and mask {}x{} differ in size",
            seed.width(),
            seed.height(),
            mask.width(),
            mask.height()
        )));
    }

    let (w, h) = mask.dimensions();
    let mut out = PixMut::new(w, h, PixelDepth::Bit1)?;
    let mut queue = VecDeque::new();

    for y in 0..h {
        for x in 0..w {
            if seed.get_pixel_unchecked(x, y) != 0
                && mask.get_pixel_unchecked(x, y) != 0
                && out.get_pixel_unchecked(x, y) == 0
            {
                out.set_pixel_unchecked(x, y, 1);
                queue.push_back((x, y));
            }
        }
    }

    let offsets: &[(i32, i32)] = match connectivity {
        ConnectivityType::FourWay => &[(-1, 0), (1, 0), (0, -1), (0, 1)],
        ConnectivityType::EightWay => &[
            (-1, -1),
            (0, -1),
            (1, -1),
            (-1, 0),
            (1, 0),
            (-1, 1),
            (0, 1),
            (1, 1),
        ],
    };

    while let Some((x, y)) = queue.pop_front() {
        for &(dx, dy) in offsets {
            let nx = x as i32 + dx;
            let ny = y as i32 + dy;
            if nx < 0 || ny < 0 || nx >= w as i32 || ny >= h as i32 {
                continue;
            }
            let (nx, ny) = (nx as u32, ny as u32);
            if mask.get_pixel_unchecked(nx, ny) != 0 && out.get_pixel_unchecked(nx, ny) == 0 {
                out.set_pixel_unchecked(nx, ny, 1);
                queue.push_back((nx, ny));
            }
        }
    }

    Ok(out.into())
}

/// Remove every mask component touched by the seed
///
/// Equivalent to `mask XOR seedfill_binary(seed, mask)`.
pub fn remove_seeded_components(
    seed: &Pix,
    mask: &Pix,
    connectivity: ConnectivityType,
) -> RegionResult<Pix> {
    let filled = seedfill_binary(seed, mask, connectivity)?;
    Ok(mask.xor(&filled)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pix_from_rows(rows: &[&str]) -> Pix {
        let mut pm = PixMut::new(rows[0].len() as u32, rows.len() as u32, PixelDepth::Bit1).unwrap();
        for (y, row) in rows.iter().enumerate() {
            for (x, ch) in row.chars().enumerate() {
                if ch == '#' {
                    pm.set_pixel(x as u32, y as u32, 1).unwrap();
                }
            }
        }
        pm.into()
    }

    #[test]
    fn test_seedfill_fills_touched_component() {
        let mask = pix_from_rows(&["##..#", ".#..#", "..#.."]);
        let seed = pix_from_rows(&["#....", ".....", "....."]);
        let four = seedfill_binary(&seed, &mask, ConnectivityType::FourWay).unwrap();
        assert_eq!(four.count_pixels().unwrap(), 3);
        let eight = seedfill_binary(&seed, &mask, ConnectivityType::EightWay).unwrap();
        assert_eq!(eight.count_pixels().unwrap(), 4);
        assert_eq!(eight.get_pixel(4, 0), Some(0));
    }

    #[test]
    fn test_seed_outside_mask_ignored() {
        let mask = pix_from_rows(&["#...", "...."]);
        let seed = pix_from_rows(&["...#", "...."]);
        let out = seedfill_binary(&seed, &mask, ConnectivityType::EightWay).unwrap();
        assert_eq!(out.count_pixels().unwrap(), 0);
    }

    #[test]
    fn test_remove_seeded_components() {
        let mask = pix_from_rows(&["##..#", "##..#"]);
        let seed = pix_from_rows(&[".....", "....#"]);
        let out = remove_seeded_components(&seed, &mask, ConnectivityType::FourWay).unwrap();
        assert_eq!(out.count_pixels().unwrap(), 4);
        assert_eq!(out.get_pixel(4, 0), Some(0));
    }

    #[test]
    fn test_size_mismatch() {
        let a = Pix::new(3, 3, PixelDepth::Bit1).unwrap();
        let b = Pix::new(4, 3, PixelDepth::Bit1).unwrap();
        assert!(seedfill_binary(&a, &b, ConnectivityType::FourWay).is_err());
    }
}
