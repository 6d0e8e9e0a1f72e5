//! Connected component analysis
//!
//! Components are found with a two-pass labeling over a union-find forest.
//! Labels follow raster order of each component's first pixel, so the
//! output order is deterministic.

use crate::error::{RegionError, RegionResult};
use flatpage_core::{Box, Pix, PixMut, PixelDepth};

/// Connectivity type for component analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectivityType {
    /// 4-way connectivity (up, down, left, right)
    #[default]
    FourWay,
    /// 8-way connectivity (includes diagonals)
    EightWay,
}

/// A connected component in an image
#[derive(Debug, Clone)]
pub struct ConnectedComponent {
    /// Label for this component, starting at 1
    pub label: u32,
    /// Number of pixels in this component
    pub pixel_count: u32,
    /// Bounding box of this component
    pub bounds: Box,
    /// 1 bpp mask the size of `bounds` holding only this component's pixels
    pub mask: Pix,
}

pub(crate) fn check_binary(pix: &Pix) -> RegionResult<()> {
    if pix.depth() != PixelDepth::Bit1 {
        return Err(RegionError::UnsupportedDepth {
            expected: "1-bpp binary",
            actual: pix.depth().bits(),
        });
    }
    Ok(())
}

struct UnionFind {
    parent: Vec<u32>,
}

impl UnionFind {
    fn new() -> Self {
        // slot 0 is background
        Self { parent: vec![0] }
    }

    fn make(&mut self) -> u32 {
        let id = self.parent.len() as u32;
        self.parent.push(id);
        id
    }

    fn find(&mut self, mut a: u32) -> u32 {
        while self.parent[a as usize] != a {
            let grand = self.parent[self.parent[a as usize] as usize];
            self.parent[a as usize] = grand;
            a = grand;
        }
        a
    }

    fn union(&mut self, a: u32, b: u32) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            // keep the smaller id as root so labels stay in raster order
            let (lo, hi) = if ra < rb { (ra, rb) } else { (rb, ra) };
            self.parent[hi as usize] = lo;
        }
    }
}

/// Assign final labels (1..=n in raster order); 0 is background.
fn label_array(pix: &Pix, connectivity: ConnectivityType) -> (Vec<u32>, u32) {
    let (w, h) = (pix.width() as usize, pix.height() as usize);
    let mut labels = vec![0u32; w * h];
    let mut uf = UnionFind::new();

    for y in 0..h {
        let line = pix.row_data(y as u32);
        for x in 0..w {
            if flatpage_core::pix::get_data_bit(line, x as u32) == 0 {
                continue;
            }
            let mut neighbors = [0u32; 4];
            let mut n = 0;
            let mut push = |l: u32| {
                if l != 0 {
                    neighbors[n] = l;
                    n += 1;
                }
            };
            if x > 0 {
                push(labels[y * w + x - 1]);
            }
            if y > 0 {
                push(labels[(y - 1) * w + x]);
                if connectivity == ConnectivityType::EightWay {
                    if x > 0 {
                        push(labels[(y - 1) * w + x - 1]);
                    }
                    if x + 1 < w {
                        push(labels[(y - 1) * w + x + 1]);
                    }
                }
            }
            let label = match neighbors[..n].iter().min() {
                None => uf.make(),
                Some(&min) => {
                    for &other in &neighbors[..n] {
                        uf.union(min, other);
                    }
                    min
                }
            };
            labels[y * w + x] = label;
        }
    }

    // Compact roots to 1..=n in order of first appearance.
    let mut remap = vec![0u32; uf.parent.len()];
    let mut count = 0u32;
    for l in labels.iter_mut() {
        if *l == 0 {
            continue;
        }
        let root = uf.find(*l) as usize;
        if remap[root] == 0 {
            count += 1;
            remap[root] = count;
        }
        *l = remap[root];
    }
    (labels, count)
}

/// Find all connected components in a binary image
///
/// Returns the components in raster order of their first pixel, each with
/// its label, pixel count, bounding box and mask.
///
/// # Errors
///
/// Returns an error if `pix` is not 1 bpp.
pub fn find_connected_components(
    pix: &Pix,
    connectivity: ConnectivityType,
) -> RegionResult<Vec<ConnectedComponent>> {
    check_binary(pix)?;
    let (labels, count) = label_array(pix, connectivity);
    let w = pix.width() as usize;

    // (min_x, min_y, max_x, max_y, pixel_count)
    let mut stats = vec![(u32::MAX, u32::MAX, 0u32, 0u32, 0u32); count as usize];
    for (i, &l) in labels.iter().enumerate() {
        if l == 0 {
            continue;
        }
        let (x, y) = ((i % w) as u32, (i / w) as u32);
        let s = &mut stats[(l - 1) as usize];
        s.0 = s.0.min(x);
        s.1 = s.1.min(y);
        s.2 = s.2.max(x);
        s.3 = s.3.max(y);
        s.4 += 1;
    }

    let mut components = Vec::with_capacity(count as usize);
    for (idx, &(x0, y0, x1, y1, n)) in stats.iter().enumerate() {
        let label = idx as u32 + 1;
        let (bw, bh) = (x1 - x0 + 1, y1 - y0 + 1);
        let mut mask = PixMut::new(bw, bh, PixelDepth::Bit1)?;
        for y in y0..=y1 {
            let row = &labels[(y as usize) * w..(y as usize + 1) * w];
            for x in x0..=x1 {
                if row[x as usize] == label {
                    mask.set_pixel_unchecked(x - x0, y - y0, 1);
                }
            }
        }
        components.push(ConnectedComponent {
            label,
            pixel_count: n,
            bounds: Box::new_unchecked(x0 as i32, y0 as i32, bw as i32, bh as i32),
            mask: mask.into(),
        });
    }
    Ok(components)
}

/// Label all connected components in a binary image
///
/// Returns a 32 bpp image where each foreground pixel holds the label of
/// its component and background is 0.
///
/// # Errors
///
/// Returns an error if `pix` is not 1 bpp.
pub fn label_connected_components(pix: &Pix, connectivity: ConnectivityType) -> RegionResult<Pix> {
    check_binary(pix)?;
    let (labels, _) = label_array(pix, connectivity);
    let (w, h) = pix.dimensions();
    let mut out = PixMut::new(w, h, PixelDepth::Bit32)?;
    for y in 0..h {
        let src = &labels[(y * w) as usize..((y + 1) * w) as usize];
        out.row_data_mut(y).copy_from_slice(src);
    }
    Ok(out.into())
}
