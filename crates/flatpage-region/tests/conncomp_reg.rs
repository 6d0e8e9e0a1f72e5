//! Connected component regression test
//!
//! Labels a synthetic page, checks component bounds against the known
//! geometry and removes a figure by seed filling from its eroded core.

use flatpage_core::Box;
use flatpage_region::{
    ConnectivityType, find_connected_components, label_connected_components, seedfill_binary,
};
use flatpage_test::{RegParams, SyntheticPage};

#[test]
fn conncomp_reg() {
    let mut rp = RegParams::new("conncomp");

    // A single solid line per row: close the character gaps by drawing
    // lines as figures.
    let page = SyntheticPage::new()
        .with_lines(0)
        .with_figure(Box::new_unchecked(50, 40, 300, 20))
        .with_figure(Box::new_unchecked(50, 100, 200, 10))
        .with_figure(Box::new_unchecked(400, 40, 20, 300));
    let pix = page.render_binary().unwrap();

    let ccs = find_connected_components(&pix, ConnectivityType::EightWay).unwrap();
    rp.compare_values(3.0, ccs.len() as f64, 0.0);
    rp.compare_bool(true, ccs[0].bounds == Box::new_unchecked(50, 40, 300, 20));
    rp.compare_values(6000.0, ccs[0].pixel_count as f64, 0.0);
    rp.compare_bool(true, ccs[1].bounds == Box::new_unchecked(400, 40, 20, 300));
    rp.compare_bool(true, ccs[2].bounds == Box::new_unchecked(50, 100, 200, 10));

    let total: u64 = ccs.iter().map(|c| c.pixel_count as u64).sum();
    rp.compare_values(pix.count_pixels().unwrap() as f64, total as f64, 0.0);

    // Each mask holds exactly its own pixels.
    for cc in &ccs {
        rp.compare_values(cc.pixel_count as f64, cc.mask.count_pixels().unwrap() as f64, 0.0);
    }

    let labeled = label_connected_components(&pix, ConnectivityType::FourWay).unwrap();
    rp.compare_values(2.0, labeled.get_pixel(405, 200).unwrap() as f64, 0.0);

    // Seeding inside the tall block recovers the whole block.
    let mut seed = flatpage_core::PixMut::new(pix.width(), pix.height(), pix.depth()).unwrap();
    seed.set_pixel(410, 300, 1).unwrap();
    let filled = seedfill_binary(&seed.into(), &pix, ConnectivityType::EightWay).unwrap();
    rp.compare_values(6000.0, filled.count_pixels().unwrap() as f64, 0.0);
    let rest = pix.xor(&filled).unwrap();
    let ccs = find_connected_components(&rest, ConnectivityType::EightWay).unwrap();
    rp.compare_values(2.0, ccs.len() as f64, 0.0);

    assert!(rp.cleanup(), "conncomp regression test failed");
}
