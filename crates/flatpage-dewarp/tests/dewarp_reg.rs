//! Single page dewarping regression test
//!
//! Builds models from synthetic pages with known line geometry, checks the
//! disparity the model measures against that geometry and verifies that
//! rendering straightens the lines.
//!
//! Run with:
//! ```
//! cargo test -p flatpage-dewarp --test dewarp_reg
//! ```

use flatpage_core::{FPix, PixelDepth};
use flatpage_dewarp::{
    DewarpError, DewarpOptions, Dewarpa, DewarpaOptions, ModelSource, PageState,
    apply_vertical_disparity, dewarp_single_page, find_textline_centers,
};
use flatpage_test::{RegParams, SyntheticPage, gray_to_binary};

/// Largest line curvature magnitude, in micro-units, over a page's lines.
fn max_line_curvature(pix: &flatpage_core::Pix) -> (usize, f64) {
    let lines = find_textline_centers(pix).unwrap();
    let worst = lines
        .iter()
        .map(|l| {
            let (c2, _, _) = l.points().get_quadratic_lsf().unwrap();
            (1.0e6 * c2 as f64).abs()
        })
        .fold(0.0, f64::max);
    (lines.len(), worst)
}

#[test]
fn dewarp_reg() {
    let mut rp = RegParams::new("dewarp");

    let page = SyntheticPage::new();
    let pixs = page.render_binary().unwrap();
    let vertical_only = DewarpaOptions::new()
        .with_model(DewarpOptions::new().with_build_horizontal(false))
        .with_use_both(false);

    // Test 1-2: the source page has 20 visibly curved lines.
    let (nlines, curv_in) = max_line_curvature(&pixs);
    rp.compare_values(20.0, nlines as f64, 0.0);
    rp.compare_bool(true, curv_in > 80.0);

    // Test 3-6: vertical correction straightens them in place.
    let out = dewarp_single_page(&pixs, &pixs, &vertical_only).unwrap();
    rp.compare_bool(true, out.v_applied && !out.h_applied);
    rp.compare_bool(true, out.source == ModelSource::Own);
    rp.compare_bool(true, out.pix.dimensions() == pixs.dimensions());
    let (nlines, curv_out) = max_line_curvature(&out.pix);
    rp.compare_values(20.0, nlines as f64, 0.0);
    rp.compare_bool(true, curv_out < 15.0);

    // Test 7: each line lands on its height at the page center.
    let lines = find_textline_centers(&out.pix).unwrap();
    for (i, line) in lines.iter().enumerate() {
        let ys = line.points().y_coords();
        let mean = ys.iter().sum::<f32>() / ys.len() as f32;
        rp.compare_values(page.line_center(i as u32, 500.0) as f64, mean as f64, 1.5);
    }

    // Test 8: the model fits a gray rendering of the same page, and
    // thresholding the result gives the binary result.
    let gray = page.render_gray().unwrap();
    let out_gray = dewarp_single_page(&pixs, &gray, &vertical_only).unwrap();
    rp.compare_bool(true, out_gray.pix.depth() == PixelDepth::Bit8);
    rp.compare_pix(&gray_to_binary(&out_gray.pix, 128).unwrap(), &out.pix);

    // Test 9: and an RGB rendering.
    let rgb = page.render_rgb().unwrap();
    let out_rgb = dewarp_single_page(&pixs, &rgb, &vertical_only).unwrap();
    rp.compare_bool(true, out_rgb.pix.depth() == PixelDepth::Bit32);

    // Test 10-13: a freshly built horizontal model is fully ready; with
    // horizontal correction the output widens by the model's extra width.
    let both = DewarpaOptions::new();
    let mut dewa = Dewarpa::new(1, both);
    dewa.build_page_model(0, &pixs).unwrap();
    rp.compare_bool(true, dewa.model(0).unwrap().h_success());
    rp.compare_bool(true, !dewa.is_ready());
    rp.compare_bool(true, dewa.page_state(0).unwrap() == PageState::FullyReady);
    let out_both = dewa.apply_disparity(0, &pixs).unwrap();
    let extra = dewa.model(0).unwrap().extra_width();
    let expected_w = pixs.width() + if out_both.h_applied { extra } else { 0 };
    rp.compare_values(expected_w as f64, out_both.pix.width() as f64, 0.0);
    rp.compare_bool(true, dewa.page_state(0).unwrap() == PageState::Applied);

    // Test 14: a page larger than the model's fields is rejected.
    let big = SyntheticPage::new().with_size(1200, 1500).render_binary().unwrap();
    let err = dewa.apply_disparity(0, &big).unwrap_err();
    rp.compare_bool(true, matches!(err, DewarpError::FieldTooSmall { .. }));

    assert!(rp.cleanup(), "dewarp regression test failed");
}

#[test]
fn dewarp_model_reg() {
    let mut rp = RegParams::new("dewarp_model");

    // 12 lines, two of them short: 10 survive the filter.
    let page = SyntheticPage::new()
        .with_lines(12)
        .with_short_lines(&[3, 8]);
    let pixs = page.render_binary().unwrap();
    let opts = DewarpaOptions::new()
        .with_model(DewarpOptions::new().with_min_lines(5).with_build_horizontal(false))
        .with_use_both(false);
    let mut dewa = Dewarpa::new(1, opts);
    dewa.build_page_model(0, &pixs).unwrap();
    let model = dewa.model(0).unwrap();

    // Test 1-3: model shape.
    rp.compare_bool(true, model.v_success());
    rp.compare_values(10.0, model.n_lines() as f64, 0.0);
    rp.compare_bool(true, model.grid_size() == (35, 45));

    // Test 4: curvature in micro-units; sag 10 over half-width 500 gives
    // -40 and sag 25 gives -100.
    rp.compare_values(-40.0, model.max_curvature() as f64, 3.0);
    rp.compare_values(-100.0, model.min_curvature() as f64, 3.0);

    // Test 5: the sampled field is recovered from the full field.
    let mut model = model.clone();
    flatpage_dewarp::populate_full_resolution(&mut model).unwrap();
    let full = model.full_v_disparity().unwrap();
    let back = full.subsample(model.sampling()).unwrap();
    rp.compare_fpix(&back, model.sampled_v_disparity().unwrap(), 0.0);

    // Test 6-7: zero disparity at each line's flat point, sag * t² at its
    // left end.
    let t2 = {
        let t = (80.0 - 500.0) / 500.0f32;
        t * t
    };
    for i in (0..12).filter(|i| ![3, 8].contains(i)) {
        let y = page.line_center(i, 500.0).round() as u32;
        let at_center = full.get_pixel(500, y).unwrap();
        let at_edge = full.get_pixel(80, y).unwrap();
        rp.compare_values(0.0, at_center as f64, 1.0);
        rp.compare_values((page.sag(i) * t2) as f64, at_edge as f64, 1.5);
    }

    // Test 8: the debug renderer draws contours.
    let contours = full.render_contours(2.0, 0.15).unwrap();
    rp.compare_bool(true, contours.dimensions() == full.dimensions());
    rp.compare_bool(true, contours.count_pixels().unwrap() > 0);

    // Test 9: a minimized model renders the same page.
    let before = dewa.apply_disparity(0, &pixs).unwrap();
    dewa.minimize();
    rp.compare_bool(true, dewa.model(0).unwrap().full_v_disparity().is_none());
    let after = dewa.apply_disparity(0, &pixs).unwrap();
    rp.compare_pix(&before.pix, &after.pix);

    assert!(rp.cleanup(), "dewarp model regression test failed");
}

#[test]
fn dewarp_failure_reg() {
    let mut rp = RegParams::new("dewarp_failure");

    // Test 1: two lines cannot make a model that needs ten.
    let pixs = SyntheticPage::new().with_lines(2).render_binary().unwrap();
    let opts = DewarpaOptions::new().with_model(DewarpOptions::new().with_min_lines(10));
    let mut dewa = Dewarpa::new(1, opts.clone());
    let err = dewa.build_page_model(0, &pixs).unwrap_err();
    rp.compare_bool(
        true,
        matches!(
            err,
            DewarpError::InsufficientLines {
                found: 2,
                required: 10
            }
        ),
    );
    rp.compare_bool(true, dewa.page_state(0).unwrap() == PageState::Unbuilt);

    // Test 2: the page is then passed through.
    let out = dewa.apply_disparity(0, &pixs).unwrap();
    rp.compare_bool(true, out.source == ModelSource::None);
    rp.compare_pix(&out.pix, &pixs);
    rp.compare_bool(true, dewarp_single_page(&pixs, &pixs, &opts).is_err());

    // Test 3: a blank page has no lines at all.
    let blank = SyntheticPage::new().with_lines(0).render_binary().unwrap();
    rp.compare_bool(true, find_textline_centers(&blank).unwrap().is_empty());

    // Test 4: extreme disparities stay inside the image.
    for value in [-5000.0, 5000.0] {
        let field = FPix::new_with_value(pixs.width(), pixs.height(), value).unwrap();
        let out = apply_vertical_disparity(&pixs, &field).unwrap();
        rp.compare_bool(true, out.dimensions() == pixs.dimensions());
    }

    // Test 5: a gray page cannot be used to find lines.
    let gray = SyntheticPage::new().render_gray().unwrap();
    let err = dewa.build_page_model(0, &gray).unwrap_err();
    rp.compare_bool(true, matches!(err, DewarpError::UnsupportedDepth { .. }));

    assert!(rp.cleanup(), "dewarp failure regression test failed");
}

#[test]
fn dewarp_options_reg() {
    let mut rp = RegParams::new("dewarp_options");

    // Test 1: options survive a JSON round trip.
    let opts = DewarpaOptions::new()
        .with_model(DewarpOptions::new().with_sampling(20).with_min_lines(8))
        .with_max_dist(4);
    let json = serde_json::to_string(&opts).unwrap();
    let back: DewarpaOptions = serde_json::from_str(&json).unwrap();
    rp.compare_bool(true, back == opts);

    // Test 2: missing fields take their defaults.
    let partial: DewarpaOptions = serde_json::from_str(r#"{"max_dist": 6}"#).unwrap();
    rp.compare_values(6.0, partial.max_dist as f64, 0.0);
    rp.compare_values(30.0, partial.model.sampling as f64, 0.0);
    rp.compare_values(180.0, partial.thresholds.max_linecurv as f64, 0.0);

    // Test 3: out-of-range values read from a file are clamped on use.
    let raw: DewarpaOptions =
        serde_json::from_str(r#"{"model": {"sampling": 2, "min_lines": 1}}"#).unwrap();
    let dewa = Dewarpa::new(3, raw);
    rp.compare_values(5.0, dewa.options().model.sampling as f64, 0.0);
    rp.compare_values(4.0, dewa.options().model.min_lines as f64, 0.0);

    assert!(rp.cleanup(), "dewarp options regression test failed");
}
