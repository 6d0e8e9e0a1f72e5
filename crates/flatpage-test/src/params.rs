//! Regression test parameters and comparisons

use flatpage_core::{FPix, Pix};

/// Regression test parameters
///
/// Tracks the test name, the index of the current comparison and every
/// failure seen so far. Comparisons never panic; call [`RegParams::cleanup`]
/// at the end of the test and assert on its result.
pub struct RegParams {
    /// Name of the test (e.g., "dewarp")
    pub test_name: String,
    index: usize,
    success: bool,
    failures: Vec<String>,
}

impl RegParams {
    /// Create new regression test parameters
    pub fn new(test_name: &str) -> Self {
        eprintln!();
        eprintln!("////////////////////////////////////////////////");
        eprintln!("////////////////   {}_reg   ///////////////", test_name);
        eprintln!("////////////////////////////////////////////////");

        Self {
            test_name: test_name.to_string(),
            index: 0,
            success: true,
            failures: Vec::new(),
        }
    }

    /// Get the current test index
    pub fn index(&self) -> usize {
        self.index
    }

    fn fail(&mut self, msg: String) -> bool {
        eprintln!("{}", msg);
        self.failures.push(msg);
        self.success = false;
        false
    }

    /// Compare two floating-point values
    ///
    /// Returns `true` if `|expected - actual| <= delta`.
    pub fn compare_values(&mut self, expected: f64, actual: f64, delta: f64) -> bool {
        self.index += 1;
        let diff = (expected - actual).abs();
        if diff > delta || diff.is_nan() {
            return self.fail(format!(
                "Failure in {}_reg: value comparison for index {}\n\
                 difference = {} but allowed delta = {}\n\
                 expected = {}, actual = {}",
                self.test_name, self.index, diff, delta, expected, actual
            ));
        }
        true
    }

    /// Check a boolean condition
    pub fn compare_bool(&mut self, expected: bool, actual: bool) -> bool {
        self.index += 1;
        if expected != actual {
            return self.fail(format!(
                "Failure in {}_reg: condition for index {} was {}, expected {}",
                self.test_name, self.index, actual, expected
            ));
        }
        true
    }

    /// Compare two Pix images for exact equality
    pub fn compare_pix(&mut self, pix1: &Pix, pix2: &Pix) -> bool {
        self.index += 1;
        if !pix1.sizes_equal(pix2) {
            return self.fail(format!(
                "Failure in {}_reg: pix comparison for index {} - dimension mismatch \
                 ({}x{} vs {}x{})",
                self.test_name,
                self.index,
                pix1.width(),
                pix1.height(),
                pix2.width(),
                pix2.height()
            ));
        }
        for y in 0..pix1.height() {
            for x in 0..pix1.width() {
                if pix1.get_pixel(x, y) != pix2.get_pixel(x, y) {
                    return self.fail(format!(
                        "Failure in {}_reg: pix comparison for index {} - pixel mismatch at ({}, {})",
                        self.test_name, self.index, x, y
                    ));
                }
            }
        }
        true
    }

    /// Compare two FPix fields element by element within `delta`
    pub fn compare_fpix(&mut self, fpix1: &FPix, fpix2: &FPix, delta: f32) -> bool {
        self.index += 1;
        if fpix1.dimensions() != fpix2.dimensions() {
            return self.fail(format!(
                "Failure in {}_reg: fpix comparison for index {} - dimension mismatch",
                self.test_name, self.index
            ));
        }
        let worst = fpix1
            .data()
            .iter()
            .zip(fpix2.data())
            .map(|(a, b)| (a - b).abs())
            .fold(0f32, f32::max);
        if worst > delta {
            return self.fail(format!(
                "Failure in {}_reg: fpix comparison for index {} - max difference {} > {}",
                self.test_name, self.index, worst, delta
            ));
        }
        true
    }

    /// Clean up and report results
    ///
    /// Returns `true` if all comparisons passed.
    pub fn cleanup(self) -> bool {
        if self.success {
            eprintln!("SUCCESS: {}_reg", self.test_name);
        } else {
            eprintln!("FAILURE: {}_reg", self.test_name);
            for failure in &self.failures {
                eprintln!("  {}", failure);
            }
        }
        eprintln!();
        self.success
    }

    /// Check if all comparisons have passed so far
    pub fn is_success(&self) -> bool {
        self.success
    }

    /// Get list of failures
    pub fn failures(&self) -> &[String] {
        &self.failures
    }
}
