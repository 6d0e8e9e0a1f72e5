//! Page collections with reference models
//!
//! A [`Dewarpa`] holds one entry per page of a document. Each entry has an
//! active slot, which is empty, a real model, or a link to another page's
//! model, and a cache where a real model is parked while a link replaces
//! it. Pages whose own model is missing or fails validation borrow the
//! model of the nearest page of the same parity (left and right pages of a
//! book curve differently) within `max_dist`.

use crate::apply::apply_disparity;
use crate::error::{DewarpError, DewarpResult};
use crate::horizontal::build_horizontal_disparity;
use crate::model::{build_vertical_disparity, populate_full_resolution};
use crate::textline::find_textline_centers_with;
use crate::types::{Dewarp, DewarpOptions, DewarpedPage, ModelSource, PageState};
use flatpage_core::Pix;
use serde::{Deserialize, Serialize};

/// Limits a model must meet to be used
///
/// Curvatures are in micro-units and slopes in milli-units, as recorded on
/// [`Dewarp`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidityThresholds {
    /// Largest allowed line curvature magnitude (default: 180)
    pub max_linecurv: i32,
    /// Smallest allowed spread between line curvatures (default: 0)
    pub min_diff_linecurv: i32,
    /// Largest allowed spread between line curvatures (default: 200)
    pub max_diff_linecurv: i32,
    /// Largest allowed margin curvature magnitude (default: 50)
    pub max_edgecurv: i32,
    /// Largest allowed difference between margin curvatures (default: 40)
    pub max_diff_edgecurv: i32,
    /// Largest allowed margin slope magnitude (default: 80)
    pub max_edgeslope: i32,
}

impl Default for ValidityThresholds {
    fn default() -> Self {
        Self {
            max_linecurv: 180,
            min_diff_linecurv: 0,
            max_diff_linecurv: 200,
            max_edgecurv: 50,
            max_diff_edgecurv: 40,
            max_edgeslope: 80,
        }
    }
}

/// Options for a page collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DewarpaOptions {
    /// Options for building each page model
    pub model: DewarpOptions,
    /// Validation limits
    pub thresholds: ValidityThresholds,
    /// Farthest page a model may be borrowed from (default: 2)
    pub max_dist: usize,
    /// Prefer horizontally valid models when choosing references (default: true)
    pub use_both: bool,
}

impl Default for DewarpaOptions {
    fn default() -> Self {
        Self {
            model: DewarpOptions::default(),
            thresholds: ValidityThresholds::default(),
            max_dist: 2,
            use_both: true,
        }
    }
}

impl DewarpaOptions {
    /// Create new options with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the page model options
    pub fn with_model(mut self, model: DewarpOptions) -> Self {
        self.model = model;
        self
    }

    /// Set the validation limits
    pub fn with_thresholds(mut self, thresholds: ValidityThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Set the reference distance
    pub fn with_max_dist(mut self, max_dist: usize) -> Self {
        self.max_dist = max_dist;
        self
    }

    /// Set whether references must be valid in both directions when possible
    pub fn with_use_both(mut self, use_both: bool) -> Self {
        self.use_both = use_both;
        self
    }
}

/// Mark a model valid or invalid against `thresholds`
///
/// With `notests`, a model is valid exactly when it was built.
pub fn test_for_valid_model(dewarp: &mut Dewarp, thresholds: &ValidityThresholds, notests: bool) {
    if notests {
        dewarp.v_valid = dewarp.v_success;
        dewarp.h_valid = dewarp.h_success;
        return;
    }

    let (mincurv, maxcurv) = (dewarp.min_curvature, dewarp.max_curvature);
    let diff = maxcurv - mincurv;
    dewarp.v_valid = dewarp.v_success
        && mincurv.abs().max(maxcurv.abs()) <= thresholds.max_linecurv
        && (thresholds.min_diff_linecurv..=thresholds.max_diff_linecurv).contains(&diff);

    let (lcurv, rcurv) = (dewarp.left_curvature, dewarp.right_curvature);
    let (lslope, rslope) = (dewarp.left_slope, dewarp.right_slope);
    dewarp.h_valid = dewarp.h_success
        && lcurv.abs().max(rcurv.abs()) <= thresholds.max_edgecurv
        && (lcurv - rcurv).abs() <= thresholds.max_diff_edgecurv
        && lslope.abs().max(rslope.abs()) <= thresholds.max_edgeslope;

    tracing::debug!(
        page = dewarp.page_number,
        v_valid = dewarp.v_valid,
        h_valid = dewarp.h_valid,
        mincurv,
        maxcurv,
        "model validity"
    );
}

/// Extract lines and build the vertical, then optionally horizontal, model.
fn build_model(pix: &Pix, page: usize, opts: &DewarpOptions) -> DewarpResult<Dewarp> {
    let lines = find_textline_centers_with(pix, &opts.textline)?;
    let mut dewarp = Dewarp::new(pix.width(), pix.height(), page, opts);
    build_vertical_disparity(&mut dewarp, &lines, opts)?;
    if opts.build_horizontal {
        build_horizontal_disparity(&mut dewarp, &lines, opts)?;
    }
    Ok(dewarp)
}

/// Active model slot of a page
#[derive(Debug, Clone, Default)]
pub enum ModelSlot {
    /// No model
    #[default]
    Empty,
    /// The page's own model
    Real(Box<Dewarp>),
    /// Use the model of another page
    Reference(usize),
}

#[derive(Debug, Clone, Default)]
struct PageEntry {
    active: ModelSlot,
    /// A real model displaced by a reference; never set while `active` is real
    cached: Option<Box<Dewarp>>,
    applied: bool,
}

/// Collection-level counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DewarpaSummary {
    /// Number of pages
    pub pages: usize,
    /// Pages with a vertical model of their own, active or cached
    pub built: usize,
    /// Pages whose active own model is vertically valid
    pub valid: usize,
    /// Pages linked to another page's model
    pub referenced: usize,
    /// Pages with no model to apply
    pub unmodeled: usize,
}

/// Page models for a multi-page document
#[derive(Debug, Clone)]
pub struct Dewarpa {
    entries: Vec<PageEntry>,
    options: DewarpaOptions,
    ready: bool,
}

impl Dewarpa {
    /// Create an empty collection of `npages` pages
    pub fn new(npages: usize, options: DewarpaOptions) -> Self {
        let options = DewarpaOptions {
            model: options.model.clamped(),
            ..options
        };
        Self {
            entries: vec![PageEntry::default(); npages],
            options,
            ready: false,
        }
    }

    /// Number of pages
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the collection has no pages
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get the options
    pub fn options(&self) -> &DewarpaOptions {
        &self.options
    }

    /// Whether reference models are in place
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    fn entry(&self, page: usize) -> DewarpResult<&PageEntry> {
        self.entries.get(page).ok_or(DewarpError::PageOutOfRange {
            page,
            npages: self.entries.len(),
        })
    }

    fn entry_mut(&mut self, page: usize) -> DewarpResult<&mut PageEntry> {
        let npages = self.entries.len();
        self.entries
            .get_mut(page)
            .ok_or(DewarpError::PageOutOfRange { page, npages })
    }

    /// Build the model for one page from its binary image and store it
    ///
    /// Runs line extraction, the vertical model and, when enabled, the
    /// horizontal model. On failure the page is left as it was.
    ///
    /// # Errors
    ///
    /// Returns [`DewarpError::PageOutOfRange`], or the error that stopped
    /// the build (typically [`DewarpError::InsufficientLines`]).
    pub fn build_page_model(&mut self, page: usize, pix: &Pix) -> DewarpResult<()> {
        self.entry(page)?;
        let built = build_model(pix, page, &self.options.model);

        match built {
            Ok(dewarp) => self.insert_model(dewarp),
            Err(e) => {
                tracing::warn!(page, error = %e, "page model build failed");
                Err(e)
            }
        }
    }

    /// Store a model in its page's slot
    ///
    /// Replaces whatever the page held, drops any cached model and marks the
    /// collection not ready.
    ///
    /// # Errors
    ///
    /// Returns [`DewarpError::PageOutOfRange`] if the model's page number is
    /// outside the collection.
    pub fn insert_model(&mut self, dewarp: Dewarp) -> DewarpResult<()> {
        let entry = self.entry_mut(dewarp.page_number)?;
        entry.active = ModelSlot::Real(Box::new(dewarp));
        entry.cached = None;
        entry.applied = false;
        self.ready = false;
        Ok(())
    }

    /// Get the active slot of a page
    pub fn slot(&self, page: usize) -> Option<&ModelSlot> {
        self.entries.get(page).map(|e| &e.active)
    }

    /// Get the page's own active model
    pub fn model(&self, page: usize) -> Option<&Dewarp> {
        match self.slot(page)? {
            ModelSlot::Real(d) => Some(d.as_ref()),
            _ => None,
        }
    }

    /// Get the page's parked model
    pub fn cached_model(&self, page: usize) -> Option<&Dewarp> {
        self.entries.get(page)?.cached.as_deref()
    }

    /// Get the page a link points to
    pub fn reference(&self, page: usize) -> Option<usize> {
        match self.slot(page)? {
            ModelSlot::Reference(target) => Some(*target),
            _ => None,
        }
    }

    /// Get the model that would be applied to a page, following a link
    pub fn resolve_model(&self, page: usize) -> Option<(&Dewarp, ModelSource)> {
        match self.slot(page)? {
            ModelSlot::Empty => None,
            ModelSlot::Real(d) => Some((d.as_ref(), ModelSource::Own)),
            ModelSlot::Reference(target) => {
                self.model(*target).map(|d| (d, ModelSource::Reference(*target)))
            }
        }
    }

    /// Get the processing state of a page
    ///
    /// A page is fully ready once horizontal estimation is enabled and its
    /// model has a horizontal field.
    ///
    /// # Errors
    ///
    /// Returns [`DewarpError::PageOutOfRange`] for an unknown page.
    pub fn page_state(&self, page: usize) -> DewarpResult<PageState> {
        if self.entry(page)?.applied {
            return Ok(PageState::Applied);
        }
        Ok(match self.resolve_model(page) {
            Some((d, _)) if d.v_success => {
                if self.options.model.build_horizontal && d.h_success {
                    PageState::FullyReady
                } else {
                    PageState::VerticalReady
                }
            }
            _ => PageState::Unbuilt,
        })
    }

    /// Nearest page in `set` with the parity of `page`, within `max_dist`
    ///
    /// Ties go to the lower page number.
    fn nearest(&self, page: usize, set: &[bool]) -> Option<usize> {
        let lo = page.saturating_sub(self.options.max_dist);
        let hi = page
            .saturating_add(self.options.max_dist)
            .min(self.entries.len().saturating_sub(1));
        (lo..=hi)
            .filter(|&q| q != page && q % 2 == page % 2 && set[q])
            .min_by_key(|&q| (q.abs_diff(page), q))
    }

    /// Validate the models and link pages without a usable model
    ///
    /// Pages keep their own model when it is valid; with `use_both`, a
    /// vertically valid page without a valid horizontal model keeps it only
    /// if no horizontally valid page of its parity is in range. Every other
    /// page is linked to the nearest kept page of its parity within
    /// `max_dist`, preferring horizontally valid pages under `use_both`. A
    /// displaced real model is parked in the page's cache.
    ///
    /// Existing links whose target is still kept and in range survive, so
    /// repeating the pass changes nothing. Returns the number of linked
    /// pages.
    pub fn insert_ref_models(&mut self, notests: bool) -> usize {
        let thresholds = self.options.thresholds;
        for entry in &mut self.entries {
            if let ModelSlot::Real(d) = &mut entry.active {
                test_for_valid_model(d, &thresholds, notests);
            }
        }

        let n = self.entries.len();
        let use_both = self.options.use_both;
        let vvalid: Vec<bool> = (0..n)
            .map(|p| self.model(p).is_some_and(|d| d.v_valid))
            .collect();
        let hvalid: Vec<bool> = (0..n)
            .map(|p| vvalid[p] && self.model(p).is_some_and(|d| d.h_valid))
            .collect();
        let keep: Vec<bool> = (0..n)
            .map(|p| {
                hvalid[p] || (vvalid[p] && (!use_both || self.nearest(p, &hvalid).is_none()))
            })
            .collect();

        let max_dist = self.options.max_dist;
        let mut links = 0;
        let mut unmodeled = 0;
        for p in 0..n {
            if keep[p] {
                continue;
            }
            if let ModelSlot::Reference(t) = self.entries[p].active {
                if keep[t] && t.abs_diff(p) <= max_dist && t % 2 == p % 2 {
                    links += 1;
                    continue;
                }
            }

            let target = if use_both {
                self.nearest(p, &hvalid).or_else(|| self.nearest(p, &keep))
            } else {
                self.nearest(p, &keep)
            };

            let entry = &mut self.entries[p];
            if let ModelSlot::Real(d) = std::mem::take(&mut entry.active) {
                entry.cached = Some(d);
            }
            match target {
                Some(t) => {
                    entry.active = ModelSlot::Reference(t);
                    links += 1;
                }
                None => unmodeled += 1,
            }
        }

        self.ready = true;
        tracing::info!(pages = n, links, unmodeled, "reference models inserted");
        links
    }

    /// Undo the reference pass
    ///
    /// Links are removed, parked models return to their pages and the
    /// collection is marked not ready.
    pub fn restore_models(&mut self) {
        for entry in &mut self.entries {
            if !matches!(entry.active, ModelSlot::Real(_)) {
                entry.active = entry.cached.take().map_or(ModelSlot::Empty, ModelSlot::Real);
            }
            entry.applied = false;
        }
        self.ready = false;
    }

    /// Render one page through its own or borrowed model
    ///
    /// The reference pass runs first if the collection is not ready.
    /// Horizontal correction runs only for a horizontally valid model. Full
    /// resolution fields are generated on the model that is used and kept.
    /// A page with no model is returned unchanged with
    /// [`ModelSource::None`].
    ///
    /// # Errors
    ///
    /// Returns [`DewarpError::PageOutOfRange`] for an unknown page and
    /// [`DewarpError::FieldTooSmall`] if `pix` is larger than the model.
    pub fn apply_disparity(&mut self, page: usize, pix: &Pix) -> DewarpResult<DewarpedPage> {
        self.entry(page)?;
        if !self.ready {
            self.insert_ref_models(false);
        }

        let (target, source) = match self.entries[page].active {
            ModelSlot::Real(_) => (page, ModelSource::Own),
            ModelSlot::Reference(t) => (t, ModelSource::Reference(t)),
            ModelSlot::Empty => {
                tracing::warn!(page, "no model available; page passed through");
                self.entries[page].applied = true;
                return Ok(DewarpedPage {
                    pix: pix.clone(),
                    source: ModelSource::None,
                    v_applied: false,
                    h_applied: false,
                });
            }
        };

        let horizontal = self.options.model.build_horizontal;
        let ModelSlot::Real(model) = &mut self.entry_mut(target)?.active else {
            return Err(DewarpError::ModelNotBuilt("reference target has no model"));
        };
        populate_full_resolution(model)?;
        let mut out = apply_disparity(pix, model, horizontal && model.h_valid)?;
        out.source = source;
        self.entries[page].applied = true;
        Ok(out)
    }

    /// Collection-level counts
    pub fn summary(&self) -> DewarpaSummary {
        fn own(e: &PageEntry) -> Option<&Dewarp> {
            match &e.active {
                ModelSlot::Real(d) => Some(d.as_ref()),
                _ => e.cached.as_deref(),
            }
        }
        DewarpaSummary {
            pages: self.entries.len(),
            built: self
                .entries
                .iter()
                .filter(|e| own(e).is_some_and(|d| d.v_success))
                .count(),
            valid: (0..self.entries.len())
                .filter(|&p| self.model(p).is_some_and(|d| d.v_valid))
                .count(),
            referenced: (0..self.entries.len())
                .filter(|&p| self.reference(p).is_some())
                .count(),
            unmodeled: (0..self.entries.len())
                .filter(|&p| self.resolve_model(p).is_none_or(|(d, _)| !d.v_success))
                .count(),
        }
    }

    /// Drop the full resolution fields of every model, active or parked
    pub fn minimize(&mut self) {
        for entry in &mut self.entries {
            if let ModelSlot::Real(d) = &mut entry.active {
                d.minimize();
            }
            if let Some(d) = &mut entry.cached {
                d.minimize();
            }
        }
    }
}
