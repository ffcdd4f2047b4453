use tracing::debug;

use crate::errors::Result;
use crate::load::Load;
use crate::storage::RecipeStore;
use crate::storage::models::{Between, Difficulty, Recipe, RecipeQuery};

pub const CALORIES_SPAN: f64 = 5000.0;
pub const PROTEIN_SPAN: f64 = 500.0;
pub const SLIDER_STEP: f64 = 5.0;
pub const EMPTY_RESULTS: &str = "No recipes found matching your criteria.";

/// A two-handle slider over `[0, span]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeFilter {
    span: f64,
    lo: f64,
    hi: f64,
}

impl RangeFilter {
    pub fn new(span: f64) -> Self {
        Self { span, lo: 0.0, hi: span }
    }

    pub fn lo(&self) -> f64 {
        self.lo
    }

    pub fn hi(&self) -> f64 {
        self.hi
    }

    pub fn span(&self) -> f64 {
        self.span
    }

    /// Clamps both handles into the span; handles never cross.
    pub fn set(&mut self, lo: f64, hi: f64) {
        let lo = lo.clamp(0.0, self.span);
        let hi = hi.clamp(0.0, self.span);
        self.lo = lo.min(hi);
        self.hi = lo.max(hi);
    }

    pub fn step_lo(&mut self, steps: i32) {
        let lo = (self.lo + f64::from(steps) * SLIDER_STEP).clamp(0.0, self.hi);
        self.lo = lo;
    }

    pub fn step_hi(&mut self, steps: i32) {
        let hi = (self.hi + f64::from(steps) * SLIDER_STEP).clamp(self.lo, self.span);
        self.hi = hi;
    }

    pub fn is_full_span(&self) -> bool {
        self.lo <= 0.0 && self.hi >= self.span
    }

    /// `None` when the range covers the whole span and would filter nothing.
    pub fn as_between(&self) -> Option<Between> {
        if self.is_full_span() {
            None
        } else {
            Some(Between {
                lo: self.lo,
                hi: self.hi,
            })
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterState {
    pub title: String,
    pub difficulty: Option<Difficulty>,
    pub calories: RangeFilter,
    pub protein: RangeFilter,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            title: String::new(),
            difficulty: None,
            calories: RangeFilter::new(CALORIES_SPAN),
            protein: RangeFilter::new(PROTEIN_SPAN),
        }
    }
}

impl FilterState {
    pub fn to_query(&self) -> RecipeQuery {
        RecipeQuery {
            title_contains: if self.title.is_empty() {
                None
            } else {
                Some(self.title.clone())
            },
            difficulty: self.difficulty,
            calories: self.calories.as_between(),
            protein: self.protein.as_between(),
            limit: None,
        }
    }

    /// Any -> easy -> medium -> hard -> any.
    pub fn cycle_difficulty(&mut self) {
        self.difficulty = match self.difficulty {
            None => Some(Difficulty::Easy),
            Some(Difficulty::Easy) => Some(Difficulty::Medium),
            Some(Difficulty::Medium) => Some(Difficulty::Hard),
            Some(Difficulty::Hard) => None,
        };
    }
}

/// The browse screen: filter state plus the result set it last produced.
#[derive(Debug)]
pub struct RecipeListView {
    filter: FilterState,
    pub recipes: Load<Vec<Recipe>>,
    dirty: bool,
    seeded: bool,
    queries_issued: usize,
}

impl Default for RecipeListView {
    fn default() -> Self {
        Self::new()
    }
}

impl RecipeListView {
    pub fn new() -> Self {
        Self {
            filter: FilterState::default(),
            recipes: Load::NotRequested,
            dirty: true,
            seeded: false,
            queries_issued: 0,
        }
    }

    pub fn with_search(search: Option<&str>) -> Self {
        let mut view = Self::new();
        view.seed_search(search);
        view
    }

    /// Applies the route's `search` parameter. Only the first call per view has any effect.
    pub fn seed_search(&mut self, search: Option<&str>) {
        if self.seeded {
            return;
        }
        self.seeded = true;
        if let Some(q) = search
            && !q.is_empty()
        {
            debug!(search = q, "seeding title filter from route");
            self.filter.title = q.to_string();
            self.dirty = true;
        }
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    /// Mutates the filter; any actual change schedules a re-query.
    pub fn update(&mut self, f: impl FnOnce(&mut FilterState)) {
        let before = self.filter.clone();
        f(&mut self.filter);
        if self.filter != before {
            self.dirty = true;
        }
    }

    pub fn needs_refresh(&self) -> bool {
        self.dirty
    }

    pub fn queries_issued(&self) -> usize {
        self.queries_issued
    }

    /// Marks the result set pending if a re-query is due, so it can be drawn before running.
    pub fn begin_refresh(&mut self) {
        if self.dirty {
            self.recipes.begin();
        }
    }

    /// Runs the query for the current filter if anything changed since the last run.
    pub fn refresh(&mut self, store: &dyn RecipeStore) -> bool {
        if !self.dirty {
            return false;
        }
        self.recipes.begin();
        let query = self.filter.to_query();
        let result: Result<Vec<Recipe>> = store.list_recipes(&query);
        self.recipes.resolve(result);
        self.dirty = false;
        self.queries_issued += 1;
        true
    }
}
