//! URL-backed list view state.
//!
//! A listing page keeps its filters, sort order and pagination in the query
//! string so that links, reloads and the back button restore the same view.
//! [`ListStateSync`] owns both directions: it projects the current
//! [`Location`] into a typed [`ViewState`], and turns a [`ViewStateUpdate`]
//! into exactly one canonical history replacement.
//!
//! ```
//! use pawhub_sync::list_state::{
//!     ListStateSync, Location, MemoryNavigator, PetSort, ViewStateUpdate,
//! };
//!
//! let navigator = MemoryNavigator::new();
//! let mut sync = ListStateSync::pets(navigator.clone(), Location::parse("/pets?ref=home"));
//!
//! let location = sync
//!     .update(ViewStateUpdate::new().filter("breed", "Poodle").sort(PetSort::PriceHigh))
//!     .unwrap();
//! assert_eq!(location.to_string(), "/pets?breed=Poodle&sort=price-high&ref=home");
//! assert_eq!(navigator.len(), 1);
//! ```

mod filters;
mod location;
mod page;
mod sort;

use std::collections::HashSet;

use thiserror::Error;

pub use filters::{FieldKind, FilterField, FilterSchema, FilterState, Scalar};
pub use location::{ChannelNavigator, Location, MemoryNavigator, Navigation, Navigator};
pub use page::{DEFAULT_PAGE_SIZE, PageState};
pub use sort::{PetSort, SortKey};

const SORT_PARAM: &str = "sort";
const PAGE_PARAM: &str = "page";
const LIMIT_PARAM: &str = "limit";

/// Rejected view state changes. Nothing is navigated when one is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ListStateError {
    #[error("unknown filter `{0}`")]
    UnknownField(String),
    #[error("invalid value `{value}` for filter `{field}`: {reason}")]
    InvalidValue {
        field: &'static str,
        value: String,
        reason: String,
    },
    #[error("page must be at least 1, got {0}")]
    InvalidPage(u32),
    #[error("page size must be at least 1, got {0}")]
    InvalidPageSize(u32),
}

/// Typed projection of a listing URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState<S> {
    pub filters: FilterState,
    pub sort: S,
    pub page: PageState,
}

impl<S: SortKey> Default for ViewState<S> {
    fn default() -> Self {
        Self {
            filters: FilterState::new(),
            sort: S::default(),
            page: PageState::default(),
        }
    }
}

impl<S: SortKey> ViewState<S> {
    /// Server query parameters: `page`, `limit`, `ordering`, then every
    /// filter with a value (explicit or default) in schema order.
    #[must_use]
    pub fn to_query_params(&self, schema: &FilterSchema) -> Vec<(String, String)> {
        let mut params = vec![
            (PAGE_PARAM.to_string(), self.page.page().to_string()),
            (LIMIT_PARAM.to_string(), self.page.page_size().to_string()),
            ("ordering".to_string(), self.sort.ordering().to_string()),
        ];
        params.extend(schema.fields().filter_map(|field| {
            self.filters
                .effective(schema, field.name)
                .map(|value| (field.name.to_string(), value.to_string()))
        }));
        params
    }
}

/// A batch of changes applied as one navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewStateUpdate<S> {
    reset_filters: bool,
    filters: Vec<(String, Option<Scalar>)>,
    sort: Option<S>,
    page: Option<u32>,
    page_size: Option<u32>,
}

impl<S> Default for ViewStateUpdate<S> {
    fn default() -> Self {
        Self {
            reset_filters: false,
            filters: Vec::new(),
            sort: None,
            page: None,
            page_size: None,
        }
    }
}

impl<S> ViewStateUpdate<S> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn filter(mut self, name: impl Into<String>, value: impl Into<Scalar>) -> Self {
        self.filters.push((name.into(), Some(value.into())));
        self
    }

    /// Resets one filter to its default.
    #[must_use]
    pub fn clear_filter(mut self, name: impl Into<String>) -> Self {
        self.filters.push((name.into(), None));
        self
    }

    /// Resets every filter before applying the others in this update.
    #[must_use]
    pub const fn reset_filters(mut self) -> Self {
        self.reset_filters = true;
        self
    }

    #[must_use]
    pub fn sort(mut self, sort: S) -> Self {
        self.sort = Some(sort);
        self
    }

    #[must_use]
    pub const fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    #[must_use]
    pub const fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }
}

/// Keeps a [`ViewState`] and the page URL in step.
///
/// The URL is the source of truth. Every change is merged into the state
/// parsed from the last known location and written back through the
/// [`Navigator`] as a single replacement that never scrolls.
#[derive(Debug)]
pub struct ListStateSync<S, N> {
    schema: FilterSchema,
    default_page_size: u32,
    navigator: N,
    location: Location,
    state: ViewState<S>,
}

impl<N: Navigator> ListStateSync<PetSort, N> {
    /// Synchronizer for the pet listing.
    pub fn pets(navigator: N, location: Location) -> Self {
        Self::new(FilterSchema::pets(), navigator, location)
    }
}

impl<S: SortKey, N: Navigator> ListStateSync<S, N> {
    pub fn new(schema: FilterSchema, navigator: N, location: Location) -> Self {
        let mut sync = Self {
            schema,
            default_page_size: DEFAULT_PAGE_SIZE,
            navigator,
            location,
            state: ViewState::default(),
        };
        sync.state = sync.read_from_location();
        sync
    }

    /// Changes the page size assumed when the URL has no `limit`.
    #[must_use]
    pub fn with_default_page_size(mut self, page_size: u32) -> Self {
        self.default_page_size = page_size.max(1);
        self.state = self.read_from_location();
        self
    }

    #[must_use]
    pub const fn schema(&self) -> &FilterSchema {
        &self.schema
    }

    #[must_use]
    pub const fn location(&self) -> &Location {
        &self.location
    }

    /// The state last projected from the URL.
    #[must_use]
    pub const fn state(&self) -> &ViewState<S> {
        &self.state
    }

    /// Server parameters for the current state.
    #[must_use]
    pub fn query_params(&self) -> Vec<(String, String)> {
        self.state.to_query_params(&self.schema)
    }

    /// Parses the current location. Malformed values fall back to defaults.
    #[must_use]
    pub fn read_from_location(&self) -> ViewState<S> {
        let pairs = self.location.pairs();
        let last = |key: &str| {
            pairs
                .iter()
                .rev()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str())
        };
        let sort = last(SORT_PARAM)
            .and_then(|token| {
                let sort = S::from_token(token);
                if sort.is_none() {
                    tracing::debug!(%token, "ignoring unknown sort");
                }
                sort
            })
            .unwrap_or_default();
        ViewState {
            filters: FilterState::from_pairs(&self.schema, &pairs),
            sort,
            page: PageState::from_params(last(PAGE_PARAM), last(LIMIT_PARAM), self.default_page_size),
        }
    }

    /// Applies `update` and navigates once.
    ///
    /// A page size change always lands on page 1. Otherwise a filter change
    /// lands on page 1 unless the update also names a page.
    ///
    /// # Errors
    ///
    /// Returns a [`ListStateError`] for unknown filters, values that do not
    /// fit their field, or zero page numbers and sizes. The URL is left
    /// untouched in that case.
    pub fn update(&mut self, update: ViewStateUpdate<S>) -> Result<Location, ListStateError> {
        let current = self.read_from_location();
        let mut next = current.clone();

        if update.reset_filters {
            next.filters = FilterState::new();
        }
        for (name, value) in update.filters {
            next.filters.set(&self.schema, &name, value)?;
        }
        if let Some(sort) = update.sort {
            next.sort = sort;
        }
        if update.page == Some(0) {
            return Err(ListStateError::InvalidPage(0));
        }

        let page_size = update.page_size.unwrap_or(current.page.page_size());
        let page = if page_size != current.page.page_size() {
            1
        } else if let Some(page) = update.page {
            page
        } else if next.filters != current.filters {
            1
        } else {
            current.page.page()
        };
        next.page = PageState::new(page, page_size)?;

        let location = self.write(&next);
        self.commit(location.clone());
        Ok(location)
    }

    /// Removes every managed parameter, keeping unrelated ones.
    pub fn clear(&mut self) -> Location {
        let location = self.write(&ViewState {
            filters: FilterState::new(),
            sort: S::default(),
            page: PageState::first(self.default_page_size),
        });
        self.commit(location.clone());
        location
    }

    /// Adopts a location produced by the router, such as a back navigation.
    pub fn on_navigation(&mut self, location: Location) -> &ViewState<S> {
        self.location = location;
        self.state = self.read_from_location();
        &self.state
    }

    fn commit(&mut self, location: Location) {
        tracing::debug!(location = %location, "list state changed");
        self.navigator.replace(Navigation {
            location: location.clone(),
            scroll: false,
        });
        self.on_navigation(location);
    }

    /// Canonical location for `state`: filters in schema order, `sort`,
    /// `page`, `limit`, then unrelated parameters in their original order.
    fn write(&self, state: &ViewState<S>) -> Location {
        let mut pairs = state.filters.to_pairs(&self.schema);
        if state.sort != S::default() {
            pairs.push((SORT_PARAM.to_string(), state.sort.token().to_string()));
        }
        if state.page.page() > 1 {
            pairs.push((PAGE_PARAM.to_string(), state.page.page().to_string()));
        }
        if state.page.page_size() != self.default_page_size {
            pairs.push((LIMIT_PARAM.to_string(), state.page.page_size().to_string()));
        }

        let managed: HashSet<&str> = self
            .schema
            .fields()
            .map(|f| f.name)
            .chain([SORT_PARAM, PAGE_PARAM, LIMIT_PARAM])
            .collect();
        pairs.extend(
            self.location
                .pairs()
                .into_iter()
                .filter(|(k, _)| !managed.contains(k.as_str())),
        );

        Location::from_pairs(self.location.path.clone(), pairs)
    }
}
