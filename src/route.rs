//! Page-level navigation targets and the header link bar.
//!
//! Routes render to and parse from web-style paths (`/`,
//! `/recipes?search=...`, `/<id>`, `/new`), so a starting screen can be
//! handed to the binary as a single argument.

use std::fmt;
use std::str::FromStr;

use url::{Url, form_urlencoded};

use crate::errors::{CookbookError, Result};
use crate::storage::models::RecipeId;

const BASE_URL: &str = "cookbook://local/";
pub const SEARCH_PARAM: &str = "search";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Landing,
    Recipes { search: Option<String> },
    Recipe(RecipeId),
    NewRecipe,
}

impl Route {
    pub fn recipes_matching(search: &str) -> Self {
        Route::Recipes {
            search: Some(search.to_string()),
        }
    }

    pub fn path(&self) -> String {
        match self {
            Route::Landing => "/".to_string(),
            Route::Recipes { .. } => "/recipes".to_string(),
            Route::Recipe(id) => format!("/{}", urlencoding::encode(id)),
            Route::NewRecipe => "/new".to_string(),
        }
    }

    pub fn parse(input: &str) -> Result<Self> {
        let base = Url::parse(BASE_URL)
            .map_err(|e| CookbookError::InvalidInput(format!("bad base url: {e}")))?;
        let url = base
            .join(input.trim())
            .map_err(|e| CookbookError::InvalidInput(format!("invalid route {input:?}: {e}")))?;

        let segments: Vec<&str> = url
            .path_segments()
            .map(|s| s.filter(|seg| !seg.is_empty()).collect())
            .unwrap_or_default();

        match segments.as_slice() {
            [] => Ok(Route::Landing),
            ["recipes"] => {
                let search = url
                    .query_pairs()
                    .find(|(k, _)| k == SEARCH_PARAM)
                    .map(|(_, v)| v.into_owned())
                    .filter(|v| !v.is_empty());
                Ok(Route::Recipes { search })
            }
            ["new"] => Ok(Route::NewRecipe),
            [id] | ["recipes", id] => {
                let id = urlencoding::decode(id).map_err(|e| {
                    CookbookError::InvalidInput(format!("invalid recipe id in {input:?}: {e}"))
                })?;
                Ok(Route::Recipe(id.into_owned()))
            }
            _ => Err(CookbookError::InvalidInput(format!("unknown route {input:?}"))),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Recipes {
                search: Some(search),
            } => {
                let query = form_urlencoded::Serializer::new(String::new())
                    .append_pair(SEARCH_PARAM, search)
                    .finish();
                write!(f, "/recipes?{query}")
            }
            other => f.write_str(&other.path()),
        }
    }
}

impl FromStr for Route {
    type Err = CookbookError;

    fn from_str(s: &str) -> Result<Self> {
        Route::parse(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderLink {
    pub label: &'static str,
    /// Function key that follows the link (F1, F2, ...).
    pub fkey: u8,
    pub route: Route,
    pub active: bool,
}

/// Links shown in the header bar; Home and Browse highlight when their path is current.
pub fn header_links(current: &Route) -> Vec<HeaderLink> {
    let path = current.path();
    vec![
        HeaderLink {
            label: "Home",
            fkey: 1,
            route: Route::Landing,
            active: path == "/",
        },
        HeaderLink {
            label: "Browse Recipes",
            fkey: 2,
            route: Route::Recipes { search: None },
            active: path == "/recipes",
        },
        HeaderLink {
            label: "Add Recipe",
            fkey: 3,
            route: Route::NewRecipe,
            active: false,
        },
    ]
}
