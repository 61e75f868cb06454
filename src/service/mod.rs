//! Cache-fronted accessors
//!
//! The two composition points of the system: each service fronts one
//! upstream with the generic cache store, the conditional-fetch cache,
//! the quota tracker (videos only), and the fallback resolver.

use crate::cache::LoadError;
use crate::upstream::UpstreamError;

pub mod recipes;
pub mod videos;

pub use recipes::RecipeService;
pub use videos::VideoService;

/// Map a client failure into the store's cloneable loader error
pub(crate) fn to_load_error(err: UpstreamError) -> LoadError {
    LoadError::Upstream(err.to_string())
}
