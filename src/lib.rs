//! # Artifact Search
//!
//! Client-side search orchestration for a cultural-artifact catalog API:
//! validated query building, debounced and cancellable request execution,
//! response-shape normalization, and typed error classification with
//! localized user-facing messaging.
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`models`]: Core data structures (search parameters, artifact records)
//! - [`query`]: Stateful query builder and stateless filter combination
//! - [`client`]: HTTP gateway with merged timeout/cancellation signals
//! - [`normalize`]: Payload-shape normalization into one canonical form
//! - [`display`]: Pure mapping of artifacts into UI-ready records
//! - [`errors`]: Error taxonomy, classification and retry guidance
//! - [`search`]: The debouncing, cancelling search controller
//! - [`config`]: Configuration management
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use artifact_search::client::ApiClient;
//! use artifact_search::display::format_list_response;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ApiClient::new("http://localhost:5000")?;
//! let response = client.quick_search("amphora", 1, 20, None).await?;
//! let formatted = format_list_response(&response);
//! println!("{} results", formatted.items.len());
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod display;
pub mod errors;
pub mod models;
pub mod normalize;
pub mod query;
pub mod search;

// Re-export commonly used types
pub use client::{ApiClient, ClientError, RequestOptions};
pub use errors::{ErrorKind, FormattedError};
pub use models::{
    ArtifactDTO, FilterField, FormattedArtifact, PaginationMeta, SearchFilters, SearchParams,
    ValidationError,
};
pub use normalize::{normalize, NormalizedResponse};
pub use query::{FilterBuilder, QueryBuilder};
pub use search::{ArtifactGateway, SearchController, SearchOptions, SearchSnapshot};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
