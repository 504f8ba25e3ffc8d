//! # RepFlow Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - The domain store ([`LibraryService`]): optimistic local mutations
//!   reconciled against a replicated document backend
//! - Port/adapter interfaces (traits) for the sync gateway
//! - The derived analytics engine ([`insights`])
//! - The watch-time accrual timer ([`WatchTimer`])
//!
//! ## Architecture Principles
//! - Only depends on `repflow-domain`
//! - No database, HTTP, or platform code
//! - All external dependencies via traits
//! - Pure, testable business logic

pub mod insights;
pub mod store;
pub mod watch;

// Re-export specific items to avoid ambiguity
pub use store::ports::{CollectionGateway, DocumentGateway, Record};
pub use store::{LibraryGateways, LibraryService};
pub use watch::WatchTimer;
