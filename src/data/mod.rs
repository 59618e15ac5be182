//! Data layer: table model, loading, filtering and sorting.
//!
//! Architecture:
//! ```text
//!  .csv / .xlsx bytes
//!        │
//!        ▼
//!   ┌──────────┐      ┌───────────┐
//!   │  loader   │◄─────│   cache   │  one entry, keyed by content digest
//!   └──────────┘      └───────────┘
//!        │  Table (date columns coerced)
//!        ▼
//!   ┌──────────┐
//!   │  filter   │  categorical sets + date range → row subset
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │   sort    │  stable, nulls last
//!   └──────────┘
//! ```

pub mod cache;
pub mod filter;
pub mod loader;
pub mod model;
pub mod pipeline;
pub mod sort;
