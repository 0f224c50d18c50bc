//! ZPL labeler core library.
//!
//! Allocates serial numbers per part and fills ZPL label templates with
//! them. The entry point is [`LabelService`], which combines a
//! [`TemplateSource`], a [`CounterStore`], the [`serial`] codec and the
//! placeholder [`fill`]er, and answers preview, print and reprint requests.

#![warn(missing_docs)]

/// Parts catalog loaded from JSON.
pub mod catalog;
/// Per-part counter records and their stores.
pub mod counter;
mod error;
/// Placeholder substitution.
pub mod fill;
/// Julian date codes and the clock seam.
pub mod julian;
/// Per-unit label identifiers.
pub mod label_id;
mod lock;
mod part;
mod response;
mod retry;
/// Serial string ⇄ ordinal codec.
pub mod serial;
/// Label generation service.
pub mod service;
/// Label template registry.
pub mod template;

// ── Convenience re-exports ──────────────────────────────────────────────────

pub use catalog::{CatalogError, PartsCatalog};
#[cfg(feature = "redb")]
pub use counter::RedbCounterStore;
pub use counter::{CounterRecord, CounterStore, MemoryCounterStore};
pub use error::{LabelError, StoreError};
pub use fill::{FieldMap, FieldValue, fill as fill_template, placeholders};
pub use julian::{Clock, FixedClock, SystemClock, julian_code, julian_date};
pub use label_id::{EntropyLabelIds, LabelIdSource};
pub use lock::PartLocks;
pub use part::{LabelRequest, Part, RenderMode};
pub use response::GenerateResponse;
pub use retry::RetryPolicy;
pub use serial::NumberingScheme;
pub use service::LabelService;
pub use template::{TemplateRegistry, TemplateSource};
