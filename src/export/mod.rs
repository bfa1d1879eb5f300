//! Export collaborators: spreadsheet rows and PDF form fill plans.
//!
//! Both read the final applicant record through the field resolver; neither
//! writes back to it.

pub mod pdf;
pub mod sheet;

pub use pdf::{FieldSource, PdfFieldFill, PdfFieldKind, PdfFieldSpec, PdfFieldValue, fill_plan, template_for};
pub use sheet::{JsonlSink, MemorySink, RowSink, SheetRow, sheet_row};
