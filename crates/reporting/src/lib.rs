//! Report Assembler — composes reducer output into CSV and JSON report
//! payloads for the export surface.

pub mod export;

pub use export::{ExportKind, ReportAssembler};
