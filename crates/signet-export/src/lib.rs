//! # signet-export
//!
//! The batch export engine. An export job walks a user's signatures in
//! fixed-size chunks, renders each one through the template store, and
//! spools a partial archive per chunk; the assembler later merges the
//! partials into one downloadable zip and tears everything down once the
//! download finishes. Chunks are executed one at a time by a dedicated
//! worker task fed through an explicit in-process queue, so progress is
//! persisted between chunks and a restart never loses more than the chunk
//! in flight.

pub mod artifacts;
pub mod assembler;
pub mod cleanup;
pub mod processor;
pub mod runner;
pub mod service;

#[cfg(test)]
pub(crate) mod testing;

pub use artifacts::ArtifactStore;
pub use assembler::{ArchiveAssembler, ExportDownload};
pub use cleanup::RetentionSweeper;
pub use processor::{ChunkOutcome, ChunkProcessor};
pub use runner::{ChunkTask, ExportQueue, ExportWorker, export_queue};
pub use service::ExportService;
