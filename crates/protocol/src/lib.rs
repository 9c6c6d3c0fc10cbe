//! Client protocol detection for chunked uploads.
//!
//! Browser uploaders split a file into chunks and describe each chunk in
//! their own way: a `Content-Range` header, indexed form fields, a resumable
//! identifier, or a byte offset header. This crate turns one inbound request
//! into a [`ChunkUpload`]: the detected [`ProtocolKind`] plus a canonical
//! [`ChunkDescriptor`].

pub mod constants;
pub mod descriptor;
pub mod error;
pub mod file;
pub mod handler;
pub mod kind;
pub mod registry;
pub mod request;
mod variants;

pub use descriptor::ChunkDescriptor;
pub use error::ProtocolError;
pub use file::{TempUpload, UploadedFile, move_file};
pub use handler::{ChunkCheckRequest, ChunkUpload};
pub use kind::{AssemblyStrategy, HandlerRole, ProtocolKind};
pub use registry::HandlerRegistry;
pub use request::{ClientIdentity, RequestParts, UploadRequest};
