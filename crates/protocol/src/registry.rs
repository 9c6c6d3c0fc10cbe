//! Ordered protocol lookup.

use crate::error::ProtocolError;
use crate::file::UploadedFile;
use crate::handler::{ChunkCheckRequest, ChunkUpload};
use crate::kind::{HandlerRole, ProtocolKind};
use crate::request::UploadRequest;

/// An ordered list of protocols plus an optional fallback.
///
/// Built once at startup and shared by reference; resolution never mutates
/// it. The first protocol whose predicate claims a request wins.
#[derive(Debug, Clone)]
pub struct HandlerRegistry {
    handlers: Vec<ProtocolKind>,
    fallback: Option<ProtocolKind>,
    role: Option<HandlerRole>,
}

impl HandlerRegistry {
    /// A registry with no role restriction.
    pub fn new(handlers: Vec<ProtocolKind>, fallback: Option<ProtocolKind>) -> Self {
        Self {
            handlers,
            fallback,
            role: None,
        }
    }

    /// Default upload registry, falling back to a single-shot upload.
    pub fn uploads() -> Self {
        Self::new(
            ProtocolKind::DEFAULT_UPLOADS.to_vec(),
            Some(ProtocolKind::Single),
        )
        .restricted_to(HandlerRole::Upload)
    }

    /// Default completeness-check registry. Has no fallback.
    pub fn checks() -> Self {
        Self::new(ProtocolKind::DEFAULT_CHECKS.to_vec(), None).restricted_to(HandlerRole::Check)
    }

    /// Limits resolution to protocols of one role. Registered protocols of
    /// another role stay listed but are skipped.
    pub fn restricted_to(mut self, role: HandlerRole) -> Self {
        self.role = Some(role);
        self
    }

    /// Appends a protocol after the existing ones. A kind that is already
    /// listed keeps its earlier position for resolution.
    pub fn register(&mut self, kind: ProtocolKind) {
        self.handlers.push(kind);
    }

    /// Replaces the active protocol list.
    pub fn set_handlers(&mut self, handlers: Vec<ProtocolKind>) {
        self.handlers = handlers;
    }

    pub fn handlers(&self) -> &[ProtocolKind] {
        &self.handlers
    }

    pub fn set_fallback(&mut self, fallback: Option<ProtocolKind>) {
        self.fallback = fallback;
    }

    pub fn fallback(&self) -> Option<ProtocolKind> {
        self.fallback
    }

    /// Applies configured protocol names: a non-empty `overrides` list
    /// replaces the handlers, then `custom` names are appended.
    pub fn configure(&mut self, custom: &[String], overrides: &[String]) -> Result<(), ProtocolError> {
        if !overrides.is_empty() {
            let handlers = overrides
                .iter()
                .map(|name| name.parse())
                .collect::<Result<Vec<_>, _>>()?;
            self.set_handlers(handlers);
        }
        for name in custom {
            self.register(name.parse()?);
        }
        Ok(())
    }

    /// Protocols taking part in resolution, in order.
    pub fn active(&self) -> impl Iterator<Item = ProtocolKind> + '_ {
        self.handlers
            .iter()
            .copied()
            .filter(move |kind| self.role.is_none_or(|role| kind.role() == role))
    }

    /// Picks the protocol for a request.
    ///
    /// A protocol that recognises the request but rejects its values stops
    /// resolution with that error instead of falling through to the
    /// fallback.
    pub fn resolve(&self, req: &dyn UploadRequest) -> Result<ProtocolKind, ProtocolError> {
        for kind in self.active() {
            if kind.detect(req)? {
                tracing::debug!(protocol = %kind, "chunk protocol resolved");
                return Ok(kind);
            }
        }

        match self.fallback {
            Some(kind) => {
                tracing::debug!(protocol = %kind, "no chunk protocol matched, using fallback");
                Ok(kind)
            }
            None => Err(ProtocolError::ProtocolMismatch),
        }
    }

    /// Resolves and binds an upload request.
    pub fn handler_for(
        &self,
        req: &dyn UploadRequest,
        file: &dyn UploadedFile,
    ) -> Result<ChunkUpload, ProtocolError> {
        self.resolve(req)?.bind(req, file)
    }

    /// Resolves and binds a completeness-check request.
    pub fn check_for(&self, req: &dyn UploadRequest) -> Result<ChunkCheckRequest, ProtocolError> {
        self.resolve(req)?.bind_check(req)
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::uploads()
    }
}
