//! Fragment file names.
//!
//! A fragment name is the original file name, the client identity (session
//! id or browser fingerprint), the protocol token and optionally the chunk
//! index, joined by `-`/`.` and ending in `.part`:
//!
//! ```text
//! report.pdf-<session>-<token>.3.part
//! ```

use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};

use chunk_upload_protocol::{ChunkUpload, ClientIdentity};
use chunk_upload_storage::CHUNK_EXTENSION;

use crate::TransferError;
use crate::validation::validate_file_name;

/// How fragments of different clients are kept apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamingPolicy {
    /// Add the session id when a session is active.
    #[serde(default = "default_use_session")]
    pub use_session: bool,
    /// Add a fingerprint of client ip and user agent.
    #[serde(default)]
    pub use_browser: bool,
}

fn default_use_session() -> bool {
    true
}

impl Default for NamingPolicy {
    fn default() -> Self {
        Self {
            use_session: default_use_session(),
            use_browser: false,
        }
    }
}

/// The identity component a policy resolves to for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityPart {
    Session(String),
    Fingerprint(String),
    None,
}

impl NamingPolicy {
    /// Picks the identity component. A requested session without an active
    /// session falls back to the browser fingerprint.
    pub fn identity_part(&self, identity: &ClientIdentity) -> IdentityPart {
        if self.use_session {
            if let Some(session) = &identity.session_id {
                return IdentityPart::Session(session.clone());
            }
            return IdentityPart::Fingerprint(fingerprint(identity));
        }
        if self.use_browser {
            return IdentityPart::Fingerprint(fingerprint(identity));
        }
        IdentityPart::None
    }

    /// Builds a fragment name from its parts.
    ///
    /// The token and session come from the client, so the finished name must
    /// still be a plain file name inside the chunk directory.
    pub fn fragment_name(
        &self,
        original_name: &str,
        identity: &ClientIdentity,
        token: Option<&str>,
        index: Option<u64>,
    ) -> Result<String, TransferError> {
        let mut parts = vec![original_name.to_owned()];
        match self.identity_part(identity) {
            IdentityPart::Session(id) | IdentityPart::Fingerprint(id) => parts.push(id),
            IdentityPart::None => {}
        }
        if let Some(token) = token.filter(|t| !t.is_empty()) {
            parts.push(token.to_owned());
        }

        let mut name = parts.join("-");
        if let Some(index) = index {
            name.push_str(&format!(".{index}"));
        }
        name.push('.');
        name.push_str(CHUNK_EXTENSION);
        validate_file_name(&name)?;
        Ok(name)
    }

    /// Fragment name for a bound upload. `indexed` adds the chunk ordinal.
    pub fn upload_fragment_name(
        &self,
        upload: &ChunkUpload,
        indexed: bool,
    ) -> Result<String, TransferError> {
        self.fragment_name(
            upload.original_filename(),
            upload.identity(),
            upload.fragment_token(),
            indexed.then(|| upload.chunk_ordinal()),
        )
    }
}

/// Hex md5 of client ip and user agent.
pub fn fingerprint(identity: &ClientIdentity) -> String {
    hex::encode(Md5::digest(identity.fingerprint_source().as_bytes()))
}

/// Strips the fragment extension and a trailing `.<index>`, leaving the name
/// shared by every fragment of one upload.
pub fn fragment_base(name: &str) -> &str {
    let stem = name
        .strip_suffix(CHUNK_EXTENSION)
        .and_then(|s| s.strip_suffix('.'))
        .unwrap_or(name);
    match stem.rsplit_once('.') {
        Some((base, index)) if !index.is_empty() && index.bytes().all(|b| b.is_ascii_digit()) => base,
        _ => stem,
    }
}

/// Chunk ordinal encoded in a fragment name, if any.
pub fn fragment_index(name: &str) -> Option<u64> {
    let base = fragment_base(name);
    let stem = name.strip_suffix(CHUNK_EXTENSION)?.strip_suffix('.')?;
    stem.strip_prefix(base)?.strip_prefix('.')?.parse().ok()
}
