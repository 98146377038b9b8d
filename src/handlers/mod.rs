//! Request handlers for the callable operations

pub mod ask;
pub mod audio;

#[cfg(test)]
mod test_handlers;

use std::sync::Arc;
use std::time::Duration;

use crate::config::StorageConfig;
use crate::repository_traits::{BlobStore, ChatStore, IdentityResolver};
use crate::speech::{SpeechRecognizer, SpeechSynthesizer};
use crate::transport::Generator;

pub use ask::AskHandler;
pub use audio::AudioHandler;

/// Injected collaborators shared by every operation. Holds no mutable state;
/// each call is independent.
pub struct Handlers {
    pub(crate) identity: Arc<dyn IdentityResolver>,
    pub(crate) generator: Arc<dyn Generator>,
    pub(crate) recognizer: Arc<dyn SpeechRecognizer>,
    pub(crate) synthesizer: Arc<dyn SpeechSynthesizer>,
    pub(crate) chats: Arc<dyn ChatStore>,
    pub(crate) blobs: Arc<dyn BlobStore>,
    pub(crate) signed_url_ttl: Duration,
    pub(crate) max_upload_bytes: usize,
}

impl Handlers {
    pub fn new(
        identity: Arc<dyn IdentityResolver>,
        generator: Arc<dyn Generator>,
        recognizer: Arc<dyn SpeechRecognizer>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
        chats: Arc<dyn ChatStore>,
        blobs: Arc<dyn BlobStore>,
        storage: &StorageConfig,
    ) -> Self {
        Self {
            identity,
            generator,
            recognizer,
            synthesizer,
            chats,
            blobs,
            signed_url_ttl: storage.signed_url_ttl(),
            max_upload_bytes: storage.max_upload_bytes,
        }
    }
}
