use crate::error::MediaError;
use crate::media::LocalStream;
use async_trait::async_trait;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaConstraints {
    pub audio: bool,
    pub video: bool,
}

impl Default for MediaConstraints {
    fn default() -> Self {
        Self {
            audio: true,
            video: true,
        }
    }
}

/// Supplies local tracks on demand. Acquisition may take a while or be refused.
#[async_trait]
pub trait MediaSource: Send + Sync {
    async fn acquire(&self, constraints: &MediaConstraints) -> Result<LocalStream, MediaError>;
}

/// Always refuses access.
#[derive(Debug, Default, Clone, Copy)]
pub struct DeniedSource;

#[async_trait]
impl MediaSource for DeniedSource {
    async fn acquire(&self, _constraints: &MediaConstraints) -> Result<LocalStream, MediaError> {
        Err(MediaError::Denied)
    }
}
