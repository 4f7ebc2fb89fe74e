//! Domain model (keys, job names, chat events, interactions, transcripts, ...).
//!
//! ここは I/O を持たない決定的なロジックだけを置きます。テストの中心はここです。

pub mod artifact;
pub mod chat;
pub mod completion;
pub mod errors;
pub mod ids;
pub mod interaction;
pub mod job;
pub mod storage;
pub mod transcript;

pub use artifact::AudioArtifact;
pub use chat::{Attachment, Author, ChannelId, ChatMessage, IgnoreReason, InboundEvent, MessageId};
pub use completion::{CompletionEnvelope, CompletionEvent, CompletionSummary, RelayOutcome};
pub use errors::{ErrorKind, RelayError, ServiceError};
pub use ids::{EventId, RequestId};
pub use interaction::{Action, CommandReply, Interaction, InteractionResponse, ReplyBody};
pub use job::{JobDescription, JobName, JobStatus, TranscriptionJob};
pub use storage::{ObjectSummary, StorageKey, StorageLocation};
