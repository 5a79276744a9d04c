//! Service modules for the mashup workflow
//!
//! Stage services (selection, acquisition, normalization, trimming, merge),
//! the subprocess backends they run on, result delivery, and the
//! orchestrator that sequences them.

pub mod acquisition;
pub mod candidate_selector;
pub mod ffmpeg_codec;
pub mod merger;
pub mod normalizer;
pub mod notifier;
pub mod trimmer;
pub mod workflow_orchestrator;
pub mod ytdlp_client;

pub use acquisition::{AcquisitionReport, AcquisitionStage};
pub use candidate_selector::{CandidateSelector, Selection, TierCounts};
pub use ffmpeg_codec::FfmpegCodec;
pub use merger::{MergeReport, Merger};
pub use normalizer::{Normalizer, StageReport};
pub use notifier::{
    ArchivingNotifier, DeliveryReceipt, MailTransport, Notifier, NotifyError, OutboxTransport,
    OutgoingMessage,
};
pub use trimmer::Trimmer;
pub use workflow_orchestrator::{PipelineStatistics, RunReport, WorkflowOrchestrator};
pub use ytdlp_client::YtDlpClient;
