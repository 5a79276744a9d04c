//! Result delivery
//!
//! A finished mashup is packaged as a gzip archive next to the output file
//! and handed to a [`MailTransport`] as an [`OutgoingMessage`]. The bundled
//! [`OutboxTransport`] spools messages to a directory for an external mailer;
//! talking SMTP is left to that mailer.

use std::fs::File;
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Subject line of every delivery
pub const MESSAGE_SUBJECT: &str = "Your Mashup is Ready!";

/// Body text of every delivery
pub const MESSAGE_BODY: &str = concat!(
    "Hi! Your mashup has been created successfully. ",
    "Please find it attached as a compressed archive."
);

/// Delivery errors
#[derive(Debug, Error)]
pub enum NotifyError {
    /// Nothing to deliver
    #[error("Output file not found: {}", .0.display())]
    MissingOutput(PathBuf),

    /// Archive could not be written
    #[error("Failed to package {}: {source}", .path.display())]
    Packaging {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Transport rejected the message
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Message handed to a transport
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutgoingMessage {
    pub message_id: Uuid,
    pub to: String,
    pub subject: String,
    pub body: String,
    /// Archive to attach
    pub attachment: PathBuf,
    pub created_at: DateTime<Utc>,
}

/// What a delivery produced
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryReceipt {
    pub message_id: Uuid,
    pub recipient: String,
    pub archive_path: PathBuf,
    /// Where the transport put the message, when it has a location
    pub spooled_to: Option<PathBuf>,
}

/// Outbound message channel
pub trait MailTransport: Send + Sync {
    /// Send `message`; returns where it was spooled, if anywhere
    fn send(&self, message: &OutgoingMessage) -> Result<Option<PathBuf>, NotifyError>;
}

/// Delivers a finished output to a recipient
pub trait Notifier: Send + Sync {
    fn deliver(&self, output_path: &Path, recipient: &str) -> Result<DeliveryReceipt, NotifyError>;
}

/// Spools each message as `<message_id>.json` plus an attachment copy
#[derive(Debug, Clone)]
pub struct OutboxTransport {
    outbox: PathBuf,
}

impl OutboxTransport {
    pub fn new(outbox: impl Into<PathBuf>) -> Self {
        Self { outbox: outbox.into() }
    }

    pub fn outbox(&self) -> &Path {
        &self.outbox
    }
}

impl MailTransport for OutboxTransport {
    fn send(&self, message: &OutgoingMessage) -> Result<Option<PathBuf>, NotifyError> {
        std::fs::create_dir_all(&self.outbox)?;

        let attachment_name = message
            .attachment
            .file_name()
            .ok_or_else(|| NotifyError::Transport("attachment has no file name".to_string()))?;
        let spooled_attachment = self
            .outbox
            .join(format!("{}-{}", message.message_id, attachment_name.to_string_lossy()));
        std::fs::copy(&message.attachment, &spooled_attachment)?;

        let envelope = OutgoingMessage {
            attachment: spooled_attachment,
            ..message.clone()
        };
        let envelope_path = self.outbox.join(format!("{}.json", message.message_id));
        std::fs::write(&envelope_path, serde_json::to_vec_pretty(&envelope)?)?;

        tracing::info!(
            message_id = %message.message_id,
            to = %message.to,
            envelope = %envelope_path.display(),
            "Message spooled to outbox"
        );
        Ok(Some(envelope_path))
    }
}

/// gzip-packaging notifier
pub struct ArchivingNotifier<T: MailTransport> {
    transport: T,
}

impl<T: MailTransport> ArchivingNotifier<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}

/// Archive path for an output file: `<name>.gz` in the same directory
pub fn archive_path_for(output_path: &Path) -> PathBuf {
    let mut name = output_path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".gz");
    output_path.with_file_name(name)
}

/// Compress `src` into `dst` with gzip
pub fn package_gzip(src: &Path, dst: &Path) -> Result<u64, NotifyError> {
    let packaging = |source: io::Error| NotifyError::Packaging {
        path: src.to_path_buf(),
        source,
    };

    let mut reader = BufReader::new(File::open(src).map_err(packaging)?);
    let writer = BufWriter::new(File::create(dst).map_err(packaging)?);
    let mut encoder = GzEncoder::new(writer, Compression::default());
    let copied = io::copy(&mut reader, &mut encoder).map_err(packaging)?;
    encoder.finish().map_err(packaging)?;
    Ok(copied)
}

impl<T: MailTransport> Notifier for ArchivingNotifier<T> {
    fn deliver(&self, output_path: &Path, recipient: &str) -> Result<DeliveryReceipt, NotifyError> {
        if !output_path.is_file() {
            return Err(NotifyError::MissingOutput(output_path.to_path_buf()));
        }

        let archive_path = archive_path_for(output_path);
        let bytes = package_gzip(output_path, &archive_path)?;
        tracing::debug!(archive = %archive_path.display(), bytes, "Output packaged");

        let message = OutgoingMessage {
            message_id: Uuid::new_v4(),
            to: recipient.to_string(),
            subject: MESSAGE_SUBJECT.to_string(),
            body: MESSAGE_BODY.to_string(),
            attachment: archive_path.clone(),
            created_at: Utc::now(),
        };
        let spooled_to = self.transport.send(&message)?;

        Ok(DeliveryReceipt {
            message_id: message.message_id,
            recipient: message.to,
            archive_path,
            spooled_to,
        })
    }
}
