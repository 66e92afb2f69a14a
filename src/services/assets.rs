//! Upload-then-commit support for entities that own stored files.
//!
//! Files are written to storage before the owning rows are inserted. When the
//! database work fails, every file uploaded by that call is deleted again;
//! when an update drops asset rows, their files are deleted after commit.
//! Deletions are best effort: failures are logged and never replace the
//! error that triggered them.

use std::{fmt, future::Future, path::Path};

use chrono::Utc;
use futures::future::join_all;
use rand::Rng;

use crate::{
    error::{AppError, AppResult},
    storage::AssetStorage,
};

/// A file received from the client, not yet persisted.
#[derive(Debug, Clone)]
pub struct NewFile {
    pub original_name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredAsset {
    pub file_name: String,
    pub url: String,
    pub original_name: String,
}

#[derive(Debug)]
pub enum UploadOutcome {
    Stored(StoredAsset),
    Failed { original_name: String, error: String },
}

#[derive(Debug, Default)]
pub struct UploadSummary {
    pub outcomes: Vec<UploadOutcome>,
}

impl UploadSummary {
    pub fn attempted(&self) -> usize {
        self.outcomes.len()
    }

    pub fn stored(&self) -> impl Iterator<Item = &StoredAsset> {
        self.outcomes.iter().filter_map(|outcome| match outcome {
            UploadOutcome::Stored(asset) => Some(asset),
            UploadOutcome::Failed { .. } => None,
        })
    }

    pub fn stored_count(&self) -> usize {
        self.stored().count()
    }

    pub fn failed_count(&self) -> usize {
        self.attempted() - self.stored_count()
    }

    pub fn stored_file_names(&self) -> Vec<String> {
        self.stored().map(|asset| asset.file_name.clone()).collect()
    }
}

/// How many uploads of a batch must succeed before the database work runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UploadPolicy {
    /// At least one success whenever at least one file was sent.
    #[default]
    AtLeastOne,
    All,
    AtLeast(usize),
}

impl UploadPolicy {
    pub fn required(&self, attempted: usize) -> usize {
        match self {
            UploadPolicy::AtLeastOne => attempted.min(1),
            UploadPolicy::All => attempted,
            UploadPolicy::AtLeast(n) => attempted.min(*n),
        }
    }

    pub fn evaluate(&self, summary: &UploadSummary) -> AppResult<()> {
        let required = self.required(summary.attempted());
        let stored = summary.stored_count();
        if stored < required {
            return Err(AppError::UploadFailed(format!(
                "{stored} of {} files uploaded, {required} required",
                summary.attempted()
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertPhase {
    Validating,
    Uploading,
    Committing,
    Committed,
    RolledBackWithCleanup,
    Rejected,
}

impl UpsertPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            UpsertPhase::Committed | UpsertPhase::RolledBackWithCleanup | UpsertPhase::Rejected
        )
    }
}

impl fmt::Display for UpsertPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UpsertPhase::Validating => "validating",
            UpsertPhase::Uploading => "uploading",
            UpsertPhase::Committing => "committing",
            UpsertPhase::Committed => "committed",
            UpsertPhase::RolledBackWithCleanup => "rolled_back_with_cleanup",
            UpsertPhase::Rejected => "rejected",
        };
        f.write_str(name)
    }
}

/// `<unix millis>-<16 hex chars>[.ext]`, extension lower-cased from the original name.
pub fn generate_file_name(original_name: &str) -> String {
    let suffix: u64 = rand::thread_rng().r#gen();
    let extension = Path::new(original_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
        .unwrap_or_default();
    format!("{}-{:016x}{}", Utc::now().timestamp_millis(), suffix, extension)
}

async fn upload_one(storage: &dyn AssetStorage, file: NewFile) -> UploadOutcome {
    let file_name = generate_file_name(&file.original_name);
    match storage.write(&file_name, &file.bytes).await {
        Ok(()) => UploadOutcome::Stored(StoredAsset {
            url: storage.public_url(&file_name),
            file_name,
            original_name: file.original_name,
        }),
        Err(err) => {
            tracing::warn!(
                original_name = %file.original_name,
                error = %err,
                "asset upload failed"
            );
            UploadOutcome::Failed {
                original_name: file.original_name,
                error: err.to_string(),
            }
        }
    }
}

/// Writes every file concurrently; one failure does not stop the others.
pub async fn upload_all(storage: &dyn AssetStorage, files: Vec<NewFile>) -> UploadSummary {
    let outcomes = join_all(files.into_iter().map(|file| upload_one(storage, file))).await;
    UploadSummary { outcomes }
}

/// Uploads and applies `policy`. A rejected batch has its stored files removed.
pub async fn upload_with_policy(
    storage: &dyn AssetStorage,
    files: Vec<NewFile>,
    policy: UploadPolicy,
) -> AppResult<UploadSummary> {
    let summary = upload_all(storage, files).await;
    tracing::debug!(
        phase = %UpsertPhase::Uploading,
        attempted = summary.attempted(),
        failed = summary.failed_count(),
        "uploads finished"
    );
    if let Err(err) = policy.evaluate(&summary) {
        remove_files(storage, &summary.stored_file_names()).await;
        tracing::warn!(phase = %UpsertPhase::Rejected, error = %err, "upload policy not met");
        return Err(err);
    }
    Ok(summary)
}

/// Best-effort removal of stored files.
pub async fn remove_files(storage: &dyn AssetStorage, file_names: &[String]) {
    let results = join_all(file_names.iter().map(|name| storage.delete(name))).await;
    for (name, result) in file_names.iter().zip(results) {
        if let Err(err) = result {
            tracing::warn!(file_name = %name, error = %err, "failed to delete stored asset");
        }
    }
}

/// Runs the transactional part of an upsert. If it fails, the files uploaded
/// for this call are deleted and the original error is returned.
pub async fn commit_or_compensate<T, F>(
    storage: &dyn AssetStorage,
    uploaded: &UploadSummary,
    work: F,
) -> AppResult<T>
where
    F: Future<Output = AppResult<T>>,
{
    tracing::debug!(phase = %UpsertPhase::Committing, "running transaction");
    match work.await {
        Ok(value) => {
            tracing::debug!(phase = %UpsertPhase::Committed, "transaction committed");
            Ok(value)
        }
        Err(err) => {
            let file_names = uploaded.stored_file_names();
            tracing::warn!(
                phase = %UpsertPhase::RolledBackWithCleanup,
                files = file_names.len(),
                error = %err,
                "transaction failed, removing uploaded files"
            );
            remove_files(storage, &file_names).await;
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn stored(name: &str) -> UploadOutcome {
        UploadOutcome::Stored(StoredAsset {
            file_name: name.to_string(),
            url: format!("/uploads/{name}"),
            original_name: name.to_string(),
        })
    }

    fn failed(name: &str) -> UploadOutcome {
        UploadOutcome::Failed {
            original_name: name.to_string(),
            error: "disk full".into(),
        }
    }

    #[test]
    fn file_names_keep_a_normalized_extension() {
        let name = generate_file_name("Front View.JPG");
        assert!(name.ends_with(".jpg"), "{name}");
        assert!(!name.contains(' '));

        let bare = generate_file_name("README");
        assert!(!bare.contains('.'), "{bare}");

        let odd = generate_file_name("archive.t/ar");
        assert!(!odd.contains('/'), "{odd}");
    }

    #[test]
    fn file_names_do_not_collide() {
        let names: HashSet<String> = (0..10_000).map(|_| generate_file_name("a.png")).collect();
        assert_eq!(names.len(), 10_000);
    }

    #[test]
    fn default_policy_needs_one_success_when_files_were_sent() {
        let policy = UploadPolicy::default();

        let empty = UploadSummary::default();
        assert!(policy.evaluate(&empty).is_ok());

        let partial = UploadSummary {
            outcomes: vec![failed("a"), stored("b")],
        };
        assert!(policy.evaluate(&partial).is_ok());
        assert_eq!(partial.failed_count(), 1);

        let none = UploadSummary {
            outcomes: vec![failed("a"), failed("b")],
        };
        assert!(matches!(
            policy.evaluate(&none),
            Err(AppError::UploadFailed(_))
        ));
    }

    #[test]
    fn strict_policies() {
        let partial = UploadSummary {
            outcomes: vec![failed("a"), stored("b"), stored("c")],
        };
        assert!(UploadPolicy::All.evaluate(&partial).is_err());
        assert!(UploadPolicy::AtLeast(2).evaluate(&partial).is_ok());
        assert!(UploadPolicy::AtLeast(3).evaluate(&partial).is_err());
        assert_eq!(UploadPolicy::AtLeast(5).required(2), 2);
    }

    #[test]
    fn terminal_phases() {
        assert!(UpsertPhase::Committed.is_terminal());
        assert!(UpsertPhase::RolledBackWithCleanup.is_terminal());
        assert!(!UpsertPhase::Uploading.is_terminal());
        assert_eq!(UpsertPhase::RolledBackWithCleanup.to_string(), "rolled_back_with_cleanup");
    }
}
