//! End-to-end pipeline scenarios driven through the public library API
//! with in-memory collaborators.

use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use bookclaim_core::claim::{AssetKind, BookFormat, ClaimError, ClaimInfo, Claimer};
use bookclaim_core::notify::{NotifyChannel, NotifyError, Notifier};
use bookclaim_core::pipeline::{
    PipelineServices, RunOutcome, RunRequest, run_pipeline,
};
use bookclaim_core::store::{Recorder, StoreBackend, StoreError};
use bookclaim_core::upload::{
    UploadError, UploadInfo, UploadService, UploadedArtifact, Uploader,
};

struct FakeClaimer {
    info: ClaimInfo,
}

impl FakeClaimer {
    fn new() -> Self {
        Self {
            info: ClaimInfo {
                title: "Practical Pipelines".to_string(),
                book_id: "31337".to_string(),
                description: Some("Stage by stage.".to_string()),
                ..ClaimInfo::default()
            },
        }
    }
}

#[async_trait]
impl Claimer for FakeClaimer {
    async fn claim(&mut self) -> Result<(), ClaimError> {
        Ok(())
    }

    async fn download_formats(&mut self, formats: &[BookFormat]) -> Result<(), ClaimError> {
        for &format in formats {
            self.info.add_path(
                AssetKind::Format(format),
                PathBuf::from(format!("Practical_Pipelines.{format}")),
            );
        }
        Ok(())
    }

    async fn download_extras(&mut self) -> Result<(), ClaimError> {
        self.info
            .add_path(AssetKind::Cover, PathBuf::from("Practical_Pipelines.jpg"));
        Ok(())
    }

    fn info(&self) -> &ClaimInfo {
        &self.info
    }
}

#[derive(Default)]
struct RecordingUploader {
    service: Option<UploadService>,
    uploads: Mutex<Vec<PathBuf>>,
}

#[async_trait]
impl Uploader for RecordingUploader {
    fn service(&self) -> UploadService {
        self.service.unwrap_or(UploadService::Dropbox)
    }

    async fn upload(&self, paths: &[PathBuf]) -> Result<UploadInfo, UploadError> {
        self.uploads.lock().unwrap().extend(paths.iter().cloned());
        Ok(UploadInfo {
            service: self.service(),
            artifacts: paths
                .iter()
                .map(|path| UploadedArtifact {
                    local: path.clone(),
                    remote_id: format!("remote:{}", path.display()),
                    link: Some(format!("https://sync.example.com/{}", path.display())),
                })
                .collect(),
        })
    }
}

#[derive(Default)]
struct CountingRecorder {
    calls: AtomicUsize,
}

#[async_trait]
impl Recorder for CountingRecorder {
    async fn store(&self, _claim: &ClaimInfo, _upload: &UploadInfo) -> Result<(), StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Lets a test keep a handle on a recorder that the pipeline owns boxed.
struct SharedRecorder(std::sync::Arc<CountingRecorder>);

#[async_trait]
impl Recorder for SharedRecorder {
    async fn store(&self, claim: &ClaimInfo, upload: &UploadInfo) -> Result<(), StoreError> {
        self.0.store(claim, upload).await
    }
}

#[derive(Default)]
struct CapturingNotifier {
    statuses: Mutex<Vec<String>>,
    errors: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl Notifier for CapturingNotifier {
    fn channel(&self) -> NotifyChannel {
        NotifyChannel::Gmail
    }

    async fn send_status(
        &self,
        claim: Option<&ClaimInfo>,
        upload: Option<&UploadInfo>,
    ) -> Result<(), NotifyError> {
        let mut summary = claim.map_or_else(String::new, |claim| claim.title.clone());
        if let Some(upload) = upload {
            summary.push_str(" via ");
            summary.push_str(upload.service.as_str());
        }
        self.statuses.lock().unwrap().push(summary);
        Ok(())
    }

    async fn send_error(&self, error: &str, stage: &str) -> Result<(), NotifyError> {
        self.errors
            .lock()
            .unwrap()
            .push((error.to_string(), stage.to_string()));
        Ok(())
    }
}

/// `--type epub --upload dropbox --notify gmail`: claims, downloads only
/// epub, uploads to dropbox, never stores, sends one status notification
/// carrying the upload info.
#[tokio::test]
async fn test_scenario_epub_to_dropbox_with_gmail_notification() {
    let request = RunRequest {
        format: BookFormat::Epub,
        upload: Some(UploadService::Dropbox),
        store: Some(StoreBackend::Firebase),
        notify: Some(NotifyChannel::Gmail),
        ..RunRequest::default()
    };

    let uploader = Box::new(RecordingUploader {
        service: Some(UploadService::Dropbox),
        ..RecordingUploader::default()
    });
    let recorder = std::sync::Arc::new(CountingRecorder::default());
    let notifier = CapturingNotifier::default();

    let mut services = PipelineServices {
        claimer: Box::new(FakeClaimer::new()),
        uploader: Some(uploader),
        recorder: Some(Box::new(SharedRecorder(recorder.clone()))),
    };

    let outcome = run_pipeline(&request, &mut services, Some(&notifier))
        .await
        .unwrap();

    assert_eq!(outcome, RunOutcome::Completed);

    // Only the epub was downloaded and uploaded.
    let downloaded = services.claimer.info().all_paths();
    assert_eq!(downloaded, vec![PathBuf::from("Practical_Pipelines.epub")]);

    // Dropbox is not the storable destination; the recorder stays idle.
    assert_eq!(recorder.calls.load(Ordering::SeqCst), 0);

    // Exactly one status notification, carrying the upload details.
    let statuses = notifier.statuses.lock().unwrap();
    assert_eq!(statuses.as_slice(), &["Practical Pipelines via dropbox".to_string()]);
    assert!(notifier.errors.lock().unwrap().is_empty());
}

/// `--all --extras --upload drive --store firebase`: every format plus the
/// extras land on the storable destination and the record is persisted once.
#[tokio::test]
async fn test_scenario_all_formats_with_extras_to_drive_and_store() {
    let request = RunRequest {
        all_formats: true,
        extras: true,
        upload: Some(UploadService::Drive),
        store: Some(StoreBackend::Firebase),
        ..RunRequest::default()
    };

    let recorder = std::sync::Arc::new(CountingRecorder::default());

    let mut services = PipelineServices {
        claimer: Box::new(FakeClaimer::new()),
        uploader: Some(Box::new(RecordingUploader {
            service: Some(UploadService::Drive),
            ..RecordingUploader::default()
        })),
        recorder: Some(Box::new(SharedRecorder(recorder.clone()))),
    };

    let outcome = run_pipeline(&request, &mut services, None).await.unwrap();

    assert_eq!(outcome, RunOutcome::Completed);
    // Three formats plus the cover extra.
    assert_eq!(services.claimer.info().all_paths().len(), 4);
    assert_eq!(recorder.calls.load(Ordering::SeqCst), 1);
}

/// Claim-only still notifies, but nothing is downloaded or uploaded.
#[tokio::test]
async fn test_scenario_claim_only_notifies_without_transfers() {
    let request = RunRequest {
        claim_only: true,
        upload: Some(UploadService::Drive),
        notify: Some(NotifyChannel::Gmail),
        ..RunRequest::default()
    };

    let notifier = CapturingNotifier::default();
    let mut services = PipelineServices {
        claimer: Box::new(FakeClaimer::new()),
        uploader: Some(Box::new(RecordingUploader::default())),
        recorder: None,
    };

    let outcome = run_pipeline(&request, &mut services, Some(&notifier))
        .await
        .unwrap();

    assert_eq!(outcome, RunOutcome::ClaimOnly);
    assert!(services.claimer.info().all_paths().is_empty());
    let statuses = notifier.statuses.lock().unwrap();
    // No " via ..." suffix: upload info was absent from the notification.
    assert_eq!(statuses.as_slice(), &["Practical Pipelines".to_string()]);
}
