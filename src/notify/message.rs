//! Human-readable message assembly shared by all notification channels.

use crate::claim::ClaimInfo;
use crate::upload::UploadInfo;

/// Subject line for a status notification.
#[must_use]
pub fn status_subject(claim: Option<&ClaimInfo>) -> String {
    match claim {
        Some(claim) => format!("Book claimed: {}", claim.title),
        None => "Book claim status".to_string(),
    }
}

/// Body of a status notification.
///
/// Upload details appear only when an upload actually occurred.
#[must_use]
pub fn status_body(claim: Option<&ClaimInfo>, upload: Option<&UploadInfo>) -> String {
    let mut lines = Vec::new();

    if let Some(claim) = claim {
        lines.push(format!("Today's free book: {}", claim.title));
        if let Some(description) = &claim.description {
            lines.push(description.clone());
        }
        let downloaded = claim.all_paths();
        if !downloaded.is_empty() {
            lines.push(format!("Downloaded {} file(s).", downloaded.len()));
        }
    } else {
        lines.push("No claim information available.".to_string());
    }

    if let Some(upload) = upload {
        lines.push(format!("Uploaded to {}:", upload.service));
        for artifact in &upload.artifacts {
            match &artifact.link {
                Some(link) => lines.push(format!("  {link}")),
                None => lines.push(format!("  {}", artifact.remote_id)),
            }
        }
    }

    lines.join("\n")
}

/// Subject line for an error notification.
#[must_use]
pub fn error_subject(stage: &str) -> String {
    format!("Book claim failed ({stage})")
}

/// Body of an error notification.
#[must_use]
pub fn error_body(error: &str, stage: &str) -> String {
    format!("Stage: {stage}\nError: {error}")
}
