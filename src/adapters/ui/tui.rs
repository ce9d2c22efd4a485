//! Implements InputPort. Inquire-based interactive prompts.
//!
//! All application errors are rendered inline here; nothing bubbles out of
//! `run()` except a clean exit.

use crate::adapters::ui::progress::PollSpinner;
use crate::domain::{
    AttachedDocument, CarrierBatch, DocumentSlot, ExtractionResult, IntakeError, QcSubmission,
    Session, UploadJob,
};
use crate::ports::InputPort;
use crate::usecases::{AuthService, PollCancel, ReportService, ResultPoller, UploadService};
use async_trait::async_trait;
use inquire::{Confirm, Password, PasswordDisplayMode, Select, Text};
use std::path::Path;
use std::sync::Arc;
use tracing::warn;

/// TUI adapter. Inquire prompts over the injected services.
pub struct IntakeTui {
    auth: Arc<AuthService>,
    uploads: Arc<UploadService>,
    poller: Arc<ResultPoller>,
    reports: Arc<ReportService>,
}

impl IntakeTui {
    pub fn new(
        auth: Arc<AuthService>,
        uploads: Arc<UploadService>,
        poller: Arc<ResultPoller>,
        reports: Arc<ReportService>,
    ) -> Self {
        Self {
            auth,
            uploads,
            poller,
            reports,
        }
    }

    /// Login/register menu. Returns false when the user quits.
    async fn auth_menu(&self) -> bool {
        let choice = Select::new(
            "Welcome. What would you like to do?",
            vec!["Login", "Register", "Quit"],
        )
        .prompt();
        match choice {
            Ok("Login") => {
                let (Some(username), Some(password)) =
                    (prompt_text("Username:"), prompt_password("Password:"))
                else {
                    return true;
                };
                match self.auth.login(&username, &password).await {
                    Ok(session) => println!("Logged in as {}.", session.username),
                    Err(e) => render_error(&e),
                }
                true
            }
            Ok("Register") => {
                let (Some(username), Some(password), Some(confirmation)) = (
                    prompt_text("Username (3+ characters):"),
                    prompt_password("Password:"),
                    prompt_password("Confirm password:"),
                ) else {
                    return true;
                };
                match self.auth.register(&username, &password, &confirmation).await {
                    Ok(session) => println!("Registered and logged in as {}.", session.username),
                    Err(e) => render_error(&e),
                }
                true
            }
            Ok(_) | Err(_) => false,
        }
    }

    /// Main menu for an authenticated session. Returns false when the user quits.
    async fn main_menu(&self, session: &Session) -> bool {
        let choice = Select::new(
            &format!("[{}] Main menu", session.username),
            vec![
                "Upload carrier quotes",
                "QC check (quote + policy + certificate)",
                "Upload history",
                "Logout",
                "Quit",
            ],
        )
        .prompt();
        match choice {
            Ok("Upload carrier quotes") => {
                self.upload_flow(session).await;
                true
            }
            Ok("QC check (quote + policy + certificate)") => {
                self.qc_flow(session).await;
                true
            }
            Ok("Upload history") => {
                self.history_view(session).await;
                true
            }
            Ok("Logout") => {
                if let Err(e) = self.auth.logout().await {
                    render_error(&e);
                }
                true
            }
            Ok(_) | Err(_) => false,
        }
    }

    /// Collect a multi-carrier batch, submit it, and wait for results.
    async fn upload_flow(&self, session: &Session) {
        let mut batch = CarrierBatch::new();
        let first = batch.entries()[0].id;
        if !self.fill_entry(&mut batch, first).await {
            return;
        }
        while confirm("Add another carrier?") {
            let id = batch.add_carrier();
            if !self.fill_entry(&mut batch, id).await {
                return;
            }
        }

        loop {
            let choice = Select::new(
                &format!(
                    "{} carrier(s), {} file(s) attached",
                    batch.len(),
                    batch.total_files()
                ),
                vec!["Submit", "Add carrier", "Remove carrier", "Back"],
            )
            .prompt();
            match choice {
                Ok("Submit") => match self.uploads.submit(&batch, session).await {
                    Ok(job) => {
                        println!(
                            "Upload accepted: {} ({} files).",
                            job.upload_id, job.total_files
                        );
                        self.wait_for_result(&job).await;
                        return;
                    }
                    Err(e) => render_error(&e),
                },
                Ok("Add carrier") => {
                    let id = batch.add_carrier();
                    if !self.fill_entry(&mut batch, id).await {
                        return;
                    }
                }
                Ok("Remove carrier") => {
                    let options: Vec<String> = batch
                        .entries()
                        .iter()
                        .map(|e| format!("{} ({})", e.name, e.id))
                        .collect();
                    if let Ok(selected) = Select::new("Remove which carrier?", options).prompt() {
                        let id = batch
                            .entries()
                            .iter()
                            .find(|e| format!("{} ({})", e.name, e.id) == selected)
                            .map(|e| e.id);
                        if let Some(id) = id {
                            if !batch.remove_carrier(id) {
                                println!("At least one carrier entry must remain.");
                            }
                        }
                    }
                }
                Ok(_) | Err(_) => return,
            }
        }
    }

    /// Prompt one carrier entry: name plus optional property/liability PDFs.
    /// Returns false if the user backed out.
    async fn fill_entry(&self, batch: &mut CarrierBatch, id: u32) -> bool {
        let Some(name) = prompt_text("Carrier name:") else {
            return false;
        };
        batch.set_name(id, name);

        for slot in [DocumentSlot::Property, DocumentSlot::Liability] {
            let Some(path) = prompt_text(&format!("{} quote PDF path (empty to skip):", slot))
            else {
                return false;
            };
            if path.trim().is_empty() {
                continue;
            }
            match read_document(&path).await {
                Ok(doc) => {
                    if let Err(e) = batch.attach(id, slot, doc) {
                        render_error(&e);
                    }
                }
                Err(e) => render_error(&e),
            }
        }
        true
    }

    /// Strict QC flow: all three documents are required.
    async fn qc_flow(&self, session: &Session) {
        let Some(carrier_name) = prompt_text("Carrier name:") else {
            return;
        };
        let mut docs = Vec::with_capacity(3);
        for label in ["Quote", "Policy", "Certificate"] {
            let Some(path) = prompt_text(&format!("{} PDF path:", label)) else {
                return;
            };
            match read_document(&path).await {
                Ok(doc) => docs.push(doc),
                Err(e) => {
                    render_error(&e);
                    return;
                }
            }
        }
        let mut docs = docs.into_iter();
        let (Some(quote), Some(policy), Some(certificate)) =
            (docs.next(), docs.next(), docs.next())
        else {
            return;
        };
        let submission = QcSubmission {
            carrier_name,
            quote,
            policy,
            certificate,
        };

        match self.uploads.submit_qc(&submission, session).await {
            Ok(job) => {
                println!("QC upload accepted: {}.", job.upload_id);
                self.wait_for_result(&job).await;
            }
            Err(e) => render_error(&e),
        }
    }

    /// Poll for the extraction result with a spinner; Ctrl-C stops waiting
    /// without cancelling the backend job.
    async fn wait_for_result(&self, job: &UploadJob) {
        let (cancel, cancel_rx) = PollCancel::channel();
        let spinner = PollSpinner::start(&job.upload_id);
        let ctrl_c = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        });

        let outcome = self.poller.poll_for_result(&job.upload_id, cancel_rx).await;
        ctrl_c.abort();
        spinner.finish();

        match outcome {
            Ok(result) => {
                render_result(&result);
                match self.reports.write_markdown(job, &result).await {
                    Ok(path) => println!("Report written to {}.", path.display()),
                    Err(e) => warn!(error = %e, "report write failed"),
                }
                match self.reports.write_csv(job, &result).await {
                    Ok(path) => println!("CSV export written to {}.", path.display()),
                    Err(e) => warn!(error = %e, "csv write failed"),
                }
            }
            Err(e) => render_error(&e),
        }
    }

    async fn history_view(&self, session: &Session) {
        match self.uploads.history(session).await {
            Ok(jobs) if jobs.is_empty() => println!("No uploads yet."),
            Ok(jobs) => {
                for job in jobs {
                    let carriers: Vec<&str> =
                        job.carriers.iter().map(|c| c.name.as_str()).collect();
                    println!(
                        "{}  {}  {} file(s)  [{}]",
                        job.created_at.format("%Y-%m-%d %H:%M"),
                        job.upload_id,
                        job.total_files,
                        carriers.join(", ")
                    );
                }
            }
            Err(e) => render_error(&e),
        }
    }
}

#[async_trait]
impl InputPort for IntakeTui {
    async fn run(&self) -> Result<(), IntakeError> {
        loop {
            let keep_going = match self.auth.current_session() {
                Some(session) => self.main_menu(&session).await,
                None => self.auth_menu().await,
            };
            if !keep_going {
                return Ok(());
            }
        }
    }
}

/// Text prompt; None when the user cancels (Esc/Ctrl-C).
fn prompt_text(message: &str) -> Option<String> {
    Text::new(message).prompt().ok()
}

fn prompt_password(message: &str) -> Option<String> {
    Password::new(message)
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()
        .ok()
}

fn confirm(message: &str) -> bool {
    Confirm::new(message)
        .with_default(false)
        .prompt()
        .unwrap_or(false)
}

/// Read a PDF from disk into an attached document.
async fn read_document(path_input: &str) -> Result<AttachedDocument, IntakeError> {
    let path = Path::new(path_input.trim());
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| IntakeError::Validation(format!("cannot read '{}': {}", path.display(), e)))?;
    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("document.pdf")
        .to_string();
    Ok(AttachedDocument::new(filename, bytes))
}

/// Inline error rendering. Timeouts get the softer "may still complete" text.
fn render_error(error: &IntakeError) {
    match error {
        IntakeError::Timeout { .. } | IntakeError::Poll(_) => {
            println!("Processing timed out; the data may still complete later. Check upload history and retry.");
        }
        IntakeError::Cancelled => {
            println!("Stopped waiting. The backend keeps processing; check back via upload history.");
        }
        other => println!("{}", other),
    }
}

/// Print extracted fields per coverage, with comparison flags when present.
fn render_result(result: &ExtractionResult) {
    println!("\nExtraction result for {}:", result.upload_id);
    for (category, fields) in &result.fields {
        println!("\n  {}", category);
        let flags = result.comparison.as_ref().and_then(|c| c.get(category));
        for (name, value) in fields {
            match flags.and_then(|f| f.get(name)) {
                Some(flag) => println!("    {}: {} [{:?}]", name, value, flag),
                None => println!("    {}: {}", name, value),
            }
        }
        if let Some(Some(cert)) = result.certificates.get(category) {
            println!("    certificate: {}", cert);
        }
    }
    if result.comparison.is_none() {
        println!("\n  Certificate comparison still pending on the backend.");
    }
    println!();
}
