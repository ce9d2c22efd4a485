//! Report generation. Renders a fetched extraction result to local files.
//!
//! The backend writes the canonical copy into the user's sheet tab; these
//! are the client-side Markdown and CSV renditions for offline review.

use crate::domain::{ComparisonFlag, ExtractionResult, IntakeError, UploadJob};
use std::path::PathBuf;
use tokio::fs;
use tracing::info;

pub struct ReportService {
    reports_dir: PathBuf,
}

impl ReportService {
    pub fn new(reports_dir: PathBuf) -> Self {
        Self { reports_dir }
    }

    /// Write a Markdown report: one section per coverage category, with
    /// comparison flags and certificate refs when present.
    pub async fn write_markdown(
        &self,
        job: &UploadJob,
        result: &ExtractionResult,
    ) -> Result<PathBuf, IntakeError> {
        let path = self.prepare_path(&result.upload_id, "md").await?;

        let mut md = String::new();
        md.push_str(&format!("# Extraction Report: {}\n\n", result.upload_id));
        md.push_str(&format!(
            "**User:** {} | **Submitted:** {}\n\n",
            job.username,
            job.created_at.format("%Y-%m-%d %H:%M UTC")
        ));
        if !job.carriers.is_empty() {
            let names: Vec<&str> = job.carriers.iter().map(|c| c.name.as_str()).collect();
            md.push_str(&format!("**Carriers:** {}\n\n", names.join(", ")));
        }
        md.push_str("---\n\n");

        for (category, fields) in &result.fields {
            md.push_str(&format!("## {}\n\n", category));

            if let Some(Some(cert)) = result.certificates.get(category) {
                md.push_str(&format!("Certificate: `{}`\n\n", cert));
            }

            let flags = result
                .comparison
                .as_ref()
                .and_then(|c| c.get(category));

            for (name, value) in fields {
                match flags.and_then(|f| f.get(name)) {
                    Some(flag) => md.push_str(&format!(
                        "- **{}**: {} ({})\n",
                        name,
                        value,
                        flag_label(*flag)
                    )),
                    None => md.push_str(&format!("- **{}**: {}\n", name, value)),
                }
            }
            md.push('\n');
        }

        if result.comparison.is_none() {
            md.push_str("_Certificate comparison was not available when this report was generated._\n");
        }

        fs::write(&path, md)
            .await
            .map_err(|e| IntakeError::Report(format!("write report: {}", e)))?;
        info!(path = %path.display(), "markdown report written");
        Ok(path)
    }

    /// Write a CSV export: one row per extracted field
    /// (`coverage,field,value,flag`).
    pub async fn write_csv(
        &self,
        _job: &UploadJob,
        result: &ExtractionResult,
    ) -> Result<PathBuf, IntakeError> {
        let path = self.prepare_path(&result.upload_id, "csv").await?;
        let content = render_csv(result).map_err(|e| IntakeError::Report(e.to_string()))?;
        fs::write(&path, content)
            .await
            .map_err(|e| IntakeError::Report(format!("write csv: {}", e)))?;
        info!(path = %path.display(), "csv export written");
        Ok(path)
    }

    async fn prepare_path(&self, upload_id: &str, ext: &str) -> Result<PathBuf, IntakeError> {
        fs::create_dir_all(&self.reports_dir)
            .await
            .map_err(|e| IntakeError::Report(format!("create reports dir: {}", e)))?;
        Ok(self
            .reports_dir
            .join(format!("extraction_{}.{}", upload_id, ext)))
    }
}

fn flag_label(flag: ComparisonFlag) -> &'static str {
    match flag {
        ComparisonFlag::Match => "matches certificate",
        ComparisonFlag::Mismatch => "MISMATCH vs certificate",
        ComparisonFlag::Unverified => "unverified",
    }
}

/// Render the result as CSV using the csv crate (safe quoting/escaping).
fn render_csv(result: &ExtractionResult) -> Result<String, csv::Error> {
    let mut wtr = csv::WriterBuilder::new().from_writer(Vec::new());

    wtr.write_record(["Coverage", "Field", "Value", "Flag"])?;

    for (category, fields) in &result.fields {
        let coverage = category.to_string();
        let flags = result.comparison.as_ref().and_then(|c| c.get(category));
        for (name, value) in fields {
            let flag = flags
                .and_then(|f| f.get(name))
                .map(|f| match f {
                    ComparisonFlag::Match => "match",
                    ComparisonFlag::Mismatch => "mismatch",
                    ComparisonFlag::Unverified => "unverified",
                })
                .unwrap_or("");
            wtr.write_record([coverage.as_str(), name.as_str(), value.as_str(), flag])?;
        }
    }

    wtr.flush()?;
    let bytes = wtr.into_inner().map_err(|e| {
        csv::Error::from(std::io::Error::new(
            std::io::ErrorKind::Other,
            e.to_string(),
        ))
    })?;

    String::from_utf8(bytes).map_err(|e| {
        csv::Error::from(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            e.to_string(),
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CarrierSummary, CoverageCategory};
    use chrono::Utc;
    use std::collections::BTreeMap;

    fn sample() -> (UploadJob, ExtractionResult) {
        let job = UploadJob {
            upload_id: "upload_1".to_string(),
            username: "mudassir".to_string(),
            carriers: vec![CarrierSummary {
                name: "State Farm".to_string(),
                has_property: true,
                has_liability: true,
            }],
            total_files: 2,
            created_at: Utc::now(),
        };
        let result = ExtractionResult {
            upload_id: "upload_1".to_string(),
            fields: BTreeMap::from([
                (
                    CoverageCategory::Property,
                    BTreeMap::from([("Building Limit".to_string(), "$1,000,000".to_string())]),
                ),
                (
                    CoverageCategory::GeneralLiability,
                    BTreeMap::from([("Each Occurrence".to_string(), "$2,000,000".to_string())]),
                ),
            ]),
            certificates: BTreeMap::from([(
                CoverageCategory::GeneralLiability,
                Some("certs/upload_1_gl.pdf".to_string()),
            )]),
            comparison: Some(BTreeMap::from([(
                CoverageCategory::GeneralLiability,
                BTreeMap::from([("Each Occurrence".to_string(), ComparisonFlag::Match)]),
            )])),
        };
        (job, result)
    }

    #[tokio::test]
    async fn test_markdown_contains_every_field_once() {
        let dir = tempfile::tempdir().unwrap();
        let service = ReportService::new(dir.path().to_path_buf());
        let (job, result) = sample();

        let path = service.write_markdown(&job, &result).await.unwrap();
        let content = tokio::fs::read_to_string(path).await.unwrap();

        assert_eq!(content.matches("Building Limit").count(), 1);
        assert_eq!(content.matches("Each Occurrence").count(), 1);
        assert!(content.contains("matches certificate"));
        assert!(content.contains("certs/upload_1_gl.pdf"));
        assert!(content.contains("mudassir"));
    }

    #[tokio::test]
    async fn test_markdown_notes_missing_comparison() {
        let dir = tempfile::tempdir().unwrap();
        let service = ReportService::new(dir.path().to_path_buf());
        let (job, mut result) = sample();
        result.comparison = None;

        let path = service.write_markdown(&job, &result).await.unwrap();
        let content = tokio::fs::read_to_string(path).await.unwrap();
        assert!(content.contains("comparison was not available"));
    }

    #[tokio::test]
    async fn test_csv_rows() {
        let dir = tempfile::tempdir().unwrap();
        let service = ReportService::new(dir.path().to_path_buf());
        let (job, result) = sample();

        let path = service.write_csv(&job, &result).await.unwrap();
        let content = tokio::fs::read_to_string(path).await.unwrap();

        let mut lines = content.lines();
        assert_eq!(lines.next().unwrap(), "Coverage,Field,Value,Flag");
        // BTreeMap order: PROPERTY < GL enum order (Property first).
        assert!(content.contains("PROPERTY,Building Limit,\"$1,000,000\","));
        assert!(content.contains("GL,Each Occurrence,\"$2,000,000\",match"));
        assert_eq!(content.lines().count(), 3);
    }
}
