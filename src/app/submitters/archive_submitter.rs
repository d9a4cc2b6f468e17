use super::log_submitter::ACKNOWLEDGEMENT;
use crate::domain::model::{SubmissionPayload, SubmissionReceipt, TableSnapshot};
use crate::domain::ports::{Storage, Submitter};
use crate::utils::error::{FormError, Result};
use async_trait::async_trait;
use std::io::Write;
use zip::write::{FileOptions, ZipWriter};

/// Writes `payload.json` plus one CSV per table into a zip through `Storage`.
pub struct ArchiveSubmitter<S: Storage> {
    storage: S,
    base_path: String,
}

impl<S: Storage> ArchiveSubmitter<S> {
    pub fn new(storage: S, base_path: impl Into<String>) -> Self {
        Self {
            storage,
            base_path: base_path.into(),
        }
    }

    pub fn archive_name(payload: &SubmissionPayload) -> String {
        format!(
            "{}_{}.zip",
            payload.form_id,
            payload.submitted_at.format("%Y%m%dT%H%M%SZ")
        )
    }

    fn build_archive(payload: &SubmissionPayload) -> Result<Vec<u8>> {
        let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));

        zip.start_file::<_, ()>("payload.json", FileOptions::default())?;
        let json = serde_json::to_string_pretty(payload)?;
        zip.write_all(json.as_bytes())?;

        for table in &payload.tables {
            zip.start_file::<_, ()>(format!("{}.csv", table.name), FileOptions::default())?;
            zip.write_all(&table_csv(table)?)?;
        }

        let cursor = zip.finish()?;
        Ok(cursor.into_inner())
    }
}

/// Fixed fields, then the current columns by label. Orphaned values are left out.
pub fn table_csv(table: &TableSnapshot) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    let header = table
        .fixed_fields
        .iter()
        .map(String::as_str)
        .chain(table.columns.iter().map(|c| c.label.as_str()));
    writer.write_record(header)?;

    for row in &table.rows {
        let fixed = table
            .fixed_fields
            .iter()
            .map(|name| row.fields.get(name).map(ToString::to_string).unwrap_or_default());
        let dynamic = table.columns.iter().map(|c| {
            row.dynamic_fields
                .get(&c.key)
                .map(ToString::to_string)
                .unwrap_or_default()
        });
        writer.write_record(fixed.chain(dynamic).collect::<Vec<String>>())?;
    }

    writer.into_inner().map_err(|e| FormError::SubmissionError {
        message: format!("CSV buffer flush failed: {}", e),
    })
}

#[async_trait]
impl<S: Storage> Submitter for ArchiveSubmitter<S> {
    async fn submit(&self, payload: &SubmissionPayload) -> Result<SubmissionReceipt> {
        let archive_name = Self::archive_name(payload);
        tracing::debug!(
            "Creating submission archive with {} table file(s)",
            payload.tables.len()
        );

        let zip_data = Self::build_archive(payload)?;

        tracing::debug!("Writing archive ({} bytes) to storage", zip_data.len());
        self.storage.write_file(&archive_name, &zip_data).await?;

        let location = format!("{}/{}", self.base_path, archive_name);
        tracing::info!("Submission archived to {}", location);
        Ok(SubmissionReceipt {
            message: ACKNOWLEDGEMENT.to_string(),
            location: Some(location),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{ColumnDefinition, FieldValue, Record};
    use chrono::{TimeZone, Utc};
    use std::collections::{BTreeMap, HashMap};
    use std::io::Read;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[derive(Clone)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MockStorage {
        fn new() -> Self {
            Self {
                files: Arc::new(Mutex::new(HashMap::new())),
            }
        }

        async fn get_file(&self, path: &str) -> Option<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned()
        }
    }

    impl Storage for MockStorage {
        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), data.to_vec());
            Ok(())
        }
    }

    fn payload() -> SubmissionPayload {
        let mut row = Record::empty(["description", "amount"]);
        row.fields
            .insert("description".to_string(), FieldValue::from("Laptop, 14\""));
        row.fields.insert("amount".to_string(), FieldValue::Number(1200.0));
        row.dynamic_fields
            .insert("Risk".to_string(), FieldValue::from("low"));
        row.dynamic_fields
            .insert("Orphan".to_string(), FieldValue::from("stale"));

        SubmissionPayload {
            form_id: "asset-transfer".to_string(),
            title: "Asset Transfer Request".to_string(),
            submitted_at: Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap(),
            sections: BTreeMap::new(),
            tables: vec![TableSnapshot {
                name: "assets".to_string(),
                fixed_fields: vec!["description".to_string(), "amount".to_string()],
                columns: vec![ColumnDefinition {
                    key: "Risk".to_string(),
                    label: "Risk".to_string(),
                }],
                rows: vec![row],
            }],
            role_groups: BTreeMap::new(),
            attachments: Vec::new(),
            custom_fields: Vec::new(),
        }
    }

    #[test]
    fn test_table_csv_excludes_orphans() {
        let csv = String::from_utf8(table_csv(&payload().tables[0]).unwrap()).unwrap();
        assert_eq!(
            csv,
            "description,amount,Risk\n\"Laptop, 14\"\"\",1200,low\n"
        );
    }

    #[tokio::test]
    async fn test_submit_writes_archive() {
        let storage = MockStorage::new();
        let submitter = ArchiveSubmitter::new(storage.clone(), "out");

        let receipt = submitter.submit(&payload()).await.unwrap();
        assert_eq!(receipt.message, ACKNOWLEDGEMENT);
        assert_eq!(
            receipt.location.as_deref(),
            Some("out/asset-transfer_20240301T093000Z.zip")
        );

        let zip_bytes = storage
            .get_file("asset-transfer_20240301T093000Z.zip")
            .await
            .unwrap();
        let mut archive = zip::ZipArchive::new(std::io::Cursor::new(zip_bytes)).unwrap();
        let mut names: Vec<String> = (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect();
        names.sort();
        assert_eq!(names, vec!["assets.csv", "payload.json"]);

        let mut json = String::new();
        archive
            .by_name("payload.json")
            .unwrap()
            .read_to_string(&mut json)
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["formId"], "asset-transfer");
        assert_eq!(value["tables"][0]["rows"][0]["dynamicFields"]["Orphan"], "stale");
    }
}
