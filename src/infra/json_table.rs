use serde::Serialize;
use serde_json::Value;
use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::app::ports::{CompanySource, FeatureTableSink, PersonnelSource, ProfileFragmentSource};
use crate::error::{FeatureError, Result};
use crate::pipeline::ingestion::RawTable;
use crate::pipeline::processing::{FeatureTable, FlattenedProfile};

/// Read a table file holding either a JSON array of row objects or one row
/// object per line (NDJSON). Blank lines are skipped.
pub fn read_table(name: &str, path: &Path) -> Result<RawTable> {
    let content = fs::read_to_string(path)?;

    let table = if content.trim_start().starts_with('[') {
        RawTable::from_json_array(name, serde_json::from_str(&content)?)?
    } else {
        let mut rows = Vec::new();
        for (line_no, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<Value>(line)? {
                Value::Object(row) => rows.push(row),
                _ => {
                    return Err(FeatureError::malformed(
                        format!("{}:{}", path.display(), line_no + 1),
                        "expected one JSON object per line",
                    ))
                }
            }
        }
        RawTable::from_rows(name, rows)
    };

    info!(table = name, path = %path.display(), rows = table.len(), "Table loaded");
    Ok(table)
}

/// File-backed table source. One instance serves one table.
pub struct JsonTableFile {
    name: String,
    path: PathBuf,
}

impl JsonTableFile {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }

    fn load(&self) -> Result<RawTable> {
        read_table(&self.name, &self.path)
    }
}

impl CompanySource for JsonTableFile {
    fn load_companies(&self) -> Result<RawTable> {
        self.load()
    }
}

impl PersonnelSource for JsonTableFile {
    fn load_personnel(&self) -> Result<RawTable> {
        self.load()
    }
}

impl ProfileFragmentSource for JsonTableFile {
    fn load_fragments(&self) -> Result<RawTable> {
        self.load()
    }
}

/// Writes the feature table as NDJSON, one row per line.
pub struct NdjsonFeatureSink {
    path: PathBuf,
}

impl NdjsonFeatureSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

/// Truncate `path` and write one JSON value per line, creating parent dirs.
fn write_ndjson<T: Serialize>(path: &Path, rows: impl IntoIterator<Item = T>) -> Result<usize> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)?;
    let mut writer = BufWriter::new(file);

    let mut written = 0;
    for row in rows {
        serde_json::to_writer(&mut writer, &row)?;
        writer.write_all(b"\n")?;
        written += 1;
    }
    writer.flush()?;
    Ok(written)
}

impl FeatureTableSink for NdjsonFeatureSink {
    fn write_table(&self, table: &FeatureTable) -> Result<()> {
        let rows = write_ndjson(&self.path, &table.rows)?;
        info!(path = %self.path.display(), rows, "Feature table written");
        Ok(())
    }
}

/// Write flattened profiles as NDJSON, one fixed-width column map per line.
pub fn write_flattened_profiles(path: &Path, profiles: &[FlattenedProfile]) -> Result<()> {
    let rows = write_ndjson(path, profiles.iter().map(FlattenedProfile::to_row))?;
    info!(path = %path.display(), rows, "Flattened profiles written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CompanyRecord, FragmentFields, RawProfileFragment};
    use crate::pipeline::processing::assembler::AgeStatistics;
    use crate::pipeline::processing::{
        FeatureTableAssembler, ImputationTier, ProfileFlattener, ResolvedCompany, ResolvedCount,
        ResolvedStage, StageResolution,
    };
    use tempfile::tempdir;

    #[test]
    fn test_reads_json_array_and_ndjson() {
        let dir = tempdir().unwrap();
        let array = dir.path().join("a.json");
        let lines = dir.path().join("b.ndjson");
        fs::write(&array, r#"[{"id": "1"}, {"id": "2", "name": "x"}]"#).unwrap();
        fs::write(&lines, "{\"id\": \"1\"}\n\n{\"id\": \"2\", \"name\": \"x\"}\n").unwrap();

        let from_array = read_table("companies", &array).unwrap();
        let from_lines = read_table("companies", &lines).unwrap();
        assert_eq!(from_array, from_lines);
        assert_eq!(from_array.len(), 2);
        assert!(from_array.has_column("name"));
    }

    #[test]
    fn test_rejects_non_object_lines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.ndjson");
        fs::write(&path, "{\"id\": \"1\"}\n42\n").unwrap();
        assert!(matches!(read_table("t", &path), Err(FeatureError::MalformedField { .. })));
    }

    #[test]
    fn test_sink_writes_one_line_per_row() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out/features.ndjson");

        let assembler = FeatureTableAssembler::new(
            AgeStatistics {
                reference_year: 2020,
                mean_age: None,
            },
            &Default::default(),
        );
        let companies = ["a", "b"]
            .iter()
            .map(|id| ResolvedCompany {
                record: CompanyRecord::new(*id),
                employees: ResolvedCount {
                    value: Some(3.0),
                    tier: ImputationTier::Observed,
                },
                stage: ResolvedStage {
                    stage: None,
                    resolution: StageResolution::Unresolved,
                },
            })
            .collect();
        let table = assembler.assemble(companies, &[]);

        NdjsonFeatureSink::new(&path).write_table(&table).unwrap();
        let written = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = written.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["id"], "a");
        assert_eq!(first["employees_clean"], 3.0);
        assert_eq!(first["no_personnel_data"], 1);
    }

    #[test]
    fn test_flattened_profiles_keep_every_slot_column() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("profiles.ndjson");
        let fragments = vec![RawProfileFragment {
            profile_id: "https://linkedin.com/in/ana".to_string(),
            fields: FragmentFields::Education {
                institution: Some("ENS".to_string()),
                degree: Some("PhD".to_string()),
                field: None,
            },
        }];
        let outcome = ProfileFlattener::new(2).flatten(&fragments);

        write_flattened_profiles(&path, &outcome.profiles).unwrap();
        let written = fs::read_to_string(&path).unwrap();
        let row: Value = serde_json::from_str(written.trim()).unwrap();
        assert_eq!(row["profile_id"], "https://linkedin.com/in/ana");
        assert_eq!(row["degree"], "PhD");
        assert_eq!(row["degree_2"], Value::Null);
        assert_eq!(row["title_2"], Value::Null);
        assert_eq!(row.as_object().unwrap().len(), 1 + 3 * 3 * 2);
    }
}
