use crate::config::{ALIAS_OUTPUT_CSV_FILENAME, LIST_SEPARATOR, ORCID_OUTPUT_CSV_FILENAME};
use crate::models::{AliasRecord, AliasRow, CanonicalRecord, GroupBy, OrcidRecord, OrcidRow};
use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate};
use csv::WriterBuilder;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

pub const ORCID_COLUMNS: [&str; 9] = [
    "orcid",
    "alias",
    "dblp_key",
    "affiliation",
    "researcher_id",
    "google_scholar_id",
    "scopus_id",
    "acm_id",
    "homepage",
];

pub const ALIAS_COLUMNS: [&str; 9] = [
    "alias",
    "orcid",
    "dblp_key",
    "affiliation",
    "researcher_id",
    "google_scholar_id",
    "scopus_id",
    "acm_id",
    "homepage",
];

/// Where the table goes.
#[derive(Debug, Clone)]
pub enum Destination {
    Stdout,
    File(PathBuf),
}

pub fn output_filename(group_by: GroupBy) -> &'static str {
    match group_by {
        GroupBy::Orcid => ORCID_OUTPUT_CSV_FILENAME,
        GroupBy::Alias => ALIAS_OUTPUT_CSV_FILENAME,
    }
}

pub fn columns(group_by: GroupBy) -> [&'static str; 9] {
    match group_by {
        GroupBy::Orcid => ORCID_COLUMNS,
        GroupBy::Alias => ALIAS_COLUMNS,
    }
}

fn cell(field: &Option<String>) -> &str {
    field.as_deref().unwrap_or("")
}

fn orcid_row(r: &OrcidRecord) -> OrcidRow<'_> {
    OrcidRow {
        orcid: &r.orcid,
        alias: r.alias.join(LIST_SEPARATOR),
        dblp_key: r.dblp_key.join(LIST_SEPARATOR),
        affiliation: cell(&r.affiliation),
        researcher_id: cell(&r.researcher_id),
        google_scholar_id: cell(&r.scholar_id),
        scopus_id: cell(&r.scopus_id),
        acm_id: cell(&r.acm_id),
        homepage: cell(&r.homepage),
    }
}

fn alias_row(r: &AliasRecord) -> AliasRow<'_> {
    AliasRow {
        alias: &r.alias,
        orcid: r.orcid.join(LIST_SEPARATOR),
        dblp_key: &r.dblp_key,
        affiliation: cell(&r.affiliation),
        researcher_id: cell(&r.researcher_id),
        google_scholar_id: cell(&r.scholar_id),
        scopus_id: cell(&r.scopus_id),
        acm_id: cell(&r.acm_id),
        homepage: cell(&r.homepage),
    }
}

/// Orders records by their primary key (ORCID or alias).
pub fn sort_records(records: &mut [CanonicalRecord]) {
    records.sort_by(|a, b| a.primary_key().cmp(b.primary_key()));
}

/// Writes the dated comment line, the header and one row per record.
/// Records are written in the order given.
pub fn write_records<W: Write>(
    mut out: W,
    records: &[CanonicalRecord],
    group_by: GroupBy,
    parsed_on: NaiveDate,
) -> Result<()> {
    writeln!(out, "# PARSED ON {}", parsed_on.format("%Y-%m-%d"))?;

    let mut writer = WriterBuilder::new().has_headers(false).from_writer(out);
    writer.write_record(columns(group_by))?;

    for record in records {
        match (group_by, record) {
            (GroupBy::Orcid, CanonicalRecord::ByOrcid(r)) => writer.serialize(orcid_row(r))?,
            (GroupBy::Alias, CanonicalRecord::ByAlias(r)) => writer.serialize(alias_row(r))?,
            _ => bail!(
                "Record {:?} does not belong to the {:?} grouping",
                record.primary_key(),
                group_by
            ),
        }
    }

    writer.flush()?;
    Ok(())
}

/// Sorts and writes the table. File output goes to a temporary sibling first
/// and is renamed into place, so a failed run never leaves a partial table.
pub fn export(
    mut records: Vec<CanonicalRecord>,
    group_by: GroupBy,
    destination: &Destination,
) -> Result<()> {
    sort_records(&mut records);
    let today = Local::now().date_naive();

    match destination {
        Destination::Stdout => {
            let stdout = io::stdout();
            write_records(BufWriter::new(stdout.lock()), &records, group_by, today)
                .context("Failed to write table to stdout")?;
        }
        Destination::File(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create directory: {:?}", parent))?;
            }

            let tmp_path = path.with_extension("csv.tmp");
            let file = File::create(&tmp_path)
                .with_context(|| format!("Failed to create temp file: {:?}", tmp_path))?;
            write_records(
                BufWriter::with_capacity(128 * 1024, file),
                &records,
                group_by,
                today,
            )
            .with_context(|| format!("Failed to write table: {:?}", tmp_path))?;

            fs::rename(&tmp_path, path)
                .with_context(|| format!("Failed to rename temp file to: {:?}", path))?;

            info!(rows = records.len(), path = ?path, "Parsed info saved");
        }
    }

    Ok(())
}

pub fn file_destination(output_dir: &Path, group_by: GroupBy) -> Destination {
    Destination::File(output_dir.join(output_filename(group_by)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    fn orcid_record(orcid: &str, aliases: &[&str]) -> CanonicalRecord {
        CanonicalRecord::ByOrcid(OrcidRecord {
            orcid: orcid.to_string(),
            alias: aliases.iter().map(|s| s.to_string()).collect(),
            dblp_key: vec!["homepages/a".to_string(), "homepages/b".to_string()],
            affiliation: Some("MIT, Cambridge".to_string()),
            researcher_id: None,
            scholar_id: None,
            scopus_id: None,
            acm_id: Some("99".to_string()),
            homepage: None,
        })
    }

    fn alias_record(alias: &str) -> CanonicalRecord {
        CanonicalRecord::ByAlias(AliasRecord {
            alias: alias.to_string(),
            orcid: vec!["O1".to_string(), "O2".to_string()],
            dblp_key: "homepages/a".to_string(),
            affiliation: None,
            researcher_id: None,
            scholar_id: Some("S".to_string()),
            scopus_id: None,
            acm_id: None,
            homepage: Some("https://a.example".to_string()),
        })
    }

    fn render(records: &[CanonicalRecord], group_by: GroupBy) -> String {
        let mut out = Vec::new();
        write_records(&mut out, records, group_by, date()).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn orcid_table_layout() {
        let text = render(&[orcid_record("O1", &["Jane Doe", "J. Doe"])], GroupBy::Orcid);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "# PARSED ON 2024-03-01");
        assert_eq!(
            lines[1],
            "orcid,alias,dblp_key,affiliation,researcher_id,google_scholar_id,scopus_id,acm_id,homepage"
        );
        assert_eq!(
            lines[2],
            "O1,Jane Doe|J. Doe,homepages/a|homepages/b,\"MIT, Cambridge\",,,,99,"
        );
    }

    #[test]
    fn alias_table_layout() {
        let text = render(&[alias_record("Jane Doe")], GroupBy::Alias);
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[1].starts_with("alias,orcid,dblp_key"));
        assert_eq!(lines[2], "Jane Doe,O1|O2,homepages/a,,,S,,,https://a.example");
    }

    #[test]
    fn empty_table_still_has_header() {
        let text = render(&[], GroupBy::Alias);
        assert_eq!(text.lines().count(), 2);
    }

    #[test]
    fn mismatched_grouping_is_rejected() {
        let mut out = Vec::new();
        let result = write_records(&mut out, &[alias_record("X")], GroupBy::Orcid, date());
        assert!(result.is_err());
    }

    #[test]
    fn records_sort_by_primary_key() {
        let mut records = vec![alias_record("b"), alias_record("Z"), alias_record("a")];
        sort_records(&mut records);
        let keys: Vec<&str> = records.iter().map(CanonicalRecord::primary_key).collect();
        assert_eq!(keys, vec!["Z", "a", "b"]);
    }

    #[test]
    fn export_to_file_sorts_and_renames() {
        let dir = TempDir::new().unwrap();
        let destination = file_destination(dir.path(), GroupBy::Orcid);

        export(
            vec![orcid_record("O2", &["B"]), orcid_record("O1", &["A"])],
            GroupBy::Orcid,
            &destination,
        )
        .unwrap();

        let path = dir.path().join(ORCID_OUTPUT_CSV_FILENAME);
        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert!(lines[0].starts_with("# PARSED ON "));
        assert!(lines[2].starts_with("O1,"));
        assert!(lines[3].starts_with("O2,"));
        assert!(!path.with_extension("csv.tmp").exists());
    }

    #[test]
    fn output_filenames() {
        assert_eq!(output_filename(GroupBy::Orcid), "by_orcid.csv");
        assert_eq!(output_filename(GroupBy::Alias), "by_alias.csv");
    }
}
