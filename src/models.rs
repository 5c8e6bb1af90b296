use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::catalog::CatalogColumns;
use crate::policy::InstitutionPolicy;

/// Spreadsheet extensions picked up when scanning the data directory.
pub const WORKBOOK_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xlsb", "xls", "ods"];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "ConfigFile")]
pub struct Config {
    pub authority: Authority,
    pub catalog_file: String,
    // Data source configuration
    pub data_directory: Option<String>,
    /// Ordered rounds, earliest first. Empty means "every workbook in the data directory".
    pub input_files: Vec<String>,
    pub output_directory: Option<String>,
    pub output_file: String,
    pub write_csv: bool,
    pub catalog_columns: CatalogColumns,
    pub scan: ScanConfig,
    pub institutions: InstitutionPolicy,
    pub tabular: TabularLayout,
}

/// On-disk shape of [`Config`]. Settings left out of the file take the
/// defaults of the configured authority, not those of KCET.
#[derive(Deserialize)]
struct ConfigFile {
    authority: Option<Authority>,
    catalog_file: Option<String>,
    data_directory: Option<String>,
    input_files: Option<Vec<String>>,
    output_directory: Option<String>,
    output_file: Option<String>,
    write_csv: Option<bool>,
    catalog_columns: Option<CatalogColumns>,
    scan: Option<ScanConfig>,
    institutions: Option<InstitutionPolicy>,
    tabular: Option<TabularLayout>,
}

impl From<ConfigFile> for Config {
    fn from(file: ConfigFile) -> Self {
        let defaults = Config::for_authority(file.authority.unwrap_or(Authority::Kcet));
        Self {
            authority: defaults.authority,
            catalog_file: file.catalog_file.unwrap_or(defaults.catalog_file),
            data_directory: file.data_directory.or(defaults.data_directory),
            input_files: file.input_files.unwrap_or(defaults.input_files),
            output_directory: file.output_directory.or(defaults.output_directory),
            output_file: file.output_file.unwrap_or(defaults.output_file),
            write_csv: file.write_csv.unwrap_or(defaults.write_csv),
            catalog_columns: file.catalog_columns.unwrap_or(defaults.catalog_columns),
            scan: file.scan.unwrap_or(defaults.scan),
            institutions: file.institutions.unwrap_or(defaults.institutions),
            tabular: file.tabular.unwrap_or(defaults.tabular),
        }
    }
}

/// Which admission authority's export layout the inputs follow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Authority {
    /// Institution sections introduced by header lines, one program per row.
    #[serde(rename = "kcet")]
    Kcet,
    /// Ordinary tables with one column per program.
    #[serde(rename = "comedk")]
    Comedk,
}

impl std::str::FromStr for Authority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "kcet" => Ok(Authority::Kcet),
            "comedk" => Ok(Authority::Comedk),
            other => Err(format!("unknown authority '{}', expected kcet or comedk", other)),
        }
    }
}

impl std::fmt::Display for Authority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Authority::Kcet => write!(f, "KCET"),
            Authority::Comedk => write!(f, "COMEDK"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Regex recognising an institution header line. Code and name come from
    /// the `code`/`name` groups, or groups 1 and 2.
    pub header_pattern: String,
    /// Column header holding the cutoff value.
    pub cutoff_marker: String,
    /// Text that must follow a course code at the start of a program cell.
    pub code_separator: String,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            header_pattern: r".*?(E\d+)\s+(.*)".to_string(),
            cutoff_marker: "GM".to_string(),
            code_separator: " ".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TabularLayout {
    pub code_column: String,
    pub name_column: String,
    pub category_column: String,
    /// Alternative headers renamed to `category_column` before validation.
    pub category_aliases: Vec<String>,
    pub category_filter: String,
}

impl Default for TabularLayout {
    fn default() -> Self {
        Self {
            code_column: "College Code".to_string(),
            name_column: "College Name".to_string(),
            category_column: "Seat Category".to_string(),
            category_aliases: vec!["Seat Type".to_string(), "Seat type".to_string()],
            category_filter: "GM".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::for_authority(Authority::Kcet)
    }
}

impl Config {
    pub fn for_authority(authority: Authority) -> Self {
        let (catalog_file, catalog_columns, data_directory, output_file) = match authority {
            Authority::Kcet => (
                "kcet_config/COURSECODE_ENGG.xlsx",
                CatalogColumns::default(),
                "kcet_files",
                "KCET_AGGREGATED.xlsx",
            ),
            Authority::Comedk => (
                "comedk_files/COMEDK_BRANCH_CODES.xlsx",
                CatalogColumns::comedk(),
                "comedk_files",
                "COMEDK_ALL_output.xlsx",
            ),
        };

        Self {
            authority,
            catalog_file: catalog_file.to_string(),
            catalog_columns,
            data_directory: Some(data_directory.to_string()),
            input_files: Vec::new(),
            output_directory: Some("output".to_string()),
            output_file: output_file.to_string(),
            write_csv: false,
            scan: ScanConfig::default(),
            institutions: InstitutionPolicy::default(),
            tabular: TabularLayout::default(),
        }
    }

    pub fn load_from_file(file_path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(file_path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save_to_file(&self, file_path: &str) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(file_path, content)?;
        Ok(())
    }

    /// Switch to another authority. Authority-dependent settings still at the
    /// old authority's defaults move to the new one's; customised ones stay.
    pub fn set_authority(&mut self, authority: Authority) {
        if authority == self.authority {
            return;
        }
        let old = Config::for_authority(self.authority);
        let new = Config::for_authority(authority);

        if self.catalog_file == old.catalog_file {
            self.catalog_file = new.catalog_file;
        }
        if self.catalog_columns == old.catalog_columns {
            self.catalog_columns = new.catalog_columns;
        }
        if self.data_directory == old.data_directory {
            self.data_directory = new.data_directory;
        }
        if self.output_file == old.output_file {
            self.output_file = new.output_file;
        }
        self.authority = authority;
    }

    /// Key columns of every per-source table. The first one is the join key.
    pub fn base_columns(&self) -> Vec<String> {
        let mut columns = vec![
            self.tabular.code_column.clone(),
            self.tabular.name_column.clone(),
        ];
        if self.authority == Authority::Comedk {
            columns.push(self.tabular.category_column.clone());
        }
        columns
    }

    pub fn data_dir(&self) -> &str {
        self.data_directory.as_deref().unwrap_or(".")
    }

    pub fn output_dir(&self) -> &str {
        self.output_directory.as_deref().unwrap_or("output")
    }

    pub fn output_path(&self) -> PathBuf {
        Path::new(self.output_dir()).join(&self.output_file)
    }
}

/// One extracted cutoff: institution, program column label and value.
///
/// The value is always finite; `CutoffRecord::new` refuses anything else, so
/// a missing or unparsable cutoff never becomes a record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CutoffRecord {
    pub institution_code: String,
    pub institution_name: String,
    pub program_label: String,
    value: f64,
}

impl CutoffRecord {
    pub fn new(
        institution_code: impl Into<String>,
        institution_name: impl Into<String>,
        program_label: impl Into<String>,
        value: f64,
    ) -> Option<Self> {
        if !value.is_finite() {
            return None;
        }
        Some(Self {
            institution_code: institution_code.into(),
            institution_name: institution_name.into(),
            program_label: program_label.into(),
            value,
        })
    }

    pub fn value(&self) -> f64 {
        self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_reject_non_finite_values() {
        assert!(CutoffRecord::new("E001", "Example", "CS", f64::NAN).is_none());
        assert!(CutoffRecord::new("E001", "Example", "CS", f64::NEG_INFINITY).is_none());
        let record = CutoffRecord::new("E001", "Example", "CS", 1500.0).unwrap();
        assert_eq!(record.value(), 1500.0);
    }

    #[test]
    fn base_columns_depend_on_authority() {
        assert_eq!(
            Config::for_authority(Authority::Kcet).base_columns(),
            vec!["College Code", "College Name"]
        );
        assert_eq!(
            Config::for_authority(Authority::Comedk).base_columns(),
            vec!["College Code", "College Name", "Seat Category"]
        );
    }

    #[test]
    fn authority_parses_case_insensitively() {
        assert_eq!("COMEDK".parse::<Authority>().unwrap(), Authority::Comedk);
        assert!("neet".parse::<Authority>().is_err());
    }

    #[test]
    fn config_round_trips_through_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let path = path.to_str().unwrap();

        let mut config = Config::for_authority(Authority::Comedk);
        config.input_files = vec!["R1.xlsx".to_string(), "R2.xlsx".to_string()];
        config.save_to_file(path).unwrap();

        let loaded = Config::load_from_file(path).unwrap();
        assert_eq!(loaded.authority, Authority::Comedk);
        assert_eq!(loaded.input_files, config.input_files);
        assert_eq!(loaded.catalog_columns, CatalogColumns::comedk());
        assert_eq!(loaded.tabular, TabularLayout::default());
    }

    #[test]
    fn partial_comedk_config_gets_comedk_defaults() {
        let config: Config = toml::from_str(
            r#"
authority = "comedk"
catalog_file = "branches.xlsx"
"#,
        )
        .unwrap();
        assert_eq!(config.authority, Authority::Comedk);
        assert_eq!(config.catalog_file, "branches.xlsx");
        assert_eq!(config.catalog_columns, CatalogColumns::comedk());
        assert_eq!(config.data_dir(), "comedk_files");
        assert_eq!(config.output_file, "COMEDK_ALL_output.xlsx");
    }

    #[test]
    fn authority_switch_moves_untouched_defaults_only() {
        let mut config = Config::for_authority(Authority::Kcet);
        config.catalog_file = "my_branches.xlsx".to_string();
        config.set_authority(Authority::Comedk);

        assert_eq!(config.authority, Authority::Comedk);
        assert_eq!(config.catalog_file, "my_branches.xlsx");
        assert_eq!(config.catalog_columns, CatalogColumns::comedk());
        assert_eq!(config.data_dir(), "comedk_files");
        assert_eq!(config.base_columns().len(), 3);
    }

    #[test]
    fn partial_config_falls_back_to_defaults() {
        let config: Config = toml::from_str(
            r#"
authority = "kcet"
catalog_file = "codes.xlsx"

[institutions]
allow_tokens = ["MYS"]
"#,
        )
        .unwrap();
        assert_eq!(config.catalog_file, "codes.xlsx");
        assert_eq!(config.scan, ScanConfig::default());
        assert_eq!(config.institutions.allow_tokens, vec!["MYS"]);
        assert!(config.institutions.deny_tokens.contains(&"MANGALORE".to_string()));
    }
}
