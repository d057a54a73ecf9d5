#[cfg(feature = "cli")]
pub mod cli;

use crate::adapters::directory::{LocalDirectory, SheetDirectory};
use crate::core::{ConfigProvider, DirectoryStore};
use crate::domain::model::ExportFormat;
use crate::domain::schema::ColumnMap;
use crate::utils::error::{Result, RouterError};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    pub directory: DirectoryConfig,
    pub routing: RoutingConfig,
    pub schema: ColumnMap,
    pub export: ExportConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DirectorySourceKind {
    Sheet,
    #[default]
    Local,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectoryConfig {
    pub source: DirectorySourceKind,
    pub url: Option<String>,
    pub path: String,
    pub timeout_seconds: u64,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            source: DirectorySourceKind::Local,
            url: None,
            path: "bde_directory.json".to_string(),
            timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Whether a row may go to several agents whose territories overlap.
    pub allow_overlap: bool,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            allow_overlap: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub format: ExportFormat,
    pub output_path: String,
    pub archive_prefix: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            format: ExportFormat::Csv,
            output_path: "./output".to_string(),
            archive_prefix: "Processed_CSVs".to_string(),
        }
    }
}

/// Either directory variant behind one type, picked from `[directory]`.
pub enum ConfiguredDirectory {
    Sheet(SheetDirectory),
    Local(LocalDirectory),
}

#[async_trait::async_trait]
impl DirectoryStore for ConfiguredDirectory {
    async fn load(&self) -> Result<crate::domain::model::Directory> {
        match self {
            ConfiguredDirectory::Sheet(store) => store.load().await,
            ConfiguredDirectory::Local(store) => store.load().await,
        }
    }

    fn describe(&self) -> String {
        match self {
            ConfiguredDirectory::Sheet(store) => store.describe(),
            ConfiguredDirectory::Local(store) => store.describe(),
        }
    }
}

impl RouterConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| RouterError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${BDE_SHEET_URL})，未設定的保持原樣
    fn substitute_env_vars(content: &str) -> String {
        let re = Regex::new(r"\$\{([^}]+)\}").expect("static env pattern is valid");

        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .into_owned()
    }

    pub fn directory_store(&self) -> Result<ConfiguredDirectory> {
        match self.directory.source {
            DirectorySourceKind::Sheet => {
                let url = self
                    .directory
                    .url
                    .as_deref()
                    .ok_or_else(|| RouterError::MissingConfigError {
                        field: "directory.url".to_string(),
                    })?;
                Ok(ConfiguredDirectory::Sheet(SheetDirectory::new(
                    url,
                    Duration::from_secs(self.directory.timeout_seconds),
                )?))
            }
            DirectorySourceKind::Local => Ok(ConfiguredDirectory::Local(LocalDirectory::new(
                &self.directory.path,
            ))),
        }
    }

    pub fn local_directory(&self) -> LocalDirectory {
        LocalDirectory::new(&self.directory.path)
    }
}

impl ConfigProvider for RouterConfig {
    fn column_map(&self) -> &ColumnMap {
        &self.schema
    }

    fn allow_overlap(&self) -> bool {
        self.routing.allow_overlap
    }

    fn export_format(&self) -> ExportFormat {
        self.export.format
    }

    fn output_path(&self) -> &str {
        &self.export.output_path
    }

    fn archive_prefix(&self) -> &str {
        &self.export.archive_prefix
    }
}

impl Validate for RouterConfig {
    fn validate(&self) -> Result<()> {
        match self.directory.source {
            DirectorySourceKind::Sheet => {
                let url = self.directory.url.as_deref().unwrap_or_default();
                validation::validate_url("directory.url", url)?;
            }
            DirectorySourceKind::Local => {
                validation::validate_path("directory.path", &self.directory.path)?;
            }
        }
        validation::validate_positive_number(
            "directory.timeout_seconds",
            self.directory.timeout_seconds,
            1,
        )?;

        validation::validate_path("export.output_path", &self.export.output_path)?;
        validation::validate_non_empty_string("export.archive_prefix", &self.export.archive_prefix)?;

        self.schema.compile()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = RouterConfig::from_toml_str("").unwrap();

        assert_eq!(config.directory.source, DirectorySourceKind::Local);
        assert!(config.allow_overlap());
        assert_eq!(config.export_format(), ExportFormat::Csv);
        assert_eq!(config.archive_prefix(), "Processed_CSVs");
        assert_eq!(config.column_map(), &ColumnMap::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_full_config() {
        let toml_content = r#"
[directory]
source = "sheet"
url = "https://docs.google.com/spreadsheets/d/e/abc/pub?output=csv"
timeout_seconds = 10

[routing]
allow_overlap = false

[schema]
version = "2"
record_type_column = 2
record_type_value = "Res_Resale"
location_column = 6

[[schema.mappings]]
source = 4
target = "First Name"

[[schema.mappings]]
source = 5
target = "Phone1"
normalize = "phone"

[[schema.mappings]]
source = 6
target = "Location"
prefix = "P-"

[schema.constants]
Company = "NEW"

[export]
format = "xlsx"
output_path = "./daily"
archive_prefix = "BDE_Files"
"#;

        let config = RouterConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.directory.source, DirectorySourceKind::Sheet);
        assert!(!config.allow_overlap());
        assert_eq!(config.schema.version, "2");
        assert_eq!(config.schema.location_column, 6);
        assert_eq!(config.schema.mappings.len(), 3);
        assert_eq!(config.schema.min_width(), 7);
        assert_eq!(config.export_format(), ExportFormat::Xlsx);
        assert!(config.validate().is_ok());
        assert!(matches!(
            config.directory_store().unwrap(),
            ConfiguredDirectory::Sheet(_)
        ));
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("LISTING_ROUTER_TEST_SHEET", "https://sheet.example.com/pub.csv");

        let toml_content = r#"
[directory]
source = "sheet"
url = "${LISTING_ROUTER_TEST_SHEET}"
"#;

        let config = RouterConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(
            config.directory.url.as_deref(),
            Some("https://sheet.example.com/pub.csv")
        );

        std::env::remove_var("LISTING_ROUTER_TEST_SHEET");
    }

    #[test]
    fn test_config_validation() {
        let placeholder = r#"
[directory]
source = "sheet"
url = "YAHAN_APNA_LINK"
"#;
        let config = RouterConfig::from_toml_str(placeholder).unwrap();
        assert!(config.validate().is_err());

        let missing_url = RouterConfig::from_toml_str("[directory]\nsource = \"sheet\"\n").unwrap();
        assert!(missing_url.validate().is_err());
        assert!(matches!(
            missing_url.directory_store(),
            Err(RouterError::MissingConfigError { .. })
        ));

        let bad_target = r#"
[[schema.mappings]]
source = 1
target = "Nickname"
"#;
        let config = RouterConfig::from_toml_str(bad_target).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[export]\nformat = \"xlsx\"\n")
            .unwrap();

        let config = RouterConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.export.format, ExportFormat::Xlsx);
        assert_eq!(config.export.output_path, "./output");
    }
}
