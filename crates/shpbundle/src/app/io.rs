//! Decoding file lists and rendering bundle output.

use std::fmt;
use std::str::FromStr;

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::domain::model::{BundleOutput, FileDescriptor};

/// Document formats accepted for the incoming file list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
#[value(rename_all = "kebab-case")]
pub enum InputFormat {
    /// JSON array of file objects.
    Json,
    /// YAML sequence of file objects, as found in workflow job files.
    Yaml,
}

/// Document formats available for the bundled result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
#[value(rename_all = "kebab-case")]
pub enum OutputFormat {
    Json,
    Yaml,
}

impl InputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            InputFormat::Json => "json",
            InputFormat::Yaml => "yaml",
        }
    }
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Yaml => "yaml",
        }
    }
}

impl FromStr for InputFormat {
    type Err = FormatParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(InputFormat::Json),
            "yaml" | "yml" => Ok(InputFormat::Yaml),
            other => Err(FormatParseError::UnknownFormat(other.to_string())),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = FormatParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "yaml" | "yml" => Ok(OutputFormat::Yaml),
            other => Err(FormatParseError::UnknownFormat(other.to_string())),
        }
    }
}

impl fmt::Display for InputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an [`InputFormat`] or [`OutputFormat`] fails.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum FormatParseError {
    #[error("unknown document format '{0}'")]
    UnknownFormat(String),
}

/// Decode a list of file objects, skipping `null` entries.
pub fn decode_files(source: &str, format: InputFormat) -> Result<Vec<FileDescriptor>> {
    let entries: Vec<Option<FileDescriptor>> = match format {
        InputFormat::Json => {
            serde_json::from_str(source).context("failed to parse JSON file list")?
        }
        InputFormat::Yaml => {
            serde_yaml::from_str(source).context("failed to parse YAML file list")?
        }
    };

    let total = entries.len();
    let files: Vec<FileDescriptor> = entries.into_iter().flatten().collect();
    if files.len() != total {
        tracing::debug!(skipped = total - files.len(), "skipped null file entries");
    }
    Ok(files)
}

/// Render bundle output as a document.
pub fn render_output(output: &BundleOutput, format: OutputFormat, pretty: bool) -> Result<String> {
    let rendered = match format {
        OutputFormat::Json if pretty => serde_json::to_string_pretty(output)?,
        OutputFormat::Json => serde_json::to_string(output)?,
        OutputFormat::Yaml => serde_yaml::to_string(output)?,
    };
    Ok(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::bundle::bundle_shapefiles;

    #[test]
    fn parses_format_aliases() {
        assert_eq!("JSON".parse::<InputFormat>(), Ok(InputFormat::Json));
        assert_eq!(" yml ".parse::<OutputFormat>(), Ok(OutputFormat::Yaml));
        assert_eq!(
            "xml".parse::<InputFormat>(),
            Err(FormatParseError::UnknownFormat("xml".into()))
        );
    }

    #[test]
    fn decode_skips_null_entries() {
        let files = decode_files(
            r#"[null, {"path": "/out/a.shp"}, null, {"path": "/out/a.dbf"}]"#,
            InputFormat::Json,
        )
        .unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(files[1].basename, "a.dbf");
    }

    #[test]
    fn decode_reads_yaml_job_lists() {
        let source = r#"
- class: File
  path: /out/roads.shp
- class: File
  path: /out/roads.prj
  nameroot: roads
"#;
        let files = decode_files(source, InputFormat::Yaml).unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].nameroot, "roads");
        assert_eq!(files[1].extra.get("class").and_then(|v| v.as_str()), Some("File"));
    }

    #[test]
    fn decode_rejects_non_list_documents() {
        let err = decode_files(r#"{"path": "/out/a.shp"}"#, InputFormat::Json).unwrap_err();
        assert!(err.to_string().contains("failed to parse JSON file list"));
    }

    #[test]
    fn renders_single_bundle_without_list_wrapper() {
        let output = bundle_shapefiles(&[FileDescriptor::from_path("/out/a.shp")]);
        let rendered = render_output(&output, OutputFormat::Json, false).unwrap();
        assert_eq!(
            rendered,
            r#"{"file":{"class":"File","path":"/out/a.shp","basename":"a.shp","nameroot":"a","nameext":".shp","secondaryFiles":[]}}"#
        );
    }

    #[test]
    fn renders_empty_result_as_empty_list() {
        let output = bundle_shapefiles(&[]);
        assert_eq!(render_output(&output, OutputFormat::Json, true).unwrap(), "[]");
    }

    #[test]
    fn renders_yaml() {
        let output = bundle_shapefiles(&[FileDescriptor::from_path("/out/a.shp")]);
        let rendered = render_output(&output, OutputFormat::Yaml, false).unwrap();
        assert!(rendered.starts_with("file:\n  class: File\n"), "{rendered}");
    }
}
