//! Configuration resolution: raw TOML document → [`AppSettings`].
//!
//! `work_mode` is the only required key. Every other key is optional: when it
//! is absent the documented default is used and a generic warning is logged;
//! when it is present but unusable (unknown token, wrong type, out of range)
//! the default is used and an `[OPT]`-tagged warning is logged instead. Both
//! kinds are also returned as [`Fallback`] values so callers and tests can
//! inspect them without scraping logs.
//!
//! Keys are resolved in a fixed order (work mode, directories, PDF strategy,
//! image strategy); the order only affects the sequence of warnings.

use crate::error::ConfigError;
use crate::logging::OPTION_TAG;
use crate::settings::{
    format_choices, AppSettings, AutoGroupingConfig, Choice, ColorMode, DirectoriesConfig,
    GroupBy, ImageFormat, ImageMode, ImageNamingConfig, ImageOutputConfig, ImageOutputStrategy,
    PageNaming, PdfMode, PdfOutputStrategy, WorkMode,
};
use serde::de::DeserializeOwned;
use std::fmt;
use std::path::{Path, PathBuf};
use toml::{Table, Value};
use tracing::{debug, warn};

/// Name of the top-level table holding every setting.
pub const SETTINGS_TABLE: &str = "Settings";

/// A default substituted for an optional key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fallback {
    /// The key (or an empty directory string) was not provided.
    Missing { key: String, default: String },
    /// The key was provided with an unusable value and was ignored.
    Invalid {
        key: String,
        value: String,
        expected: String,
        default: String,
    },
}

impl Fallback {
    /// Dotted key path below `[Settings]`, e.g. `Directories.input_dir`.
    pub fn key(&self) -> &str {
        match self {
            Fallback::Missing { key, .. } | Fallback::Invalid { key, .. } => key,
        }
    }

    /// `true` for the `[OPT]`-tagged class of warning.
    pub fn is_invalid(&self) -> bool {
        matches!(self, Fallback::Invalid { .. })
    }
}

impl fmt::Display for Fallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fallback::Missing { key, default } => {
                write!(f, "Optional config '{key}' missing. Using default: {default}")
            }
            Fallback::Invalid {
                key,
                value,
                expected,
                default,
            } => write!(
                f,
                "{OPTION_TAG} Invalid option for '{key}': {value}. Expected {expected}. \
                 Ignoring and using default: {default}"
            ),
        }
    }
}

/// Outcome of a successful resolution.
#[derive(Debug, Clone)]
pub struct Resolved {
    pub settings: AppSettings,
    /// Every fallback taken, in emission order.
    pub fallbacks: Vec<Fallback>,
}

/// Read, parse and resolve the configuration file at `path`.
pub fn load_settings(path: impl AsRef<Path>) -> Result<Resolved, ConfigError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(ConfigError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    debug!("Loaded config file: {}", path.display());
    resolve_str(&text)
}

/// Parse a TOML document and resolve it.
pub fn resolve_str(text: &str) -> Result<Resolved, ConfigError> {
    let doc: Table = text.parse()?;
    resolve(&doc)
}

/// Resolve an already parsed document against the process working directory.
pub fn resolve(doc: &Table) -> Result<Resolved, ConfigError> {
    ConfigResolver::new().resolve(doc)
}

/// Stateful resolver; collects fallbacks while walking the document.
#[derive(Debug)]
pub struct ConfigResolver {
    work_dir: PathBuf,
    fallbacks: Vec<Fallback>,
}

impl Default for ConfigResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigResolver {
    /// Resolver whose default `work_space` is the process working directory.
    pub fn new() -> Self {
        let work_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self::with_work_dir(work_dir)
    }

    /// Resolver with an explicit default `work_space`.
    pub fn with_work_dir(work_dir: impl Into<PathBuf>) -> Self {
        Self {
            work_dir: work_dir.into(),
            fallbacks: Vec::new(),
        }
    }

    /// Resolve `doc` into settings, consuming the resolver.
    pub fn resolve(mut self, doc: &Table) -> Result<Resolved, ConfigError> {
        let root = match doc.get(SETTINGS_TABLE) {
            None => return Err(ConfigError::MissingSettings),
            Some(Value::Table(table)) => Section::root(table),
            Some(other) => {
                return Err(ConfigError::SettingsNotTable {
                    found: other.type_str(),
                })
            }
        };

        let work_mode = required_choice::<WorkMode>(&root, "work_mode")?;
        let directories = self.directories(&root);
        let pdf_strategy = self.pdf_strategy(&root);
        let img_strategy = self.img_strategy(&root);

        let settings = AppSettings {
            work_mode,
            directories,
            pdf_strategy,
            img_strategy,
        };
        debug!(?settings, fallbacks = self.fallbacks.len(), "Configuration resolved");

        Ok(Resolved {
            settings,
            fallbacks: self.fallbacks,
        })
    }

    // ── Sections ─────────────────────────────────────────────────────────

    fn directories(&mut self, root: &Section<'_>) -> DirectoriesConfig {
        let section = self.section(root, "Directories");
        let work_dir = self.work_dir.clone();
        let work_space = self.directory(
            &section,
            "work_space",
            work_dir.clone(),
            &format!("current directory ({})", work_dir.display()),
        );
        let input_dir = self.directory(
            &section,
            "input_dir",
            PathBuf::from(DirectoriesConfig::DEFAULT_INPUT_DIR),
            DirectoriesConfig::DEFAULT_INPUT_DIR,
        );
        let output_dir = self.directory(
            &section,
            "output_dir",
            PathBuf::from(DirectoriesConfig::DEFAULT_OUTPUT_DIR),
            DirectoriesConfig::DEFAULT_OUTPUT_DIR,
        );
        DirectoriesConfig {
            work_space,
            input_dir,
            output_dir,
        }
    }

    fn pdf_strategy(&mut self, root: &Section<'_>) -> PdfOutputStrategy {
        let section = self.section(root, "PdfOutputStrategy");
        let mode = self.choice(&section, "mode", PdfMode::default());
        let output_name = self.value(
            &section,
            "output_name",
            PdfOutputStrategy::DEFAULT_OUTPUT_NAME.to_string(),
            "a non-empty file name",
            |name: &String| !name.trim().is_empty(),
        );
        let overwrite_existing = self.flag(&section, "overwrite_existing");

        let grouping = self.section(&section, "AutoGrouping");
        let auto_grouping = AutoGroupingConfig {
            enable: self.flag(&grouping, "enable"),
            group_by: self.choice(&grouping, "group_by", GroupBy::default()),
            max_images_per_pdf: self.value(
                &grouping,
                "max_images_per_pdf",
                0u32,
                "a non-negative integer",
                |_| true,
            ),
        };

        PdfOutputStrategy {
            mode,
            output_name,
            overwrite_existing,
            auto_grouping,
        }
    }

    fn img_strategy(&mut self, root: &Section<'_>) -> ImageOutputStrategy {
        let section = self.section(root, "ImageOutputStrategy");
        let mode = self.choice(&section, "mode", ImageMode::default());

        let out = self.section(&section, "Output");
        let output = ImageOutputConfig {
            format: self.choice(&out, "image_format", ImageFormat::default()),
            dpi: self.value(
                &out,
                "dpi",
                ImageOutputConfig::DEFAULT_DPI,
                "a positive integer",
                |dpi: &u32| *dpi > 0,
            ),
            color_mode: self.choice(&out, "color_mode", ColorMode::default()),
            overwrite_existing: self.flag(&out, "overwrite_existing"),
        };

        let naming = self.section(&section, "Naming");
        let naming = ImageNamingConfig {
            page_naming: self.choice(&naming, "page_naming", PageNaming::default()),
            start_index: self.value(
                &naming,
                "start_index",
                ImageNamingConfig::default().start_index,
                "an integer",
                |_| true,
            ),
        };

        ImageOutputStrategy {
            mode,
            output,
            naming,
        }
    }

    // ── Key helpers ──────────────────────────────────────────────────────

    /// Descend into a sub-table; a non-table value is ignored with a warning.
    fn section<'t>(&mut self, parent: &Section<'t>, name: &str) -> Section<'t> {
        let path = parent.key_path(name);
        let table = match parent.get(name) {
            None => None,
            Some(Value::Table(table)) => Some(table),
            Some(other) => {
                self.record(Fallback::Invalid {
                    key: path.clone(),
                    value: other.to_string(),
                    expected: "a table".to_string(),
                    default: "an empty section".to_string(),
                });
                None
            }
        };
        Section { table, path }
    }

    fn choice<T>(&mut self, section: &Section<'_>, key: &str, default: T) -> T
    where
        T: Choice + DeserializeOwned,
    {
        match section.get(key) {
            None => {
                self.missing(section.key_path(key), default.token());
                default
            }
            Some(raw) => match raw.clone().try_into::<T>() {
                Ok(value) => value,
                Err(_) => {
                    self.invalid(
                        section.key_path(key),
                        raw,
                        &format_choices(T::EXPECTED),
                        default.token(),
                    );
                    default
                }
            },
        }
    }

    fn value<T>(
        &mut self,
        section: &Section<'_>,
        key: &str,
        default: T,
        expected: &str,
        accept: impl Fn(&T) -> bool,
    ) -> T
    where
        T: DeserializeOwned + fmt::Display,
    {
        match section.get(key) {
            None => {
                self.missing(section.key_path(key), &default);
                default
            }
            Some(raw) => match raw.clone().try_into::<T>() {
                Ok(value) if accept(&value) => value,
                _ => {
                    self.invalid(section.key_path(key), raw, expected, &default);
                    default
                }
            },
        }
    }

    fn flag(&mut self, section: &Section<'_>, key: &str) -> bool {
        self.value(section, key, false, "a boolean", |_| true)
    }

    /// Directory keys treat an empty string as "not set".
    fn directory(
        &mut self,
        section: &Section<'_>,
        key: &str,
        default: PathBuf,
        default_label: &str,
    ) -> PathBuf {
        match section.get(key) {
            Some(Value::String(s)) if !s.is_empty() => PathBuf::from(s),
            None | Some(Value::String(_)) => {
                self.missing(section.key_path(key), default_label);
                default
            }
            Some(other) => {
                self.invalid(section.key_path(key), other, "a path string", default_label);
                default
            }
        }
    }

    fn missing(&mut self, key: String, default: impl fmt::Display) {
        self.record(Fallback::Missing {
            key,
            default: default.to_string(),
        });
    }

    fn invalid(&mut self, key: String, raw: &Value, expected: &str, default: impl fmt::Display) {
        self.record(Fallback::Invalid {
            key,
            value: raw.to_string(),
            expected: expected.to_string(),
            default: default.to_string(),
        });
    }

    fn record(&mut self, fallback: Fallback) {
        warn!("{fallback}");
        self.fallbacks.push(fallback);
    }
}

/// Resolve a required enumerated key; absence or an unknown token is fatal.
fn required_choice<T>(section: &Section<'_>, key: &str) -> Result<T, ConfigError>
where
    T: Choice + DeserializeOwned,
{
    let raw = section.get(key).ok_or_else(|| ConfigError::MissingRequired {
        key: section.key_path(key),
    })?;
    raw.clone().try_into::<T>().map_err(|_| ConfigError::InvalidRequired {
        key: section.key_path(key),
        value: raw.to_string(),
        expected: format_choices(T::EXPECTED),
    })
}

/// A view on one (possibly absent) table of the document.
struct Section<'t> {
    table: Option<&'t Table>,
    path: String,
}

impl<'t> Section<'t> {
    fn root(table: &'t Table) -> Self {
        Self {
            table: Some(table),
            path: String::new(),
        }
    }

    fn get(&self, key: &str) -> Option<&'t Value> {
        self.table.and_then(|t| t.get(key))
    }

    fn key_path(&self, key: &str) -> String {
        if self.path.is_empty() {
            key.to_string()
        } else {
            format!("{}.{}", self.path, key)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::ImageFormat;

    fn resolve_doc(text: &str) -> Result<Resolved, ConfigError> {
        let doc: Table = text.parse().expect("valid toml");
        ConfigResolver::with_work_dir("/ws").resolve(&doc)
    }

    fn invalid_keys(resolved: &Resolved) -> Vec<&str> {
        resolved
            .fallbacks
            .iter()
            .filter(|f| f.is_invalid())
            .map(Fallback::key)
            .collect()
    }

    #[test]
    fn missing_work_mode_is_fatal() {
        let err = resolve_doc("[Settings]\n[Settings.Directories]\ninput_dir = \"in\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::MissingRequired { ref key } if key == "work_mode"));
    }

    #[test]
    fn unknown_work_mode_is_fatal() {
        let err = resolve_doc("[Settings]\nwork_mode = \"pdf2txt\"\n").unwrap_err();
        match err {
            ConfigError::InvalidRequired { key, value, expected } => {
                assert_eq!(key, "work_mode");
                assert!(value.contains("pdf2txt"));
                assert_eq!(expected, "['img2pdf', 'pdf2img']");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn non_string_work_mode_is_fatal() {
        let err = resolve_doc("[Settings]\nwork_mode = 3\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidRequired { .. }));
    }

    #[test]
    fn missing_settings_table_is_fatal() {
        let err = resolve_doc("work_mode = \"img2pdf\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::MissingSettings));
    }

    #[test]
    fn scalar_settings_is_fatal() {
        let err = resolve_doc("Settings = \"img2pdf\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::SettingsNotTable { found: "string" }));
    }

    #[test]
    fn unparseable_document_is_fatal() {
        let err = resolve_str("[Settings\nwork_mode = ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn omitted_keys_resolve_to_defaults() {
        let resolved = resolve_doc("[Settings]\nwork_mode = \"pdf2img\"\n").unwrap();
        let expected = AppSettings::with_defaults(WorkMode::PdfToImage, "/ws");
        assert_eq!(resolved.settings, expected);
        assert!(resolved.fallbacks.iter().all(|f| !f.is_invalid()));
        // 3 directories + 3 pdf + 3 grouping + 1 image mode + 4 output + 2 naming
        assert_eq!(resolved.fallbacks.len(), 16);
    }

    #[test]
    fn fallbacks_follow_resolution_order() {
        let resolved = resolve_doc("[Settings]\nwork_mode = \"img2pdf\"\n").unwrap();
        let keys: Vec<&str> = resolved.fallbacks.iter().map(Fallback::key).collect();
        assert_eq!(keys[0], "Directories.work_space");
        assert_eq!(keys[3], "PdfOutputStrategy.mode");
        assert_eq!(keys[6], "PdfOutputStrategy.AutoGrouping.enable");
        assert_eq!(keys[9], "ImageOutputStrategy.mode");
        assert_eq!(keys[15], "ImageOutputStrategy.Naming.start_index");
    }

    #[test]
    fn out_of_enum_values_fall_back_with_tag() {
        let resolved = resolve_doc(
            r#"
            [Settings]
            work_mode = "img2pdf"
            [Settings.PdfOutputStrategy]
            mode = "zip_everything"
            [Settings.ImageOutputStrategy.Output]
            image_format = "tiff"
            color_mode = "cmyk"
            "#,
        )
        .unwrap();
        let s = &resolved.settings;
        assert_eq!(s.pdf_strategy.mode, PdfMode::ManyToOne);
        assert_eq!(s.img_strategy.output.format, ImageFormat::Png);
        assert_eq!(s.img_strategy.output.color_mode, ColorMode::Rgb);
        assert_eq!(
            invalid_keys(&resolved),
            vec![
                "PdfOutputStrategy.mode",
                "ImageOutputStrategy.Output.image_format",
                "ImageOutputStrategy.Output.color_mode",
            ]
        );
        let first = resolved.fallbacks.iter().find(|f| f.is_invalid()).unwrap();
        let msg = first.to_string();
        assert!(msg.starts_with("[OPT] Invalid option for 'PdfOutputStrategy.mode'"), "{msg}");
        assert!(msg.contains("['many_to_one', 'one_to_one', 'auto_grouping']"), "{msg}");
    }

    #[test]
    fn missing_key_warning_is_untagged() {
        let resolved = resolve_doc("[Settings]\nwork_mode = \"img2pdf\"\n").unwrap();
        let msg = resolved.fallbacks[3].to_string();
        assert_eq!(
            msg,
            "Optional config 'PdfOutputStrategy.mode' missing. Using default: many_to_one"
        );
    }

    #[test]
    fn wrong_types_and_ranges_fall_back() {
        let resolved = resolve_doc(
            r#"
            [Settings]
            work_mode = "pdf2img"
            [Settings.PdfOutputStrategy]
            overwrite_existing = "yes"
            output_name = ""
            [Settings.PdfOutputStrategy.AutoGrouping]
            max_images_per_pdf = -4
            [Settings.ImageOutputStrategy.Output]
            dpi = 0
            [Settings.ImageOutputStrategy.Naming]
            start_index = "one"
            "#,
        )
        .unwrap();
        let s = &resolved.settings;
        assert!(!s.pdf_strategy.overwrite_existing);
        assert_eq!(s.pdf_strategy.output_name, "merged.pdf");
        assert_eq!(s.pdf_strategy.auto_grouping.max_images_per_pdf, 0);
        assert_eq!(s.img_strategy.output.dpi, 300);
        assert_eq!(s.img_strategy.naming.start_index, 1);
        assert_eq!(invalid_keys(&resolved).len(), 5);
    }

    #[test]
    fn negative_start_index_is_kept() {
        let resolved = resolve_doc(
            r#"
            [Settings]
            work_mode = "pdf2img"
            [Settings.ImageOutputStrategy.Naming]
            start_index = -3
            "#,
        )
        .unwrap();
        assert_eq!(resolved.settings.img_strategy.naming.start_index, -3);
        assert!(invalid_keys(&resolved).is_empty());
    }

    #[test]
    fn pascal_case_aliases_are_accepted() {
        let resolved = resolve_doc(
            r#"
            [Settings]
            work_mode = "img2pdf"
            [Settings.PdfOutputStrategy]
            mode = "OneToOne"
            [Settings.PdfOutputStrategy.AutoGrouping]
            group_by = "Prefix"
            [Settings.ImageOutputStrategy.Naming]
            page_naming = "Original"
            "#,
        )
        .unwrap();
        let s = &resolved.settings;
        assert_eq!(s.pdf_strategy.mode, PdfMode::OneToOne);
        assert_eq!(s.pdf_strategy.auto_grouping.group_by, GroupBy::Prefix);
        assert_eq!(s.img_strategy.naming.page_naming, PageNaming::Original);
        assert!(invalid_keys(&resolved).is_empty());
    }

    #[test]
    fn full_document_resolves_without_fallbacks() {
        let resolved = resolve_doc(
            r#"
            [Settings]
            work_mode = "pdf2img"

            [Settings.Directories]
            work_space = "/data"
            input_dir = "pdfs"
            output_dir = "pages"

            [Settings.PdfOutputStrategy]
            mode = "auto_grouping"
            output_name = "book.pdf"
            overwrite_existing = true

            [Settings.PdfOutputStrategy.AutoGrouping]
            enable = true
            group_by = "metadata"
            max_images_per_pdf = 20

            [Settings.ImageOutputStrategy]
            mode = "one_to_one"

            [Settings.ImageOutputStrategy.Output]
            image_format = "jpeg"
            dpi = 150
            color_mode = "grayscale"
            overwrite_existing = true

            [Settings.ImageOutputStrategy.Naming]
            page_naming = "custom"
            start_index = 0
            "#,
        )
        .unwrap();
        assert!(resolved.fallbacks.is_empty(), "{:?}", resolved.fallbacks);
        let s = resolved.settings;
        assert_eq!(s.directories.absolute_input(), PathBuf::from("/data/pdfs"));
        assert_eq!(s.directories.absolute_output(), PathBuf::from("/data/pages"));
        assert_eq!(s.pdf_strategy.mode, PdfMode::AutoGrouping);
        assert_eq!(s.pdf_strategy.output_name, "book.pdf");
        assert!(s.pdf_strategy.auto_grouping.enable);
        assert_eq!(s.pdf_strategy.auto_grouping.group_by, GroupBy::Metadata);
        assert_eq!(s.pdf_strategy.auto_grouping.max_images_per_pdf, 20);
        assert_eq!(s.img_strategy.output.format, ImageFormat::Jpeg);
        assert_eq!(s.img_strategy.output.dpi, 150);
        assert_eq!(s.img_strategy.output.color_mode, ColorMode::Grayscale);
        assert_eq!(s.img_strategy.naming.page_naming, PageNaming::Custom);
        assert_eq!(s.img_strategy.naming.start_index, 0);
    }

    #[test]
    fn empty_directory_string_counts_as_missing() {
        let resolved = resolve_doc(
            "[Settings]\nwork_mode = \"img2pdf\"\n[Settings.Directories]\ninput_dir = \"\"\n",
        )
        .unwrap();
        let f = &resolved.fallbacks[1];
        assert_eq!(f.key(), "Directories.input_dir");
        assert!(!f.is_invalid());
        assert_eq!(resolved.settings.directories.input_dir, PathBuf::from("input"));
    }

    #[test]
    fn non_table_section_is_ignored_with_tag() {
        let resolved = resolve_doc(
            "[Settings]\nwork_mode = \"img2pdf\"\nDirectories = \"elsewhere\"\n",
        )
        .unwrap();
        assert_eq!(invalid_keys(&resolved), vec!["Directories"]);
        assert_eq!(
            resolved.settings.directories,
            DirectoriesConfig::rooted_at("/ws")
        );
    }

    #[test]
    fn missing_config_file_is_reported() {
        let err = load_settings("/definitely/not/here/config.toml").unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { .. }));
    }
}
