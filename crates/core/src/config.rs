use debugtoggle_plugin::PluginError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use toml_edit::{value, DocumentMut};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Syntax(#[from] toml_edit::TomlError),
    #[error(transparent)]
    Invalid(#[from] toml::de::Error),
}

/// A config load failure, together with the file it happened in.
#[derive(Debug)]
pub struct ConfigLoadError {
    pub path: PathBuf,
    pub source: ConfigError,
}

impl From<ConfigLoadError> for PluginError {
    fn from(err: ConfigLoadError) -> Self {
        PluginError::Config {
            path: err.path,
            source: Box::new(err.source),
        }
    }
}

trait ConfigSerializeDefault {
    fn fix_config(self, name: &str, doc: &mut DocumentMut);
}

macro_rules! impl_simple_default {
    ( $( $type:ty ),* ) => {
        $(
            impl ConfigSerializeDefault for $type {
                fn fix_config(self, name: &str, doc: &mut DocumentMut) {
                    doc.entry(name).or_insert_with(|| value(self));
                }
            }
        )*
    }
}

impl_simple_default!(String, bool);

macro_rules! gen_config {
    (
        $( $name:ident: $type:ty = $default:expr),*
    ) => {
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        pub struct PluginConfig {
            $(
                pub $name: $type,
            )*
        }

        impl Default for PluginConfig {
            fn default() -> PluginConfig {
                PluginConfig {
                    $(
                        $name: $default,
                    )*
                }
            }
        }

        impl PluginConfig {
            /// Parses `src`, filling in every missing key with its default. Returns the
            /// config and the patched document text.
            pub fn from_toml(src: &str) -> Result<(PluginConfig, String), ConfigError> {
                let mut doc = src.parse::<DocumentMut>()?;

                $(
                    <$type as ConfigSerializeDefault>::fix_config($default, stringify!($name), &mut doc);
                )*

                let patched = doc.to_string();
                let config = toml::from_str(&patched)?;
                Ok((config, patched))
            }
        }
    };
}

gen_config! {
    debug_command: String = "/debug".to_string(),
    forget_on_quit: bool = false,
    log_block_events: bool = true,
    announce_on_join: bool = false
}

impl PluginConfig {
    /// Loads the config at `path`. A missing file is created with the defaults and
    /// missing keys are written back to the file.
    pub fn load(path: &Path) -> Result<PluginConfig, ConfigLoadError> {
        Self::load_inner(path).map_err(|source| ConfigLoadError {
            path: path.to_owned(),
            source,
        })
    }

    fn load_inner(path: &Path) -> Result<PluginConfig, ConfigError> {
        let str = match fs::read_to_string(path) {
            Ok(str) => str,
            Err(err) if err.kind() == io::ErrorKind::NotFound => String::new(),
            Err(err) => return Err(err.into()),
        };
        let (config, patched) = PluginConfig::from_toml(&str)?;

        if str != patched {
            let mut file = fs::OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(path)?;
            write!(file, "{}", patched)?;
        }

        Ok(config)
    }
}
