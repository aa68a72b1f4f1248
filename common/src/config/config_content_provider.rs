use std::io::ErrorKind;
use std::path::PathBuf;

use super::ConfigError;

pub trait ConfigContentProvider {
    /// `Ok(None)` means there is no stored config yet.
    fn get_config_content(&self) -> Result<Option<String>, ConfigError>;
}

pub struct FileContentConfigProvider {
    file_path: PathBuf,
}

impl FileContentConfigProvider {
    pub fn new(file_path: impl Into<PathBuf>) -> Self {
        Self {
            file_path: file_path.into(),
        }
    }
}

impl ConfigContentProvider for FileContentConfigProvider {
    fn get_config_content(&self) -> Result<Option<String>, ConfigError> {
        match std::fs::read_to_string(&self.file_path) {
            Ok(content) => Ok(Some(content)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(ConfigError::Io {
                path: self.file_path.display().to_string(),
                source,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_means_no_content() {
        let provider = FileContentConfigProvider::new("does/not/exist/side_stacker.yaml");
        assert!(matches!(provider.get_config_content(), Ok(None)));
    }

    #[test]
    fn reads_existing_file() {
        let path =
            std::env::temp_dir().join(format!("side_stacker_cfg_{}.yaml", std::process::id()));
        std::fs::write(&path, "listen_addr: 127.0.0.1:4000\n").unwrap();
        let provider = FileContentConfigProvider::new(&path);
        let content = provider.get_config_content().unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(content.as_deref(), Some("listen_addr: 127.0.0.1:4000\n"));
    }
}
