//! Generic parameters functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::de::DeserializeOwned;
use std::{fs::read_to_string, path::{Path, PathBuf}};
use thiserror::Error;
use toml;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// An error that occurs during loading of a parameter file.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Cannot determine the software root directory: {0}")]
    SwRootUnavailable(std::io::Error),

    #[error("Cannot load the parmeter file {0:?}: {1}")]
    FileLoadError(PathBuf, std::io::Error),

    #[error("Cannot read the parameter file {0:?}: {1}")]
    DeserialiseError(PathBuf, toml::de::Error)
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Get the default parameter directory, `<sw root>/params`.
pub fn default_params_dir() -> Result<PathBuf, LoadError> {
    let mut path = crate::host::get_sw_root()
        .map_err(LoadError::SwRootUnavailable)?;
    path.push("params");

    Ok(path)
}

/// Load a parameter file
///
/// The file path is relative to the "params" directory under the software root.
pub fn load<P>(param_file_path: &str) -> Result<P, LoadError> 
where
    P: DeserializeOwned
{
    load_from_dir(default_params_dir()?, param_file_path)
}

/// Load a parameter file from the given parameter directory.
pub fn load_from_dir<D, P>(params_dir: D, param_file_path: &str) -> Result<P, LoadError>
where
    D: AsRef<Path>,
    P: DeserializeOwned
{
    let path = params_dir.as_ref().join(param_file_path);

    // Load the file into a string
    let params_str = match read_to_string(&path) {
        Ok(s) => s,
        Err(e) => return Err(LoadError::FileLoadError(path, e))
    };

    // Parse the string into the parameter struct
    from_toml_str(&params_str).map_err(|e| LoadError::DeserialiseError(path, e))
}

/// Parse parameters from a TOML string.
pub fn from_toml_str<P>(params_str: &str) -> Result<P, toml::de::Error>
where
    P: DeserializeOwned
{
    toml::from_str(params_str)
}

#[cfg(test)]
mod test {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct TestParams {
        rate_hz: f64,
        #[serde(default)]
        name: String,
    }

    #[test]
    fn test_load_from_dir() {
        let dir = std::env::temp_dir().join(format!("util_params_test_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("test.toml"), "# comment\nrate_hz = 30.0\n").unwrap();

        let p: TestParams = load_from_dir(&dir, "test.toml").unwrap();
        assert_eq!(p, TestParams { rate_hz: 30.0, name: String::new() });

        match load_from_dir::<_, TestParams>(&dir, "missing.toml") {
            Err(LoadError::FileLoadError(..)) => (),
            r => panic!("Expected FileLoadError, got {:?}", r)
        }

        std::fs::write(dir.join("bad.toml"), "rate_hz = \"fast\"\n").unwrap();
        match load_from_dir::<_, TestParams>(&dir, "bad.toml") {
            Err(LoadError::DeserialiseError(..)) => (),
            r => panic!("Expected DeserialiseError, got {:?}", r)
        }

        std::fs::remove_dir_all(&dir).ok();
    }
}
