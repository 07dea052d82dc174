use std::{fs, path::PathBuf};

use crate::model::GameType;
use crate::prefill::Fixture;

/// # Errors
///
/// Will return `Err` if any of the ';'-separated files is not readable
pub fn check_readable_file(file: &str) -> Result<String, String> {
    for part in file.split(';') {
        let path = PathBuf::from(part);
        if !path.is_file() || fs::metadata(&path).is_err() {
            return Err(format!("The sql startup script '{part}' is not readable."));
        }
    }
    Ok(file.to_string())
}

/// # Errors
///
/// Will return `Err` if the file is not readable or is not a valid fixture
pub fn check_readable_file_and_json(file: &str) -> Result<Fixture, String> {
    let path = PathBuf::from(file);
    if !path.is_file() {
        return Err(format!("The json file '{file}' is not readable."));
    }
    let contents = fs::read_to_string(&path)
        .map_err(|e| format!("The json file '{file}' is not readable: {e}"))?;
    Fixture::from_json_str(&contents)
        .map_err(|e| format!("The json file '{file}' is not in the correct format: {e}"))
}

/// # Errors
///
/// Will return `Err` for a name that is not one of the four game types
pub fn check_game_type(name: &str) -> Result<GameType, String> {
    name.parse::<GameType>().map_err(|e| e.to_string())
}

/// Concatenate the ';'-separated startup scripts in order.
///
/// # Errors
///
/// Will return `Err` if a file cannot be read
pub fn combine_sql_scripts(files: &str) -> Result<String, String> {
    files
        .split(';')
        .map(|file| {
            fs::read_to_string(file).map_err(|e| format!("Failed to read '{file}': {e}"))
        })
        .collect::<Result<Vec<_>, _>>()
        .map(|scripts| scripts.join("\n"))
}
