use std::fs;
use std::path::{Path, PathBuf};

fn flag_path() -> PathBuf {
    let config_dir = dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("kitanime-tui");

    fs::create_dir_all(&config_dir).ok();
    config_dir.join("dark_mode")
}

/// The persisted dark-mode flag. Anything but the literal string "true"
/// (missing file included) reads as light mode.
pub fn load() -> bool {
    read_flag(&flag_path())
}

pub fn store(dark: bool) {
    write_flag(&flag_path(), dark);
}

fn read_flag(path: &Path) -> bool {
    fs::read_to_string(path)
        .map(|contents| contents.trim() == "true")
        .unwrap_or(false)
}

fn write_flag(path: &Path, dark: bool) {
    if let Err(err) = fs::write(path, if dark { "true" } else { "false" }) {
        log::error!("failed to persist theme flag: {err}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_flag(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("kitanime-tui-test-{name}"))
    }

    #[test]
    fn flag_round_trips() {
        let path = temp_flag("roundtrip");
        write_flag(&path, true);
        assert!(read_flag(&path));
        assert_eq!(fs::read_to_string(&path).unwrap(), "true");

        write_flag(&path, false);
        assert!(!read_flag(&path));
        assert_eq!(fs::read_to_string(&path).unwrap(), "false");

        fs::remove_file(&path).ok();
    }

    #[test]
    fn missing_or_garbled_flag_reads_light() {
        assert!(!read_flag(&temp_flag("missing")));

        let path = temp_flag("garbled");
        fs::write(&path, "maybe?").unwrap();
        assert!(!read_flag(&path));
        fs::remove_file(&path).ok();
    }
}
