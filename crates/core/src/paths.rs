use std::path::{Path, PathBuf};

/// Storage slot holding the whole insight list.
pub const INSIGHTS_KEY: &str = "tubemind_insights_v1";

pub fn get_root_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("tubemind")
}

/// Get the file backing a storage slot
pub fn get_slot_path(data_dir: &Path, key: &str) -> PathBuf {
    data_dir.join(format!("{}.json", key))
}

/// Scratch file a slot is written to before being renamed into place
pub fn get_slot_tmp_path(data_dir: &Path, key: &str) -> PathBuf {
    data_dir.join(format!(".{}.json.tmp", key))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_paths_live_in_data_dir() {
        let dir = Path::new("/data");
        assert_eq!(
            get_slot_path(dir, INSIGHTS_KEY),
            PathBuf::from("/data/tubemind_insights_v1.json")
        );
        assert_eq!(get_slot_tmp_path(dir, INSIGHTS_KEY).parent(), Some(dir));
    }
}
