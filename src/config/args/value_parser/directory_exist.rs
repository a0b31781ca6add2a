use std::path::PathBuf;

pub fn is_directory_exist(dir_path: &str) -> Result<String, String> {
    let dir_path = PathBuf::from(dir_path);

    if dir_path.is_dir() {
        Ok(dir_path.to_string_lossy().to_string())
    } else {
        Err(format!("directory not found: {}", dir_path.display()))
    }
}
