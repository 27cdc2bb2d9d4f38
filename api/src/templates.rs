use std::path::{Path, PathBuf};
use tera::Tera;

/// Directories searched when `TEMPLATES_DIR` is unset: the workspace root
/// layout first, then the crate directory
const TEMPLATE_DIRS: [&str; 2] = ["api/templates", "templates"];

/// Locate the template directory relative to the working directory
pub fn resolve_template_dir(explicit: Option<PathBuf>) -> PathBuf {
    explicit.unwrap_or_else(|| {
        TEMPLATE_DIRS
            .iter()
            .map(PathBuf::from)
            .find(|dir| dir.is_dir())
            .unwrap_or_else(|| PathBuf::from(TEMPLATE_DIRS[0]))
    })
}

fn template_glob(dir: &Path) -> String {
    format!("{}/**/*.html", dir.display())
}

lazy_static::lazy_static! {
    pub static ref TEMPLATES: Tera = {
        let dir = resolve_template_dir(std::env::var_os("TEMPLATES_DIR").map(PathBuf::from));
        match Tera::new(&template_glob(&dir)) {
            Ok(t) => t,
            Err(e) => {
                tracing::error!(dir = %dir.display(), "Template parsing error: {}", e);
                std::process::exit(1);
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_template_dir_wins() {
        let dir = resolve_template_dir(Some(PathBuf::from("/srv/roster/templates")));
        assert_eq!(dir, PathBuf::from("/srv/roster/templates"));
        assert_eq!(template_glob(&dir), "/srv/roster/templates/**/*.html");
    }

    #[test]
    fn test_template_dir_found_from_working_directory() {
        let dir = resolve_template_dir(None);
        assert!(dir.is_relative());
        assert!(dir.join("base.html").is_file());
    }
}
