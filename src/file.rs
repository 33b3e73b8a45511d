use std::{
    env, io,
    path::{Path, PathBuf},
};

pub fn cwd() -> io::Result<PathBuf> { env::current_dir() }

pub fn make_relative(current: &Path, home: &Path) -> PathBuf {
    match current.strip_prefix(home) {
        Err(_) => current.to_path_buf(),
        Ok(relative_path) => Path::new("~").join(relative_path),
    }
}

pub struct Exists<'p> {
    path: &'p Path,
}

impl<'p> Exists<'p> {
    pub fn check(path: &'p Path) -> Self { Self { path } }
    pub fn folder(&self) -> bool { self.path.is_dir() }
    pub fn file(&self) -> bool { self.path.exists() }
}
