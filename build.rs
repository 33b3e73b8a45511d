use chrono::Datelike;
use std::{env, process::Command};

fn git_hash() -> String {
    match Command::new("git").args(["rev-parse", "--short=10", "HEAD"]).output() {
        Ok(output) if output.status.success() => String::from_utf8_lossy(&output.stdout).trim().to_string(),
        _ => String::new(),
    }
}

fn main() {
    let date = chrono::Utc::now();
    let profile = env::var("PROFILE").unwrap_or_else(|_| "debug".into());

    println!("cargo:rustc-env=GIT_HASH={}", git_hash());
    println!("cargo:rustc-env=BUILD_DATE={}-{:02}-{:02}", date.year(), date.month(), date.day());
    println!("cargo:rustc-env=PROFILE={profile}");

    println!("cargo:rerun-if-changed=build.rs");
}
