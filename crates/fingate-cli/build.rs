use std::time::{SystemTime, UNIX_EPOCH};

fn main() {
    // Reference time for the "Set RTC Time" menu item.
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    println!("cargo:rustc-env=FINGATE_BUILD_EPOCH={}", secs);
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=src");
}
