//! Build script for story-views.
//!
//! Rebuilds the crate when the embedded view-tracking migrations change.

fn main() {
    println!("cargo:rerun-if-changed=migrations");
}
