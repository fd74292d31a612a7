//! BuildKit init command
//!
//! Writes a starter project file next to the Xcode workspace.

use std::fs;
use std::path::Path;

const TEMPLATE: &str = r#"# BuildKit project file
# Relative paths resolve against this file's directory.
# Any [config] key can be overridden with BUILDKIT_<KEY>, e.g. BUILDKIT_SCHEME.

[config]
app_name = "MyApp"
info_plist = "MyApp/Info.plist"
icon_dir = "MyApp/Images.xcassets/AppIcon.appiconset"
workspace = "MyApp.xcworkspace"
scheme = "MyApp"
sdk = "iphoneos"
build_configuration = "Release"
build_dir = "build"
code_sign = "iPhone Distribution"
provisioning_profile = ""

[pipeline]
tasks = ["increment_version", "decorate_icon", "xcode_build"]

[tasks.xcode_build]
clean = false
log = false
# formatter = "xcpretty -c"
# exit_status = "process"
"#;

/// Write the starter project file at `path`
pub fn init_project(path: &Path, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        println!("✓ {} already exists.", path.display());
        println!("  Use --force to overwrite it.");
        return Ok(());
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, TEMPLATE)?;

    println!("✓ Created {}", path.display());
    println!("  Fill in the [config] values, then run `buildkit check`.");
    Ok(())
}
