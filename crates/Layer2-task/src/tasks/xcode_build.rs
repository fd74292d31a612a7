//! xcode_build - build the app with xcodebuild
//!
//! Runs after `decorate_icon`. Whatever the outcome of the build, every
//! icon backup in the store is restored before the task returns, so the
//! icon directory ends up exactly as it was before the pipeline started.

use super::build_status::{build_exit_code, ExitStatusSource};
use crate::executor::{CommandOutput, CommandSpec, Executor};
use crate::store::BuildOutcome;
use crate::task::{Task, TaskContext, TaskId, TaskReport};
use async_trait::async_trait;
use buildkit_foundation::{
    assert_files_exist, assert_required_config, Config, ConfigKey, Error, Result, TaskOptions,
};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

const REQUIRED: [ConfigKey; 8] = [
    ConfigKey::AppName,
    ConfigKey::Workspace,
    ConfigKey::Sdk,
    ConfigKey::BuildConfiguration,
    ConfigKey::BuildDir,
    ConfigKey::Scheme,
    ConfigKey::CodeSign,
    ConfigKey::ProvisioningProfile,
];

const DEFAULT_PROGRAM: &str = "xcodebuild";

/// xcodebuild action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildAction {
    Clean,
    Build,
}

impl BuildAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            BuildAction::Clean => "clean",
            BuildAction::Build => "build",
        }
    }
}

/// `[tasks.xcode_build]` options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XcodeBuildOptions {
    /// Run `clean` before `build`
    pub clean: bool,

    /// Echo the build output at info level
    pub log: bool,

    /// Display filter fed the raw output on stdin, e.g. `xcpretty -c`
    pub formatter: Option<Vec<String>>,

    pub program: String,

    pub exit_status: ExitStatusSource,
}

impl Default for XcodeBuildOptions {
    fn default() -> Self {
        Self {
            clean: false,
            log: false,
            formatter: None,
            program: DEFAULT_PROGRAM.to_string(),
            exit_status: ExitStatusSource::Process,
        }
    }
}

impl XcodeBuildOptions {
    pub fn from_options(options: &TaskOptions) -> Result<Self> {
        let formatter = match options.string("formatter") {
            Some(line) => Some(shlex::split(line).filter(|argv| !argv.is_empty()).ok_or_else(
                || Error::Config(format!("cannot parse formatter command {:?}", line)),
            )?),
            None => None,
        };
        let exit_status = match options.string("exit_status") {
            Some(value) => value.parse()?,
            None => ExitStatusSource::default(),
        };

        Ok(Self {
            clean: options.flag("clean"),
            log: options.flag("log"),
            formatter,
            program: options
                .string("program")
                .unwrap_or(DEFAULT_PROGRAM)
                .to_string(),
            exit_status,
        })
    }
}

/// xcodebuild arguments for `action`, building into `build_dir`
pub fn xcodebuild_args(config: &Config, action: BuildAction, build_dir: &Path) -> Result<Vec<String>> {
    let workspace = config.require_path(ConfigKey::Workspace)?;
    Ok(vec![
        "-workspace".to_string(),
        workspace.to_string_lossy().into_owned(),
        "-sdk".to_string(),
        config.require_str(ConfigKey::Sdk)?.to_string(),
        "-scheme".to_string(),
        config.require_str(ConfigKey::Scheme)?.to_string(),
        "-configuration".to_string(),
        config.require_str(ConfigKey::BuildConfiguration)?.to_string(),
        format!("CODE_SIGN_IDENTITY={}", config.require_str(ConfigKey::CodeSign)?),
        format!(
            "PROVISIONING_PROFILE={}",
            config.require_str(ConfigKey::ProvisioningProfile)?
        ),
        format!("CONFIGURATION_BUILD_DIR={}", build_dir.display()),
        action.as_str().to_string(),
    ])
}

/// Builds the workspace and restores decorated icons afterwards
pub struct XcodeBuildTask {
    executor: Arc<dyn Executor>,
    options: XcodeBuildOptions,
    outcome: Option<BuildOutcome>,
    output: String,
}

impl XcodeBuildTask {
    pub fn new(executor: Arc<dyn Executor>, options: XcodeBuildOptions) -> Self {
        Self {
            executor,
            options,
            outcome: None,
            output: String::new(),
        }
    }

    async fn invoke(&self, config: &Config, action: BuildAction, build_dir: &Path) -> Result<CommandOutput> {
        let spec = CommandSpec::new(&self.options.program)
            .args(xcodebuild_args(config, action, build_dir)?)
            .current_dir(config.root());
        info!("xcodebuild {}", action.as_str());
        self.executor.execute(&spec).await
    }

    /// Optional clean, then build. The build runs even when the clean fails.
    async fn build(&self, config: &Config) -> Result<BuildRun> {
        let build_dir = config.require_path(ConfigKey::BuildDir)?;
        if !build_dir.exists() {
            debug!("Creating build directory {}", build_dir.display());
            std::fs::create_dir_all(&build_dir)?;
        }

        let clean = if self.options.clean {
            let clean = self.invoke(config, BuildAction::Clean, &build_dir).await?;
            if !clean.success() {
                warn!("xcodebuild clean exited with {:?}", clean.exit_code);
            }
            Some(clean)
        } else {
            None
        };

        let build = self.invoke(config, BuildAction::Build, &build_dir).await?;
        Ok(BuildRun { clean, build })
    }

    /// Raw output passed through the formatter, if one is configured and works
    async fn display_output(&self, raw: &str) -> String {
        let Some((program, args)) = self.options.formatter.as_ref().and_then(|f| f.split_first())
        else {
            return raw.to_string();
        };
        if !self.executor.is_available(program) {
            warn!("Formatter {} not found, showing raw output", program);
            return raw.to_string();
        }

        let spec = CommandSpec::new(program.as_str())
            .args(args.iter().cloned())
            .stdin(raw);
        match self.executor.execute(&spec).await {
            Ok(out) if out.success() => out.stdout,
            Ok(out) => {
                warn!("Formatter {} exited with {:?}", program, out.exit_code);
                raw.to_string()
            }
            Err(e) => {
                warn!("Formatter {} failed: {}", program, e);
                raw.to_string()
            }
        }
    }
}

/// Outputs of one build; only `build` decides the outcome
struct BuildRun {
    clean: Option<CommandOutput>,
    build: CommandOutput,
}

impl BuildRun {
    /// Clean and build output, for display
    fn combined(&self) -> String {
        match &self.clean {
            Some(clean) => join_output(&clean.combined, &self.build.combined),
            None => self.build.combined.clone(),
        }
    }
}

fn join_output(first: &str, second: &str) -> String {
    match (first.is_empty(), second.is_empty()) {
        (true, _) => second.to_string(),
        (_, true) => first.to_string(),
        _ => format!("{}\n{}", first, second),
    }
}

#[async_trait]
impl Task for XcodeBuildTask {
    fn id(&self) -> TaskId {
        TaskId::XCODE_BUILD
    }

    fn check_preconditions(&self, config: &Config) -> Result<()> {
        assert_required_config(&REQUIRED, config)?;
        let workspace = config.require_path(ConfigKey::Workspace)?;
        assert_files_exist(&[workspace])
    }

    async fn execute(&mut self, ctx: &mut TaskContext<'_>) -> Result<()> {
        let built = self.build(ctx.config).await;

        let pending = ctx.store.icon_backups.len();
        let restored = ctx.store.icon_backups.restore_all();
        let run = match (built, restored) {
            (Ok(run), Ok(count)) => {
                debug!("Restored {} original icons", count);
                run
            }
            (Ok(_), Err(e)) => {
                error!("Failed to restore original icons: {}", e);
                return Err(e);
            }
            (Err(e), restored) => {
                match restored {
                    Ok(count) => debug!("Restored {} of {} original icons", count, pending),
                    Err(restore_err) => {
                        error!("Failed to restore original icons: {}", restore_err)
                    }
                }
                return Err(e);
            }
        };

        let exit_code = build_exit_code(self.options.exit_status, &run.build);
        let outcome = BuildOutcome::from_exit_code(exit_code);
        if outcome.succeeded {
            info!("Build succeeded");
        } else {
            error!("Build failed with exit code {:?}", exit_code);
        }

        self.output = self.display_output(&run.combined()).await;
        if self.options.log {
            for line in self.output.lines() {
                info!("{}", line);
            }
        }

        self.outcome = Some(outcome);
        ctx.store.build = Some(outcome);
        Ok(())
    }

    fn report(&self, _ctx: &TaskContext<'_>) -> TaskReport {
        let summary = if self.outcome.map(|o| o.succeeded).unwrap_or(false) {
            "xcode_build completed, project built successfully"
        } else {
            "xcode_build completed, but the project failed to build"
        };
        TaskReport::new(summary, self.output.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config::new("/project")
            .with("app_name", "Demo")
            .with("workspace", "Demo.xcworkspace")
            .with("sdk", "iphoneos")
            .with("build_configuration", "Release")
            .with("build_dir", "build")
            .with("scheme", "Demo")
            .with("code_sign", "iPhone Distribution: Example")
            .with("provisioning_profile", "ABC-123")
    }

    #[test]
    fn test_xcodebuild_args() {
        let args =
            xcodebuild_args(&config(), BuildAction::Build, Path::new("/project/build")).unwrap();
        assert_eq!(
            args,
            vec![
                "-workspace",
                "/project/Demo.xcworkspace",
                "-sdk",
                "iphoneos",
                "-scheme",
                "Demo",
                "-configuration",
                "Release",
                "CODE_SIGN_IDENTITY=iPhone Distribution: Example",
                "PROVISIONING_PROFILE=ABC-123",
                "CONFIGURATION_BUILD_DIR=/project/build",
                "build",
            ]
        );
    }

    #[test]
    fn test_options_defaults() {
        let opts = XcodeBuildOptions::from_options(&TaskOptions::new()).unwrap();
        assert_eq!(opts, XcodeBuildOptions::default());
        assert_eq!(opts.program, "xcodebuild");
    }

    #[test]
    fn test_options_parsing() {
        let opts = XcodeBuildOptions::from_options(
            &TaskOptions::new()
                .with("clean", true)
                .with("formatter", "xcpretty -c --no-utf")
                .with("exit_status", "marker")
                .with("program", "./scripts/build.sh"),
        )
        .unwrap();
        assert!(opts.clean);
        assert!(!opts.log);
        assert_eq!(
            opts.formatter,
            Some(vec!["xcpretty".to_string(), "-c".to_string(), "--no-utf".to_string()])
        );
        assert_eq!(opts.exit_status, ExitStatusSource::Marker);
        assert_eq!(opts.program, "./scripts/build.sh");
    }

    #[test]
    fn test_invalid_options() {
        assert!(XcodeBuildOptions::from_options(
            &TaskOptions::new().with("exit_status", "guess")
        )
        .is_err());
        assert!(XcodeBuildOptions::from_options(
            &TaskOptions::new().with("formatter", "xcpretty \"-c")
        )
        .is_err());
    }

    #[test]
    fn test_preconditions_name_every_missing_key() {
        let task = XcodeBuildTask::new(
            Arc::new(crate::executor::LocalExecutor::new()),
            XcodeBuildOptions::default(),
        );
        let config = Config::new("/project").with("app_name", "Demo");

        match task.check_preconditions(&config) {
            Err(Error::MissingConfig { keys }) => assert_eq!(keys.len(), 7),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_join_output() {
        assert_eq!(join_output("", "b"), "b");
        assert_eq!(join_output("a", ""), "a");
        assert_eq!(join_output("a", "b"), "a\nb");
    }
}
