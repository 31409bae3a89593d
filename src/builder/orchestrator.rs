//! The orchestrator: target registration, step expansion, and the
//! execution pipeline.
//!
//! Registration expands every target into compile steps plus at most one
//! link or archive step, wiring DAG edges as it goes. `run` executes
//! pre-hooks, the steps in topological order with freshness skipping,
//! and post-hooks, and reports the outcome.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::time::Instant;

use tracing::{debug, error, info, warn};

use crate::builder::depfile;
use crate::builder::hooks::{CompileCommandsHook, Hook, HookContext, SelfRebuildHook};
use crate::builder::step::{self, BuildStep, StepKind};
use crate::core::target::{detect_language, Language, LinkObject, SourceFile, Target, TargetKind};
use crate::core::toolchain::Toolchain;
use crate::graph::{Dag, NodeId};
use crate::util::fs::{ensure_dir, normalize_path, read_dir_sorted};
use crate::util::process::{Runner, SystemRunner};

/// Outcome of one pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildResult {
    /// Number of steps in the DAG (0 when the run was refused).
    pub total: usize,
    pub completed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub duration_secs: f64,
    pub success: bool,
}

/// Holds targets, steps, and hooks, and drives the build pipeline.
pub struct Orchestrator {
    dag: Dag,
    targets: Vec<Target>,
    steps: Vec<BuildStep>,
    pre_hooks: Vec<Box<dyn Hook>>,
    post_hooks: Vec<Box<dyn Hook>>,

    /// Output path -> step id, populated at step creation.
    output_index: HashMap<PathBuf, NodeId>,

    build_dir: PathBuf,
    config_file: PathBuf,
    toolchain: Toolchain,
    runner: Box<dyn Runner>,

    /// The argv this process was started with; the self-rebuild hook
    /// re-invokes it after replacing the binary.
    argv: Vec<String>,

    init_time: Instant,
    stop_on_error: bool,
    verbose: bool,
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new()
    }
}

impl Orchestrator {
    /// Create an orchestrator backed by the real process executor, with
    /// the default toolchain, build directory `build`, configuration file
    /// `build.c`, and the self-rebuild pre-hook installed.
    pub fn new() -> Self {
        Self::with_runner(Box::new(SystemRunner))
    }

    /// Create an orchestrator with a custom process executor.
    pub fn with_runner(runner: Box<dyn Runner>) -> Self {
        let mut orchestrator = Orchestrator {
            dag: Dag::new(),
            targets: Vec::new(),
            steps: Vec::new(),
            pre_hooks: Vec::new(),
            post_hooks: Vec::new(),
            output_index: HashMap::new(),
            build_dir: PathBuf::from("build"),
            config_file: PathBuf::from("build.c"),
            toolchain: Toolchain::default(),
            runner,
            argv: std::env::args().collect(),
            init_time: Instant::now(),
            stop_on_error: true,
            verbose: false,
        };
        orchestrator.add_pre_hook(Box::new(SelfRebuildHook::default()));
        orchestrator
    }

    pub fn set_build_dir(&mut self, dir: impl Into<PathBuf>) {
        self.build_dir = dir.into();
    }

    pub fn set_config_file(&mut self, path: impl AsRef<Path>) {
        self.config_file = normalize_path(path.as_ref());
    }

    pub fn set_toolchain(&mut self, toolchain: Toolchain) {
        self.toolchain = toolchain;
    }

    pub fn set_c_compiler(&mut self, cc: impl Into<String>) {
        self.toolchain.c_compiler = cc.into();
    }

    pub fn set_cxx_compiler(&mut self, cxx: impl Into<String>) {
        self.toolchain.cxx_compiler = cxx.into();
    }

    pub fn set_assembler(&mut self, assembler: impl Into<String>) {
        self.toolchain.assembler = assembler.into();
    }

    pub fn set_archiver(&mut self, archiver: impl Into<String>) {
        self.toolchain.archiver = archiver.into();
    }

    pub fn set_linker(&mut self, linker: impl Into<String>) {
        self.toolchain.linker = linker.into();
    }

    pub fn set_objcopy(&mut self, objcopy: impl Into<String>) {
        self.toolchain.objcopy = objcopy.into();
    }

    pub fn set_size(&mut self, size: impl Into<String>) {
        self.toolchain.size = size.into();
    }

    pub fn set_stop_on_error(&mut self, stop: bool) {
        self.stop_on_error = stop;
    }

    pub fn set_verbose(&mut self, verbose: bool) {
        self.verbose = verbose;
    }

    /// Override the argv handed to the self-rebuild hook.
    pub fn set_argv(&mut self, argv: Vec<String>) {
        self.argv = argv;
    }

    pub fn build_dir(&self) -> &Path {
        &self.build_dir
    }

    pub fn config_file(&self) -> &Path {
        &self.config_file
    }

    pub fn toolchain(&self) -> &Toolchain {
        &self.toolchain
    }

    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    pub fn steps(&self) -> &[BuildStep] {
        &self.steps
    }

    /// Append a pre-hook; pre-hooks run in insertion order before the DAG.
    pub fn add_pre_hook(&mut self, hook: Box<dyn Hook>) {
        self.pre_hooks.push(hook);
    }

    /// Append a post-hook; post-hooks run in insertion order after the
    /// DAG, and only when no step failed.
    pub fn add_post_hook(&mut self, hook: Box<dyn Hook>) {
        self.post_hooks.push(hook);
    }

    /// Remove the default self-rebuild pre-hook. Intended for embedders
    /// that manage their own binary lifecycle.
    pub fn disable_self_rebuild(&mut self) {
        self.pre_hooks.retain(|hook| hook.name() != "self-rebuild");
    }

    /// Look up the step that produces `path`.
    pub fn step_for_output(&self, path: &Path) -> Option<&BuildStep> {
        self.output_index
            .get(&normalize_path(path))
            .map(|&id| &self.steps[id])
    }

    /// Register a target: enumerate its source directories, expand it
    /// into steps, and wire the DAG.
    ///
    /// Targets referenced through `link_target` must already be
    /// registered, otherwise no dependency edge is created.
    pub fn add_target(&mut self, mut target: Target) {
        debug_assert!(!target.name.is_empty(), "target name must be non-empty");
        debug_assert!(
            !target.output_name.is_empty(),
            "target output name must be non-empty"
        );

        self.expand_source_dirs(&mut target);

        let target_index = self.targets.len();
        let mut compile_ids: Vec<NodeId> = Vec::new();
        let mut link_language = Language::C;

        for source in &target.sources {
            let language = match source.language {
                Language::Auto | Language::Unknown => detect_language(&source.path),
                explicit => explicit,
            };
            if language == Language::Cxx {
                link_language = Language::Cxx;
            }

            let stem = self
                .build_dir
                .join(&target.artifacts_dir)
                .join(strip_root(&source.path));
            let output = normalize_path(&append_suffix(&stem, "o"));
            let dep_path = normalize_path(&append_suffix(&stem, "d"));

            let command = step::compile_command(
                &self.toolchain,
                &target,
                source,
                language,
                &source.path,
                &output,
            );

            let id = self.dag.add_node();
            let step = BuildStep {
                id,
                kind: StepKind::Compile,
                name: source
                    .path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| source.path.display().to_string()),
                target_index,
                language,
                inputs: vec![source.path.clone()],
                output: output.clone(),
                dep_path: target.emit_deps.then(|| dep_path.clone()),
                header_deps: depfile::parse(&dep_path),
                command,
                dirty: true,
                completed: false,
                result: None,
            };

            self.output_index.insert(output, id);
            self.steps.push(step);
            compile_ids.push(id);
        }

        let database_output = self
            .build_dir
            .join(&target.artifacts_dir)
            .join("compile_commands.json");
        let database_inputs: Vec<PathBuf> =
            target.sources.iter().map(|s| s.path.clone()).collect();
        self.add_post_hook(Box::new(CompileCommandsHook::new(
            compile_ids.clone(),
            database_inputs,
            database_output,
        )));

        if let Some(artifact) = target.artifact_path(&self.build_dir) {
            let artifact = normalize_path(&artifact);
            let inputs: Vec<PathBuf> = compile_ids
                .iter()
                .map(|&id| self.steps[id].output.clone())
                .collect();

            let (kind, language, command) = match target.kind {
                TargetKind::StaticLib => (
                    StepKind::Archive,
                    Language::C,
                    step::archive_command(&self.toolchain, &inputs, &artifact),
                ),
                _ => (
                    StepKind::Link,
                    link_language,
                    step::link_command(
                        &self.toolchain,
                        &target,
                        &self.targets,
                        &self.build_dir,
                        link_language,
                        &inputs,
                        &artifact,
                    ),
                ),
            };

            let id = self.dag.add_node();
            for &compile_id in &compile_ids {
                self.dag.add_edge(id, compile_id);
            }

            // Cross-target edges: the output step depends on each linked
            // target's output step, resolved through the output index.
            for obj in &target.link_objects {
                let LinkObject::Target(dep_name) = obj else {
                    continue;
                };
                let dep_output = self
                    .targets
                    .iter()
                    .find(|t| t.name == *dep_name)
                    .and_then(|dep| dep.artifact_path(&self.build_dir))
                    .map(|path| normalize_path(&path));
                match dep_output.and_then(|path| self.output_index.get(&path).copied()) {
                    Some(dep_id) => self.dag.add_edge(id, dep_id),
                    None => warn!(
                        "target '{}' links '{}', which is not registered yet; no build-order edge",
                        target.name, dep_name
                    ),
                }
            }

            let step = BuildStep {
                id,
                kind,
                name: target.name.clone(),
                target_index,
                language,
                inputs,
                output: artifact.clone(),
                dep_path: None,
                header_deps: Vec::new(),
                command,
                dirty: true,
                completed: false,
                result: None,
            };

            self.output_index.insert(artifact, id);
            self.steps.push(step);
        }

        self.targets.push(target);
    }

    /// Enumerate each source directory (non-recursively, sorted by name)
    /// and append every file with a recognized extension to the target's
    /// sources. Unreadable directories are skipped with a warning.
    fn expand_source_dirs(&self, target: &mut Target) {
        let mut found: Vec<SourceFile> = Vec::new();
        for dir in &target.source_dirs {
            let entries = match read_dir_sorted(dir) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!("skipping source directory {}: {:#}", dir.display(), e);
                    continue;
                }
            };
            for path in entries {
                let language = detect_language(&path);
                if language != Language::Unknown {
                    found.push(SourceFile {
                        path,
                        language,
                        flags: Vec::new(),
                    });
                }
            }
        }
        target.sources.extend(found);
    }

    /// Run the pipeline: pre-hooks, the DAG in topological order, then
    /// post-hooks (skipped entirely if any step failed).
    pub fn run(&mut self) -> BuildResult {
        let total = self.steps.len();
        let mut completed = 0;
        let mut failed = 0;
        let mut skipped = 0;

        for hook in &self.pre_hooks {
            let ctx = HookContext {
                config_file: &self.config_file,
                build_dir: &self.build_dir,
                toolchain: &self.toolchain,
                argv: &self.argv,
                runner: self.runner.as_ref(),
                steps: &self.steps,
            };
            if hook.needs_rebuild(&ctx) {
                debug!("Running pre-hook '{}'", hook.name());
                if let Err(e) = hook.run(&ctx).and_then(|_| hook.on_complete(&ctx)) {
                    error!("pre-hook '{}' failed: {:#}", hook.name(), e);
                    failed += 1;
                    return self.finish(total, completed, failed, skipped);
                }
            } else {
                debug!("Skipping pre-hook '{}'", hook.name());
            }
        }

        let order = match self.dag.topo_sort() {
            Ok(order) => order,
            Err(_) => {
                error!("Dependency cycle detected");
                return BuildResult {
                    total: 0,
                    completed: 0,
                    failed: 0,
                    skipped: 0,
                    duration_secs: self.init_time.elapsed().as_secs_f64(),
                    success: false,
                };
            }
        };

        for id in order {
            let step = &mut self.steps[id];
            if step.completed || !step.needs_rebuild() {
                skipped += 1;
                continue;
            }

            if let Some(parent) = step.output.parent() {
                if let Err(e) = ensure_dir(parent) {
                    error!("[{}] {}: {:#}", step.kind_label(), step.name, e);
                    failed += 1;
                    if self.stop_on_error {
                        break;
                    }
                    continue;
                }
            }

            if self.verbose {
                info!("[{}] {}", step.kind_label(), step.name);
                info!("{}", step.command.display_command());
            }

            match self.runner.run(&step.command) {
                Ok(output) if output.success() => {
                    step.result = Some(output);
                    step.completed = true;
                    step.dirty = false;
                    completed += 1;
                }
                Ok(output) => {
                    error!(
                        "[{}] {} failed (exit {:?}):\n{}",
                        step.kind_label(),
                        step.name,
                        output.exit_code,
                        output.stderr
                    );
                    step.result = Some(output);
                    failed += 1;
                    if self.stop_on_error {
                        break;
                    }
                }
                Err(e) => {
                    error!("[{}] {} failed: {}", step.kind_label(), step.name, e);
                    failed += 1;
                    if self.stop_on_error {
                        break;
                    }
                }
            }
        }

        if failed == 0 {
            for hook in &self.post_hooks {
                let ctx = HookContext {
                    config_file: &self.config_file,
                    build_dir: &self.build_dir,
                    toolchain: &self.toolchain,
                    argv: &self.argv,
                    runner: self.runner.as_ref(),
                    steps: &self.steps,
                };
                if hook.needs_rebuild(&ctx) {
                    debug!("Running post-hook '{}'", hook.name());
                    if let Err(e) = hook.run(&ctx).and_then(|_| hook.on_complete(&ctx)) {
                        error!("post-hook '{}' failed: {:#}", hook.name(), e);
                        failed += 1;
                        if self.stop_on_error {
                            break;
                        }
                    }
                } else {
                    debug!("Skipping post-hook '{}'", hook.name());
                }
            }
        }

        self.finish(total, completed, failed, skipped)
    }

    fn finish(&self, total: usize, completed: usize, failed: usize, skipped: usize) -> BuildResult {
        let duration_secs = self.init_time.elapsed().as_secs_f64();
        let success = failed == 0;

        if success {
            info!("Build succeeded: {} completed, {} skipped", completed, skipped);
        } else {
            error!(
                "Build failed: {} completed, {} failed, {} skipped",
                completed, failed, skipped
            );
        }
        info!("Took {:.2}s", duration_secs);

        BuildResult {
            total,
            completed,
            failed,
            skipped,
            duration_secs,
            success,
        }
    }
}

/// `main.c` -> `main.c.o`-style naming: the suffix is appended after the
/// existing extension rather than replacing it.
fn append_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}

/// Drop the root so an absolute source path nests under the artifacts
/// directory instead of escaping it.
fn strip_root(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::RootDir | Component::Prefix(_)))
        .collect()
}
