//! Build steps: one unit of work in the DAG.
//!
//! A step carries its fully formed command, its inputs and single output,
//! and a kind-specific freshness policy. The three kinds form a closed
//! set, so the policy is a match on the kind rather than a trait object.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::core::target::{Language, LinkObject, SourceFile, Target, TargetKind};
use crate::core::toolchain::Toolchain;
use crate::graph::NodeId;
use crate::util::fs::{file_exists, file_is_newer};
use crate::util::process::{ExecOutput, ProcessCommand};

/// What a step does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    Compile,
    Archive,
    Link,
}

/// One unit of work produced from a target.
#[derive(Debug)]
pub struct BuildStep {
    /// DAG node id; also the step's index in the orchestrator's step table.
    pub id: NodeId,

    pub kind: StepKind,

    /// Short display name: source basename for compiles, target name otherwise.
    pub name: String,

    /// Index of the owning target in the orchestrator's target table.
    pub target_index: usize,

    /// Language driving the command (compiler/link driver selection).
    pub language: Language,

    /// Input paths. Compile steps have exactly one; link and archive
    /// steps carry the owning target's compile outputs in declaration order.
    pub inputs: Vec<PathBuf>,

    /// The single output path.
    pub output: PathBuf,

    /// Where the compiler writes the depfile, for compile steps with
    /// dependency emission enabled.
    pub dep_path: Option<PathBuf>,

    /// Header dependencies parsed from the previous run's depfile.
    pub header_deps: Vec<PathBuf>,

    /// The command to execute.
    pub command: ProcessCommand,

    pub dirty: bool,
    pub completed: bool,

    /// Process outcome after execution.
    pub result: Option<ExecOutput>,
}

impl BuildStep {
    /// Kind label used in step log headers.
    pub fn kind_label(&self) -> &'static str {
        match self.kind {
            StepKind::Compile => "COMPILE",
            StepKind::Archive => "ARCHIVE",
            StepKind::Link => "LINK",
        }
    }

    /// Decide whether this step must run.
    ///
    /// Every kind rebuilds when the output is missing or any input is
    /// newer than it. Compile steps additionally rebuild when a header
    /// from the previous run's depfile is newer than the output.
    pub fn needs_rebuild(&self) -> bool {
        if !file_exists(&self.output) {
            return true;
        }

        if self.inputs.iter().any(|input| file_is_newer(input, &self.output)) {
            return true;
        }

        if self.kind == StepKind::Compile {
            return self
                .header_deps
                .iter()
                .any(|dep| file_is_newer(dep, &self.output));
        }

        false
    }
}

/// Build the argv for a compile step.
///
/// Canonical order: program, preprocessor flags, language flags,
/// optimization, includes, defines, -fPIC for shared libraries, -MMD when
/// emitting deps, per-file flags, then `-c input -o output`.
pub(crate) fn compile_command(
    toolchain: &Toolchain,
    target: &Target,
    source: &SourceFile,
    language: Language,
    input: &Path,
    output: &Path,
) -> ProcessCommand {
    let mut cmd = ProcessCommand::new(toolchain.compiler_for(language));

    cmd = cmd.args(target.cpp_flags.iter().cloned());

    let lang_flags = if language == Language::Cxx {
        &target.cxx_flags
    } else {
        &target.c_flags
    };
    cmd = cmd.args(lang_flags.iter().cloned());

    cmd = cmd.arg(target.optimize.as_flag());

    for inc in &target.include_dirs {
        cmd = cmd.arg(inc.as_flag());
    }

    for def in &target.defines {
        cmd = cmd.arg(format!("-D{}", def));
    }

    if target.kind == TargetKind::SharedLib {
        cmd = cmd.arg("-fPIC");
    }

    if target.emit_deps {
        cmd = cmd.arg("-MMD");
    }

    cmd = cmd.args(source.flags.iter().cloned());

    cmd.arg("-c")
        .arg(input.display().to_string())
        .arg("-o")
        .arg(output.display().to_string())
}

/// Build the argv for a link step.
///
/// Canonical order: program, -shared for shared libraries, inputs,
/// `-o output`, library search paths, link objects, the pie/lto/strip
/// toggles, then user link flags.
pub(crate) fn link_command(
    toolchain: &Toolchain,
    target: &Target,
    registered: &[Target],
    build_dir: &Path,
    language: Language,
    inputs: &[PathBuf],
    output: &Path,
) -> ProcessCommand {
    let mut cmd = ProcessCommand::new(toolchain.linker_for(language));

    if target.kind == TargetKind::SharedLib {
        cmd = cmd.arg("-shared");
    }

    for input in inputs {
        cmd = cmd.arg(input.display().to_string());
    }

    cmd = cmd.arg("-o").arg(output.display().to_string());

    for path in &target.lib_paths {
        cmd = cmd.arg(format!("-L{}", path.display()));
    }

    let mut in_progress = HashSet::new();
    for obj in &target.link_objects {
        match obj {
            LinkObject::SystemLib(name) => {
                cmd = cmd.arg(format!("-l{}", name));
            }
            LinkObject::Framework(name) => {
                cmd = cmd.arg("-framework").arg(name.clone());
            }
            LinkObject::StaticPath(path)
            | LinkObject::SharedPath(path)
            | LinkObject::ObjectFile(path) => {
                cmd = cmd.arg(path.display().to_string());
            }
            LinkObject::Target(name) => {
                // The DAG handles build ordering; here we emit the library
                // and its transitive target dependencies.
                cmd = add_target_libs(cmd, name, registered, build_dir, &mut in_progress);
            }
        }
    }

    if target.pie {
        cmd = cmd.arg("-pie");
    }
    if target.lto {
        cmd = cmd.arg("-flto");
    }
    if target.strip {
        cmd = cmd.arg("-s");
    }

    cmd.args(target.link_flags.iter().cloned())
}

/// Recursively append a target's artifact and those of its transitive
/// target dependencies. `in_progress` breaks reference cycles.
fn add_target_libs(
    mut cmd: ProcessCommand,
    name: &str,
    registered: &[Target],
    build_dir: &Path,
    in_progress: &mut HashSet<String>,
) -> ProcessCommand {
    if !in_progress.insert(name.to_string()) {
        return cmd;
    }

    let Some(dep) = registered.iter().find(|t| t.name == name) else {
        tracing::warn!("link target '{}' is not registered; skipping", name);
        in_progress.remove(name);
        return cmd;
    };

    if let Some(path) = dep.artifact_path(build_dir) {
        cmd = cmd.arg(path.display().to_string());
    }

    for obj in &dep.link_objects {
        if let LinkObject::Target(dep_name) = obj {
            cmd = add_target_libs(cmd, dep_name, registered, build_dir, in_progress);
        }
    }

    in_progress.remove(name);
    cmd
}

/// Build the argv for an archive step: `archiver rcs output inputs..`.
pub(crate) fn archive_command(
    toolchain: &Toolchain,
    inputs: &[PathBuf],
    output: &Path,
) -> ProcessCommand {
    let archiver = if toolchain.archiver.is_empty() {
        "ar"
    } else {
        toolchain.archiver.as_str()
    };

    let mut cmd = ProcessCommand::new(archiver)
        .arg("rcs")
        .arg(output.display().to_string());

    for input in inputs {
        cmd = cmd.arg(input.display().to_string());
    }
    cmd
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use filetime::{set_file_mtime, FileTime};
    use tempfile::TempDir;

    fn source(path: &str) -> SourceFile {
        SourceFile {
            path: PathBuf::from(path),
            language: Language::Auto,
            flags: Vec::new(),
        }
    }

    #[test]
    fn test_compile_command_canonical_order() {
        let mut target = Target::executable("app");
        target
            .add_cpp_flag("-DPREP")
            .add_c_flag("-Wall")
            .add_include("include")
            .add_define("NDEBUG");

        let cmd = compile_command(
            &Toolchain::default(),
            &target,
            &source("main.c"),
            Language::C,
            Path::new("main.c"),
            Path::new("build/bin/main.c.o"),
        );

        assert_eq!(cmd.program, "gcc");
        assert_eq!(
            cmd.args,
            vec![
                "-DPREP",
                "-Wall",
                "-Og",
                "-Iinclude",
                "-DNDEBUG",
                "-MMD",
                "-c",
                "main.c",
                "-o",
                "build/bin/main.c.o"
            ]
        );
    }

    #[test]
    fn test_compile_command_cxx_flags_and_compiler() {
        let mut target = Target::executable("app");
        target.add_c_flag("-Wall").add_cxx_flag("-std=c++17");

        let cmd = compile_command(
            &Toolchain::default(),
            &target,
            &source("main.cpp"),
            Language::Cxx,
            Path::new("main.cpp"),
            Path::new("build/bin/main.cpp.o"),
        );

        assert_eq!(cmd.program, "g++");
        assert!(cmd.args.contains(&"-std=c++17".to_string()));
        assert!(!cmd.args.contains(&"-Wall".to_string()));
    }

    #[test]
    fn test_compile_command_shared_lib_pic() {
        let target = Target::shared_lib("core");
        let cmd = compile_command(
            &Toolchain::default(),
            &target,
            &source("core.c"),
            Language::C,
            Path::new("core.c"),
            Path::new("build/bin/core.c.o"),
        );
        assert!(cmd.args.contains(&"-fPIC".to_string()));
    }

    #[test]
    fn test_compile_command_no_mmd_when_deps_disabled() {
        let mut target = Target::executable("app");
        target.emit_deps = false;
        let cmd = compile_command(
            &Toolchain::default(),
            &target,
            &source("main.c"),
            Language::C,
            Path::new("main.c"),
            Path::new("out.o"),
        );
        assert!(!cmd.args.contains(&"-MMD".to_string()));
    }

    #[test]
    fn test_compile_command_per_file_flags_before_input() {
        let target = Target::executable("app");
        let src = SourceFile {
            path: PathBuf::from("simd.c"),
            language: Language::C,
            flags: vec!["-mavx2".to_string()],
        };

        let cmd = compile_command(
            &Toolchain::default(),
            &target,
            &src,
            Language::C,
            Path::new("simd.c"),
            Path::new("out.o"),
        );

        let avx = cmd.args.iter().position(|a| a == "-mavx2").unwrap();
        let dash_c = cmd.args.iter().position(|a| a == "-c").unwrap();
        assert!(avx < dash_c);
    }

    #[test]
    fn test_link_command_executable() {
        let mut target = Target::executable("app");
        target
            .add_lib_path("/opt/lib")
            .link_system_lib("m")
            .add_link_flag("-Wl,--as-needed");

        let inputs = vec![PathBuf::from("build/bin/main.c.o")];
        let cmd = link_command(
            &Toolchain::default(),
            &target,
            &[],
            Path::new("build"),
            Language::C,
            &inputs,
            Path::new("build/bin/app"),
        );

        assert_eq!(cmd.program, "gcc");
        assert_eq!(
            cmd.args,
            vec![
                "build/bin/main.c.o",
                "-o",
                "build/bin/app",
                "-L/opt/lib",
                "-lm",
                "-pie",
                "-Wl,--as-needed"
            ]
        );
    }

    #[test]
    fn test_link_command_shared_flag_first() {
        let target = Target::shared_lib("core");
        let cmd = link_command(
            &Toolchain::default(),
            &target,
            &[],
            Path::new("build"),
            Language::C,
            &[PathBuf::from("a.o")],
            Path::new("build/bin/libcore.so"),
        );
        assert_eq!(cmd.args[0], "-shared");
    }

    #[test]
    fn test_link_command_cxx_driver() {
        let target = Target::executable("app");
        let cmd = link_command(
            &Toolchain::default(),
            &target,
            &[],
            Path::new("build"),
            Language::Cxx,
            &[],
            Path::new("build/bin/app"),
        );
        assert_eq!(cmd.program, "g++");
    }

    #[test]
    fn test_link_command_toggles() {
        let mut target = Target::executable("app");
        target.lto = true;
        target.strip = true;

        let cmd = link_command(
            &Toolchain::default(),
            &target,
            &[],
            Path::new("build"),
            Language::C,
            &[],
            Path::new("build/bin/app"),
        );

        let args = &cmd.args;
        assert!(args.contains(&"-pie".to_string()));
        assert!(args.contains(&"-flto".to_string()));
        assert!(args.contains(&"-s".to_string()));
    }

    #[test]
    fn test_link_command_transitive_target_closure() {
        // app -> core -> base: linking app emits libcore.a then libbase.a.
        let base = Target::static_lib("base");
        let mut core = Target::static_lib("core");
        core.link_target(&base);
        let mut app = Target::executable("app");
        app.link_target(&core);

        let registered = vec![base, core];
        let cmd = link_command(
            &Toolchain::default(),
            &app,
            &registered,
            Path::new("build"),
            Language::C,
            &[],
            Path::new("build/bin/app"),
        );

        let core_pos = cmd
            .args
            .iter()
            .position(|a| a == "build/bin/libcore.a")
            .unwrap();
        let base_pos = cmd
            .args
            .iter()
            .position(|a| a == "build/bin/libbase.a")
            .unwrap();
        assert!(core_pos < base_pos);
    }

    #[test]
    fn test_link_command_unregistered_target_skipped() {
        let mut app = Target::executable("app");
        let ghost = Target::static_lib("ghost");
        app.link_target(&ghost);

        let cmd = link_command(
            &Toolchain::default(),
            &app,
            &[],
            Path::new("build"),
            Language::C,
            &[],
            Path::new("build/bin/app"),
        );
        assert!(!cmd.args.iter().any(|a| a.contains("ghost")));
    }

    #[test]
    fn test_link_command_cyclic_references_terminate() {
        let mut a = Target::static_lib("a");
        let mut b = Target::static_lib("b");
        a.link_objects.push(LinkObject::Target("b".to_string()));
        b.link_objects.push(LinkObject::Target("a".to_string()));
        let mut app = Target::executable("app");
        app.link_objects.push(LinkObject::Target("a".to_string()));

        let registered = vec![a, b];
        let cmd = link_command(
            &Toolchain::default(),
            &app,
            &registered,
            Path::new("build"),
            Language::C,
            &[],
            Path::new("build/bin/app"),
        );

        assert!(cmd.args.contains(&"build/bin/liba.a".to_string()));
        assert!(cmd.args.contains(&"build/bin/libb.a".to_string()));
    }

    #[test]
    fn test_archive_command() {
        let inputs = vec![PathBuf::from("a.o"), PathBuf::from("b.o")];
        let cmd = archive_command(&Toolchain::default(), &inputs, Path::new("build/bin/libx.a"));

        assert_eq!(cmd.program, "gcc-ar");
        assert_eq!(cmd.args, vec!["rcs", "build/bin/libx.a", "a.o", "b.o"]);
    }

    #[test]
    fn test_archive_command_empty_inputs_well_formed() {
        let cmd = archive_command(&Toolchain::default(), &[], Path::new("build/bin/libx.a"));
        assert_eq!(cmd.args, vec!["rcs", "build/bin/libx.a"]);
    }

    fn step_with(tmp: &TempDir, kind: StepKind) -> BuildStep {
        BuildStep {
            id: 0,
            kind,
            name: "main.c".to_string(),
            target_index: 0,
            language: Language::C,
            inputs: vec![tmp.path().join("main.c")],
            output: tmp.path().join("main.c.o"),
            dep_path: None,
            header_deps: Vec::new(),
            command: ProcessCommand::new("true"),
            dirty: true,
            completed: false,
            result: None,
        }
    }

    #[test]
    fn test_needs_rebuild_missing_output() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("main.c"), "").unwrap();
        let step = step_with(&tmp, StepKind::Compile);
        assert!(step.needs_rebuild());
    }

    #[test]
    fn test_needs_rebuild_fresh_output() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("main.c"), "").unwrap();
        fs::write(tmp.path().join("main.c.o"), "").unwrap();
        set_file_mtime(tmp.path().join("main.c"), FileTime::from_unix_time(1000, 0)).unwrap();
        set_file_mtime(tmp.path().join("main.c.o"), FileTime::from_unix_time(2000, 0)).unwrap();

        let step = step_with(&tmp, StepKind::Compile);
        assert!(!step.needs_rebuild());
    }

    #[test]
    fn test_needs_rebuild_stale_input() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("main.c"), "").unwrap();
        fs::write(tmp.path().join("main.c.o"), "").unwrap();
        set_file_mtime(tmp.path().join("main.c"), FileTime::from_unix_time(3000, 0)).unwrap();
        set_file_mtime(tmp.path().join("main.c.o"), FileTime::from_unix_time(2000, 0)).unwrap();

        let step = step_with(&tmp, StepKind::Compile);
        assert!(step.needs_rebuild());
    }

    #[test]
    fn test_needs_rebuild_stale_header_dep() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("main.c"), "").unwrap();
        fs::write(tmp.path().join("main.c.o"), "").unwrap();
        fs::write(tmp.path().join("util.h"), "").unwrap();
        set_file_mtime(tmp.path().join("main.c"), FileTime::from_unix_time(1000, 0)).unwrap();
        set_file_mtime(tmp.path().join("main.c.o"), FileTime::from_unix_time(2000, 0)).unwrap();
        set_file_mtime(tmp.path().join("util.h"), FileTime::from_unix_time(3000, 0)).unwrap();

        let mut step = step_with(&tmp, StepKind::Compile);
        step.header_deps = vec![tmp.path().join("util.h")];
        assert!(step.needs_rebuild());
    }

    #[test]
    fn test_link_ignores_header_deps() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("main.c"), "").unwrap();
        fs::write(tmp.path().join("main.c.o"), "").unwrap();
        fs::write(tmp.path().join("util.h"), "").unwrap();
        set_file_mtime(tmp.path().join("main.c"), FileTime::from_unix_time(1000, 0)).unwrap();
        set_file_mtime(tmp.path().join("main.c.o"), FileTime::from_unix_time(2000, 0)).unwrap();
        set_file_mtime(tmp.path().join("util.h"), FileTime::from_unix_time(3000, 0)).unwrap();

        let mut step = step_with(&tmp, StepKind::Link);
        step.header_deps = vec![tmp.path().join("util.h")];
        assert!(!step.needs_rebuild());
    }
}
