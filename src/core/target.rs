//! Target definitions - what gets built.
//!
//! A Target is a mutable, append-only description of one build output:
//! executable, static library, shared library, or object-only aggregate.
//! User code populates a Target and hands it to the orchestrator, which
//! expands it into compile steps plus at most one link/archive step.

use std::path::{Path, PathBuf};

use tracing::info;

/// The kind of target being built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TargetKind {
    /// Executable binary
    #[default]
    Executable,

    /// Static library (lib{name}.a)
    StaticLib,

    /// Shared library (lib{name}.so)
    SharedLib,

    /// Object files only, no final artifact
    Object,
}

impl TargetKind {
    /// Human-readable label used in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetKind::Executable => "executable",
            TargetKind::StaticLib => "static lib",
            TargetKind::SharedLib => "shared lib",
            TargetKind::Object => "object",
        }
    }
}

/// Source language of a file or target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Language {
    Unknown,
    C,
    Cxx,
    Asm,
    /// Detect from the file extension
    #[default]
    Auto,
}

impl Language {
    /// Human-readable label used in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::C => "C",
            Language::Cxx => "C++",
            Language::Asm => "assembly",
            Language::Auto => "auto",
            Language::Unknown => "unknown",
        }
    }
}

/// Map a source path to its language by extension.
///
/// `.c` is C, `.cpp`/`.cxx`/`.cc` are C++, `.s`/`.S` are assembler.
/// Anything else is `Unknown`.
pub fn detect_language(path: &Path) -> Language {
    match path.extension().and_then(|e| e.to_str()) {
        Some("c") => Language::C,
        Some("cpp") | Some("cxx") | Some("cc") => Language::Cxx,
        Some("s") | Some("S") => Language::Asm,
        _ => Language::Unknown,
    }
}

/// Optimization mode, mapped 1:1 to a compiler flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OptimizeMode {
    /// -O0
    None,
    /// -Og
    #[default]
    Debug,
    /// -O2
    Release,
    /// -O3
    Fast,
    /// -Os
    Size,
    /// -Oz
    SizeMin,
}

impl OptimizeMode {
    /// The compiler flag for this mode.
    pub fn as_flag(&self) -> &'static str {
        match self {
            OptimizeMode::None => "-O0",
            OptimizeMode::Debug => "-Og",
            OptimizeMode::Release => "-O2",
            OptimizeMode::Fast => "-O3",
            OptimizeMode::Size => "-Os",
            OptimizeMode::SizeMin => "-Oz",
        }
    }
}

/// How an include directory is passed to the compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IncludeKind {
    /// -I
    Normal,
    /// -isystem
    System,
    /// -idirafter
    After,
    /// -F (macOS frameworks)
    Framework,
}

/// An include directory with its flag kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncludeDir {
    pub path: PathBuf,
    pub kind: IncludeKind,
}

impl IncludeDir {
    /// Render as a single compiler argument (`-Ipath`, `-isystempath`, ...).
    pub fn as_flag(&self) -> String {
        let prefix = match self.kind {
            IncludeKind::Normal => "-I",
            IncludeKind::System => "-isystem",
            IncludeKind::After => "-idirafter",
            IncludeKind::Framework => "-F",
        };
        format!("{}{}", prefix, self.path.display())
    }
}

/// One source file with its language and optional per-file flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    pub language: Language,
    /// Extra compiler flags applied to this file only.
    pub flags: Vec<String>,
}

/// One logical entry in a target's link list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkObject {
    /// Another registered target, by name. The dependency must be added to
    /// the orchestrator before the target that references it.
    Target(String),
    /// System library, linked with -l{name}
    SystemLib(String),
    /// Direct path to a static archive
    StaticPath(PathBuf),
    /// Direct path to a shared library
    SharedPath(PathBuf),
    /// macOS framework, linked with -framework {name}
    Framework(String),
    /// Raw object file path
    ObjectFile(PathBuf),
}

/// A build target with its full configuration.
///
/// Mutated by user code only; the orchestrator reads it during registration
/// and never writes it back.
#[derive(Debug, Clone)]
pub struct Target {
    /// Target name (non-empty)
    pub name: String,

    /// What kind of artifact to produce
    pub kind: TargetKind,

    /// Explicit source files, in declaration order
    pub sources: Vec<SourceFile>,

    /// Directories enumerated (non-recursively) for sources at registration
    pub source_dirs: Vec<PathBuf>,

    /// Include directories, in declaration order
    pub include_dirs: Vec<IncludeDir>,

    /// Preprocessor defines: `NAME` or `NAME=VALUE` tokens
    pub defines: Vec<String>,

    /// Extra C compiler flags
    pub c_flags: Vec<String>,

    /// Extra C++ compiler flags
    pub cxx_flags: Vec<String>,

    /// Preprocessor flags, applied to both C and C++
    pub cpp_flags: Vec<String>,

    /// Things to link against
    pub link_objects: Vec<LinkObject>,

    /// Extra linker flags
    pub link_flags: Vec<String>,

    /// Library search paths (-L)
    pub lib_paths: Vec<PathBuf>,

    /// Optimization mode
    pub optimize: OptimizeMode,

    /// Directory for the final artifact, under the build directory
    pub bin_dir: PathBuf,

    /// Directory for intermediate objects and depfiles, under the build directory
    pub artifacts_dir: PathBuf,

    /// Final artifact name (defaults to the target name)
    pub output_name: String,

    /// Position-independent executable
    pub pie: bool,

    /// Link-time optimization
    pub lto: bool,

    /// Strip symbols
    pub strip: bool,

    /// Emit .d dependency files during compilation
    pub emit_deps: bool,
}

impl Target {
    /// Create a new target with the given name and kind.
    pub fn new(name: impl Into<String>, kind: TargetKind) -> Self {
        let name = name.into();
        Target {
            output_name: name.clone(),
            name,
            kind,
            sources: Vec::new(),
            source_dirs: Vec::new(),
            include_dirs: Vec::new(),
            defines: Vec::new(),
            c_flags: Vec::new(),
            cxx_flags: Vec::new(),
            cpp_flags: Vec::new(),
            link_objects: Vec::new(),
            link_flags: Vec::new(),
            lib_paths: Vec::new(),
            optimize: OptimizeMode::Debug,
            bin_dir: PathBuf::from("bin"),
            artifacts_dir: PathBuf::from("bin"),
            pie: false,
            lto: false,
            strip: false,
            emit_deps: true,
        }
    }

    /// Create a new executable target. Executables default to PIE.
    pub fn executable(name: impl Into<String>) -> Self {
        let mut target = Self::new(name, TargetKind::Executable);
        target.pie = true;
        target
    }

    /// Create a new static library target.
    pub fn static_lib(name: impl Into<String>) -> Self {
        Self::new(name, TargetKind::StaticLib)
    }

    /// Create a new shared library target.
    pub fn shared_lib(name: impl Into<String>) -> Self {
        Self::new(name, TargetKind::SharedLib)
    }

    /// Create a new object-only target (no link or archive step).
    pub fn object(name: impl Into<String>) -> Self {
        Self::new(name, TargetKind::Object)
    }

    /// Add a source file; its language is detected from the extension.
    pub fn add_source(&mut self, path: impl Into<PathBuf>) -> &mut Self {
        self.sources.push(SourceFile {
            path: path.into(),
            language: Language::Auto,
            flags: Vec::new(),
        });
        self
    }

    /// Add a source file with an explicit language and per-file flags.
    pub fn add_source_with_flags(
        &mut self,
        path: impl Into<PathBuf>,
        language: Language,
        flags: impl IntoIterator<Item = impl Into<String>>,
    ) -> &mut Self {
        self.sources.push(SourceFile {
            path: path.into(),
            language,
            flags: flags.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// Add several source files at once.
    pub fn add_sources(&mut self, paths: impl IntoIterator<Item = impl Into<PathBuf>>) -> &mut Self {
        for path in paths {
            self.add_source(path);
        }
        self
    }

    /// Add a directory to enumerate for sources at registration time.
    ///
    /// Only direct children are considered; subdirectories are not entered.
    pub fn add_source_dir(&mut self, path: impl Into<PathBuf>) -> &mut Self {
        self.source_dirs.push(path.into());
        self
    }

    /// Add several source directories at once.
    pub fn add_source_dirs(
        &mut self,
        paths: impl IntoIterator<Item = impl Into<PathBuf>>,
    ) -> &mut Self {
        for path in paths {
            self.add_source_dir(path);
        }
        self
    }

    /// Add a normal (-I) include directory.
    pub fn add_include(&mut self, path: impl Into<PathBuf>) -> &mut Self {
        self.add_include_dir(path, IncludeKind::Normal)
    }

    /// Add a system (-isystem) include directory.
    pub fn add_include_system(&mut self, path: impl Into<PathBuf>) -> &mut Self {
        self.add_include_dir(path, IncludeKind::System)
    }

    /// Add an include directory with an explicit kind.
    pub fn add_include_dir(&mut self, path: impl Into<PathBuf>, kind: IncludeKind) -> &mut Self {
        self.include_dirs.push(IncludeDir {
            path: path.into(),
            kind,
        });
        self
    }

    /// Add a preprocessor define (`NAME` or `NAME=VALUE`).
    pub fn add_define(&mut self, define: impl Into<String>) -> &mut Self {
        self.defines.push(define.into());
        self
    }

    /// Add a `NAME=VALUE` preprocessor define.
    pub fn add_define_value(
        &mut self,
        name: impl AsRef<str>,
        value: impl AsRef<str>,
    ) -> &mut Self {
        self.defines
            .push(format!("{}={}", name.as_ref(), value.as_ref()));
        self
    }

    /// Add an extra C compiler flag.
    pub fn add_c_flag(&mut self, flag: impl Into<String>) -> &mut Self {
        self.c_flags.push(flag.into());
        self
    }

    /// Add an extra C++ compiler flag.
    pub fn add_cxx_flag(&mut self, flag: impl Into<String>) -> &mut Self {
        self.cxx_flags.push(flag.into());
        self
    }

    /// Add a preprocessor flag (applies to both C and C++).
    pub fn add_cpp_flag(&mut self, flag: impl Into<String>) -> &mut Self {
        self.cpp_flags.push(flag.into());
        self
    }

    /// Add an extra linker flag.
    pub fn add_link_flag(&mut self, flag: impl Into<String>) -> &mut Self {
        self.link_flags.push(flag.into());
        self
    }

    /// Link against another target. The dependency must already be
    /// registered with the orchestrator when this target is added.
    pub fn link_target(&mut self, dep: &Target) -> &mut Self {
        self.link_objects.push(LinkObject::Target(dep.name.clone()));
        self
    }

    /// Link a system library (-l{name}).
    pub fn link_system_lib(&mut self, name: impl Into<String>) -> &mut Self {
        self.link_objects.push(LinkObject::SystemLib(name.into()));
        self
    }

    /// Link a static archive by path.
    pub fn link_static(&mut self, path: impl Into<PathBuf>) -> &mut Self {
        self.link_objects.push(LinkObject::StaticPath(path.into()));
        self
    }

    /// Link a shared library by path.
    pub fn link_shared(&mut self, path: impl Into<PathBuf>) -> &mut Self {
        self.link_objects.push(LinkObject::SharedPath(path.into()));
        self
    }

    /// Link a macOS framework.
    pub fn link_framework(&mut self, name: impl Into<String>) -> &mut Self {
        self.link_objects.push(LinkObject::Framework(name.into()));
        self
    }

    /// Link a raw object file by path.
    pub fn link_object_file(&mut self, path: impl Into<PathBuf>) -> &mut Self {
        self.link_objects.push(LinkObject::ObjectFile(path.into()));
        self
    }

    /// Add a library search path (-L).
    pub fn add_lib_path(&mut self, path: impl Into<PathBuf>) -> &mut Self {
        self.lib_paths.push(path.into());
        self
    }

    /// Set the optimization mode.
    pub fn set_optimize(&mut self, mode: OptimizeMode) -> &mut Self {
        self.optimize = mode;
        self
    }

    /// Override the final artifact name.
    pub fn set_output_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.output_name = name.into();
        self
    }

    /// Override the artifact directory (relative to the build directory).
    pub fn set_bin_dir(&mut self, dir: impl Into<PathBuf>) -> &mut Self {
        self.bin_dir = dir.into();
        self
    }

    /// Override the intermediate-object directory (relative to the build directory).
    pub fn set_artifacts_dir(&mut self, dir: impl Into<PathBuf>) -> &mut Self {
        self.artifacts_dir = dir.into();
        self
    }

    /// The final artifact filename: `{output_name}` for executables,
    /// `lib{output_name}.a` / `lib{output_name}.so` for libraries.
    /// Object aggregates produce no final artifact.
    pub fn artifact_filename(&self) -> Option<String> {
        match self.kind {
            TargetKind::Executable => Some(self.output_name.clone()),
            TargetKind::StaticLib => Some(format!("lib{}.a", self.output_name)),
            TargetKind::SharedLib => Some(format!("lib{}.so", self.output_name)),
            TargetKind::Object => None,
        }
    }

    /// The final artifact path under `build_dir`, or None for object aggregates.
    pub fn artifact_path(&self, build_dir: &Path) -> Option<PathBuf> {
        self.artifact_filename()
            .map(|name| build_dir.join(&self.bin_dir).join(name))
    }

    /// Log the whole target configuration at INFO level.
    pub fn log_config(&self) {
        info!("Target: {}", self.name);
        info!("  Kind: {}", self.kind.as_str());
        info!("  Optimization: {}", self.optimize.as_flag());

        if self.sources.is_empty() {
            info!("  Sources: (none)");
        } else {
            info!("  Sources ({}):", self.sources.len());
            for src in &self.sources {
                info!("    {}  [lang: {}]", src.path.display(), src.language.as_str());
                for flag in &src.flags {
                    info!("      per-file flag: {}", flag);
                }
            }
        }

        for dir in &self.source_dirs {
            info!("  Source directory: {}", dir.display());
        }
        for inc in &self.include_dirs {
            info!("  Include: {}", inc.as_flag());
        }
        for def in &self.defines {
            info!("  Define: -D{}", def);
        }
        for obj in &self.link_objects {
            match obj {
                LinkObject::Target(name) => info!("  Link: target '{}'", name),
                LinkObject::SystemLib(name) => info!("  Link: -l{}", name),
                LinkObject::StaticPath(path) => info!("  Link: {} (static)", path.display()),
                LinkObject::SharedPath(path) => info!("  Link: {} (shared)", path.display()),
                LinkObject::Framework(name) => info!("  Link: -framework {}", name),
                LinkObject::ObjectFile(path) => info!("  Link: {} (object)", path.display()),
            }
        }

        info!("  Output: {}/{}", self.bin_dir.display(), self.output_name);
        info!("  PIE: {}  LTO: {}  strip: {}  deps: {}", self.pie, self.lto, self.strip, self.emit_deps);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_executable_defaults() {
        let target = Target::executable("app");
        assert_eq!(target.name, "app");
        assert_eq!(target.kind, TargetKind::Executable);
        assert_eq!(target.output_name, "app");
        assert!(target.pie);
        assert!(target.emit_deps);
        assert!(!target.lto);
        assert_eq!(target.optimize, OptimizeMode::Debug);
        assert_eq!(target.bin_dir, PathBuf::from("bin"));
        assert_eq!(target.artifacts_dir, PathBuf::from("bin"));
    }

    #[test]
    fn test_library_not_pie() {
        assert!(!Target::static_lib("core").pie);
        assert!(!Target::shared_lib("core").pie);
    }

    #[test]
    fn test_detect_language() {
        assert_eq!(detect_language(Path::new("main.c")), Language::C);
        assert_eq!(detect_language(Path::new("main.cpp")), Language::Cxx);
        assert_eq!(detect_language(Path::new("main.cxx")), Language::Cxx);
        assert_eq!(detect_language(Path::new("main.cc")), Language::Cxx);
        assert_eq!(detect_language(Path::new("boot.s")), Language::Asm);
        assert_eq!(detect_language(Path::new("boot.S")), Language::Asm);
        assert_eq!(detect_language(Path::new("readme.txt")), Language::Unknown);
        assert_eq!(detect_language(Path::new("Makefile")), Language::Unknown);
    }

    #[test]
    fn test_add_define_value() {
        let mut target = Target::executable("app");
        target.add_define("NDEBUG").add_define_value("VERSION", "2");
        assert_eq!(target.defines, vec!["NDEBUG", "VERSION=2"]);
    }

    #[test]
    fn test_sources_preserve_order() {
        let mut target = Target::executable("app");
        target.add_sources(["b.c", "a.c", "c.c"]);
        let paths: Vec<_> = target.sources.iter().map(|s| s.path.clone()).collect();
        assert_eq!(
            paths,
            vec![PathBuf::from("b.c"), PathBuf::from("a.c"), PathBuf::from("c.c")]
        );
    }

    #[test]
    fn test_link_target_records_name() {
        let core = Target::static_lib("core");
        let mut app = Target::executable("app");
        app.link_target(&core);
        assert_eq!(app.link_objects, vec![LinkObject::Target("core".into())]);
    }

    #[test]
    fn test_artifact_paths() {
        let build = Path::new("build");
        assert_eq!(
            Target::executable("app").artifact_path(build),
            Some(PathBuf::from("build/bin/app"))
        );
        assert_eq!(
            Target::static_lib("core").artifact_path(build),
            Some(PathBuf::from("build/bin/libcore.a"))
        );
        assert_eq!(
            Target::shared_lib("core").artifact_path(build),
            Some(PathBuf::from("build/bin/libcore.so"))
        );
        assert_eq!(Target::object("objs").artifact_path(build), None);
    }

    #[test]
    fn test_output_name_override() {
        let mut target = Target::static_lib("core");
        target.set_output_name("core2");
        assert_eq!(
            target.artifact_path(Path::new("build")),
            Some(PathBuf::from("build/bin/libcore2.a"))
        );
    }

    #[test]
    fn test_include_flags() {
        let inc = IncludeDir {
            path: PathBuf::from("include"),
            kind: IncludeKind::Normal,
        };
        assert_eq!(inc.as_flag(), "-Iinclude");

        let sys = IncludeDir {
            path: PathBuf::from("/usr/local/include"),
            kind: IncludeKind::System,
        };
        assert_eq!(sys.as_flag(), "-isystem/usr/local/include");
    }
}
