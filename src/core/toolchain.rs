//! The toolchain record: which programs drive each step kind.

use crate::core::target::Language;

/// Program names for every tool the orchestrator may invoke.
///
/// Programs are looked up through PATH by the process runner; no detection
/// or probing happens here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    pub c_compiler: String,
    pub cxx_compiler: String,
    pub assembler: String,
    pub archiver: String,
    /// Empty means: link with the compiler that matches the step's language.
    pub linker: String,
    pub objcopy: String,
    pub size: String,
}

impl Default for Toolchain {
    fn default() -> Self {
        Toolchain {
            c_compiler: "gcc".to_string(),
            cxx_compiler: "g++".to_string(),
            assembler: "as".to_string(),
            archiver: "gcc-ar".to_string(),
            linker: String::new(),
            objcopy: "objcopy".to_string(),
            size: "size".to_string(),
        }
    }
}

impl Toolchain {
    /// The compiler driver for a language. `Auto` and `Unknown` fall back
    /// to the C compiler.
    pub fn compiler_for(&self, lang: Language) -> &str {
        match lang {
            Language::Cxx => &self.cxx_compiler,
            Language::Asm => &self.assembler,
            _ => &self.c_compiler,
        }
    }

    /// The link driver for a language: the configured linker if set,
    /// otherwise the compiler matching the language.
    pub fn linker_for(&self, lang: Language) -> &str {
        if self.linker.is_empty() {
            self.compiler_for(lang)
        } else {
            &self.linker
        }
    }
}
