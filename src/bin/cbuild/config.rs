//! The build description compiled into this binary.
//!
//! This mirrors the template that `cbuild init` writes: one executable
//! built from everything under `src/`. A project replaces it through the
//! self-rebuild bootstrap, which recompiles `build.c` against the
//! shipped libraries and restarts the tool.

use cbuild::{Orchestrator, Target};

/// The user configuration entry point.
pub fn build(b: &mut Orchestrator) {
    let mut app = Target::executable("app");

    app.add_source_dir("src");
    app.add_include("include");

    b.add_target(app);
}
