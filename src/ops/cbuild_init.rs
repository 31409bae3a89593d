//! Implementation of `cbuild init`.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};

/// Template configuration written by `cbuild init`.
const BUILD_TEMPLATE: &str = r#"#include "cbuild/builder.h"
#include "cbuild/target.h"

void build(builder_t* b)
{
  allocator_t* alloc = builder_allocator(b);

  target_t* app = target_executable(alloc, string("app"));

  target_add_source_dir(app, string("src"));
  target_add_include(app, string("include"));

  builder_add_target(b, app);
}
"#;

/// Starter program written next to the template configuration.
const MAIN_TEMPLATE: &str = r#"#include <stdio.h>

int main(int argc, char *argv[]) {
    printf("Hello, cbuild!\n");
    return 0;
}
"#;

/// Create a template `build.c` in `path`, plus a starter `src/main.c`
/// when no sources exist yet.
pub fn init_project(path: &Path) -> Result<()> {
    let config = path.join("build.c");
    if config.exists() {
        bail!("`build.c` already exists in `{}`", path.display());
    }

    fs::write(&config, BUILD_TEMPLATE).with_context(|| "failed to write build.c")?;

    let src_dir = path.join("src");
    if !src_dir.exists() {
        fs::create_dir_all(&src_dir).with_context(|| "failed to create src directory")?;
        fs::write(src_dir.join("main.c"), MAIN_TEMPLATE)
            .with_context(|| "failed to write src/main.c")?;
    }

    Ok(())
}
