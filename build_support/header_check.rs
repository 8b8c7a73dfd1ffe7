use std::{fs, path::Path};

const DECLARED_FUNCTIONS: &[&str] = include!("../src/ffi_functions.in");

/// Warn about every function in `src/ffi.rs` that the installed `libtrace.h`
/// does not declare.
pub fn check_declarations(include_dir: &Path) {
  let header = include_dir.join("libtrace.h");
  println!("cargo:rerun-if-changed={}", header.display());

  let text = match fs::read_to_string(&header) {
    Ok(text) => text,
    Err(err) => {
      println!("cargo:warning=cannot read {}: {err}", header.display());
      return;
    }
  };

  for name in DECLARED_FUNCTIONS {
    if !declares(&text, name) {
      println!(
        "cargo:warning={name} is declared in src/ffi.rs but not in {}",
        header.display()
      );
    }
  }
}

/// `name` appears as a whole identifier directly followed by `(`.
fn declares(header: &str, name: &str) -> bool {
  let is_ident = |c: char| c.is_ascii_alphanumeric() || c == '_';
  header.match_indices(name).any(|(at, _)| {
    let before_ok = header[..at].chars().next_back().is_none_or(|c| !is_ident(c));
    let after = header[at + name.len()..].trim_start();
    before_ok && after.starts_with('(')
  })
}
