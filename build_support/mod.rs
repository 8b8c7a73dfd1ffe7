pub mod header_check;
pub mod link;

use std::{env, path::PathBuf};

pub fn run() {
  println!("cargo:rerun-if-env-changed=LIBTRACE_LIB_DIR");
  println!("cargo:rerun-if-env-changed=LIBTRACE_STATIC");
  println!("cargo:rerun-if-env-changed=LIBTRACE_INCLUDE_DIR");
  println!("cargo:rerun-if-changed=src/ffi_functions.in");

  if let Some(dir) = env::var_os("LIBTRACE_INCLUDE_DIR") {
    header_check::check_declarations(&PathBuf::from(dir));
  }

  // Only the `native` backend references libtrace symbols.
  if env::var_os("CARGO_FEATURE_NATIVE").is_some() {
    link::emit_link_flags();
  }
}
