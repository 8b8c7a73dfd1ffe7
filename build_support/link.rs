use std::env;

pub fn emit_link_flags() {
  if let Ok(lib_dir) = env::var("LIBTRACE_LIB_DIR") {
    println!("cargo:rustc-link-search=native={lib_dir}");
  }
  let kind = match env::var("LIBTRACE_STATIC").as_deref() {
    Ok("1") => "static",
    _ => "dylib",
  };
  println!("cargo:rustc-link-lib={kind}=trace");
}
